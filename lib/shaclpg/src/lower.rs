//! Lowers a [`StatementGraph`] into a property graph [`SchemaGraph`].

use crate::datatype::map_datatype;
use crate::error::GraphError;
use crate::model::{PropertyConstraint, SchemaEdge, SchemaGraph};
use crate::naming::{flat_upper_case, local_name, upper_snake_case};
use crate::statement::{EdgeFact, PropertyFact, PropertyScope, PropertySpec, StatementGraph};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// How relationship names become relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelationshipTypeStyle {
    /// `underName` becomes `UNDER_NAME`.
    #[default]
    UpperSnake,
    /// `memberOf` becomes `MEMBEROF`.
    Flat,
}

impl RelationshipTypeStyle {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::UpperSnake => upper_snake_case(name),
            Self::Flat => flat_upper_case(name),
        }
    }
}

/// Which constraint wins when a relationship property is found both nested in the
/// relationship shape and through a compatibility shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgePropertyPrecedence {
    /// The nested constraint is kept.
    #[default]
    Nested,
    /// The last constraint found wins: nested, then same-subject, then compound name.
    Flattened,
}

/// Alternative encodings of relationship properties that are also recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompatShims {
    /// Properties whose subject is the relationship name itself.
    pub same_subject: bool,
    /// Properties of the relationship source named `{relationship}_{property}`.
    pub compound_name: bool,
}

impl CompatShims {
    pub const NONE: Self = Self {
        same_subject: false,
        compound_name: false,
    };
}

impl Default for CompatShims {
    fn default() -> Self {
        Self {
            same_subject: true,
            compound_name: true,
        }
    }
}

/// Options of the [`PgLowering`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoweringOptions {
    pub relationship_types: RelationshipTypeStyle,
    pub edge_property_precedence: EdgePropertyPrecedence,
    pub compat: CompatShims,
}

impl LoweringOptions {
    #[must_use]
    pub fn with_relationship_types(mut self, style: RelationshipTypeStyle) -> Self {
        self.relationship_types = style;
        self
    }

    #[must_use]
    pub fn with_edge_property_precedence(mut self, precedence: EdgePropertyPrecedence) -> Self {
        self.edge_property_precedence = precedence;
        self
    }

    #[must_use]
    pub fn with_compat_shims(mut self, compat: CompatShims) -> Self {
        self.compat = compat;
        self
    }
}

/// Builds a property graph schema out of statements.
///
/// Each type fact becomes a labeled node, each node-scoped property fact a constraint of
/// that node and each edge fact a typed edge. Facts about unknown subjects are dropped,
/// so the output never contains a dangling edge.
///
/// ```
/// use oxrdf::NamedNode;
/// use shaclpg::{Cardinality, EdgeFact, PgLowering, StatementGraph, TypeFact};
///
/// let schema = |name: &str| NamedNode::new_unchecked(format!("http://schema.org/{name}"));
/// let mut statements = StatementGraph::new("example");
/// for class in ["Person", "Organization"] {
///     statements.insert(TypeFact {
///         subject: class.into(),
///         object: schema(class),
///     });
/// }
/// statements.insert(EdgeFact::new(
///     "Person",
///     schema("memberOf"),
///     schema("Organization"),
///     Cardinality::default(),
/// ));
///
/// let pg = PgLowering::default().lower(&statements);
/// assert_eq!(pg.node_count(), 2);
/// assert!(pg.edges().any(|edge| edge.edge_type() == "MEMBER_OF"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PgLowering {
    options: LoweringOptions,
}

impl PgLowering {
    pub fn new(options: LoweringOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoweringOptions {
        &self.options
    }

    pub fn lower(&self, statements: &StatementGraph) -> SchemaGraph {
        let mut pg = SchemaGraph::with_namespace("pgschema", statements.namespace());

        for fact in statements.type_facts() {
            pg.get_or_insert_node(&fact.subject)
                .add_label(local_name(fact.object.as_str()));
        }

        for fact in statements.property_facts() {
            if fact.is_mirror() {
                continue;
            }
            let Some(node) = pg.node_mut(&fact.subject) else {
                debug!(subject = %fact.subject, property = %fact.name(), "Property of an unknown subject, dropping it");
                continue;
            };
            node.add_property_constraint(property_constraint(fact.property.name(), &fact.property));
        }

        let facts_by_subject = index_property_facts(statements);
        for fact in statements.edge_facts() {
            let id = available_edge_id(&pg, fact);
            let edge = self.lower_edge(id, fact, &facts_by_subject);
            match pg.add_edge(edge) {
                Ok(()) => (),
                Err(GraphError::DanglingEdge { edge, endpoint }) => {
                    warn!(edge = %edge, endpoint = %endpoint, "Relationship with an unknown endpoint, dropping it");
                }
            }
        }
        pg
    }

    fn lower_edge(
        &self,
        id: String,
        fact: &EdgeFact,
        facts_by_subject: &FxHashMap<&str, Vec<&PropertyFact>>,
    ) -> SchemaEdge {
        let name = fact.name();
        let mut edge = SchemaEdge::new(
            id,
            &fact.subject,
            &fact.object,
            self.options.relationship_types.apply(name),
        );
        for nested in &fact.nested_properties {
            edge.add_property_constraint(property_constraint(nested.name(), nested));
        }
        if self.options.compat.same_subject {
            for constraint in same_subject_properties(fact, facts_by_subject) {
                self.attach(&mut edge, constraint);
            }
        }
        if self.options.compat.compound_name {
            for constraint in compound_name_properties(fact, facts_by_subject) {
                self.attach(&mut edge, constraint);
            }
        }
        edge.set_cardinality(fact.cardinality);
        edge
    }

    fn attach(&self, edge: &mut SchemaEdge, constraint: PropertyConstraint) {
        match self.options.edge_property_precedence {
            EdgePropertyPrecedence::Nested => {
                if edge.property_constraint(&constraint.name).is_none() {
                    edge.add_property_constraint(constraint);
                }
            }
            EdgePropertyPrecedence::Flattened => {
                edge.add_property_constraint(constraint);
            }
        }
    }
}

/// Lowers statements with the default options.
pub fn lower_to_pg(statements: &StatementGraph) -> SchemaGraph {
    PgLowering::default().lower(statements)
}

/// `{subject}_{relationship}_{object}`, suffixed with a counter when another relationship
/// already owns it (`A -b_c-> D` and `A_b -c-> D` share the same base id).
fn available_edge_id(pg: &SchemaGraph, fact: &EdgeFact) -> String {
    let id = format!("{}_{}_{}", fact.subject, fact.name(), fact.object);
    if pg.edge(&id).is_none() {
        return id;
    }
    let mut counter = 2_u32;
    loop {
        let candidate = format!("{id}_{counter}");
        if pg.edge(&candidate).is_none() {
            debug!(
                subject = %fact.subject,
                relationship = %fact.name(),
                id = %candidate,
                "Relationship id already taken, renaming it"
            );
            return candidate;
        }
        counter += 1;
    }
}

/// Properties stated directly on the relationship name, as in `memberOf role xsd:string`.
fn same_subject_properties(
    fact: &EdgeFact,
    facts_by_subject: &FxHashMap<&str, Vec<&PropertyFact>>,
) -> Vec<PropertyConstraint> {
    facts_by_subject
        .get(fact.name())
        .into_iter()
        .flatten()
        .filter(|property| property.scope == PropertyScope::Node)
        .map(|property| property_constraint(property.property.name(), &property.property))
        .collect()
}

/// Properties of the relationship source named `{relationship}_{property}`.
///
/// Mirrors are left out: they copy the nested properties of one relationship and would
/// leak into every relationship sharing its name.
fn compound_name_properties(
    fact: &EdgeFact,
    facts_by_subject: &FxHashMap<&str, Vec<&PropertyFact>>,
) -> Vec<PropertyConstraint> {
    let prefix = format!("{}_", fact.name());
    facts_by_subject
        .get(fact.subject.as_str())
        .into_iter()
        .flatten()
        .filter(|property| property.scope == PropertyScope::Node)
        .filter_map(|property| {
            let name = property.name();
            let stripped = name.strip_prefix(&prefix)?;
            (!stripped.is_empty()).then(|| property_constraint(stripped, &property.property))
        })
        .collect()
}

fn index_property_facts(statements: &StatementGraph) -> FxHashMap<&str, Vec<&PropertyFact>> {
    let mut index = FxHashMap::<&str, Vec<&PropertyFact>>::default();
    for fact in statements.property_facts() {
        index.entry(fact.subject.as_str()).or_default().push(fact);
    }
    index
}

fn property_constraint(name: &str, property: &PropertySpec) -> PropertyConstraint {
    PropertyConstraint::new(name, map_datatype(property.datatype.as_str()))
        .with_cardinality(property.cardinality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::PgDatatype;
    use crate::model::Cardinality;
    use crate::statement::TypeFact;
    use oxrdf::NamedNode;
    use oxrdf::vocab::xsd;

    fn schema(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://schema.org/{name}"))
    }

    fn string_property(name: &str, min: u64) -> PropertySpec {
        PropertySpec::new(
            schema(name),
            xsd::STRING.into_owned(),
            Cardinality::new(min, None),
        )
    }

    fn person_and_organization() -> StatementGraph {
        let mut statements = StatementGraph::new("test");
        for class in ["Person", "Organization"] {
            statements.insert(TypeFact {
                subject: class.into(),
                object: schema(class),
            });
        }
        statements
    }

    fn member_of(nested: Vec<PropertySpec>) -> EdgeFact {
        let mut edge = EdgeFact::new(
            "Person",
            schema("memberOf"),
            schema("Organization"),
            Cardinality::default(),
        );
        edge.nested_properties = nested;
        edge
    }

    #[test]
    fn nodes_are_labeled_by_class_local_name() {
        let pg = lower_to_pg(&person_and_organization());
        assert_eq!(pg.name(), "pgschema");
        assert_eq!(pg.node_count(), 2);
        assert_eq!(
            pg.node("Person").and_then(|node| node.first_label()),
            Some("Person")
        );
    }

    #[test]
    fn node_properties_are_mapped() {
        let mut statements = person_and_organization();
        statements.insert(PropertyFact::new(
            "Person",
            PropertySpec::new(
                schema("birthDate"),
                xsd::DATE.into_owned(),
                Cardinality::new(0, Some(1)),
            ),
        ));
        statements.insert(PropertyFact::new("Ghost", string_property("name", 1)));

        let pg = lower_to_pg(&statements);
        let Some(constraint) = pg
            .node("Person")
            .and_then(|node| node.property_constraint("birthDate"))
        else {
            panic!("birthDate should be a constraint of Person")
        };
        assert_eq!(constraint.datatype, PgDatatype::Date);
        assert_eq!(constraint.max_cardinality, Some(1));
        assert!(!pg.contains_node("Ghost"));
    }

    #[test]
    fn mirrored_properties_stay_off_nodes() {
        let mut statements = person_and_organization();
        statements.insert(member_of(vec![string_property("role", 1)]));
        statements.insert(PropertyFact::mirror(
            "Person",
            schema("memberOf"),
            string_property("role", 1),
        ));

        let pg = lower_to_pg(&statements);
        assert!(
            pg.node("Person")
                .is_some_and(|node| node.property_constraints().is_empty())
        );
        let Some(edge) = pg.edges().next() else {
            panic!("memberOf should be lowered")
        };
        assert_eq!(edge.property_constraints().len(), 1);
        assert!(edge.property_constraint("role").is_some_and(|c| c.is_required()));
    }

    #[test]
    fn edges_need_both_endpoints() {
        let mut statements = person_and_organization();
        statements.insert(EdgeFact::new(
            "Person",
            schema("worksFor"),
            schema("Company"),
            Cardinality::default(),
        ));
        let pg = lower_to_pg(&statements);
        assert_eq!(pg.edge_count(), 0);
    }

    #[test]
    fn edge_identity_type_and_cardinality() {
        let mut statements = person_and_organization();
        let mut edge = member_of(Vec::new());
        edge.cardinality = Cardinality::new(1, Some(2));
        statements.insert(edge);

        let pg = lower_to_pg(&statements);
        let Some(edge) = pg.edge("Person_memberOf_Organization") else {
            panic!("the edge id should be derived from its endpoints")
        };
        assert_eq!(edge.edge_type(), "MEMBER_OF");
        assert_eq!(edge.source(), "Person");
        assert_eq!(edge.target(), "Organization");
        assert_eq!(edge.property(SchemaEdge::MIN_COUNT), Some("1"));
        assert_eq!(edge.property(SchemaEdge::MAX_COUNT), Some("2"));

        let pg = PgLowering::new(
            LoweringOptions::default().with_relationship_types(RelationshipTypeStyle::Flat),
        )
        .lower(&statements);
        assert_eq!(pg.edge_types().into_iter().collect::<Vec<_>>(), ["MEMBEROF"]);
    }

    #[test]
    fn relationships_sharing_a_name_keep_their_own_properties() {
        let mut statements = person_and_organization();
        statements.insert(TypeFact {
            subject: "Club".into(),
            object: schema("Club"),
        });
        statements.insert(member_of(vec![string_property("role", 1)]));
        let mut club = EdgeFact::new(
            "Person",
            schema("memberOf"),
            schema("Club"),
            Cardinality::default(),
        );
        club.nested_properties = vec![string_property("fee", 1)];
        statements.insert(club);
        for nested in ["role", "fee"] {
            statements.insert(PropertyFact::mirror(
                "Person",
                schema("memberOf"),
                string_property(nested, 1),
            ));
        }

        let pg = lower_to_pg(&statements);
        let names = |id: &str| {
            pg.edge(id)
                .map(|edge| edge.property_constraints().keys().cloned().collect::<Vec<_>>())
        };
        assert_eq!(
            names("Person_memberOf_Organization"),
            Some(vec!["role".to_owned()])
        );
        assert_eq!(names("Person_memberOf_Club"), Some(vec!["fee".to_owned()]));
    }

    #[test]
    fn edge_ids_never_overwrite_each_other() {
        let mut statements = StatementGraph::new("test");
        for class in ["A", "A_b", "D"] {
            statements.insert(TypeFact {
                subject: class.into(),
                object: schema(class),
            });
        }
        statements.insert(EdgeFact::new(
            "A",
            schema("b_c"),
            schema("D"),
            Cardinality::default(),
        ));
        statements.insert(EdgeFact::new(
            "A_b",
            schema("c"),
            schema("D"),
            Cardinality::default(),
        ));

        let pg = lower_to_pg(&statements);
        assert_eq!(pg.edge_count(), 2);
        assert_eq!(pg.edge("A_b_c_D").map(SchemaEdge::source), Some("A"));
        assert_eq!(pg.edge("A_b_c_D_2").map(SchemaEdge::source), Some("A_b"));
        assert_eq!(
            pg.edge("A_b_c_D_2").map(SchemaEdge::edge_type),
            Some("C")
        );
    }

    #[test]
    fn same_subject_shim() {
        let mut statements = person_and_organization();
        statements.insert(member_of(Vec::new()));
        statements.insert(PropertyFact::new("memberOf", string_property("since", 0)));

        let pg = lower_to_pg(&statements);
        assert!(pg.edges().all(|edge| edge.property_constraint("since").is_some()));
        assert!(!pg.contains_node("memberOf"));

        let pg = PgLowering::new(LoweringOptions::default().with_compat_shims(CompatShims {
            same_subject: false,
            compound_name: true,
        }))
        .lower(&statements);
        assert!(pg.edges().all(|edge| edge.property_constraints().is_empty()));
    }

    #[test]
    fn compound_name_shim() {
        let mut statements = person_and_organization();
        statements.insert(member_of(Vec::new()));
        statements.insert(PropertyFact::new(
            "Person",
            string_property("memberOf_startDate", 1),
        ));

        let pg = lower_to_pg(&statements);
        let Some(edge) = pg.edges().next() else {
            panic!("memberOf should be lowered")
        };
        assert!(edge.property_constraint("startDate").is_some());

        let pg = PgLowering::new(LoweringOptions::default().with_compat_shims(CompatShims::NONE))
            .lower(&statements);
        assert!(pg.edges().all(|edge| edge.property_constraints().is_empty()));
    }

    #[test]
    fn precedence_between_nested_and_flattened_encodings() {
        let mut statements = person_and_organization();
        statements.insert(member_of(vec![string_property("role", 1)]));
        statements.insert(PropertyFact::new(
            "memberOf",
            PropertySpec::new(
                schema("role"),
                xsd::INTEGER.into_owned(),
                Cardinality::default(),
            ),
        ));

        let role = |options: LoweringOptions| {
            PgLowering::new(options)
                .lower(&statements)
                .edges()
                .find_map(|edge| edge.property_constraint("role").cloned())
        };
        let nested = role(LoweringOptions::default());
        assert_eq!(nested.map(|c| c.datatype), Some(PgDatatype::String));
        let flattened = role(
            LoweringOptions::default()
                .with_edge_property_precedence(EdgePropertyPrecedence::Flattened),
        );
        assert_eq!(flattened.map(|c| c.datatype), Some(PgDatatype::Integer));
    }
}
