//! Flattens SHACL shapes into a [`StatementGraph`].

use crate::model::Cardinality;
use crate::naming::{local_name, namespace_of};
use crate::statement::{EdgeFact, Fact, PropertyFact, PropertySpec, StatementGraph, TypeFact};
use crate::vocab::{DEFAULT_NAMESPACE, sh};
use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// Options of the [`ShapeExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Namespace of the produced statement graph.
    ///
    /// Defaults to the namespace of the first target class.
    pub namespace: Option<String>,
    /// Also emits each relationship property as a property of the relationship source,
    /// under the compound name `{relationship}_{property}`.
    pub mirror_nested_properties: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            mirror_nested_properties: true,
        }
    }
}

impl ExtractOptions {
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn without_mirrored_properties(mut self) -> Self {
        self.mirror_nested_properties = false;
        self
    }
}

/// Reads the node shapes of an RDF graph into statements.
///
/// A node shape needs a `sh:targetClass` to be kept. Its property shapes become
/// relationships when they have a `sh:class` and scalar properties when they have a `sh:datatype`.
/// Any other construct is dropped.
///
/// ```
/// use oxrdf::{Graph, NamedNodeRef, TripleRef};
/// use oxrdf::vocab::rdf;
/// use shaclpg::ShapeExtractor;
/// use shaclpg::vocab::sh;
///
/// let shape = NamedNodeRef::new("http://schema.org/PersonShape")?;
/// let person = NamedNodeRef::new("http://schema.org/Person")?;
/// let mut graph = Graph::new();
/// graph.insert(TripleRef::new(shape, rdf::TYPE, sh::NODE_SHAPE));
/// graph.insert(TripleRef::new(shape, sh::TARGET_CLASS, person));
///
/// let statements = ShapeExtractor::default().extract(&graph);
/// assert_eq!(statements.type_facts().count(), 1);
/// assert!(statements.contains("type:Person"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapeExtractor {
    options: ExtractOptions,
}

impl ShapeExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn extract(&self, graph: &Graph) -> StatementGraph {
        let shapes = find_node_shapes(graph);
        let namespace = self
            .options
            .namespace
            .clone()
            .or_else(|| {
                shapes
                    .first()
                    .map(|shape| namespace_of(shape.class.as_str()).to_owned())
            })
            .filter(|namespace| !namespace.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
        let mut statements = StatementGraph::with_namespace("statements", namespace);

        for shape in &shapes {
            statements.insert(TypeFact {
                subject: shape.id.clone(),
                object: shape.class.into_owned(),
            });
        }
        let mut mirrors = Vec::new();
        for shape in &shapes {
            self.extract_properties(graph, shape, &mut statements, &mut mirrors);
        }
        // Node properties win over mirrors with the same compound name, whatever their order
        for mirror in mirrors {
            let mirror = Fact::from(mirror);
            if statements.contains(&mirror.id()) {
                debug!(statement = %mirror, "A node property has the compound name of a relationship property, keeping the node property");
            } else {
                statements.insert(mirror);
            }
        }
        statements
    }

    fn extract_properties(
        &self,
        graph: &Graph,
        shape: &NodeShape<'_>,
        statements: &mut StatementGraph,
        mirrors: &mut Vec<PropertyFact>,
    ) {
        for value in graph.objects_for_subject_predicate(shape.node, sh::PROPERTY) {
            let Some(property) = as_subject(value) else {
                warn!(shape = %shape.node, value = %value, "sh:property value is not a node, skipping it");
                continue;
            };
            let Some(path) = named_object(graph, property, sh::PATH) else {
                warn!(shape = %shape.node, property = %property, "Property shape without an IRI sh:path, skipping it");
                continue;
            };
            let cardinality = read_cardinality(graph, property);

            if let Some(class) = graph.object_for_subject_predicate(property, sh::CLASS) {
                let TermRef::NamedNode(class) = class else {
                    warn!(shape = %shape.node, path = %path, "sh:class is not an IRI, skipping the property shape");
                    continue;
                };
                let mut edge =
                    EdgeFact::new(&shape.id, path.into_owned(), class.into_owned(), cardinality);
                edge.nested_properties = nested_properties(graph, property);
                if self.options.mirror_nested_properties {
                    mirrors.extend(edge.nested_properties.iter().map(|nested| {
                        PropertyFact::mirror(&shape.id, path.into_owned(), nested.clone())
                    }));
                }
                statements.insert(edge);
            } else if let Some(datatype) = named_object(graph, property, sh::DATATYPE) {
                statements.insert(PropertyFact::new(
                    &shape.id,
                    PropertySpec::new(path.into_owned(), datatype.into_owned(), cardinality),
                ));
            } else {
                debug!(shape = %shape.node, path = %path, "Property shape with neither sh:class nor sh:datatype is not supported, dropping it");
            }
        }
    }
}

/// Extracts statements with the default options.
pub fn extract_statements(graph: &Graph) -> StatementGraph {
    ShapeExtractor::default().extract(graph)
}

struct NodeShape<'a> {
    node: NamedOrBlankNodeRef<'a>,
    class: NamedNodeRef<'a>,
    id: String,
}

fn find_node_shapes(graph: &Graph) -> Vec<NodeShape<'_>> {
    let mut shapes = Vec::new();
    let mut ids = FxHashMap::<String, NamedNodeRef<'_>>::default();
    for node in graph.subjects_for_predicate_object(rdf::TYPE, sh::NODE_SHAPE) {
        let mut classes = graph
            .objects_for_subject_predicate(node, sh::TARGET_CLASS)
            .filter_map(|class| match class {
                TermRef::NamedNode(class) => Some(class),
                _ => None,
            });
        let Some(class) = classes.next() else {
            warn!(shape = %node, "Node shape without an IRI sh:targetClass, skipping it");
            continue;
        };
        for ignored in classes {
            warn!(shape = %node, target_class = %class, ignored = %ignored, "Node shape with several target classes, only the first is used");
        }
        let id = local_name(class.as_str()).to_owned();
        if let Some(previous) = ids.insert(id.clone(), class) {
            if previous != class {
                warn!(id = %id, first = %previous, second = %class, "Two target classes share the same local name");
            }
        }
        shapes.push(NodeShape { node, class, id });
    }
    shapes
}

fn nested_properties(graph: &Graph, relationship: NamedOrBlankNodeRef<'_>) -> Vec<PropertySpec> {
    let mut properties = Vec::new();
    for value in graph.objects_for_subject_predicate(relationship, sh::PROPERTY) {
        let Some(nested) = as_subject(value) else {
            warn!(relationship = %relationship, value = %value, "Nested sh:property value is not a node, skipping it");
            continue;
        };
        let Some(path) = named_object(graph, nested, sh::PATH) else {
            warn!(relationship = %relationship, property = %nested, "Nested property shape without an IRI sh:path, skipping it");
            continue;
        };
        let Some(datatype) = named_object(graph, nested, sh::DATATYPE) else {
            debug!(relationship = %relationship, path = %path, "Nested property shape without sh:datatype is not supported, dropping it");
            continue;
        };
        properties.push(PropertySpec::new(
            path.into_owned(),
            datatype.into_owned(),
            read_cardinality(graph, nested),
        ));
    }
    properties
}

fn read_cardinality(graph: &Graph, shape: NamedOrBlankNodeRef<'_>) -> Cardinality {
    Cardinality::new(
        read_count(graph, shape, sh::MIN_COUNT).unwrap_or(0),
        read_count(graph, shape, sh::MAX_COUNT),
    )
}

fn read_count(
    graph: &Graph,
    shape: NamedOrBlankNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Option<u64> {
    let value = graph.object_for_subject_predicate(shape, predicate)?;
    let count = match value {
        TermRef::Literal(literal) => literal.value().trim().parse().ok(),
        _ => None,
    };
    if count.is_none() {
        warn!(shape = %shape, predicate = %predicate, value = %value, "Invalid count, using the default");
    }
    count
}

fn named_object<'a>(
    graph: &'a Graph,
    subject: NamedOrBlankNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Option<NamedNodeRef<'a>> {
    match graph.object_for_subject_predicate(subject, predicate)? {
        TermRef::NamedNode(node) => Some(node),
        _ => None,
    }
}

fn as_subject(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(node.into()),
        TermRef::BlankNode(node) => Some(node.into()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::PropertyScope;
    use oxrdf::vocab::xsd;
    use oxrdf::{BlankNode, Literal, NamedNode, TripleRef};

    const SCHEMA: &str = "http://schema.org/";

    fn iri(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("{SCHEMA}{name}"))
    }

    fn node_shape(graph: &mut Graph, shape: &str, class: Option<&str>) -> NamedNode {
        let shape = iri(shape);
        graph.insert(TripleRef::new(&shape, rdf::TYPE, sh::NODE_SHAPE));
        if let Some(class) = class {
            graph.insert(TripleRef::new(&shape, sh::TARGET_CLASS, &iri(class)));
        }
        shape
    }

    fn property_shape(
        graph: &mut Graph,
        owner: NamedOrBlankNodeRef<'_>,
        path: &str,
    ) -> BlankNode {
        let property = BlankNode::default();
        graph.insert(TripleRef::new(owner, sh::PROPERTY, &property));
        graph.insert(TripleRef::new(&property, sh::PATH, &iri(path)));
        property
    }

    #[test]
    fn shapes_without_target_class_are_skipped() {
        let mut graph = Graph::new();
        node_shape(&mut graph, "OrphanShape", None);
        node_shape(&mut graph, "PersonShape", Some("Person"));
        let statements = extract_statements(&graph);
        assert_eq!(statements.len(), 1);
        assert!(statements.contains("type:Person"));
        assert_eq!(statements.namespace(), SCHEMA);
    }

    #[test]
    fn scalar_properties_and_counts() {
        let mut graph = Graph::new();
        let shape = node_shape(&mut graph, "PersonShape", Some("Person"));
        let property = property_shape(&mut graph, shape.as_ref().into(), "givenName");
        graph.insert(TripleRef::new(&property, sh::DATATYPE, xsd::STRING));
        graph.insert(TripleRef::new(&property, sh::MIN_COUNT, &Literal::from(1)));
        graph.insert(TripleRef::new(&property, sh::MAX_COUNT, &Literal::from(2)));

        let statements = extract_statements(&graph);
        let Some(Fact::Property(fact)) = statements.get("property:Person:givenName") else {
            panic!("givenName should be extracted")
        };
        assert_eq!(fact.property.datatype, xsd::STRING);
        assert_eq!(fact.property.cardinality, Cardinality::new(1, Some(2)));
        assert_eq!(fact.scope, PropertyScope::Node);
    }

    #[test]
    fn invalid_counts_fall_back_to_defaults() {
        let mut graph = Graph::new();
        let shape = node_shape(&mut graph, "PersonShape", Some("Person"));
        let property = property_shape(&mut graph, shape.as_ref().into(), "name");
        graph.insert(TripleRef::new(&property, sh::DATATYPE, xsd::STRING));
        graph.insert(TripleRef::new(&property, sh::MIN_COUNT, &Literal::from(-1)));
        graph.insert(TripleRef::new(
            &property,
            sh::MAX_COUNT,
            &Literal::new_simple_literal("many"),
        ));

        let statements = extract_statements(&graph);
        let Some(fact) = statements.property_facts().next() else {
            panic!("name should be extracted")
        };
        assert_eq!(fact.property.cardinality, Cardinality::default());
    }

    #[test]
    fn relationships_carry_nested_properties_and_mirrors() {
        let mut graph = Graph::new();
        let shape = node_shape(&mut graph, "PersonShape", Some("Person"));
        let member_of = property_shape(&mut graph, shape.as_ref().into(), "memberOf");
        graph.insert(TripleRef::new(&member_of, sh::CLASS, &iri("Organization")));
        let role = property_shape(&mut graph, member_of.as_ref().into(), "role");
        graph.insert(TripleRef::new(&role, sh::DATATYPE, xsd::STRING));
        graph.insert(TripleRef::new(&role, sh::MIN_COUNT, &Literal::from(1)));

        let statements = extract_statements(&graph);
        let Some(Fact::Edge(edge)) = statements.get("edge:Person:memberOf:Organization") else {
            panic!("memberOf should be extracted")
        };
        assert_eq!(edge.object, "Organization");
        assert_eq!(edge.cardinality, Cardinality::default());
        assert_eq!(edge.nested_properties.len(), 1);
        assert_eq!(edge.nested_properties[0].name(), "role");

        let Some(Fact::Property(mirror)) = statements.get("property:Person:memberOf_role") else {
            panic!("role should be mirrored on Person")
        };
        assert!(mirror.is_mirror());
        assert_eq!(mirror.property.cardinality.min, 1);

        let statements =
            ShapeExtractor::new(ExtractOptions::default().without_mirrored_properties())
                .extract(&graph);
        assert_eq!(statements.property_facts().count(), 0);
    }

    #[test]
    fn node_properties_win_over_mirrors_with_the_same_name() {
        let mut graph = Graph::new();
        let shape = node_shape(&mut graph, "PersonShape", Some("Person"));
        let member_of = property_shape(&mut graph, shape.as_ref().into(), "memberOf");
        graph.insert(TripleRef::new(&member_of, sh::CLASS, &iri("Organization")));
        let since = property_shape(&mut graph, member_of.as_ref().into(), "since");
        graph.insert(TripleRef::new(&since, sh::DATATYPE, xsd::STRING));
        let compound = property_shape(&mut graph, shape.as_ref().into(), "memberOf_since");
        graph.insert(TripleRef::new(&compound, sh::DATATYPE, xsd::DATE));

        let statements = extract_statements(&graph);
        let Some(Fact::Property(fact)) = statements.get("property:Person:memberOf_since") else {
            panic!("memberOf_since should be extracted")
        };
        assert_eq!(fact.scope, PropertyScope::Node);
        assert_eq!(fact.property.datatype, xsd::DATE);
    }

    #[test]
    fn unsupported_and_malformed_property_shapes_are_dropped() {
        let mut graph = Graph::new();
        let shape = node_shape(&mut graph, "PersonShape", Some("Person"));
        // Neither sh:class nor sh:datatype
        property_shape(&mut graph, shape.as_ref().into(), "nickname");
        // No sh:path
        let pathless = BlankNode::default();
        graph.insert(TripleRef::new(&shape, sh::PROPERTY, &pathless));
        graph.insert(TripleRef::new(&pathless, sh::DATATYPE, xsd::STRING));
        // Literal sh:property value
        graph.insert(TripleRef::new(
            &shape,
            sh::PROPERTY,
            &Literal::new_simple_literal("oops"),
        ));

        let statements = extract_statements(&graph);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn explicit_namespace_wins() {
        let mut graph = Graph::new();
        node_shape(&mut graph, "PersonShape", Some("Person"));
        let statements =
            ShapeExtractor::new(ExtractOptions::default().with_namespace("http://example.com/"))
                .extract(&graph);
        assert_eq!(statements.namespace(), "http://example.com/");
    }
}
