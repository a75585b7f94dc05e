//! Lifts statements, and through them property graph schemas, back into SHACL shapes.

use crate::model::{Cardinality, SchemaGraph};
use crate::naming::lower_camel_case;
use crate::statement::{EdgeFact, Fact, PropertyFact, PropertySpec, StatementGraph, TypeFact};
use crate::vocab::sh;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Graph, Literal, NamedNode, NamedOrBlankNodeRef, TripleRef};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

/// Writes one node shape per subject and one property shape per property or relationship.
///
/// The shape of a class `C` is `CShape`. Subjects without a class get
/// `{namespace}{subject}Shape`, a node shape without target.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdfLifting;

impl RdfLifting {
    pub fn new() -> Self {
        Self
    }

    pub fn lift(&self, statements: &StatementGraph) -> Graph {
        let mut graph = Graph::new();
        let mut shapes = ShapeTable::new(statements.namespace());
        for fact in statements.type_facts() {
            shapes.register(fact);
        }
        for fact in statements {
            match fact {
                Fact::Type(fact) => {
                    if let Some(shape) = shapes.resolve(&fact.subject, &mut graph) {
                        graph.insert(TripleRef::new(&shape, sh::TARGET_CLASS, &fact.object));
                    }
                }
                Fact::Property(fact) => lift_property(fact, &mut shapes, &mut graph),
                Fact::Edge(fact) => lift_edge(fact, &mut shapes, &mut graph),
            }
        }
        graph
    }

    /// Lifts a property graph schema, going through [`raise_to_statements`].
    pub fn lift_pg(&self, pg: &SchemaGraph) -> Graph {
        self.lift(&raise_to_statements(pg))
    }
}

/// Lifts statements into SHACL shapes.
pub fn lift_to_rdf(statements: &StatementGraph) -> Graph {
    RdfLifting::new().lift(statements)
}

/// Shape IRIs by subject, created on first use.
struct ShapeTable<'a> {
    namespace: &'a str,
    shapes: FxHashMap<String, NamedNode>,
    declared: FxHashSet<String>,
}

impl<'a> ShapeTable<'a> {
    fn new(namespace: &'a str) -> Self {
        Self {
            namespace,
            shapes: FxHashMap::default(),
            declared: FxHashSet::default(),
        }
    }

    fn register(&mut self, fact: &TypeFact) {
        match NamedNode::new(format!("{}Shape", fact.object.as_str())) {
            Ok(shape) => {
                self.shapes.insert(fact.subject.clone(), shape);
            }
            Err(error) => warn!(class = %fact.object, %error, "Cannot mint a shape IRI for the class"),
        }
    }

    /// Returns the shape of `subject`, declaring it in `graph` the first time.
    fn resolve(&mut self, subject: &str, graph: &mut Graph) -> Option<NamedNode> {
        let shape = match self.shapes.get(subject) {
            Some(shape) => shape.clone(),
            None => match NamedNode::new(format!("{}{subject}Shape", self.namespace)) {
                Ok(shape) => {
                    self.shapes.insert(subject.to_owned(), shape.clone());
                    shape
                }
                Err(error) => {
                    warn!(subject, %error, "Cannot mint a shape IRI for the subject, skipping its statements");
                    return None;
                }
            },
        };
        if self.declared.insert(subject.to_owned()) {
            graph.insert(TripleRef::new(&shape, rdf::TYPE, sh::NODE_SHAPE));
        }
        Some(shape)
    }
}

fn lift_property(fact: &PropertyFact, shapes: &mut ShapeTable<'_>, graph: &mut Graph) {
    // Mirrors are written as nested shapes of their relationship
    if fact.is_mirror() {
        return;
    }
    let Some(shape) = shapes.resolve(&fact.subject, graph) else {
        return;
    };
    let property = property_shape(graph, shape.as_ref().into(), &fact.property.predicate);
    graph.insert(TripleRef::new(&property, sh::DATATYPE, &fact.property.datatype));
    write_cardinality(graph, &property, fact.property.cardinality);
}

fn lift_edge(fact: &EdgeFact, shapes: &mut ShapeTable<'_>, graph: &mut Graph) {
    let Some(shape) = shapes.resolve(&fact.subject, graph) else {
        return;
    };
    let relationship = property_shape(graph, shape.as_ref().into(), &fact.predicate);
    graph.insert(TripleRef::new(&relationship, sh::CLASS, &fact.class));
    write_cardinality(graph, &relationship, fact.cardinality);
    for nested in &fact.nested_properties {
        let property = property_shape(graph, relationship.as_ref().into(), &nested.predicate);
        graph.insert(TripleRef::new(&property, sh::DATATYPE, &nested.datatype));
        write_cardinality(graph, &property, nested.cardinality);
    }
}

fn property_shape(
    graph: &mut Graph,
    owner: NamedOrBlankNodeRef<'_>,
    path: &NamedNode,
) -> BlankNode {
    let property = BlankNode::default();
    graph.insert(TripleRef::new(owner, sh::PROPERTY, &property));
    graph.insert(TripleRef::new(&property, rdf::TYPE, sh::PROPERTY_SHAPE));
    graph.insert(TripleRef::new(&property, sh::PATH, path));
    property
}

fn write_cardinality(graph: &mut Graph, property: &BlankNode, cardinality: Cardinality) {
    if cardinality.min > 0 {
        graph.insert(TripleRef::new(
            property,
            sh::MIN_COUNT,
            &Literal::from(cardinality.min),
        ));
    }
    if let Some(max) = cardinality.max {
        graph.insert(TripleRef::new(property, sh::MAX_COUNT, &Literal::from(max)));
    }
}

/// Turns a property graph schema back into statements.
///
/// IRIs are rebuilt in the graph namespace: classes from node labels, properties from
/// constraint names and relationships from the lowerCamelCase form of their type.
pub fn raise_to_statements(pg: &SchemaGraph) -> StatementGraph {
    let namespace = pg.namespace();
    let mut statements = StatementGraph::with_namespace(pg.name(), namespace);

    for node in pg.nodes() {
        if let Some(class) = node.first_label().and_then(|label| mint(namespace, label)) {
            statements.insert(TypeFact {
                subject: node.id().to_owned(),
                object: class,
            });
        }
        for constraint in node.property_constraints().values() {
            let Some(predicate) = mint(namespace, &constraint.name) else {
                continue;
            };
            statements.insert(PropertyFact::new(
                node.id(),
                PropertySpec::new(
                    predicate,
                    constraint.datatype.xsd_iri().into_owned(),
                    constraint.cardinality(),
                ),
            ));
        }
    }

    for edge in pg.edges() {
        let target_label = pg
            .node(edge.target())
            .and_then(|node| node.first_label())
            .unwrap_or(edge.target());
        let (Some(predicate), Some(class)) = (
            mint(namespace, &lower_camel_case(edge.edge_type())),
            mint(namespace, target_label),
        ) else {
            continue;
        };
        let mut fact = EdgeFact::new(
            edge.source(),
            predicate,
            class,
            edge.cardinality().unwrap_or_default(),
        );
        edge.target().clone_into(&mut fact.object);
        fact.nested_properties = edge
            .property_constraints()
            .values()
            .filter_map(|constraint| {
                Some(PropertySpec::new(
                    mint(namespace, &constraint.name)?,
                    constraint.datatype.xsd_iri().into_owned(),
                    constraint.cardinality(),
                ))
            })
            .collect();
        statements.insert(fact);
    }
    statements
}

fn mint(namespace: &str, name: &str) -> Option<NamedNode> {
    NamedNode::new(format!("{namespace}{name}"))
        .inspect_err(|error| warn!(namespace, name, %error, "Cannot build an IRI, skipping it"))
        .ok()
}
