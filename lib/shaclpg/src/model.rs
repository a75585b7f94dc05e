//! Property graph schema model.
//!
//! This module defines the types the lowering stage produces and the writers consume:
//! - [`SchemaGraph`] - Named container of nodes and edges with an identifier index
//! - [`SchemaNode`] - Node with labels and property constraints
//! - [`SchemaEdge`] - Typed relationship with edge-scoped property constraints
//! - [`PropertyConstraint`] - Datatype and cardinality of a single property
//! - [`Cardinality`] - Minimum and optional maximum count

use crate::datatype::PgDatatype;
use crate::error::GraphError;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Minimum and maximum number of values.
///
/// A missing maximum means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cardinality {
    pub min: u64,
    pub max: Option<u64>,
}

impl Cardinality {
    /// Sentinel used where an unbounded maximum has to be written as a signed integer.
    pub const UNBOUNDED: i64 = -1;

    #[inline]
    pub fn new(min: u64, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// Returns true for `[0..*]`, the cardinality of an unconstrained property.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.min == 0 && self.max.is_none()
    }

    /// Returns true if `count` values are allowed.
    #[inline]
    pub fn allows(&self, count: u64) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// The maximum, with [`Self::UNBOUNDED`] for no maximum.
    pub fn max_or_unbounded(&self) -> i64 {
        self.max
            .and_then(|max| i64::try_from(max).ok())
            .unwrap_or(Self::UNBOUNDED)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}..{max}]", self.min),
            None => write!(f, "[{}..*]", self.min),
        }
    }
}

/// Constraint on one property of a node or an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyConstraint {
    pub name: String,
    pub datatype: PgDatatype,
    pub min_cardinality: u64,
    pub max_cardinality: Option<u64>,
}

impl PropertyConstraint {
    /// Creates an optional, unbounded constraint.
    pub fn new(name: impl Into<String>, datatype: PgDatatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            min_cardinality: 0,
            max_cardinality: None,
        }
    }

    #[must_use]
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.set_cardinality(cardinality);
        self
    }

    pub fn set_cardinality(&mut self, cardinality: Cardinality) {
        self.min_cardinality = cardinality.min;
        self.max_cardinality = cardinality.max;
    }

    pub fn cardinality(&self) -> Cardinality {
        Cardinality::new(self.min_cardinality, self.max_cardinality)
    }

    /// A property is required when at least one value is expected.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.min_cardinality > 0
    }
}

/// A node of a property graph schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    id: String,
    labels: BTreeSet<String>,
    property_constraints: BTreeMap<String, PropertyConstraint>,
    properties: BTreeMap<String, Value>,
}

impl SchemaNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: BTreeSet::new(),
            property_constraints: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    /// The label writers display for this node, the smallest one.
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn property_constraints(&self) -> &BTreeMap<String, PropertyConstraint> {
        &self.property_constraints
    }

    pub fn property_constraint(&self, name: &str) -> Option<&PropertyConstraint> {
        self.property_constraints.get(name)
    }

    /// Adds a constraint, returning the one it replaces if a constraint with the same name existed.
    pub fn add_property_constraint(
        &mut self,
        constraint: PropertyConstraint,
    ) -> Option<PropertyConstraint> {
        self.property_constraints
            .insert(constraint.name.clone(), constraint)
    }

    /// Property values carried by the node itself.
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }
}

/// A relationship of a property graph schema.
///
/// Its endpoints are node identifiers of the [`SchemaGraph`] that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEdge {
    id: String,
    source: String,
    target: String,
    edge_type: String,
    property_constraints: BTreeMap<String, PropertyConstraint>,
    properties: BTreeMap<String, String>,
}

impl SchemaEdge {
    /// Key of the relationship minimum count in the edge property bag.
    pub const MIN_COUNT: &str = "minCount";
    /// Key of the relationship maximum count in the edge property bag.
    pub const MAX_COUNT: &str = "maxCount";

    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: edge_type.into(),
            property_constraints: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn edge_type(&self) -> &str {
        &self.edge_type
    }

    pub fn property_constraints(&self) -> &BTreeMap<String, PropertyConstraint> {
        &self.property_constraints
    }

    pub fn property_constraint(&self, name: &str) -> Option<&PropertyConstraint> {
        self.property_constraints.get(name)
    }

    /// Adds an edge-scoped constraint, returning the one it replaces.
    pub fn add_property_constraint(
        &mut self,
        constraint: PropertyConstraint,
    ) -> Option<PropertyConstraint> {
        self.property_constraints
            .insert(constraint.name.clone(), constraint)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Records the relationship's own cardinality.
    ///
    /// The minimum is always written, the maximum only when bounded.
    pub fn set_cardinality(&mut self, cardinality: Cardinality) {
        self.set_property(Self::MIN_COUNT, cardinality.min.to_string());
        match cardinality.max {
            Some(max) => self.set_property(Self::MAX_COUNT, max.to_string()),
            None => {
                self.properties.remove(Self::MAX_COUNT);
            }
        }
    }

    /// Reads the relationship's own cardinality back, if any bound is recorded.
    ///
    /// A bound that does not parse as a count is ignored.
    pub fn cardinality(&self) -> Option<Cardinality> {
        let min = self.property(Self::MIN_COUNT).and_then(|v| v.parse().ok());
        let max = self.property(Self::MAX_COUNT).and_then(|v| v.parse().ok());
        (min.is_some() || max.is_some()).then(|| Cardinality::new(min.unwrap_or(0), max))
    }
}

/// A named and namespaced graph of schema nodes and edges.
///
/// Node identifiers are unique and every edge endpoint is a node of the same graph.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    name: String,
    namespace: String,
    nodes: Vec<SchemaNode>,
    node_index: FxHashMap<String, usize>,
    edges: Vec<SchemaEdge>,
    edge_index: FxHashMap<String, usize>,
}

impl SchemaGraph {
    /// Creates an empty graph in the default namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_namespace(name, crate::vocab::DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Adds a node, returning the node it replaces if one had the same identifier.
    pub fn add_node(&mut self, node: SchemaNode) -> Option<SchemaNode> {
        if let Some(&position) = self.node_index.get(node.id()) {
            Some(std::mem::replace(&mut self.nodes[position], node))
        } else {
            self.node_index.insert(node.id().to_owned(), self.nodes.len());
            self.nodes.push(node);
            None
        }
    }

    /// Returns the node with the given identifier, creating an empty one if needed.
    pub fn get_or_insert_node(&mut self, id: &str) -> &mut SchemaNode {
        let position = match self.node_index.get(id) {
            Some(&position) => position,
            None => {
                self.node_index.insert(id.to_owned(), self.nodes.len());
                self.nodes.push(SchemaNode::new(id));
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[position]
    }

    pub fn node(&self, id: &str) -> Option<&SchemaNode> {
        self.node_index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut SchemaNode> {
        self.node_index
            .get(id)
            .map(|&position| &mut self.nodes[position])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Returns the first node carrying `label`.
    pub fn node_by_label(&self, label: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|node| node.labels().contains(label))
    }

    /// Adds an edge, replacing the edge with the same identifier if any.
    ///
    /// Fails if the source or the target is not a node of this graph.
    pub fn add_edge(&mut self, edge: SchemaEdge) -> Result<(), GraphError> {
        for endpoint in [edge.source(), edge.target()] {
            if !self.contains_node(endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id().to_owned(),
                    endpoint: endpoint.to_owned(),
                });
            }
        }
        if let Some(&position) = self.edge_index.get(edge.id()) {
            self.edges[position] = edge;
        } else {
            self.edge_index.insert(edge.id().to_owned(), self.edges.len());
            self.edges.push(edge);
        }
        Ok(())
    }

    pub fn edge(&self, id: &str) -> Option<&SchemaEdge> {
        self.edge_index.get(id).map(|&position| &self.edges[position])
    }

    /// Returns the edges whose type is `edge_type`.
    pub fn edges_of_type<'a>(
        &'a self,
        edge_type: &'a str,
    ) -> impl Iterator<Item = &'a SchemaEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.edge_type() == edge_type)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &SchemaNode> {
        self.nodes.iter()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = &SchemaEdge> {
        self.edges.iter()
    }

    /// All the node labels of the graph.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .flat_map(|node| node.labels().iter().map(String::as_str))
            .collect()
    }

    /// All the relationship types of the graph.
    pub fn edge_types(&self) -> BTreeSet<&str> {
        self.edges.iter().map(SchemaEdge::edge_type).collect()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the graph has neither nodes nor edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
