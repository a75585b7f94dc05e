//! JSON form of a property graph schema.
//!
//! ```json
//! {
//!   "nodes": [{"label": "Person", "properties": {"givenName": {"type": "String", "minCount": 1}}}],
//!   "relationships": [
//!     {"type": "MEMBER_OF", "source": "Person", "target": "Organization", "properties": {}, "minCount": "0"}
//!   ]
//! }
//! ```

use crate::error::WriteError;
use crate::model::{PropertyConstraint, SchemaEdge, SchemaGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

/// A property graph schema as written to and read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgSchemaDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub label: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDocument {
    #[serde(rename = "type", default = "default_type")]
    pub datatype: String,
    /// Only written when positive.
    #[serde(rename = "minCount", default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u64>,
    /// Only written when bounded.
    #[serde(rename = "maxCount", default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u64>,
}

/// A relationship. Its own counts are strings, as stored in the edge property bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDocument {
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// Label of the source node.
    pub source: String,
    /// Label of the target node.
    pub target: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDocument>,
    #[serde(rename = "minCount", default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<String>,
    #[serde(rename = "maxCount", default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<String>,
}

fn default_type() -> String {
    "String".into()
}

impl PgSchemaDocument {
    /// Builds the document of a schema graph.
    ///
    /// Nodes without label are left out. Relationship endpoints are written as node labels.
    pub fn from_graph(graph: &SchemaGraph) -> Self {
        let nodes = graph
            .nodes()
            .filter_map(|node| {
                Some(NodeDocument {
                    label: node.first_label()?.to_owned(),
                    properties: property_documents(node.property_constraints()),
                })
            })
            .collect();
        let endpoint = |id: &str| {
            graph
                .node(id)
                .and_then(|node| node.first_label())
                .unwrap_or(id)
                .to_owned()
        };
        let relationships = graph
            .edges()
            .map(|edge| RelationshipDocument {
                relationship_type: edge.edge_type().to_owned(),
                source: endpoint(edge.source()),
                target: endpoint(edge.target()),
                properties: property_documents(edge.property_constraints()),
                min_count: edge.property(SchemaEdge::MIN_COUNT).map(str::to_owned),
                max_count: edge.property(SchemaEdge::MAX_COUNT).map(str::to_owned),
            })
            .collect();
        Self {
            nodes,
            relationships,
        }
    }

    pub fn to_string_pretty(&self) -> Result<String, WriteError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), WriteError> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    /// Returns the document of the node labeled `label`.
    pub fn node(&self, label: &str) -> Option<&NodeDocument> {
        self.nodes.iter().find(|node| node.label == label)
    }
}

impl FromStr for PgSchemaDocument {
    type Err = serde_json::Error;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(json)
    }
}

impl From<&SchemaGraph> for PgSchemaDocument {
    fn from(graph: &SchemaGraph) -> Self {
        Self::from_graph(graph)
    }
}

fn property_documents(
    constraints: &BTreeMap<String, PropertyConstraint>,
) -> BTreeMap<String, PropertyDocument> {
    constraints
        .iter()
        .map(|(name, constraint)| {
            (
                name.clone(),
                PropertyDocument {
                    datatype: constraint.datatype.to_string(),
                    min_count: Some(constraint.min_cardinality).filter(|min| *min > 0),
                    max_count: constraint.max_cardinality,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::PgDatatype;
    use crate::model::Cardinality;
    use serde_json::{Value, json};

    fn person_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::new("pgschema");
        let person = graph.get_or_insert_node("Person");
        person.add_label("Person");
        person.add_property_constraint(
            PropertyConstraint::new("givenName", PgDatatype::String)
                .with_cardinality(Cardinality::new(1, None)),
        );
        person.add_property_constraint(
            PropertyConstraint::new("height", PgDatatype::Float)
                .with_cardinality(Cardinality::new(0, Some(1))),
        );
        graph
            .get_or_insert_node("Organization")
            .add_label("Organization");
        let mut edge = SchemaEdge::new(
            "Person_memberOf_Organization",
            "Person",
            "Organization",
            "MEMBER_OF",
        );
        edge.add_property_constraint(
            PropertyConstraint::new("role", PgDatatype::String)
                .with_cardinality(Cardinality::new(1, None)),
        );
        edge.set_cardinality(Cardinality::default());
        graph.add_edge(edge).unwrap();
        graph
    }

    #[test]
    fn document_shape() {
        let document = PgSchemaDocument::from_graph(&person_graph());
        let value: Value = serde_json::from_str(&document.to_string_pretty().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "nodes": [
                    {
                        "label": "Person",
                        "properties": {
                            "givenName": {"type": "String", "minCount": 1},
                            "height": {"type": "Float", "maxCount": 1}
                        }
                    },
                    {"label": "Organization", "properties": {}}
                ],
                "relationships": [
                    {
                        "type": "MEMBER_OF",
                        "source": "Person",
                        "target": "Organization",
                        "properties": {"role": {"type": "String", "minCount": 1}},
                        "minCount": "0"
                    }
                ]
            })
        );
    }

    #[test]
    fn unlabeled_nodes_are_left_out() {
        let mut graph = SchemaGraph::new("pgschema");
        graph.get_or_insert_node("anonymous");
        assert!(PgSchemaDocument::from_graph(&graph).nodes.is_empty());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let document: PgSchemaDocument = r#"{"nodes": [{"label": "Thing", "properties": {"name": {}}}]}"#
            .parse()
            .unwrap();
        assert!(document.relationships.is_empty());
        let Some(name) = document.node("Thing").and_then(|node| node.properties.get("name")) else {
            panic!("Thing.name should be parsed")
        };
        assert_eq!(name.datatype, "String");
        assert_eq!(name.min_count, None);
    }
}
