//! Graphviz DOT rendering of a property graph schema.

use crate::io::cypher::PALETTE;
use crate::model::{PropertyConstraint, SchemaGraph};
use std::fmt;

/// Renders the schema as a left-to-right digraph, one HTML table per node.
///
/// ```
/// use shaclpg::SchemaGraph;
/// use shaclpg::io::dot::render;
///
/// let mut graph = SchemaGraph::new("pgschema");
/// graph.get_or_insert_node("Person").add_label("Person");
/// let dot = render(&graph);
/// assert!(dot.starts_with("digraph \"pgschema\" {"));
/// assert!(dot.contains("<B>Person</B>"));
/// ```
pub fn render(graph: &SchemaGraph) -> String {
    DotGraph::new(graph).to_string()
}

/// A [`Display`](fmt::Display)able DOT graph.
#[derive(Debug, Clone, Copy)]
pub struct DotGraph<'a> {
    graph: &'a SchemaGraph,
}

impl<'a> DotGraph<'a> {
    pub fn new(graph: &'a SchemaGraph) -> Self {
        Self { graph }
    }
}

impl fmt::Display for DotGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph \"{}\" {{", escape_quoted(self.graph.name()))?;
        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [shape=none, fontname=\"Helvetica\"];")?;
        writeln!(f, "  edge [fontname=\"Helvetica\", fontsize=10];")?;
        for (i, node) in self.graph.nodes().enumerate() {
            let title = node.first_label().unwrap_or(node.id());
            write!(
                f,
                "  \"{}\" [label=<<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\">\
                 <TR><TD COLSPAN=\"2\" BGCOLOR=\"{}\"><B>{}</B></TD></TR>",
                escape_quoted(node.id()),
                PALETTE[i % PALETTE.len()],
                escape_html(title)
            )?;
            for constraint in node.property_constraints().values() {
                write_property_row(f, constraint)?;
            }
            writeln!(f, "</TABLE>>];")?;
        }
        for edge in self.graph.edges() {
            let cardinality = edge.cardinality().unwrap_or_default();
            write!(
                f,
                "  \"{}\" -> \"{}\" [label=\"{} {cardinality}",
                escape_quoted(edge.source()),
                escape_quoted(edge.target()),
                escape_quoted(edge.edge_type()),
            )?;
            for constraint in edge.property_constraints().values() {
                write!(
                    f,
                    "\\n{}: {} {}",
                    escape_quoted(&constraint.name),
                    constraint.datatype,
                    constraint.cardinality()
                )?;
            }
            writeln!(f, "\"];")?;
        }
        writeln!(f, "}}")
    }
}

fn write_property_row(f: &mut fmt::Formatter<'_>, constraint: &PropertyConstraint) -> fmt::Result {
    write!(
        f,
        "<TR><TD ALIGN=\"LEFT\">{}</TD><TD ALIGN=\"LEFT\">{} {}</TD></TR>",
        escape_html(&constraint.name),
        constraint.datatype,
        constraint.cardinality()
    )
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
