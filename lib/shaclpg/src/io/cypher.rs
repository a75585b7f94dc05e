//! Cypher script rendering of a property graph schema, for inspection in a graph database browser.
//!
//! Each label becomes one node whose properties are the declared types, and each distinct
//! `source-type-target` triple one relationship between those nodes.

use crate::io::json::{PgSchemaDocument, PropertyDocument};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::fmt;

/// Node colours, assigned in label order and cycled.
pub const PALETTE: [&str; 10] = [
    "#FF5733", "#33A1FF", "#33FF57", "#9133FF", "#FFDD33", "#FF33A1", "#33FFDD", "#A1FF33",
    "#FF8333", "#8333FF",
];

/// Property names the generated nodes already use.
const RESERVED_PROPERTIES: [&str; 4] = ["id", "name", "label", "displayName"];

/// Renders the Cypher script creating the schema.
///
/// ```
/// use shaclpg::io::cypher::generate;
/// use shaclpg::io::json::PgSchemaDocument;
///
/// let document: PgSchemaDocument = r#"{"nodes": [{"label": "Person"}]}"#.parse()?;
/// assert!(generate(&document).contains("CREATE (person:Person {name: 'Person'"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn generate(document: &PgSchemaDocument) -> String {
    CypherScript::new(document).to_string()
}

/// A [`Display`](fmt::Display)able Cypher script.
#[derive(Debug, Clone, Copy)]
pub struct CypherScript<'a> {
    document: &'a PgSchemaDocument,
}

impl<'a> CypherScript<'a> {
    pub fn new(document: &'a PgSchemaDocument) -> Self {
        Self { document }
    }

    fn write_nodes(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> Result<FxHashSet<&'a str>, fmt::Error> {
        let mut labels = FxHashSet::default();
        if self.document.nodes.is_empty() {
            writeln!(f, "// No nodes found in schema")?;
            return Ok(labels);
        }
        for node in &self.document.nodes {
            if !labels.insert(node.label.as_str()) {
                continue;
            }
            let name = escape_string(&node.label);
            write!(
                f,
                "CREATE ({}:{} {{name: '{name}', displayName: '{name}', label: '{name}', color: '{}'",
                variable_name(&node.label),
                escape_identifier(&node.label),
                PALETTE[(labels.len() - 1) % PALETTE.len()]
            )?;
            write_types(f, &node.properties, true)?;
            writeln!(f, "}});")?;
        }
        Ok(labels)
    }

    fn write_relationships(
        &self,
        f: &mut fmt::Formatter<'_>,
        labels: &FxHashSet<&str>,
    ) -> fmt::Result {
        if self.document.relationships.is_empty() {
            return writeln!(f, "// No relationships found in schema");
        }
        let mut seen = FxHashSet::default();
        for relationship in &self.document.relationships {
            let (source, relationship_type, target) = (
                relationship.source.as_str(),
                relationship.relationship_type.as_str(),
                relationship.target.as_str(),
            );
            if !seen.insert((source, relationship_type, target)) {
                continue;
            }
            if !labels.contains(source) || !labels.contains(target) {
                writeln!(
                    f,
                    "// Skipping relationship {relationship_type} from {source} to {target} - one or both labels not found in schema"
                )?;
                continue;
            }
            write!(
                f,
                "MATCH (a:{}), (b:{}) CREATE (a)-[r:{} {{name: '{}'",
                escape_identifier(source),
                escape_identifier(target),
                sanitize_type(relationship_type),
                escape_string(relationship_type)
            )?;
            write_types(f, &relationship.properties, false)?;
            writeln!(f, "}}]->(b);")?;
        }
        Ok(())
    }
}

impl fmt::Display for CypherScript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// Uncomment to clear the database before import")?;
        writeln!(f, "// MATCH (n) DETACH DELETE n;")?;
        writeln!(f)?;
        writeln!(f, "// Create nodes")?;
        let labels = self.write_nodes(f)?;
        writeln!(f)?;
        writeln!(f, "// Create relationships")?;
        self.write_relationships(f, &labels)
    }
}

fn write_types(
    f: &mut fmt::Formatter<'_>,
    properties: &BTreeMap<String, PropertyDocument>,
    skip_reserved: bool,
) -> fmt::Result {
    for (name, property) in properties {
        if skip_reserved && (name.starts_with('_') || RESERVED_PROPERTIES.contains(&name.as_str()))
        {
            continue;
        }
        write!(
            f,
            ", {}: '{}'",
            escape_identifier(name),
            escape_string(&property.datatype)
        )?;
    }
    Ok(())
}

/// Lower-cased alphanumeric form of a label, never starting with a digit.
fn variable_name(label: &str) -> String {
    let name: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        format!("n_{name}")
    } else {
        name
    }
}

fn sanitize_type(relationship_type: &str) -> String {
    relationship_type
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Backquotes identifiers that are not plain alphanumeric names.
fn escape_identifier(identifier: &str) -> String {
    if !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !identifier.starts_with(|c: char| c.is_ascii_digit())
    {
        identifier.to_owned()
    } else {
        format!("`{}`", identifier.replace('`', "``"))
    }
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> PgSchemaDocument {
        json.parse().unwrap()
    }

    #[test]
    fn one_node_per_label_with_cycled_colours() {
        let labels: Vec<String> = (0..11).map(|i| format!(r#"{{"label": "L{i}"}}"#)).collect();
        let script = generate(&document(&format!(
            r#"{{"nodes": [{}, {{"label": "L0"}}]}}"#,
            labels.join(",")
        )));
        assert_eq!(script.matches("CREATE (l0:L0").count(), 1);
        assert!(script.contains(
            "CREATE (l0:L0 {name: 'L0', displayName: 'L0', label: 'L0', color: '#FF5733'});"
        ));
        assert!(script.contains(
            "CREATE (l10:L10 {name: 'L10', displayName: 'L10', label: 'L10', color: '#FF5733'});"
        ));
        assert!(script.contains("// No relationships found in schema"));
    }

    #[test]
    fn node_properties_are_typed_and_reserved_names_skipped() {
        let script = generate(&document(
            r#"{"nodes": [{"label": "Person", "properties": {
                "givenName": {"type": "String", "minCount": 1},
                "name": {"type": "String"},
                "_internal": {"type": "Integer"}
            }}]}"#,
        ));
        assert!(script.contains("color: '#FF5733', givenName: 'String'});"));
        assert!(!script.contains("_internal"));
    }

    #[test]
    fn relationships_are_deduplicated_and_checked() {
        let script = generate(&document(
            r#"{
                "nodes": [{"label": "Person"}, {"label": "Organization"}],
                "relationships": [
                    {"type": "MEMBER_OF", "source": "Person", "target": "Organization",
                     "properties": {"role": {"type": "String", "minCount": 1}}, "minCount": "0"},
                    {"type": "MEMBER_OF", "source": "Person", "target": "Organization"},
                    {"type": "WORKS_FOR", "source": "Person", "target": "Company"}
                ]
            }"#,
        ));
        assert_eq!(
            script.matches("MATCH (a:Person), (b:Organization) CREATE (a)-[r:MEMBER_OF {name: 'MEMBER_OF', role: 'String'}]->(b);").count(),
            1
        );
        assert!(script.contains(
            "// Skipping relationship WORKS_FOR from Person to Company - one or both labels not found in schema"
        ));
    }

    #[test]
    fn identifiers_are_sanitized() {
        assert_eq!(variable_name("3D Model"), "n_3d_model");
        assert_eq!(escape_identifier("Web Page"), "`Web Page`");
        assert_eq!(escape_string("O'Brien"), "O\\'Brien");
        assert_eq!(sanitize_type("has-part"), "HAS_PART");
    }
}
