//! Checks instance property values against the constraints of a property graph schema.
//!
//! Only presence and cardinality are checked. The count of a value is the length of a
//! JSON array and 1 for any other non-null value.

use crate::model::{SchemaGraph, SchemaNode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The kind of a [`Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A required property has no value.
    MissingRequired,
    /// Fewer values than the minimum count.
    TooFew { count: u64, min: u64 },
    /// More values than the maximum count.
    TooMany { count: u64, max: u64 },
    /// No node of the schema carries the instance label.
    UnknownLabel,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired => f.write_str("required property is missing"),
            Self::TooFew { count, min } => write!(f, "{count} values, at least {min} expected"),
            Self::TooMany { count, max } => write!(f, "{count} values, at most {max} expected"),
            Self::UnknownLabel => f.write_str("no node has this label"),
        }
    }
}

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Identifier of the node, or label of the instance, that was validated.
    pub node: String,
    /// The property at fault, if the violation is about a property.
    pub property: Option<String>,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) => write!(f, "{}.{property}: {}", self.node, self.kind),
            None => write!(f, "{}: {}", self.node, self.kind),
        }
    }
}

/// The outcome of a validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing was violated.
    pub fn conforms(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Merges another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.violations.extend(other.violations);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conforms() {
            return f.write_str("Conforms");
        }
        writeln!(f, "{} violation(s):", self.violations.len())?;
        for violation in &self.violations {
            writeln!(f, "  {violation}")?;
        }
        Ok(())
    }
}

/// An instance to validate, identified by the label of its node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Instance {
    pub label: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// Validates property values against the constraints of `node`.
///
/// ```
/// use serde_json::json;
/// use shaclpg::{Cardinality, PgDatatype, PropertyConstraint, SchemaNode, validate_instance};
/// use std::collections::BTreeMap;
///
/// let mut person = SchemaNode::new("Person");
/// person.add_property_constraint(
///     PropertyConstraint::new("givenName", PgDatatype::String)
///         .with_cardinality(Cardinality::new(1, Some(1))),
/// );
///
/// let valid = BTreeMap::from([("givenName".to_owned(), json!("Alice"))]);
/// assert!(validate_instance(&person, &valid).conforms());
/// assert!(!validate_instance(&person, &BTreeMap::new()).conforms());
/// ```
pub fn validate_instance(
    node: &SchemaNode,
    properties: &BTreeMap<String, Value>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    for constraint in node.property_constraints().values() {
        let violation = |kind| Violation {
            node: node.id().to_owned(),
            property: Some(constraint.name.clone()),
            kind,
        };
        let Some(count) = properties.get(&constraint.name).and_then(value_count) else {
            if constraint.is_required() {
                report.add_violation(violation(ViolationKind::MissingRequired));
            }
            continue;
        };
        if count < constraint.min_cardinality {
            report.add_violation(violation(ViolationKind::TooFew {
                count,
                min: constraint.min_cardinality,
            }));
        }
        if let Some(max) = constraint.max_cardinality.filter(|max| count > *max) {
            report.add_violation(violation(ViolationKind::TooMany { count, max }));
        }
    }
    report
}

/// Validates every node against its own property values.
pub fn validate_graph(graph: &SchemaGraph) -> ValidationReport {
    let mut report = ValidationReport::new();
    for node in graph.nodes() {
        report.merge(validate_instance(node, node.properties()));
    }
    report
}

/// Validates instances against the node carrying their label.
pub fn validate_instances(graph: &SchemaGraph, instances: &[Instance]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for instance in instances {
        match graph.node_by_label(&instance.label) {
            Some(node) => report.merge(validate_instance(node, &instance.properties)),
            None => report.add_violation(Violation {
                node: instance.label.clone(),
                property: None,
                kind: ViolationKind::UnknownLabel,
            }),
        }
    }
    report
}

fn value_count(value: &Value) -> Option<u64> {
    match value {
        Value::Null => None,
        Value::Array(values) => u64::try_from(values.len()).ok(),
        _ => Some(1),
    }
}
