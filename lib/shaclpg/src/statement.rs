//! The statement graph, the representation shared by every transformer.
//!
//! Shapes are first flattened into [`Fact`]s: one per class, one per scalar property
//! and one per relationship. Each pass of a transformer only iterates the kind of fact it owns.

use crate::model::Cardinality;
use crate::naming::local_name;
use oxrdf::NamedNode;
use rustc_hash::FxHashMap;
use std::fmt;

/// States that the `subject` identifier stands for the instances of the class `object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeFact {
    pub subject: String,
    pub object: NamedNode,
}

/// A datatype-valued property with its cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertySpec {
    pub predicate: NamedNode,
    pub datatype: NamedNode,
    pub cardinality: Cardinality,
}

impl PropertySpec {
    pub fn new(predicate: NamedNode, datatype: NamedNode, cardinality: Cardinality) -> Self {
        Self {
            predicate,
            datatype,
            cardinality,
        }
    }

    /// The property name, the local name of the predicate.
    pub fn name(&self) -> &str {
        local_name(self.predicate.as_str())
    }
}

/// What a [`PropertyFact`] is a property of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PropertyScope {
    /// A property of the subject itself.
    #[default]
    Node,
    /// A copy of a property of the subject's relationship with the given predicate.
    Relationship(NamedNode),
}

/// States that instances of `subject` carry `property`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyFact {
    pub subject: String,
    pub property: PropertySpec,
    pub scope: PropertyScope,
}

impl PropertyFact {
    pub fn new(subject: impl Into<String>, property: PropertySpec) -> Self {
        Self {
            subject: subject.into(),
            property,
            scope: PropertyScope::Node,
        }
    }

    /// A copy of the relationship property `property` on the relationship's source.
    pub fn mirror(
        subject: impl Into<String>,
        relationship: NamedNode,
        property: PropertySpec,
    ) -> Self {
        Self {
            subject: subject.into(),
            property,
            scope: PropertyScope::Relationship(relationship),
        }
    }

    /// The property name.
    ///
    /// Mirrored relationship properties get the compound name `{relationship}_{property}`.
    pub fn name(&self) -> String {
        match &self.scope {
            PropertyScope::Node => self.property.name().to_owned(),
            PropertyScope::Relationship(relationship) => {
                format!(
                    "{}_{}",
                    local_name(relationship.as_str()),
                    self.property.name()
                )
            }
        }
    }

    #[inline]
    pub fn is_mirror(&self) -> bool {
        matches!(self.scope, PropertyScope::Relationship(_))
    }
}

/// States that instances of `subject` are linked by `predicate` to instances of `object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeFact {
    pub subject: String,
    pub predicate: NamedNode,
    /// Identifier of the target, the local name of `class`.
    pub object: String,
    pub class: NamedNode,
    pub cardinality: Cardinality,
    /// Properties of the relationship itself.
    pub nested_properties: Vec<PropertySpec>,
}

impl EdgeFact {
    pub fn new(
        subject: impl Into<String>,
        predicate: NamedNode,
        class: NamedNode,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: local_name(class.as_str()).to_owned(),
            predicate,
            class,
            cardinality,
            nested_properties: Vec::new(),
        }
    }

    /// The relationship name, the local name of the predicate.
    pub fn name(&self) -> &str {
        local_name(self.predicate.as_str())
    }
}

/// A single statement of a [`StatementGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fact {
    Type(TypeFact),
    Property(PropertyFact),
    Edge(EdgeFact),
}

impl Fact {
    /// The synthetic identifier of the statement.
    ///
    /// Two facts with the same identifier describe the same thing: the later one replaces the earlier.
    pub fn id(&self) -> String {
        match self {
            Self::Type(fact) => format!("type:{}", fact.subject),
            Self::Property(fact) => format!("property:{}:{}", fact.subject, fact.name()),
            Self::Edge(fact) => format!("edge:{}:{}:{}", fact.subject, fact.name(), fact.object),
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Self::Type(fact) => &fact.subject,
            Self::Property(fact) => &fact.subject,
            Self::Edge(fact) => &fact.subject,
        }
    }
}

impl From<TypeFact> for Fact {
    #[inline]
    fn from(fact: TypeFact) -> Self {
        Self::Type(fact)
    }
}

impl From<PropertyFact> for Fact {
    #[inline]
    fn from(fact: PropertyFact) -> Self {
        Self::Property(fact)
    }
}

impl From<EdgeFact> for Fact {
    #[inline]
    fn from(fact: EdgeFact) -> Self {
        Self::Edge(fact)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(fact) => write!(f, "{} a {}", fact.subject, fact.object),
            Self::Property(fact) => write!(
                f,
                "{} {} {} {}",
                fact.subject,
                fact.name(),
                fact.property.datatype,
                fact.property.cardinality
            ),
            Self::Edge(fact) => write!(
                f,
                "{} {} {} {}",
                fact.subject,
                fact.predicate,
                fact.class,
                fact.cardinality
            ),
        }
    }
}

/// An ordered and indexed set of [`Fact`]s.
#[derive(Debug, Clone, Default)]
pub struct StatementGraph {
    name: String,
    namespace: String,
    statements: Vec<Fact>,
    index: FxHashMap<String, usize>,
}

impl StatementGraph {
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

    /// The namespace new IRIs are minted in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Inserts a statement, returning the statement with the same identifier it replaces.
    pub fn insert(&mut self, statement: impl Into<Fact>) -> Option<Fact> {
        let statement = statement.into();
        let id = statement.id();
        if let Some(&position) = self.index.get(&id) {
            Some(std::mem::replace(&mut self.statements[position], statement))
        } else {
            self.index.insert(id, self.statements.len());
            self.statements.push(statement);
            None
        }
    }

    pub fn get(&self, id: &str) -> Option<&Fact> {
        self.index.get(id).map(|&position| &self.statements[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Statements in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Fact> {
        self.statements.iter()
    }

    pub fn type_facts(&self) -> impl Iterator<Item = &TypeFact> {
        self.statements.iter().filter_map(|statement| match statement {
            Fact::Type(fact) => Some(fact),
            _ => None,
        })
    }

    pub fn property_facts(&self) -> impl Iterator<Item = &PropertyFact> {
        self.statements.iter().filter_map(|statement| match statement {
            Fact::Property(fact) => Some(fact),
            _ => None,
        })
    }

    pub fn edge_facts(&self) -> impl Iterator<Item = &EdgeFact> {
        self.statements.iter().filter_map(|statement| match statement {
            Fact::Edge(fact) => Some(fact),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl<'a> IntoIterator for &'a StatementGraph {
    type Item = &'a Fact;
    type IntoIter = std::slice::Iter<'a, Fact>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
