//! The mapping between XSD datatypes and property graph value types.
//!
//! [`map_datatype`] is the single table every stage and every writer goes through.

use oxrdf::NamedNodeRef;
use oxrdf::vocab::xsd;
use std::fmt;
use std::str::FromStr;

/// A property graph value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum PgDatatype {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl PgDatatype {
    /// All the value types, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Date,
        Self::DateTime,
    ];

    /// The name used in JSON schemas and Cypher scripts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
        }
    }

    /// The XSD datatype this value type is lifted to.
    ///
    /// `Float` is lifted to `xsd:double`, the wider of the two types mapped to it.
    pub const fn xsd_iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::String => xsd::STRING,
            Self::Integer => xsd::INTEGER,
            Self::Float => xsd::DOUBLE,
            Self::Boolean => xsd::BOOLEAN,
            Self::Date => xsd::DATE,
            Self::DateTime => xsd::DATE_TIME,
        }
    }
}

impl fmt::Display for PgDatatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PgDatatype {
    type Err = UnknownDatatype;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| UnknownDatatype(name.into()))
    }
}

/// A value type name that is not one of the [`PgDatatype`] names.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown property graph datatype '{0}'")]
pub struct UnknownDatatype(String);

/// Maps an XSD datatype IRI to its property graph value type.
///
/// Never fails: any IRI outside the table maps to [`PgDatatype::String`].
///
/// ```
/// use oxrdf::vocab::xsd;
/// use shaclpg::{PgDatatype, map_datatype};
///
/// assert_eq!(map_datatype(xsd::INT.as_str()), PgDatatype::Integer);
/// assert_eq!(map_datatype("http://example.com/custom"), PgDatatype::String);
/// ```
pub fn map_datatype(iri: &str) -> PgDatatype {
    const TABLE: [(NamedNodeRef<'static>, PgDatatype); 8] = [
        (xsd::STRING, PgDatatype::String),
        (xsd::INTEGER, PgDatatype::Integer),
        (xsd::INT, PgDatatype::Integer),
        (xsd::FLOAT, PgDatatype::Float),
        (xsd::DOUBLE, PgDatatype::Float),
        (xsd::BOOLEAN, PgDatatype::Boolean),
        (xsd::DATE, PgDatatype::Date),
        (xsd::DATE_TIME, PgDatatype::DateTime),
    ];
    TABLE
        .iter()
        .find(|(xsd_iri, _)| xsd_iri.as_str() == iri)
        .map_or(PgDatatype::String, |(_, pg_type)| *pg_type)
}
