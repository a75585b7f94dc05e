//! Reading and writing schemas.
//!
//! - [`turtle`] loads and writes SHACL graphs.
//! - [`json`] is the serialized form of a property graph schema.
//! - [`cypher`] renders a script creating the schema in a graph database.
//! - [`dot`] renders a Graphviz diagram of the schema.

pub mod cypher;
pub mod dot;
pub mod json;
pub mod turtle;
