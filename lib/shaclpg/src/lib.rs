#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod datatype;
mod error;
mod extract;
pub mod io;
mod lift;
mod lower;
mod model;
pub mod naming;
mod pipeline;
mod statement;
mod validate;
pub mod vocab;

pub use datatype::{PgDatatype, UnknownDatatype, map_datatype};
pub use error::{GraphError, LoadError, Stage, StageError, TransformError, WriteError};
pub use extract::{ExtractOptions, ShapeExtractor, extract_statements};
pub use lift::{RdfLifting, lift_to_rdf, raise_to_statements};
pub use lower::{
    CompatShims, EdgePropertyPrecedence, LoweringOptions, PgLowering, RelationshipTypeStyle,
    lower_to_pg,
};
pub use model::{Cardinality, PropertyConstraint, SchemaEdge, SchemaGraph, SchemaNode};
pub use pipeline::{PipelineOptions, PipelineOutput, SchemaPipeline};
pub use statement::{
    EdgeFact, Fact, PropertyFact, PropertyScope, PropertySpec, StatementGraph, TypeFact,
};
pub use validate::{
    Instance, ValidationReport, Violation, ViolationKind, validate_graph, validate_instance,
    validate_instances,
};
