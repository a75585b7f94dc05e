//! Error types of the schema transformers.
//!
//! Malformed or unsupported shapes are not errors: they are dropped with a diagnostic.
//! Only structural violations, I/O failures and empty stage outputs are reported here.

use std::fmt;
use std::io;

/// A violation of the [`SchemaGraph`](crate::SchemaGraph) invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GraphError {
    /// An edge endpoint is not a node of the graph.
    #[error("Edge {edge} refers to the unknown node {endpoint}")]
    DanglingEdge { edge: String, endpoint: String },
}

/// Error returned while loading an RDF graph.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] oxrdfio::RdfParseError),
    /// The base IRI given to the parser is not a valid IRI.
    #[error("Invalid base IRI '{iri}': {message}")]
    InvalidBaseIri { iri: String, message: String },
}

/// Error returned while writing a schema.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WriteError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A namespace declared as a prefix is not a valid IRI.
    #[error(transparent)]
    Prefix(#[from] oxrdf::IriParseError),
}

/// A stage of the [`SchemaPipeline`](crate::SchemaPipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Lower,
    Lift,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Lower => "lower",
            Self::Lift => "lift",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reason a pipeline stage failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StageError {
    /// The stage produced nothing.
    #[error("the stage produced an empty graph")]
    EmptyGraph,
}

/// A pipeline run that aborted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Transforming {input} failed at the {stage} stage: {source}")]
pub struct TransformError {
    /// Name of the input being transformed.
    pub input: String,
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl TransformError {
    pub(crate) fn new(
        input: impl Into<String>,
        stage: Stage,
        source: impl Into<StageError>,
    ) -> Self {
        Self {
            input: input.into(),
            stage,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_names_input_and_stage() {
        let error = TransformError::new("person.ttl", Stage::Lower, StageError::EmptyGraph);
        assert_eq!(
            error.to_string(),
            "Transforming person.ttl failed at the lower stage: the stage produced an empty graph"
        );
    }

    #[test]
    fn transform_error_exposes_the_stage_error_as_source() {
        let error = TransformError::new("person.ttl", Stage::Extract, StageError::EmptyGraph);
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("the stage produced an empty graph"));
    }
}
