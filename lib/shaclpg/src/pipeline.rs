//! Runs the three transformers in sequence.

use crate::error::{Stage, StageError, TransformError};
use crate::extract::{ExtractOptions, ShapeExtractor};
use crate::lift::RdfLifting;
use crate::lower::{LoweringOptions, PgLowering};
use crate::model::SchemaGraph;
use crate::statement::StatementGraph;
use oxrdf::Graph;
use std::time::Instant;
use tracing::info;

/// Options of every stage of a [`SchemaPipeline`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub extract: ExtractOptions,
    pub lowering: LoweringOptions,
}

/// Everything a pipeline run produces.
#[derive(Debug)]
pub struct PipelineOutput {
    pub statements: StatementGraph,
    pub pg_schema: SchemaGraph,
    /// The statements lifted back into SHACL shapes.
    pub shacl: Graph,
}

/// Extracts statements from SHACL shapes, lowers them into a property graph schema and
/// lifts them back into SHACL.
///
/// A stage that produces an empty graph aborts the run.
///
/// ```
/// use oxrdf::Graph;
/// use shaclpg::{SchemaPipeline, Stage};
///
/// let error = SchemaPipeline::default().run("empty.ttl", &Graph::new()).unwrap_err();
/// assert_eq!(error.stage, Stage::Extract);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaPipeline {
    extractor: ShapeExtractor,
    lowering: PgLowering,
    lifting: RdfLifting,
}

impl SchemaPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            extractor: ShapeExtractor::new(options.extract),
            lowering: PgLowering::new(options.lowering),
            lifting: RdfLifting::new(),
        }
    }

    /// Transforms `shapes`. `input` names the source in errors and logs.
    pub fn run(&self, input: &str, shapes: &Graph) -> Result<PipelineOutput, TransformError> {
        let start = Instant::now();
        let statements = self.extractor.extract(shapes);
        info!(
            input,
            statements = statements.len(),
            elapsed = ?start.elapsed(),
            "Extracted statements"
        );
        ensure_not_empty(input, Stage::Extract, statements.is_empty())?;

        let start = Instant::now();
        let pg_schema = self.lowering.lower(&statements);
        info!(
            input,
            nodes = pg_schema.node_count(),
            edges = pg_schema.edge_count(),
            elapsed = ?start.elapsed(),
            "Lowered to a property graph schema"
        );
        ensure_not_empty(input, Stage::Lower, pg_schema.is_empty())?;

        let start = Instant::now();
        let shacl = self.lifting.lift(&statements);
        info!(
            input,
            triples = shacl.len(),
            elapsed = ?start.elapsed(),
            "Lifted to SHACL"
        );
        ensure_not_empty(input, Stage::Lift, shacl.is_empty())?;

        Ok(PipelineOutput {
            statements,
            pg_schema,
            shacl,
        })
    }
}

fn ensure_not_empty(input: &str, stage: Stage, is_empty: bool) -> Result<(), TransformError> {
    if is_empty {
        Err(TransformError::new(input, stage, StageError::EmptyGraph))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::sh;
    use oxrdf::vocab::rdf;
    use oxrdf::{NamedNodeRef, TripleRef};

    #[test]
    fn a_shape_goes_through_every_stage() {
        let shape = NamedNodeRef::new_unchecked("http://schema.org/PersonShape");
        let mut graph = Graph::new();
        graph.insert(TripleRef::new(shape, rdf::TYPE, sh::NODE_SHAPE));
        graph.insert(TripleRef::new(
            shape,
            sh::TARGET_CLASS,
            NamedNodeRef::new_unchecked("http://schema.org/Person"),
        ));

        let output = SchemaPipeline::default().run("person", &graph).unwrap();
        assert_eq!(output.statements.len(), 1);
        assert_eq!(output.pg_schema.node_count(), 1);
        assert_eq!(output.shacl.len(), 2);
    }

    #[test]
    fn shapes_without_targets_abort_extraction() {
        let mut graph = Graph::new();
        graph.insert(TripleRef::new(
            NamedNodeRef::new_unchecked("http://schema.org/OrphanShape"),
            rdf::TYPE,
            sh::NODE_SHAPE,
        ));
        let error = SchemaPipeline::default().run("orphan", &graph).unwrap_err();
        assert_eq!(error.input, "orphan");
        assert_eq!(error.stage, Stage::Extract);
        assert_eq!(error.source, StageError::EmptyGraph);
    }
}
