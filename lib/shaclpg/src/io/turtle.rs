//! Turtle loading and writing of SHACL graphs.

use crate::error::{LoadError, WriteError};
use crate::vocab::{DEFAULT_NAMESPACE, sh};
use oxrdf::{Graph, TripleRef};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use std::io::{Read, Write};

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// Parses a Turtle document into a graph.
///
/// ```
/// use shaclpg::io::turtle::load_graph;
///
/// let graph = load_graph(
///     "<PersonShape> a <http://www.w3.org/ns/shacl#NodeShape> .".as_bytes(),
///     Some("http://schema.org/"),
/// )?;
/// assert_eq!(graph.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn load_graph(reader: impl Read, base_iri: Option<&str>) -> Result<Graph, LoadError> {
    let mut parser = RdfParser::from_format(RdfFormat::Turtle);
    if let Some(base_iri) = base_iri {
        parser = parser
            .with_base_iri(base_iri)
            .map_err(|e| LoadError::InvalidBaseIri {
                iri: base_iri.into(),
                message: e.to_string(),
            })?;
    }
    let mut graph = Graph::new();
    for quad in parser.for_reader(reader) {
        let quad = quad?;
        graph.insert(TripleRef::new(&quad.subject, &quad.predicate, &quad.object));
    }
    Ok(graph)
}

/// Writes a graph as Turtle, using the `sh`, `rdf` and `xsd` prefixes and a prefix for `namespace`.
///
/// Returns the writer.
pub fn write_graph<W: Write>(graph: &Graph, writer: W, namespace: &str) -> Result<W, WriteError> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle)
        .with_prefix("sh", sh::NAMESPACE)?
        .with_prefix("rdf", RDF_NAMESPACE)?
        .with_prefix("xsd", XSD_NAMESPACE)?;
    if !namespace.is_empty() {
        let prefix = if namespace == DEFAULT_NAMESPACE {
            "schema"
        } else {
            "ns"
        };
        serializer = serializer.with_prefix(prefix, namespace)?;
    }
    let mut serializer = serializer.for_writer(writer);
    for triple in graph {
        serializer.serialize_triple(triple)?;
    }
    Ok(serializer.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    const PERSON: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix schema: <http://schema.org/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        schema:PersonShape a sh:NodeShape ;
            sh:targetClass schema:Person ;
            sh:property [ sh:path schema:givenName ; sh:datatype xsd:string ; sh:minCount 1 ] .
    "#;

    #[test]
    fn loads_and_writes_turtle() {
        let graph = load_graph(PERSON.as_bytes(), None).unwrap();
        assert_eq!(graph.len(), 6);

        let written = write_graph(&graph, Vec::new(), DEFAULT_NAMESPACE).unwrap();
        let written = String::from_utf8(written).unwrap();
        assert!(written.contains("@prefix sh: <http://www.w3.org/ns/shacl#> ."));
        assert!(written.contains("@prefix schema: <http://schema.org/> ."));
        assert!(written.contains("schema:PersonShape"));

        let reloaded = load_graph(written.as_bytes(), None).unwrap();
        assert_eq!(reloaded.len(), graph.len());
    }

    #[test]
    fn syntax_errors_are_reported() {
        let error = load_graph("schema:PersonShape a .".as_bytes(), None).unwrap_err();
        assert!(matches!(error, LoadError::Parse(_)));
    }

    #[test]
    fn invalid_base_iri_is_reported() {
        let error = load_graph("".as_bytes(), Some("not an iri")).unwrap_err();
        assert!(matches!(error, LoadError::InvalidBaseIri { .. }));
    }
}
