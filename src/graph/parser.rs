//! Source file parsing.
//!
//! The catalog only depends on [`FactParser`]; [`TurtleParser`] is the
//! production implementation backed by oxigraph.

use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{NamedNode, Quad, Term};

use super::model::{Fact, Node, Predicate};
use crate::error::ParseError;

/// Turns the content of one source file into facts.
///
/// Implementations must be deterministic in the content and must not return
/// a partial fact list: any malformed input is an error.
pub trait FactParser: Send + Sync {
    /// Parse `content`, read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] if the content is malformed.
    fn parse(&self, path: &Path, content: &[u8]) -> Result<Vec<Fact>, ParseError>;
}

impl<F> FactParser for F
where
    F: Fn(&Path, &[u8]) -> Result<Vec<Fact>, ParseError> + Send + Sync,
{
    fn parse(&self, path: &Path, content: &[u8]) -> Result<Vec<Fact>, ParseError> {
        self(path, content)
    }
}

/// Parser for Turtle files.
///
/// Other RDF syntaxes are recognised by extension (`.nt`, `.nq`, `.trig`,
/// `.n3`, `.rdf`); anything unknown is read as Turtle. Relative IRIs resolve
/// against the file's `file://` URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleParser;

impl TurtleParser {
    /// Create a parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn format_for(path: &Path) -> RdfFormat {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| RdfFormat::from_extension(&ext.to_lowercase()))
            .unwrap_or(RdfFormat::Turtle)
    }

    fn base_iri(path: &Path) -> Option<String> {
        if !path.is_absolute() {
            return None;
        }
        let iri = format!("file://{}", path.display());
        NamedNode::new(iri.as_str()).is_ok().then_some(iri)
    }
}

impl FactParser for TurtleParser {
    fn parse(&self, path: &Path, content: &[u8]) -> Result<Vec<Fact>, ParseError> {
        let mut parser = RdfParser::from_format(Self::format_for(path));
        if let Some(base) = Self::base_iri(path) {
            parser = parser
                .with_base_iri(base)
                .map_err(|e| ParseError::syntax(path, e))?;
        }

        parser
            .for_reader(content)
            .map(|quad| {
                quad.map(fact_from_quad)
                    .map_err(|e| ParseError::syntax(path, e))
            })
            .collect()
    }
}

fn fact_from_quad(quad: Quad) -> Fact {
    Fact {
        subject: node_from_term(Term::from(quad.subject)),
        predicate: Predicate::new(quad.predicate.into_string()),
        object: node_from_term(quad.object),
    }
}

fn node_from_term(term: Term) -> Node {
    match term {
        Term::NamedNode(node) => Node::Iri(node.into_string()),
        Term::BlankNode(node) => Node::Iri(format!("_:{}", node.as_str())),
        Term::Literal(literal) => Node::Literal {
            value: literal.value().to_owned(),
            language: literal.language().map(str::to_owned),
        },
        // Quoted triples only exist with oxigraph's RDF 1.2 support enabled.
        #[allow(unreachable_patterns)]
        other => Node::Iri(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RDFS_LABEL;

    const SAMPLE: &str = r#"
@prefix ex: <http://example.org/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

ex:Alice rdfs:label "Alice"@en ;
    ex:knows ex:Bob ;
    ex:age 42 .
"#;

    #[test]
    fn test_parse_turtle() {
        let facts = TurtleParser::new()
            .parse(Path::new("/data/a.ttl"), SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(facts.len(), 3);
        let alice = Node::iri("http://example.org/Alice");
        assert!(facts.contains(&Fact::new(
            alice.clone(),
            RDFS_LABEL,
            Node::lang_literal("Alice", "en")
        )));
        assert!(facts.contains(&Fact::new(
            alice.clone(),
            "http://example.org/knows",
            Node::iri("http://example.org/Bob")
        )));
        // Datatypes are not modelled, only the lexical value.
        assert!(facts.contains(&Fact::new(
            alice,
            "http://example.org/age",
            Node::literal("42")
        )));
    }

    #[test]
    fn test_malformed_yields_error_not_partial_facts() {
        let content = format!("{SAMPLE}\nex:Bob ex:knows .\n");
        let err = TurtleParser::new()
            .parse(Path::new("/data/bad.ttl"), content.as_bytes())
            .unwrap_err();

        assert!(matches!(err, ParseError::Syntax { .. }));
        assert!(err.to_string().contains("/data/bad.ttl"));
    }

    #[test]
    fn test_relative_iris_resolve_against_file() {
        let facts = TurtleParser::new()
            .parse(Path::new("/data/rel.ttl"), b"<#me> <#knows> <other.ttl#you> .")
            .unwrap();

        assert_eq!(facts.len(), 1);
        assert_eq!(
            facts[0].subject,
            Node::iri("file:///data/rel.ttl#me")
        );
        assert_eq!(facts[0].object, Node::iri("file:///data/other.ttl#you"));
    }

    #[test]
    fn test_blank_nodes_become_prefixed_iris() {
        let facts = TurtleParser::new()
            .parse(
                Path::new("/data/b.ttl"),
                b"<http://ex.org/a> <http://ex.org/p> [ <http://ex.org/q> \"x\" ] .",
            )
            .unwrap();

        assert_eq!(facts.len(), 2);
        let blank = facts
            .iter()
            .find(|f| f.predicate.as_str() == "http://ex.org/q")
            .map(|f| f.subject.clone())
            .unwrap();
        assert!(blank.as_iri().unwrap().starts_with("_:"));
    }

    #[test]
    fn test_format_from_extension() {
        let facts = TurtleParser::new()
            .parse(
                Path::new("/data/c.nt"),
                b"<http://ex.org/a> <http://ex.org/p> <http://ex.org/b> .\n",
            )
            .unwrap();
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_closure_parser() {
        let parser = |_: &Path, content: &[u8]| -> Result<Vec<Fact>, ParseError> {
            Ok(vec![Fact::new(
                Node::iri("http://ex.org/file"),
                "http://ex.org/size",
                Node::literal(content.len().to_string()),
            )])
        };

        let facts = parser.parse(Path::new("x.ttl"), b"abc").unwrap();
        assert_eq!(facts[0].object, Node::literal("3"));
    }
}
