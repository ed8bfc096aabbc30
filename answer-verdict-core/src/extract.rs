//! Assertion extraction
//!
//! Reduces a sentence to the fragment that carries its claim: the arguments
//! of the first clausal verb. The reduction runs on a dependency parse
//! produced by a [`SyntaxAnalyzer`] backend, so the heuristic itself is a
//! pure function over [`ParsedToken`]s and can be tested without a parser.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::EvalResult;

/// Grammatical role of a token, as far as extraction cares.
///
/// Labels follow the ClearNLP scheme used by spaCy's English models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepRole {
    /// `ROOT`
    Root,
    /// `ccomp`
    ClausalComplement,
    /// `dobj`
    DirectObject,
    /// `attr`
    Attribute,
    /// `prep`
    Prepositional,
    Other(String),
}

impl DepRole {
    pub fn from_label(label: &str) -> Self {
        match label {
            "ROOT" | "root" => DepRole::Root,
            "ccomp" => DepRole::ClausalComplement,
            "dobj" | "obj" => DepRole::DirectObject,
            "attr" => DepRole::Attribute,
            "prep" => DepRole::Prepositional,
            other => DepRole::Other(other.to_string()),
        }
    }

    fn is_pivot(&self) -> bool {
        matches!(self, DepRole::Root | DepRole::ClausalComplement)
    }

    fn is_kept(&self) -> bool {
        matches!(
            self,
            DepRole::DirectObject | DepRole::Attribute | DepRole::Prepositional
        )
    }
}

/// One token of a dependency parse.
///
/// `head` is the index of the governing token within the same parse; a root
/// token points at itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedToken {
    pub text: String,
    pub role: DepRole,
    pub head: usize,
}

impl ParsedToken {
    pub fn new(text: impl Into<String>, dep_label: &str, head: usize) -> Self {
        Self {
            text: text.into(),
            role: DepRole::from_label(dep_label),
            head,
        }
    }
}

/// Reduced text that stands in for a sentence's claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub text: String,
    /// True when no clausal pivot was found and `text` is the lowercased input
    pub fallback: bool,
}

impl Assertion {
    fn verbatim(text: &str) -> Self {
        Self {
            text: text.to_lowercase(),
            fallback: true,
        }
    }
}

/// Backend that produces a dependency parse for a text
#[async_trait]
pub trait SyntaxAnalyzer: Send + Sync {
    /// Identifier of the underlying parser model
    fn model_id(&self) -> &str;

    async fn analyze(&self, text: &str) -> EvalResult<Vec<ParsedToken>>;
}

/// Reduces a text to an [`Assertion`].
///
/// Implementations must not fail on malformed text; an error means the
/// backend itself failed.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn reduce(&self, text: &str) -> EvalResult<Assertion>;
}

/// Extractor backed by a dependency parser
pub struct DependencyExtractor {
    analyzer: Arc<dyn SyntaxAnalyzer>,
}

impl DependencyExtractor {
    pub fn new(analyzer: Arc<dyn SyntaxAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl Extractor for DependencyExtractor {
    async fn reduce(&self, text: &str) -> EvalResult<Assertion> {
        let tokens = self.analyzer.analyze(text).await?;
        let assertion = assertion_from_parse(text, &tokens);
        if assertion.fallback {
            tracing::debug!(
                model = self.analyzer.model_id(),
                "No clausal pivot found, comparing full text"
            );
        }
        Ok(assertion)
    }
}

/// Lowercase passthrough, for running assertion mode without a parser
pub struct IdentityExtractor;

#[async_trait]
impl Extractor for IdentityExtractor {
    async fn reduce(&self, text: &str) -> EvalResult<Assertion> {
        Ok(Assertion {
            text: text.to_lowercase(),
            fallback: false,
        })
    }
}

/// Apply the extraction heuristic to an existing parse.
///
/// The first `ROOT` or `ccomp` token in document order is the pivot. Tokens
/// in its subtree with role `dobj`, `attr` or `prep` are kept in their
/// original order, lowercased and joined with single spaces. Without a pivot
/// the whole of `text` is returned lowercased.
pub fn assertion_from_parse(text: &str, tokens: &[ParsedToken]) -> Assertion {
    let Some(pivot) = tokens.iter().position(|t| t.role.is_pivot()) else {
        return Assertion::verbatim(text);
    };

    let kept: Vec<String> = tokens
        .iter()
        .enumerate()
        .filter(|(idx, token)| token.role.is_kept() && governed_by(tokens, *idx, pivot))
        .map(|(_, token)| token.text.to_lowercase())
        .collect();

    Assertion {
        text: kept.join(" "),
        fallback: false,
    }
}

/// Whether `ancestor` is `idx` itself or lies on its head chain.
///
/// Parses from external backends are not trusted to be acyclic or in range,
/// so the walk is bounded by the token count.
fn governed_by(tokens: &[ParsedToken], idx: usize, ancestor: usize) -> bool {
    let mut current = idx;
    for _ in 0..=tokens.len() {
        if current == ancestor {
            return true;
        }
        let head = tokens[current].head;
        if head == current || head >= tokens.len() {
            return false;
        }
        current = head;
    }
    false
}
