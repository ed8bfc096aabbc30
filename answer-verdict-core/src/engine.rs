//! Verdict engine: thresholds and evaluation modes

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::EvalResult;
use crate::extract::{Assertion, Extractor};
use crate::overlap::overlap;
use crate::similarity::{Embedder, SemanticScorer};

/// Scoring strategy for one evaluation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Word overlap and similarity on the full texts
    #[default]
    Combined,
    /// Similarity between extracted assertions only
    AssertionOnly,
}

impl EvaluationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMode::Combined => "combined",
            EvaluationMode::AssertionOnly => "assertion_only",
        }
    }
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EvaluationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "combined" => Ok(EvaluationMode::Combined),
            "assertion" | "assertion_only" | "assertion-only" => Ok(EvaluationMode::AssertionOnly),
            other => Err(format!("Unknown evaluation mode: {}", other)),
        }
    }
}

/// Decision thresholds. Every comparison is strict `>`, so a score equal
/// to its threshold is not a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum similarity in combined mode (default 0.70)
    #[serde(default = "default_combined_similarity")]
    pub combined_similarity: f64,
    /// Minimum overlap ratio in combined mode (default 0.40)
    #[serde(default = "default_combined_overlap")]
    pub combined_overlap: f64,
    /// Minimum assertion similarity in assertion mode (default 0.75)
    #[serde(default = "default_assertion_similarity")]
    pub assertion_similarity: f64,
}

fn default_combined_similarity() -> f64 { 0.70 }
fn default_combined_overlap() -> f64 { 0.40 }
fn default_assertion_similarity() -> f64 { 0.75 }

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            combined_similarity: default_combined_similarity(),
            combined_overlap: default_combined_overlap(),
            assertion_similarity: default_assertion_similarity(),
        }
    }
}

impl Thresholds {
    pub fn combined_verdict(&self, scores: &ScoreBundle) -> Verdict {
        Verdict::from_bool(
            scores.similarity > self.combined_similarity
                && scores.overlap_ratio > self.combined_overlap,
        )
    }

    pub fn assertion_verdict(&self, similarity: f64) -> Verdict {
        Verdict::from_bool(similarity > self.assertion_similarity)
    }
}

/// Scores for one (response, reference) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub overlap_ratio: f64,
    pub similarity: f64,
}

/// Verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Correct,
    Incorrect,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Correct => "Correct",
            Label::Incorrect => "Incorrect",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Binary correctness decision; the label always agrees with `is_correct`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    is_correct: bool,
    label: Label,
}

impl Verdict {
    pub fn from_bool(is_correct: bool) -> Self {
        let label = if is_correct { Label::Correct } else { Label::Incorrect };
        Self { is_correct, label }
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn label(&self) -> Label {
        self.label
    }
}

/// What a verdict was based on
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Evidence {
    Combined(ScoreBundle),
    Assertion {
        response: Assertion,
        reference: Assertion,
        similarity: f64,
    },
}

/// Verdict together with its evidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgement {
    pub evidence: Evidence,
    pub verdict: Verdict,
}

/// Evaluates single (response, reference) pairs
pub struct VerdictEngine {
    scorer: SemanticScorer,
    extractor: Arc<dyn Extractor>,
    thresholds: Thresholds,
}

impl VerdictEngine {
    /// Create an engine with default thresholds
    pub fn new(embedder: Arc<dyn Embedder>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            scorer: SemanticScorer::new(embedder),
            extractor,
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn embedding_model(&self) -> &str {
        self.scorer.model_id()
    }

    /// Evaluate one pair under the given mode
    pub async fn evaluate(
        &self,
        response: &str,
        reference: &str,
        mode: EvaluationMode,
    ) -> EvalResult<Judgement> {
        match mode {
            EvaluationMode::Combined => {
                let scores = ScoreBundle {
                    overlap_ratio: overlap(response, reference),
                    similarity: self.scorer.similarity(response, reference).await?,
                };
                Ok(Judgement {
                    verdict: self.thresholds.combined_verdict(&scores),
                    evidence: Evidence::Combined(scores),
                })
            }
            EvaluationMode::AssertionOnly => {
                let response = self.extractor.reduce(response).await?;
                let reference = self.extractor.reduce(reference).await?;
                let similarity = self.scorer.similarity(&response.text, &reference.text).await?;
                Ok(Judgement {
                    verdict: self.thresholds.assertion_verdict(similarity),
                    evidence: Evidence::Assertion {
                        response,
                        reference,
                        similarity,
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalResult;
    use crate::extract::{DependencyExtractor, IdentityExtractor, ParsedToken, SyntaxAnalyzer};
    use crate::similarity::tests::BagOfWordsEmbedder;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn engine() -> VerdictEngine {
        VerdictEngine::new(
            Arc::new(BagOfWordsEmbedder::default()),
            Arc::new(IdentityExtractor),
        )
    }

    /// Serves fixed parses keyed by sentence
    struct CannedParses(HashMap<&'static str, Vec<ParsedToken>>);

    #[async_trait]
    impl SyntaxAnalyzer for CannedParses {
        fn model_id(&self) -> &str {
            "canned"
        }

        async fn analyze(&self, text: &str) -> EvalResult<Vec<ParsedToken>> {
            Ok(self.0.get(text).cloned().unwrap_or_default())
        }
    }

    fn parsing_engine() -> VerdictEngine {
        let tok = ParsedToken::new;
        let parses = HashMap::from([
            (
                "Marie Curie discovered radium.",
                vec![
                    tok("Marie", "compound", 1),
                    tok("Curie", "nsubj", 2),
                    tok("discovered", "ROOT", 2),
                    tok("radium", "dobj", 2),
                    tok(".", "punct", 2),
                ],
            ),
            (
                "She famously discovered radium.",
                vec![
                    tok("She", "nsubj", 2),
                    tok("famously", "advmod", 2),
                    tok("discovered", "ROOT", 2),
                    tok("radium", "dobj", 2),
                    tok(".", "punct", 2),
                ],
            ),
            (
                "Curie discovered radium.",
                vec![
                    tok("Curie", "nsubj", 1),
                    tok("discovered", "ROOT", 1),
                    tok("radium", "dobj", 1),
                    tok(".", "punct", 1),
                ],
            ),
            (
                "Paris is lovely.",
                vec![
                    tok("Paris", "nsubj", 1),
                    tok("is", "ROOT", 1),
                    tok("lovely", "acomp", 1),
                    tok(".", "punct", 1),
                ],
            ),
            (
                "It is Paris.",
                vec![
                    tok("It", "nsubj", 1),
                    tok("is", "ROOT", 1),
                    tok("Paris", "attr", 1),
                    tok(".", "punct", 1),
                ],
            ),
        ]);
        VerdictEngine::new(
            Arc::new(BagOfWordsEmbedder::default()),
            Arc::new(DependencyExtractor::new(Arc::new(CannedParses(parses)))),
        )
    }

    #[test]
    fn test_label_follows_verdict() {
        assert_eq!(Verdict::from_bool(true).label(), Label::Correct);
        assert_eq!(Verdict::from_bool(false).label(), Label::Incorrect);
        assert_eq!(Verdict::from_bool(true).label().to_string(), "Correct");
    }

    #[test]
    fn test_threshold_boundary_is_not_correct() {
        let t = Thresholds::default();
        let on_edge = ScoreBundle { overlap_ratio: 0.40, similarity: 0.95 };
        assert!(!t.combined_verdict(&on_edge).is_correct());
        let on_edge = ScoreBundle { overlap_ratio: 0.9, similarity: 0.70 };
        assert!(!t.combined_verdict(&on_edge).is_correct());
        assert!(!t.assertion_verdict(0.75).is_correct());
        assert!(t.assertion_verdict(0.7501).is_correct());
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            combined_similarity: 0.1,
            combined_overlap: 0.1,
            assertion_similarity: 0.1,
        };
        let scores = ScoreBundle { overlap_ratio: 0.2, similarity: 0.2 };
        assert!(t.combined_verdict(&scores).is_correct());
        assert!(!Thresholds::default().combined_verdict(&scores).is_correct());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("combined".parse::<EvaluationMode>().unwrap(), EvaluationMode::Combined);
        assert_eq!("Assertion".parse::<EvaluationMode>().unwrap(), EvaluationMode::AssertionOnly);
        assert!("fuzzy".parse::<EvaluationMode>().is_err());
    }

    #[tokio::test]
    async fn test_paraphrase_is_correct_in_combined_mode() {
        let judgement = engine()
            .evaluate(
                "The capital of France is Paris.",
                "Paris is the capital of France.",
                EvaluationMode::Combined,
            )
            .await
            .unwrap();

        let Evidence::Combined(scores) = judgement.evidence else {
            panic!("expected combined evidence");
        };
        assert!(scores.overlap_ratio > 0.6);
        assert!(scores.similarity > 0.99);
        assert!(judgement.verdict.is_correct());
    }

    #[tokio::test]
    async fn test_non_answer_is_incorrect_in_both_modes() {
        let engine = engine();
        for mode in [EvaluationMode::Combined, EvaluationMode::AssertionOnly] {
            let judgement = engine
                .evaluate(
                    "I don't know.",
                    "The mitochondria is the powerhouse of the cell.",
                    mode,
                )
                .await
                .unwrap();
            assert_eq!(judgement.verdict.label(), Label::Incorrect, "mode {}", mode);
        }
    }

    #[tokio::test]
    async fn test_assertion_mode_reports_assertions() {
        let judgement = engine()
            .evaluate("Water boils at 100 C", "WATER BOILS AT 100 C", EvaluationMode::AssertionOnly)
            .await
            .unwrap();
        match judgement.evidence {
            Evidence::Assertion { response, reference, similarity } => {
                assert_eq!(response.text, reference.text);
                assert!(similarity > 0.99);
            }
            other => panic!("unexpected evidence {:?}", other),
        }
        assert!(judgement.verdict.is_correct());
    }

    #[tokio::test]
    async fn test_empty_reference_is_scored() {
        let judgement = engine()
            .evaluate("Some answer", "", EvaluationMode::Combined)
            .await
            .unwrap();
        assert_eq!(
            judgement.evidence,
            Evidence::Combined(ScoreBundle { overlap_ratio: 0.0, similarity: 0.0 })
        );
        assert!(!judgement.verdict.is_correct());
    }

    #[tokio::test]
    async fn test_subject_and_modifier_do_not_change_assertion_verdict() {
        let engine = parsing_engine();
        let reference = "Curie discovered radium.";

        let named = engine
            .evaluate("Marie Curie discovered radium.", reference, EvaluationMode::AssertionOnly)
            .await
            .unwrap();
        let pronoun = engine
            .evaluate("She famously discovered radium.", reference, EvaluationMode::AssertionOnly)
            .await
            .unwrap();

        assert_eq!(named.evidence, pronoun.evidence);
        assert_eq!(named.verdict.label(), pronoun.verdict.label());
        let Evidence::Assertion { response, reference, similarity } = named.evidence else {
            panic!("expected assertion evidence");
        };
        assert_eq!(response.text, "radium");
        assert_eq!(reference.text, "radium");
        assert!(!response.fallback);
        assert!(similarity > 0.99);
        assert!(named.verdict.is_correct());
    }

    #[tokio::test]
    async fn test_pivot_without_kept_roles_gives_empty_assertion() {
        let judgement = parsing_engine()
            .evaluate("Paris is lovely.", "It is Paris.", EvaluationMode::AssertionOnly)
            .await
            .unwrap();

        let Evidence::Assertion { response, reference, similarity } = judgement.evidence else {
            panic!("expected assertion evidence");
        };
        assert_eq!(response.text, "");
        assert!(!response.fallback);
        assert_eq!(reference.text, "paris");
        assert_eq!(similarity, 0.0);
        assert_eq!(judgement.verdict.label(), Label::Incorrect);
    }
}
