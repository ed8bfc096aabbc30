//! Property-based tests for scoring using proptest

use proptest::prelude::*;
use verdict::{assertion_from_parse, overlap, ParsedToken, ScoreBundle, Thresholds};

// =========================================================================
// Strategies
// =========================================================================

/// Short texts over a small vocabulary so overlaps actually happen
fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("Paris"), Just("paris"), Just("is"), Just("the"), Just("capital"),
            Just("of"), Just("France."), Just("cell"), Just("THE"), Just("42"),
        ],
        0..12,
    )
    .prop_map(|words| words.join(" "))
}

fn arb_nonempty_text() -> impl Strategy<Value = String> {
    arb_text().prop_filter("non-empty", |s| !s.trim().is_empty())
}

fn arb_score() -> impl Strategy<Value = f64> {
    (0u32..=1000).prop_map(|n| n as f64 / 1000.0)
}

/// Arbitrary parse: labels from the ones extraction looks at plus noise,
/// heads anywhere (including out of range)
fn arb_parse() -> impl Strategy<Value = Vec<ParsedToken>> {
    prop::collection::vec(
        (
            "[a-zA-Z]{1,8}",
            prop_oneof![
                Just("ROOT"), Just("ccomp"), Just("dobj"), Just("attr"),
                Just("prep"), Just("nsubj"), Just("det"), Just("punct"),
            ],
            0usize..12,
        )
            .prop_map(|(text, dep, head)| ParsedToken::new(text, dep, head)),
        0..10,
    )
}

// =========================================================================
// Overlap
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn overlap_is_a_ratio(a in arb_text(), b in arb_text()) {
        let ratio = overlap(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ratio), "ratio {} out of range", ratio);
    }

    #[test]
    fn overlap_with_self_is_one(a in arb_nonempty_text()) {
        prop_assert_eq!(overlap(&a, &a), 1.0);
    }

    #[test]
    fn overlap_with_empty_reference_is_zero(a in arb_nonempty_text()) {
        prop_assert_eq!(overlap(&a, ""), 0.0);
    }

    #[test]
    fn overlap_ignores_case(a in arb_text(), b in arb_text()) {
        prop_assert_eq!(overlap(&a.to_uppercase(), &b), overlap(&a, &b.to_lowercase()));
    }
}

// =========================================================================
// Verdict monotonicity
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn combined_verdict_is_monotonic(
        overlap_ratio in arb_score(),
        similarity in arb_score(),
        bump in arb_score(),
    ) {
        let thresholds = Thresholds::default();
        let base = thresholds.combined_verdict(&ScoreBundle { overlap_ratio, similarity });

        let more_overlap = ScoreBundle {
            overlap_ratio: (overlap_ratio + bump).min(1.0),
            similarity,
        };
        let more_similar = ScoreBundle { overlap_ratio, similarity: (similarity + bump).min(1.0) };

        if base.is_correct() {
            prop_assert!(thresholds.combined_verdict(&more_overlap).is_correct());
            prop_assert!(thresholds.combined_verdict(&more_similar).is_correct());
        }
    }

    #[test]
    fn assertion_verdict_is_monotonic(similarity in arb_score(), bump in arb_score()) {
        let thresholds = Thresholds::default();
        if thresholds.assertion_verdict(similarity).is_correct() {
            prop_assert!(thresholds.assertion_verdict(similarity + bump).is_correct());
        }
    }
}

// =========================================================================
// Extraction never fails and stays inside the input
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn extraction_is_total(tokens in arb_parse()) {
        let text: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let text = text.join(" ");
        let assertion = assertion_from_parse(&text, &tokens);

        if assertion.fallback {
            prop_assert_eq!(assertion.text, text.to_lowercase());
        } else {
            let words: Vec<String> = tokens.iter().map(|t| t.text.to_lowercase()).collect();
            for word in assertion.text.split_whitespace() {
                prop_assert!(words.iter().any(|w| w == word));
            }
        }
    }
}
