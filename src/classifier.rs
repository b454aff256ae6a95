use anyhow::Result;
use regex::Regex;
use serde::Serialize;

/// Upper bound in bytes on text handed to a classifier, roughly 510 model
/// tokens of ASCII text.
pub const MAX_CLASSIFIER_BYTES: usize = 2040;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AiTextJudgment {
    pub is_ai_generated: bool,
    /// Confidence in [0, 1]; only meaningful when `is_ai_generated` is true.
    pub confidence: f32,
}

impl AiTextJudgment {
    pub fn human() -> Self {
        Self {
            is_ai_generated: false,
            confidence: 0.0,
        }
    }
}

/// Judges whether a piece of text was machine-generated.
///
/// Implementations must tolerate empty input by returning
/// `AiTextJudgment::human()` without touching any model backend.
pub trait TextClassifier {
    fn classify(&self, text: &str) -> Result<AiTextJudgment>;
}

/// Truncate classifier input on a char boundary.
pub fn truncate_for_classifier(text: &str) -> &str {
    if text.len() <= MAX_CLASSIFIER_BYTES {
        return text;
    }
    let mut end = MAX_CLASSIFIER_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Pattern-based stand-in for a model-backed detector: formulaic
/// security-alert boilerplate is what generated phishing bodies lean on.
#[derive(Debug)]
pub struct HeuristicTextClassifier {
    phrase_patterns: Vec<Regex>,
}

impl Default for HeuristicTextClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicTextClassifier {
    pub fn new() -> Self {
        Self {
            phrase_patterns: vec![
                Regex::new(r"(?i)we (have )?(detected|noticed) (unusual|suspicious) activity")
                    .unwrap(),
                Regex::new(r"(?i)(click|follow) the (link|button) (below|above) to (verify|confirm|secure)")
                    .unwrap(),
                Regex::new(r"(?i)your (account|access) (will|may) be (suspended|terminated|restricted)")
                    .unwrap(),
                Regex::new(r"(?i)this is an? (important|mandatory) security (measure|step|verification)")
                    .unwrap(),
                Regex::new(r"(?i)(dear|valued) (customer|user|member)").unwrap(),
                Regex::new(r"(?i)(we appreciate|thank you for) your (prompt|immediate) (attention|action|cooperation)")
                    .unwrap(),
            ],
        }
    }
}

impl TextClassifier for HeuristicTextClassifier {
    fn classify(&self, text: &str) -> Result<AiTextJudgment> {
        if text.trim().is_empty() {
            return Ok(AiTextJudgment::human());
        }

        let hits = self
            .phrase_patterns
            .iter()
            .filter(|pattern| pattern.is_match(text))
            .count();
        if hits == 0 {
            return Ok(AiTextJudgment::human());
        }

        log::debug!("heuristic classifier matched {hits} boilerplate phrase pattern(s)");
        Ok(AiTextJudgment {
            is_ai_generated: true,
            confidence: (0.4 + 0.15 * hits as f32).min(0.95),
        })
    }
}
