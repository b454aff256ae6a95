use crate::classifier::{truncate_for_classifier, TextClassifier};
use crate::config::Config;
use crate::email_parts::EmailParts;
use crate::report::{AnalysisReport, ReportBuilder, RiskVerdict};
use crate::svg_analyzer::SvgThreatAnalyzer;

const SUBJECT_KEYWORD_SCORE: u32 = 10;
const AI_TEXT_MAX_SCORE: f32 = 25.0;

/// Combines header heuristics, per-fragment SVG analysis and the AI-text
/// signal into one score and verdict.
///
/// The engine may be reused across messages; all per-run state lives in
/// locals inside `analyze`. Not thread-safe by contract: callers wanting
/// concurrency run one engine per worker.
pub struct EmailRiskEngine {
    config: Config,
    svg_analyzer: SvgThreatAnalyzer,
    /// `None` means the classifier failed to initialize; the AI-text pass is
    /// disabled for this engine's whole lifetime and reported on every run.
    classifier: Option<Box<dyn TextClassifier>>,
}

impl EmailRiskEngine {
    pub fn new(config: Config, classifier: Option<Box<dyn TextClassifier>>) -> Self {
        if classifier.is_none() {
            log::warn!("no text classifier available, AI-text analysis disabled for this engine");
        }
        Self {
            config,
            svg_analyzer: SvgThreatAnalyzer::new(),
            classifier,
        }
    }

    /// Run the full pipeline over one decomposed message.
    pub fn analyze(&self, parts: &EmailParts) -> AnalysisReport {
        let mut total_score = 0u32;
        let mut report = ReportBuilder::new();

        total_score += self.analyze_headers(parts, &mut report);
        total_score += self.analyze_svg_fragments(parts, &mut report);
        total_score += self.analyze_body_text(parts, &mut report);

        let verdict = RiskVerdict::from_score(total_score);
        log::info!("analysis complete: score {total_score}, verdict {verdict}");

        report.finalize(total_score, verdict);
        AnalysisReport {
            total_score,
            verdict,
            findings: report.into_lines(),
        }
    }

    fn analyze_headers(&self, parts: &EmailParts, report: &mut ReportBuilder) -> u32 {
        report.push("--- Header analysis ---");
        report.push(format!("From: {}", parts.header("From")));
        report.push(format!("To: {}", parts.header("To")));

        let subject = parts.header("Subject");
        report.push(format!("Subject: {subject}"));

        let subject_lower = subject.to_lowercase();
        let mut score = 0;
        for keyword in &self.config.suspicious_subject_keywords {
            if subject_lower.contains(&keyword.to_lowercase()) {
                score += SUBJECT_KEYWORD_SCORE;
                report.push(format!(
                    "Warning: subject contains suspicious keyword '{keyword}'"
                ));
            }
        }
        score
    }

    fn analyze_svg_fragments(&self, parts: &EmailParts, report: &mut ReportBuilder) -> u32 {
        if parts.svg_fragments.is_empty() {
            report.push("No SVG content found in message");
            return 0;
        }

        report.push(format!(
            "Found {} SVG fragment(s), analyzing each",
            parts.svg_fragments.len()
        ));

        let mut score = 0;
        for (index, fragment) in parts.svg_fragments.iter().enumerate() {
            let result = self.svg_analyzer.analyze(fragment);
            log::debug!("SVG #{} contributed {}", index + 1, result.score);
            score += result.score;
            for finding in result.findings {
                report.push(format!("SVG #{}: {}", index + 1, finding.message));
            }
        }
        score
    }

    fn analyze_body_text(&self, parts: &EmailParts, report: &mut ReportBuilder) -> u32 {
        report.push("--- AI-generated text analysis ---");

        let Some(classifier) = &self.classifier else {
            report.push("AI-text check disabled: no classifier available since startup");
            return 0;
        };

        // Empty input never reaches the classifier.
        if parts.plain_text.trim().is_empty() {
            report.push("Message body does not look AI-generated");
            return 0;
        }

        match classifier.classify(truncate_for_classifier(&parts.plain_text)) {
            Ok(judgment) if judgment.is_ai_generated => {
                let confidence = judgment.confidence.clamp(0.0, 1.0);
                let score = (confidence * AI_TEXT_MAX_SCORE).floor() as u32;
                report.push(format!(
                    "Warning: message body looks AI-generated ({:.1}% confidence)",
                    confidence * 100.0
                ));
                score
            }
            Ok(_) => {
                report.push("Message body does not look AI-generated");
                0
            }
            Err(e) => {
                // Classifier failure is never fatal to the run.
                log::warn!("text classifier failed: {e}");
                report.push("AI-text check could not be completed, treated as neutral");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::AiTextJudgment;
    use anyhow::anyhow;
    use std::collections::HashMap;

    struct FixedClassifier(AiTextJudgment);

    impl TextClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<AiTextJudgment> {
            Ok(self.0)
        }
    }

    struct FailingClassifier;

    impl TextClassifier for FailingClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<AiTextJudgment> {
            Err(anyhow!("model backend unreachable"))
        }
    }

    fn ai_generated(confidence: f32) -> Option<Box<dyn TextClassifier>> {
        Some(Box::new(FixedClassifier(AiTextJudgment {
            is_ai_generated: true,
            confidence,
        })))
    }

    fn human() -> Option<Box<dyn TextClassifier>> {
        Some(Box::new(FixedClassifier(AiTextJudgment::human())))
    }

    fn parts_with(subject: &str, plain_text: &str, svg_fragments: Vec<String>) -> EmailParts {
        let mut headers = HashMap::new();
        headers.insert("From".to_string(), "sender@example.com".to_string());
        headers.insert("To".to_string(), "rcpt@example.com".to_string());
        headers.insert("Subject".to_string(), subject.to_string());
        EmailParts {
            headers,
            plain_text: plain_text.to_string(),
            svg_fragments,
        }
    }

    const PHISHING_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><script>steal()</script><a xlink:href="https://evil.example/login"><text>paypal.com</text></a></svg>"#;

    #[test]
    fn test_end_to_end_phishing_scenario() {
        // 10 (subject) + 100 (script) + 50 (spoofed link) + 20 (0.80 * 25)
        let engine = EmailRiskEngine::new(Config::default(), ai_generated(0.80));
        let parts = parts_with(
            "Urgent: account notice",
            "please verify your account",
            vec![PHISHING_SVG.to_string()],
        );

        let report = engine.analyze(&parts);

        assert_eq!(report.total_score, 180);
        assert_eq!(report.verdict, RiskVerdict::HighRisk);

        let text = report.render();
        assert!(text.contains("From: sender@example.com"));
        assert!(text.contains("To: rcpt@example.com"));
        assert!(text.contains("Subject: Urgent: account notice"));
        assert!(text.contains("suspicious keyword 'urgent'"));
        assert!(text.contains("SVG #1: High risk: 1 <script>"));
        assert!(text.contains("does not match destination"));
        assert!(text.contains("80.0% confidence"));
        assert!(text.contains("not performed"));
        assert!(text.contains("Verdict: HIGH RISK"));
    }

    #[test]
    fn test_empty_message_looks_safe() {
        let engine = EmailRiskEngine::new(Config::default(), human());
        let parts = parts_with("hello", "", vec![]);

        let report = engine.analyze(&parts);

        assert_eq!(report.total_score, 0);
        assert_eq!(report.verdict, RiskVerdict::LooksSafe);
        let text = report.render();
        assert!(text.contains("No SVG content found"));
        assert!(text.contains("does not look AI-generated"));
    }

    #[test]
    fn test_multiple_subject_keywords_stack() {
        let engine = EmailRiskEngine::new(Config::default(), human());
        let parts = parts_with("URGENT warning: verify now", "hi", vec![]);

        let report = engine.analyze(&parts);

        // urgent + warning + verify
        assert_eq!(report.total_score, 30);
        assert_eq!(report.verdict, RiskVerdict::LowRisk);
    }

    #[test]
    fn test_svg_fragments_scored_in_order() {
        let engine = EmailRiskEngine::new(Config::default(), human());
        let malformed = "<svg not closed".to_string();
        let clean =
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg>"#
                .to_string();
        let parts = parts_with("hello", "hi", vec![malformed, clean]);

        let report = engine.analyze(&parts);

        assert_eq!(report.total_score, 50);
        assert_eq!(report.verdict, RiskVerdict::MediumRisk);
        let text = report.render();
        assert!(text.contains("Found 2 SVG fragment(s)"));
        assert!(text.contains("SVG #1: Malformed"));
        assert!(text.contains("SVG #2: Note:"));
    }

    #[test]
    fn test_classifier_failure_is_not_fatal() {
        let engine = EmailRiskEngine::new(Config::default(), Some(Box::new(FailingClassifier)));
        let parts = parts_with("urgent", "some body text", vec![]);

        let report = engine.analyze(&parts);

        assert_eq!(report.total_score, 10);
        assert!(report
            .render()
            .contains("AI-text check could not be completed"));
    }

    #[test]
    fn test_degraded_mode_reported_every_run() {
        let engine = EmailRiskEngine::new(Config::default(), None);
        let parts = parts_with("hello", "plenty of body text", vec![]);

        for _ in 0..2 {
            let report = engine.analyze(&parts);
            assert_eq!(report.total_score, 0);
            assert!(report.render().contains("AI-text check disabled"));
        }
    }

    #[test]
    fn test_empty_body_skips_classifier() {
        // A failing classifier proves the short-circuit: no error finding.
        let engine = EmailRiskEngine::new(Config::default(), Some(Box::new(FailingClassifier)));
        let parts = parts_with("hello", "  \n ", vec![]);

        let report = engine.analyze(&parts);

        assert_eq!(report.total_score, 0);
        assert!(report.render().contains("does not look AI-generated"));
        assert!(!report.render().contains("could not be completed"));
    }

    #[test]
    fn test_confidence_scales_ai_penalty() {
        for (confidence, expected) in [(1.0f32, 25u32), (0.5, 12), (0.2, 5), (0.0, 0)] {
            let engine = EmailRiskEngine::new(Config::default(), ai_generated(confidence));
            let parts = parts_with("hello", "body", vec![]);
            assert_eq!(engine.analyze(&parts).total_score, expected);
        }
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let engine = EmailRiskEngine::new(Config::default(), ai_generated(0.80));
        let parts = parts_with(
            "Urgent: account notice",
            "please verify",
            vec![PHISHING_SVG.to_string()],
        );

        let first = engine.analyze(&parts);
        let second = engine.analyze(&parts);

        assert_eq!(first, second);
    }
}
