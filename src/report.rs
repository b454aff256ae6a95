use serde::Serialize;
use std::fmt;

/// One weighted observation emitted by an analyzer. Informational
/// findings carry weight 0 and never move the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity_weight: u32,
    pub message: String,
}

impl Finding {
    pub fn new(severity_weight: u32, message: impl Into<String>) -> Self {
        Self {
            severity_weight,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

/// Risk band derived from the final total score. Always recomputed,
/// never cached across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskVerdict {
    HighRisk,
    MediumRisk,
    LowRisk,
    LooksSafe,
}

impl RiskVerdict {
    pub fn from_score(score: u32) -> Self {
        if score >= 100 {
            RiskVerdict::HighRisk
        } else if score >= 50 {
            RiskVerdict::MediumRisk
        } else if score > 0 {
            RiskVerdict::LowRisk
        } else {
            RiskVerdict::LooksSafe
        }
    }
}

impl fmt::Display for RiskVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskVerdict::HighRisk => "HIGH RISK",
            RiskVerdict::MediumRisk => "MEDIUM RISK",
            RiskVerdict::LowRisk => "LOW RISK",
            RiskVerdict::LooksSafe => "LOOKS SAFE",
        };
        write!(f, "{label}")
    }
}

/// Append-only trail of report lines. `finalize` adds the summary block
/// without discarding anything written before it.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    lines: Vec<String>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn finalize(&mut self, total_score: u32, verdict: RiskVerdict) {
        self.lines.push("=".repeat(50));
        self.lines.push("Analysis complete".to_string());
        self.lines.push(format!("Final risk score: {total_score}"));
        self.lines.push(format!("Verdict: {verdict}"));
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Result of one full analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub total_score: u32,
    pub verdict: RiskVerdict,
    pub findings: Vec<String>,
}

impl AnalysisReport {
    pub fn render(&self) -> String {
        self.findings.join("\n")
    }
}
