pub mod classifier;
pub mod config;
pub mod email_parts;
pub mod engine;
pub mod report;
pub mod svg_analyzer;

pub use classifier::{AiTextJudgment, HeuristicTextClassifier, TextClassifier};
pub use config::Config;
pub use email_parts::EmailParts;
pub use engine::EmailRiskEngine;
pub use report::{AnalysisReport, Finding, ReportBuilder, RiskVerdict};
pub use svg_analyzer::{SvgAnalysisResult, SvgThreatAnalyzer};
