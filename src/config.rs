use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Keywords that raise the score when found in the Subject header.
    /// Matching is case-insensitive substring matching.
    #[serde(default = "default_subject_keywords")]
    pub suspicious_subject_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suspicious_subject_keywords: default_subject_keywords(),
        }
    }
}

fn default_subject_keywords() -> Vec<String> {
    [
        "urgent",
        "verify",
        "warning",
        "action required",
        // Chinese equivalents, common in the phishing corpus this targets
        "紧急",
        "验证",
        "警告",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.as_ref().display()))?;
        Ok(config)
    }

    pub fn generate_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(&Config::default())?;
        std::fs::write(&path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }
}
