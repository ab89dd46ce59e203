//! Report generation for fine-tuning results

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result from evaluating a single split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitResult {
    /// Split name ("validation", "testing")
    pub split: String,
    /// Total number of examples scored
    pub total_samples: usize,
    /// Number of correct predictions
    pub correct: usize,
    /// Accuracy (correct / total_samples)
    pub accuracy: f32,
}

impl SplitResult {
    pub fn new(split: impl Into<String>, total_samples: usize, correct: usize) -> Self {
        let accuracy = if total_samples > 0 {
            correct as f32 / total_samples as f32
        } else {
            0.0
        };
        Self {
            split: split.into(),
            total_samples,
            correct,
            accuracy,
        }
    }
}

/// Final fine-tuning report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub splits: Vec<SplitResult>,
    /// Best validation accuracy observed during training
    pub best_valid_accuracy: f32,
    pub timestamp: String,
}

impl EvaluationReport {
    pub fn generate(results: &[SplitResult], best_valid_accuracy: f32) -> Self {
        Self {
            splits: results.to_vec(),
            best_valid_accuracy,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Fine-Tuning Report\n\n");
        md.push_str(&format!("**Timestamp**: {}\n\n", self.timestamp));
        md.push_str(&format!(
            "**Best Validation Accuracy**: {:.2}%\n\n",
            self.best_valid_accuracy * 100.0
        ));
        md.push_str("## Split Results\n\n");
        md.push_str("| Split | Samples | Correct | Accuracy |\n");
        md.push_str("|-------|---------|---------|----------|\n");
        for result in &self.splits {
            md.push_str(&format!(
                "| {} | {} | {} | {:.2}% |\n",
                result.split,
                result.total_samples,
                result.correct,
                result.accuracy * 100.0
            ));
        }
        md
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}
