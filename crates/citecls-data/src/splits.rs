//! Split loading from a JSON data config

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Data configuration naming the three split files
///
/// Relative paths are resolved against the config file's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub train: PathBuf,
    pub valid: PathBuf,
    pub test: PathBuf,
}

impl DataConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read data config: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse data config: {}", path.display()))
    }
}

/// One pre-tokenized example: a token-id sequence and its class label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub context: Vec<u32>,
    pub label: usize,
}

/// The three loaded splits
#[derive(Debug, Clone)]
pub struct Splits {
    pub train: Vec<Example>,
    pub valid: Vec<Example>,
    pub test: Vec<Example>,
}

impl Splits {
    /// Largest token id across all splits, if any example exists.
    pub fn max_token_id(&self) -> Option<u32> {
        self.train
            .iter()
            .chain(&self.valid)
            .chain(&self.test)
            .flat_map(|e| e.context.iter().copied())
            .max()
    }
}

fn load_split(path: &Path) -> Result<Vec<Example>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read split file: {}", path.display()))?;
    let mut examples = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let example: Example = serde_json::from_str(line)
            .with_context(|| format!("Invalid example at {}:{}", path.display(), lineno + 1))?;
        if example.context.is_empty() {
            anyhow::bail!("Empty context at {}:{}", path.display(), lineno + 1);
        }
        examples.push(example);
    }
    Ok(examples)
}

/// Load all three splits named by the data config at `config_path`.
pub fn load_splits<P: AsRef<Path>>(config_path: P) -> Result<Splits> {
    let config_path = config_path.as_ref();
    let config = DataConfig::from_file(config_path)?;
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let resolve = |p: &Path| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
        }
    };
    Ok(Splits {
        train: load_split(&resolve(&config.train))?,
        valid: load_split(&resolve(&config.valid))?,
        test: load_split(&resolve(&config.test))?,
    })
}
