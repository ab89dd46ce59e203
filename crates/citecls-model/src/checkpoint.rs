//! Checkpoint save/load
//!
//! A checkpoint is a pair of files sharing a stem: SafeTensors weights
//! (`.safetensors`) and JSON metadata (`.json`). The metadata embeds the
//! model configuration and a format version, so loading needs nothing
//! but the path.

use crate::{ClassifierConfig, SequenceClassifier};
use anyhow::{Context, Result};
use aprender::nn::serialize::{load_model, save_model};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Checkpoint format version for compatibility checking
pub const CHECKPOINT_VERSION: &str = "1.0.0";

/// Training information stored beside the weights
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Global optimizer step at save time
    pub step: usize,
    /// Validation accuracy that triggered the save
    pub valid_accuracy: Option<f32>,
    /// Learning rate at save time
    pub learning_rate: Option<f32>,
    /// Additional metadata as key-value pairs
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Save a classifier checkpoint to disk.
///
/// `path` is the checkpoint stem; the `.safetensors` and `.json`
/// extensions are appended here. Parent directories are created as
/// needed.
///
/// # Errors
/// Returns an error if the directory cannot be created, the weights
/// cannot be serialized, or either file cannot be written.
pub fn save_checkpoint<P: AsRef<Path>>(
    model: &SequenceClassifier,
    path: P,
    metadata: Option<CheckpointMetadata>,
) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create checkpoint directory: {}", parent.display())
        })?;
    }

    let weights_path = path.with_extension("safetensors");
    save_model(model, &weights_path)
        .map_err(|e| anyhow::anyhow!("Failed to save weights to SafeTensors: {}", e))?;

    let metadata_path = path.with_extension("json");
    let metadata_data = CheckpointMetadata {
        step: metadata.as_ref().map(|m| m.step).unwrap_or(0),
        valid_accuracy: metadata.as_ref().and_then(|m| m.valid_accuracy),
        learning_rate: metadata.as_ref().and_then(|m| m.learning_rate),
        extra: {
            let mut extra = HashMap::new();
            extra.insert(
                "version".to_string(),
                serde_json::Value::String(CHECKPOINT_VERSION.to_string()),
            );
            extra.insert("config".to_string(), serde_json::to_value(model.config())?);
            if let Some(m) = metadata {
                extra.extend(m.extra);
            }
            extra
        },
    };
    let json_data = serde_json::to_string_pretty(&metadata_data)
        .context("Failed to serialize metadata to JSON")?;
    fs::write(&metadata_path, json_data)
        .with_context(|| format!("Failed to write metadata file: {}", metadata_path.display()))?;

    Ok(())
}

/// Load a classifier checkpoint from disk.
///
/// # Errors
/// Returns an error if either file cannot be read, the metadata is
/// missing its config or version, or the version does not match.
pub fn load_checkpoint<P: AsRef<Path>>(
    path: P,
) -> Result<(SequenceClassifier, CheckpointMetadata)> {
    let path = path.as_ref();

    let metadata_path = path.with_extension("json");
    let json_data = fs::read_to_string(&metadata_path)
        .with_context(|| format!("Failed to read metadata file: {}", metadata_path.display()))?;
    let metadata: CheckpointMetadata =
        serde_json::from_str(&json_data).context("Failed to parse metadata JSON")?;

    let config_value = metadata
        .extra
        .get("config")
        .ok_or_else(|| anyhow::anyhow!("Missing config in metadata"))?;
    let config: ClassifierConfig = serde_json::from_value(config_value.clone())
        .context("Failed to parse config from metadata")?;

    let version = metadata
        .extra
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing version in metadata"))?;
    if version != CHECKPOINT_VERSION {
        anyhow::bail!(
            "Checkpoint version mismatch: expected {}, got {}",
            CHECKPOINT_VERSION,
            version
        );
    }

    let mut model = SequenceClassifier::new(config);

    let weights_path = path.with_extension("safetensors");
    load_model(&mut model, &weights_path)
        .map_err(|e| anyhow::anyhow!("Failed to load weights from SafeTensors: {}", e))?;

    Ok((model, metadata))
}
