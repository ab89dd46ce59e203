//! Model configuration

use serde::{Deserialize, Serialize};

/// Sequence classifier configuration
///
/// Serialized into checkpoint metadata so a saved model can be
/// reconstructed without out-of-band information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Vocabulary size (token ids must be < vocab_size)
    pub vocab_size: usize,
    /// Maximum sequence length
    pub max_seq_len: usize,
    /// Number of encoder layers
    pub n_layer: usize,
    /// Number of attention heads
    pub n_head: usize,
    /// Embedding dimension (must be divisible by n_head)
    pub n_embd: usize,
    /// Number of target classes
    pub num_classes: usize,
    /// Dropout probability (None disables dropout)
    pub dropout: Option<f32>,
    /// Seed for weight initialization (None uses entropy)
    pub seed: Option<u64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            vocab_size: 30522,
            max_seq_len: 400,
            n_layer: 4,
            n_head: 4,
            n_embd: 256,
            num_classes: 40,
            dropout: Some(0.1),
            seed: None,
        }
    }
}
