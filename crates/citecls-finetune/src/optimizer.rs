//! Optimizer setup for fine-tuning

use anyhow::{bail, Result};
use aprender::nn::optim::{AdamW, Optimizer};
use aprender::nn::Module;
use citecls_model::SequenceClassifier;

/// AdamW hyperparameters
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub learning_rate: f32,
    pub weight_decay: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    /// Linear warmup steps; 0 disables warmup
    pub warmup_steps: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 2e-5,
            weight_decay: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            warmup_steps: 0,
        }
    }
}

/// Build the AdamW optimizer over the model's parameters.
pub fn setup_optimizer(
    model: &mut SequenceClassifier,
    config: &OptimizerConfig,
) -> Result<AdamW> {
    let params = model.parameters_mut();
    if params.is_empty() {
        bail!("model has no trainable parameters");
    }
    Ok(AdamW::new(params, config.learning_rate)
        .betas(config.beta1, config.beta2)
        .eps(config.eps)
        .weight_decay(config.weight_decay))
}

/// Learning-rate multiplier at `step` (1-based) under linear warmup.
pub fn lr_multiplier(step: usize, warmup_steps: usize) -> f32 {
    if warmup_steps == 0 || step >= warmup_steps {
        1.0
    } else {
        step as f32 / warmup_steps as f32
    }
}

/// Apply the schedule for `step` to the optimizer.
pub fn update_learning_rate(optimizer: &mut AdamW, step: usize, config: &OptimizerConfig) {
    optimizer.set_lr(config.learning_rate * lr_multiplier(step, config.warmup_steps));
}
