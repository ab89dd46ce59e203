//! Inference-only evaluation over a held-out split

use crate::metrics::Accuracy;
use crate::runner::run_iter;
use anyhow::{bail, Result};
use aprender::nn::loss::CrossEntropyLoss;
use aprender::nn::Module;
use citecls_data::BatchLoader;
use citecls_model::SequenceClassifier;
use std::fmt;

/// Which split an evaluation pass covers; display text only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalSplit {
    Valid,
    Test,
}

impl fmt::Display for EvalSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalSplit::Valid => write!(f, "validation"),
            EvalSplit::Test => write!(f, "testing"),
        }
    }
}

/// Result of one full evaluation pass
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub accuracy: f32,
    pub matches: usize,
    pub total: usize,
    pub mean_loss: f32,
}

/// Evaluate the model over every batch of `loader`.
///
/// Switches the model to eval mode and rewinds the loader first. The
/// loss is computed for display only; weights are untouched.
pub fn evaluate(
    loader: &mut BatchLoader,
    model: &mut SequenceClassifier,
    split: EvalSplit,
) -> Result<EvalOutcome> {
    model.eval();
    let loss_fn = CrossEntropyLoss::new();
    let mut metrics = Accuracy::new();
    let mut total_loss = 0.0f32;
    let mut batches = 0usize;

    loader.reset();
    while let Some(batch) = loader.next_batch() {
        let logits = run_iter(model, &batch, false)?;
        let loss = loss_fn.forward(&logits, &batch.labels);
        total_loss += loss.item();
        batches += 1;
        metrics.update(&logits, &batch.labels);
    }
    if batches == 0 {
        bail!("no {} examples to evaluate", split);
    }

    let outcome = EvalOutcome {
        accuracy: metrics.score(),
        matches: metrics.matches(),
        total: metrics.total(),
        mean_loss: total_loss / batches as f32,
    };
    println!(
        "{} | loss={:.4}, {}={:.4}",
        split,
        outcome.mean_loss,
        metrics.name(),
        outcome.accuracy
    );
    Ok(outcome)
}
