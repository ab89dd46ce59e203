//! Fine-tuning loop with validation-gated checkpointing

use crate::eval::{evaluate, EvalSplit};
use crate::metrics::{Accuracy, ProgressLogger};
use crate::optimizer::{setup_optimizer, update_learning_rate, OptimizerConfig};
use crate::runner::run_iter;
use anyhow::{Context, Result};
use aprender::autograd::clear_graph;
use aprender::nn::loss::CrossEntropyLoss;
use aprender::nn::optim::Optimizer;
use aprender::nn::Module;
use citecls_data::BatchLoader;
use citecls_model::checkpoint::{save_checkpoint, CheckpointMetadata};
use citecls_model::SequenceClassifier;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Training loop parameters
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Global steps between validation passes; 0 disables mid-epoch
    /// validation (the terminal pass still runs)
    pub eval_steps: usize,
    /// Steps between progress lines
    pub log_interval: usize,
    /// Seed recorded in the checkpoint name and metadata
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 3,
            eval_steps: 8000,
            log_interval: 100,
            seed: 0,
        }
    }
}

/// What the training loop observed
#[derive(Debug, Clone)]
pub struct TrainSummary {
    /// Best validation accuracy seen across all validation passes
    pub best_valid_accuracy: f32,
    /// Total optimizer steps taken
    pub steps: usize,
    /// Checkpoint stem the best weights were written to (if any pass
    /// improved on zero)
    pub checkpoint: PathBuf,
}

/// Checkpoint stem for a given seed.
pub fn checkpoint_path(model_dir: &Path, seed: u64) -> PathBuf {
    model_dir.join(format!("fine_tuned_{seed}"))
}

/// Fine-tune the classifier.
///
/// Per batch: forward, cross-entropy loss, backward, one AdamW step.
/// Every `eval_steps` global steps the validation split is scored; the
/// checkpoint is overwritten only when validation accuracy strictly
/// improves on the best seen. A terminal validation pass applies the
/// same gate so interval misalignment never loses the last improvement.
pub fn train(
    model: &mut SequenceClassifier,
    train_loader: &mut BatchLoader,
    valid_loader: &mut BatchLoader,
    training_config: &TrainingConfig,
    optimizer_config: &OptimizerConfig,
    model_dir: &Path,
) -> Result<TrainSummary> {
    std::fs::create_dir_all(model_dir).with_context(|| {
        format!("Failed to create checkpoint directory: {}", model_dir.display())
    })?;

    let mut optimizer = setup_optimizer(model, optimizer_config)?;
    let loss_fn = CrossEntropyLoss::new();
    let checkpoint = checkpoint_path(model_dir, training_config.seed);
    let mut logger = ProgressLogger::new(training_config.log_interval);
    let mut train_metrics = Accuracy::new();
    let mut best_valid_accuracy = 0.0f32;
    let mut step = 0usize;

    for epoch in 0..training_config.epochs {
        model.train();
        train_metrics.reset();
        let mut running_loss = 0.0f32;
        let mut batches = 0usize;

        train_loader.reset();
        while let Some(batch) = train_loader.next_batch() {
            clear_graph();
            let logits = run_iter(model, &batch, true)?;
            let loss = loss_fn.forward(&logits, &batch.labels);
            loss.backward();
            let mut params = model.parameters_mut();
            optimizer.step_with_params(&mut params);
            optimizer.zero_grad();

            step += 1;
            update_learning_rate(&mut optimizer, step, optimizer_config);

            running_loss += loss.item();
            batches += 1;
            train_metrics.update(&logits, &batch.labels);
            logger.log_step(
                running_loss / batches as f32,
                train_metrics.score(),
                optimizer.lr(),
            );

            if training_config.eval_steps > 0 && step % training_config.eval_steps == 0 {
                let outcome = evaluate(valid_loader, model, EvalSplit::Valid)?;
                if outcome.accuracy > best_valid_accuracy {
                    best_valid_accuracy = outcome.accuracy;
                    save_best(
                        model,
                        &checkpoint,
                        step,
                        outcome.accuracy,
                        optimizer.lr(),
                        training_config.seed,
                    )?;
                }
                model.train();
            }
        }

        let epoch_loss = if batches > 0 {
            running_loss / batches as f32
        } else {
            0.0
        };
        println!(
            "Epoch {}: loss={:.4}, acc={:.4}",
            epoch + 1,
            epoch_loss,
            train_metrics.score()
        );
    }

    // Terminal pass so an improvement after the last interval still wins.
    let outcome = evaluate(valid_loader, model, EvalSplit::Valid)?;
    if outcome.accuracy > best_valid_accuracy {
        best_valid_accuracy = outcome.accuracy;
        save_best(
            model,
            &checkpoint,
            step,
            outcome.accuracy,
            optimizer.lr(),
            training_config.seed,
        )?;
    }
    println!("Best validation accuracy: {best_valid_accuracy:.4}");

    Ok(TrainSummary {
        best_valid_accuracy,
        steps: step,
        checkpoint,
    })
}

fn save_best(
    model: &SequenceClassifier,
    path: &Path,
    step: usize,
    accuracy: f32,
    learning_rate: f32,
    seed: u64,
) -> Result<()> {
    let mut extra = HashMap::new();
    extra.insert("seed".to_string(), serde_json::Value::from(seed));
    let metadata = CheckpointMetadata {
        step,
        valid_accuracy: Some(accuracy),
        learning_rate: Some(learning_rate),
        extra,
    };
    save_checkpoint(model, path, Some(metadata))
        .with_context(|| format!("Failed to save checkpoint: {}", path.display()))
}
