//! Fine-tuning entry point for the citation classifier
//!
//! # Usage
//!
//! ```bash
//! citecls-finetune \
//!   --config config.json \
//!   [--num-classes 40] \
//!   [--max-seq-length 400] \
//!   [--batch-size 4] \
//!   [--lr 2e-5] \
//!   [--epochs 3] \
//!   [--seed 0] \
//!   [--eval-steps 8000] \
//!   [--pretrain-model checkpoints/base] \
//!   [--model-dir models]
//! ```
//!
//! The data config is a JSON file naming the train/valid/test JSONL
//! split files. The best checkpoint lands at
//! `<model-dir>/fine_tuned_<seed>.{safetensors,json}`.

use anyhow::{bail, Context, Result};
use citecls_data::{load_splits, BatchLoader, CitationDataset};
use citecls_finetune::eval::{evaluate, EvalSplit};
use citecls_finetune::optimizer::OptimizerConfig;
use citecls_finetune::report::{EvaluationReport, SplitResult};
use citecls_finetune::train::{checkpoint_path, train, TrainingConfig};
use citecls_model::checkpoint::load_checkpoint;
use citecls_model::{ClassifierConfig, SequenceClassifier};
use clap::Parser;
use std::path::PathBuf;

/// Fine-tune the citation classifier on pre-tokenized splits
#[derive(Parser, Debug)]
#[command(name = "citecls-finetune")]
#[command(about = "Fine-tune the citation classifier", long_about = None)]
struct Args {
    /// Path to the JSON data config naming the split files
    #[arg(long, value_name = "PATH", default_value = "config.json")]
    config: PathBuf,

    /// Number of target classes
    #[arg(long, default_value = "40")]
    num_classes: usize,

    /// Maximum token sequence length per example
    #[arg(long, default_value = "400")]
    max_seq_length: usize,

    /// Batch size for all three loaders
    #[arg(long, default_value = "4")]
    batch_size: usize,

    /// AdamW learning rate
    #[arg(long, default_value = "2e-5")]
    lr: f32,

    /// Number of training epochs
    #[arg(long, default_value = "3")]
    epochs: usize,

    /// Seed for shuffling and weight initialization
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Global steps between validation passes
    #[arg(long, default_value = "8000")]
    eval_steps: usize,

    /// Steps between progress lines
    #[arg(long, default_value = "100")]
    log_interval: usize,

    /// Checkpoint to initialize from (SafeTensors + JSON metadata stem)
    #[arg(long, value_name = "PATH")]
    pretrain_model: Option<PathBuf>,

    /// Directory for fine-tuned checkpoints and the report
    #[arg(long, value_name = "PATH", default_value = "models")]
    model_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.model_dir.is_dir() {
        println!(
            "Checkpoint directory {} already exists",
            args.model_dir.display()
        );
    } else {
        std::fs::create_dir_all(&args.model_dir).with_context(|| {
            format!(
                "Failed to create checkpoint directory: {}",
                args.model_dir.display()
            )
        })?;
    }

    let splits = load_splits(&args.config)
        .with_context(|| format!("Failed to load data splits from: {}", args.config.display()))?;
    println!(
        "Loaded {} train / {} valid / {} test examples",
        splits.train.len(),
        splits.valid.len(),
        splits.test.len()
    );

    let mut model = match &args.pretrain_model {
        Some(path) => {
            let (model, _metadata) = load_checkpoint(path).with_context(|| {
                format!("Failed to load pretrained checkpoint: {}", path.display())
            })?;
            if model.num_classes() != args.num_classes {
                bail!(
                    "Pretrained checkpoint has {} classes, expected {}",
                    model.num_classes(),
                    args.num_classes
                );
            }
            println!("Initialized from checkpoint: {}", path.display());
            model
        }
        None => {
            let vocab_size = splits.max_token_id().map_or(1, |id| id as usize + 1);
            let config = ClassifierConfig {
                vocab_size,
                max_seq_len: args.max_seq_length,
                num_classes: args.num_classes,
                seed: Some(args.seed),
                ..ClassifierConfig::default()
            };
            SequenceClassifier::new(config)
        }
    };

    let mut train_loader = BatchLoader::new(
        CitationDataset::new(splits.train, args.max_seq_length)?,
        args.batch_size,
        true,
        args.seed,
    )?;
    let mut valid_loader = BatchLoader::new(
        CitationDataset::new(splits.valid, args.max_seq_length)?,
        args.batch_size,
        false,
        args.seed,
    )?;
    let mut test_loader = BatchLoader::new(
        CitationDataset::new(splits.test, args.max_seq_length)?,
        args.batch_size,
        false,
        args.seed,
    )?;

    let training_config = TrainingConfig {
        epochs: args.epochs,
        eval_steps: args.eval_steps,
        log_interval: args.log_interval,
        seed: args.seed,
    };
    let optimizer_config = OptimizerConfig {
        learning_rate: args.lr,
        ..OptimizerConfig::default()
    };

    let summary = train(
        &mut model,
        &mut train_loader,
        &mut valid_loader,
        &training_config,
        &optimizer_config,
        &args.model_dir,
    )
    .context("Training failed")?;

    // Test the best checkpoint when one was written, otherwise the
    // final weights.
    let best = checkpoint_path(&args.model_dir, args.seed);
    let mut model = if best.with_extension("safetensors").exists() {
        let (model, _) = load_checkpoint(&best)
            .with_context(|| format!("Failed to reload best checkpoint: {}", best.display()))?;
        model
    } else {
        println!("No checkpoint improved on validation; testing final weights");
        model
    };

    let valid_outcome = evaluate(&mut valid_loader, &mut model, EvalSplit::Valid)?;
    let test_outcome = evaluate(&mut test_loader, &mut model, EvalSplit::Test)?;
    println!("Test accuracy: {:.4}", test_outcome.accuracy);

    let report = EvaluationReport::generate(
        &[
            SplitResult::new("validation", valid_outcome.total, valid_outcome.matches),
            SplitResult::new("testing", test_outcome.total, test_outcome.matches),
        ],
        summary.best_valid_accuracy,
    );
    let report_path = args.model_dir.join("report.json");
    report.write_json(&report_path)?;
    println!("Report written to {}", report_path.display());

    Ok(())
}
