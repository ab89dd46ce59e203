//! Integration tests for the fine-tuning loop

use anyhow::Result;
use citecls_data::{BatchLoader, CitationDataset, Example};
use citecls_finetune::eval::{evaluate, EvalSplit};
use citecls_finetune::optimizer::OptimizerConfig;
use citecls_finetune::train::{checkpoint_path, train, TrainingConfig};
use citecls_model::checkpoint::load_checkpoint;
use citecls_model::{ClassifierConfig, SequenceClassifier};
use tempfile::TempDir;

fn test_model() -> SequenceClassifier {
    SequenceClassifier::new(ClassifierConfig {
        vocab_size: 16,
        max_seq_len: 8,
        n_layer: 1,
        n_head: 2,
        n_embd: 8,
        num_classes: 2,
        dropout: Some(0.0),
        seed: Some(42),
    })
}

fn tiny_examples(n: usize) -> Vec<Example> {
    (0..n)
        .map(|i| Example {
            context: vec![(i % 8) as u32 + 1, ((i + 3) % 8) as u32 + 1, 1],
            label: i % 2,
        })
        .collect()
}

fn loader(examples: Vec<Example>, batch_size: usize, shuffle: bool) -> Result<BatchLoader> {
    let dataset = CitationDataset::new(examples, 8)?;
    Ok(BatchLoader::new(dataset, batch_size, shuffle, 7)?)
}

/// Identical contexts carrying both labels: a deterministic model
/// predicts the same class for each pair, so validation accuracy is
/// pinned at exactly 0.5 no matter what the weights do.
fn ambiguous_pairs() -> Vec<Example> {
    vec![
        Example {
            context: vec![1, 2],
            label: 0,
        },
        Example {
            context: vec![1, 2],
            label: 1,
        },
        Example {
            context: vec![3, 4],
            label: 0,
        },
        Example {
            context: vec![3, 4],
            label: 1,
        },
    ]
}

#[test]
fn test_step_count_and_checkpoint_gate() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut model = test_model();
    let mut train_loader = loader(tiny_examples(8), 2, true)?;
    let mut valid_loader = loader(tiny_examples(4), 2, false)?;

    // 8 examples / batch 2 / 1 epoch: exactly 4 steps, so eval_steps=4
    // triggers one mid-run validation plus the terminal one.
    let training_config = TrainingConfig {
        epochs: 1,
        eval_steps: 4,
        log_interval: 1,
        seed: 0,
    };
    let optimizer_config = OptimizerConfig {
        learning_rate: 1e-3,
        ..OptimizerConfig::default()
    };

    let summary = train(
        &mut model,
        &mut train_loader,
        &mut valid_loader,
        &training_config,
        &optimizer_config,
        temp_dir.path(),
    )?;

    assert_eq!(summary.steps, 4);
    assert_eq!(summary.checkpoint, checkpoint_path(temp_dir.path(), 0));

    // The checkpoint exists exactly when some validation pass beat 0.
    let weights = summary.checkpoint.with_extension("safetensors");
    assert_eq!(weights.exists(), summary.best_valid_accuracy > 0.0);
    Ok(())
}

#[test]
fn test_terminal_validation_applies_gate() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut model = test_model();
    let mut train_loader = loader(tiny_examples(6), 2, true)?;
    let mut valid_loader = loader(tiny_examples(4), 2, false)?;

    // eval_steps far beyond the run: only the terminal pass can score.
    let training_config = TrainingConfig {
        epochs: 1,
        eval_steps: 100,
        log_interval: 0,
        seed: 3,
    };
    let optimizer_config = OptimizerConfig::default();

    let summary = train(
        &mut model,
        &mut train_loader,
        &mut valid_loader,
        &training_config,
        &optimizer_config,
        temp_dir.path(),
    )?;
    assert_eq!(summary.steps, 3);

    // The terminal pass scored the final weights, so re-scoring them
    // reproduces the recorded best.
    let outcome = evaluate(&mut valid_loader, &mut model, EvalSplit::Valid)?;
    assert!((outcome.accuracy - summary.best_valid_accuracy).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_checkpoint_metadata_records_validation() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut model = test_model();
    let mut train_loader = loader(tiny_examples(6), 2, true)?;
    let mut valid_loader = loader(tiny_examples(4), 2, false)?;

    let training_config = TrainingConfig {
        epochs: 1,
        eval_steps: 0,
        log_interval: 0,
        seed: 5,
    };
    let summary = train(
        &mut model,
        &mut train_loader,
        &mut valid_loader,
        &training_config,
        &OptimizerConfig::default(),
        temp_dir.path(),
    )?;

    let stem = checkpoint_path(temp_dir.path(), 5);
    if stem.with_extension("safetensors").exists() {
        let (_, metadata) = load_checkpoint(&stem)?;
        assert_eq!(metadata.step, summary.steps);
        assert_eq!(metadata.valid_accuracy, Some(summary.best_valid_accuracy));
        assert_eq!(
            metadata.extra.get("seed").and_then(|v| v.as_u64()),
            Some(5)
        );
    } else {
        assert_eq!(summary.best_valid_accuracy, 0.0);
    }
    Ok(())
}

#[test]
fn test_non_improving_passes_leave_checkpoint_untouched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut model = test_model();
    let mut train_loader = loader(tiny_examples(8), 2, true)?;
    let mut valid_loader = loader(ambiguous_pairs(), 2, false)?;

    // Every validation pass scores exactly 0.5, so the pass at step 2
    // writes the checkpoint and the equal-accuracy passes at step 4 and
    // after the epoch must not overwrite it.
    let training_config = TrainingConfig {
        epochs: 1,
        eval_steps: 2,
        log_interval: 0,
        seed: 11,
    };
    let summary = train(
        &mut model,
        &mut train_loader,
        &mut valid_loader,
        &training_config,
        &OptimizerConfig::default(),
        temp_dir.path(),
    )?;

    assert_eq!(summary.steps, 4);
    assert_eq!(summary.best_valid_accuracy, 0.5);

    let (_, metadata) = load_checkpoint(&checkpoint_path(temp_dir.path(), 11))?;
    assert_eq!(metadata.step, 2);
    assert_eq!(metadata.valid_accuracy, Some(0.5));
    Ok(())
}

#[test]
fn test_empty_validation_split_is_fatal() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut model = test_model();
    let mut train_loader = loader(tiny_examples(2), 2, true)?;
    let mut valid_loader = loader(Vec::new(), 2, false)?;

    let result = train(
        &mut model,
        &mut train_loader,
        &mut valid_loader,
        &TrainingConfig {
            epochs: 1,
            eval_steps: 0,
            log_interval: 0,
            seed: 0,
        },
        &OptimizerConfig::default(),
        temp_dir.path(),
    );
    assert!(result.is_err());
    Ok(())
}
