//! Integration tests for the evaluation loop and iteration runner

use anyhow::Result;
use aprender::nn::Module;
use citecls_data::{BatchLoader, CitationDataset, Example};
use citecls_finetune::eval::{evaluate, EvalSplit};
use citecls_finetune::runner::run_iter;
use citecls_model::{ClassifierConfig, SequenceClassifier};

fn test_model() -> SequenceClassifier {
    SequenceClassifier::new(ClassifierConfig {
        vocab_size: 16,
        max_seq_len: 8,
        n_layer: 1,
        n_head: 2,
        n_embd: 8,
        num_classes: 3,
        dropout: Some(0.0),
        seed: Some(42),
    })
}

fn tiny_examples(n: usize) -> Vec<Example> {
    (0..n)
        .map(|i| Example {
            context: vec![(i % 8) as u32 + 1, ((i + 2) % 8) as u32 + 1],
            label: i % 3,
        })
        .collect()
}

fn unshuffled_loader(n: usize, batch_size: usize) -> Result<BatchLoader> {
    let dataset = CitationDataset::new(tiny_examples(n), 8)?;
    Ok(BatchLoader::new(dataset, batch_size, false, 0)?)
}

#[test]
fn test_evaluation_is_deterministic() -> Result<()> {
    let mut model = test_model();
    let mut loader = unshuffled_loader(6, 2)?;

    let first = evaluate(&mut loader, &mut model, EvalSplit::Valid)?;
    let second = evaluate(&mut loader, &mut model, EvalSplit::Valid)?;

    assert_eq!(first.accuracy, second.accuracy);
    assert_eq!(first.matches, second.matches);
    assert_eq!(first.mean_loss, second.mean_loss);
    Ok(())
}

#[test]
fn test_evaluation_counts_every_example() -> Result<()> {
    let mut model = test_model();
    // Batch size 4 over 6 examples leaves a partial final batch.
    let mut loader = unshuffled_loader(6, 4)?;

    let outcome = evaluate(&mut loader, &mut model, EvalSplit::Test)?;
    assert_eq!(outcome.total, 6);
    assert!(outcome.matches <= outcome.total);
    Ok(())
}

#[test]
fn test_empty_split_is_error() -> Result<()> {
    let mut model = test_model();
    let dataset = CitationDataset::new(Vec::new(), 8)?;
    let mut loader = BatchLoader::new(dataset, 2, false, 0)?;

    assert!(evaluate(&mut loader, &mut model, EvalSplit::Test).is_err());
    Ok(())
}

#[test]
fn test_runner_logits_shape() -> Result<()> {
    let model = test_model();
    let mut loader = unshuffled_loader(4, 4)?;
    let batch = loader.next_batch().unwrap();

    let logits = run_iter(&model, &batch, true)?;
    assert_eq!(logits.shape(), [4, 3]);
    Ok(())
}

#[test]
fn test_runner_inference_matches_training_forward() -> Result<()> {
    // With dropout disabled the no-grad path must produce the same
    // logits as the recorded one.
    let mut model = test_model();
    model.eval();
    let mut loader = unshuffled_loader(4, 4)?;
    let batch = loader.next_batch().unwrap();

    let recorded = run_iter(&model, &batch, true)?;
    let inference = run_iter(&model, &batch, false)?;
    assert_eq!(recorded.data(), inference.data());
    Ok(())
}
