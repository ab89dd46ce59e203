//! Dataset wrapper and shuffling batch loader

use crate::splits::Example;
use anyhow::{bail, Result};
use aprender::autograd::Tensor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// One collated batch
///
/// `context` is padded to the batch's widest (truncated) example;
/// `lengths` holds the real length of each row so callers can rebuild
/// the padding mask. `labels` stores class indices as f32 for the loss.
#[derive(Debug)]
pub struct Batch {
    /// Token ids [batch, width]
    pub context: Tensor,
    /// Real length of each row
    pub lengths: Vec<usize>,
    /// Class indices [batch]
    pub labels: Tensor,
}

impl Batch {
    pub fn size(&self) -> usize {
        self.lengths.len()
    }

    /// Padded width of the batch.
    pub fn width(&self) -> usize {
        self.context.shape()[1]
    }
}

/// Examples bounded by a maximum sequence length
///
/// Longer contexts are truncated at collation time, never rejected.
pub struct CitationDataset {
    examples: Vec<Example>,
    max_seq_len: usize,
}

impl CitationDataset {
    pub fn new(examples: Vec<Example>, max_seq_len: usize) -> Result<Self> {
        if max_seq_len == 0 {
            bail!("max_seq_len must be positive");
        }
        Ok(Self {
            examples,
            max_seq_len,
        })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Collate the examples at `indices` into a padded batch.
    fn collate(&self, indices: &[usize]) -> Batch {
        let lengths: Vec<usize> = indices
            .iter()
            .map(|&i| self.examples[i].context.len().min(self.max_seq_len))
            .collect();
        let width = lengths.iter().copied().max().unwrap_or(1);

        let mut ids = vec![0.0f32; indices.len() * width];
        let mut labels = Vec::with_capacity(indices.len());
        for (row, (&i, &len)) in indices.iter().zip(&lengths).enumerate() {
            let example = &self.examples[i];
            for (col, &tok) in example.context[..len].iter().enumerate() {
                ids[row * width + col] = tok as f32;
            }
            labels.push(example.label as f32);
        }

        Batch {
            context: Tensor::new(&ids, &[indices.len(), width]),
            lengths,
            labels: Tensor::new(&labels, &[indices.len()]),
        }
    }
}

/// Batch iterator over a dataset
///
/// With `shuffle` the visit order is re-drawn from the seeded RNG on
/// every `reset`, one draw per epoch. The final batch may be smaller
/// than `batch_size`.
pub struct BatchLoader {
    dataset: CitationDataset,
    batch_size: usize,
    shuffle: bool,
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl BatchLoader {
    pub fn new(
        dataset: CitationDataset,
        batch_size: usize,
        shuffle: bool,
        seed: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch_size must be positive");
        }
        let mut loader = Self {
            order: (0..dataset.len()).collect(),
            dataset,
            batch_size,
            shuffle,
            cursor: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        if loader.shuffle {
            loader.order.shuffle(&mut loader.rng);
        }
        Ok(loader)
    }

    /// Next batch in the current epoch, or `None` when exhausted.
    pub fn next_batch(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.dataset.collate(&self.order[self.cursor..end]);
        self.cursor = end;
        Some(batch)
    }

    /// Rewind for the next epoch, reshuffling when enabled.
    pub fn reset(&mut self) {
        self.cursor = 0;
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }

    pub fn num_batches(&self) -> usize {
        (self.dataset.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn num_examples(&self) -> usize {
        self.dataset.len()
    }
}
