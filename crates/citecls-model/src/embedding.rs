//! Token embedding lookup

use crate::init::normal_matrix;
use anyhow::{bail, Result};
use aprender::autograd::Tensor;
use aprender::nn::Module;

/// Token embedding table
///
/// The lookup copies rows out of the table, so the table itself receives
/// no gradients and stays fixed during fine-tuning. It is still exposed
/// through `parameters()` so checkpoints carry it.
pub struct TokenEmbedding {
    /// Embedding table [vocab_size, n_embd]
    weight: Tensor,
    vocab_size: usize,
    n_embd: usize,
}

impl TokenEmbedding {
    pub fn new(vocab_size: usize, n_embd: usize, seed: Option<u64>) -> Self {
        let data = normal_matrix(vocab_size, n_embd, 0.02, seed);
        let weight = Tensor::new(&data, &[vocab_size, n_embd]).requires_grad();
        Self {
            weight,
            vocab_size,
            n_embd,
        }
    }

    /// Gather embedding rows for a batch of token ids.
    ///
    /// # Arguments
    /// * `ids` - Token ids [batch, seq], integer values stored as f32
    ///
    /// # Returns
    /// Embedded sequence [batch, seq, n_embd]
    ///
    /// # Errors
    /// Returns an error if the input is not 2D or any id falls outside
    /// the vocabulary.
    pub fn forward(&self, ids: &Tensor) -> Result<Tensor> {
        let shape = ids.shape();
        if shape.len() != 2 {
            bail!("expected 2D token-id tensor, got shape {:?}", shape);
        }
        let (batch, seq) = (shape[0], shape[1]);
        let id_data = ids.data();
        let table = self.weight.data();
        let mut out = vec![0.0f32; batch * seq * self.n_embd];
        for (pos, &raw) in id_data.iter().enumerate() {
            let id = raw as usize;
            if id >= self.vocab_size {
                bail!(
                    "token id {} out of range for vocabulary of size {}",
                    id,
                    self.vocab_size
                );
            }
            let src = id * self.n_embd;
            let dst = pos * self.n_embd;
            out[dst..dst + self.n_embd].copy_from_slice(&table[src..src + self.n_embd]);
        }
        Ok(Tensor::new(&out, &[batch, seq, self.n_embd]))
    }
}

impl Module for TokenEmbedding {
    /// # Panics
    /// Panics if the input is not 2D or contains an out-of-vocabulary
    /// token id. Use [`TokenEmbedding::forward`] to handle these as
    /// errors.
    fn forward(&self, input: &Tensor) -> Tensor {
        self.forward(input).expect("embedding lookup failed")
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weight]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weight]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_shape() {
        let embed = TokenEmbedding::new(10, 4, Some(42));
        let ids = Tensor::new(&[0.0, 1.0, 2.0, 9.0, 3.0, 3.0], &[2, 3]);
        let out = embed.forward(&ids).unwrap();
        assert_eq!(out.shape(), [2, 3, 4]);
    }

    #[test]
    fn test_same_id_same_row() {
        let embed = TokenEmbedding::new(10, 4, Some(42));
        let ids = Tensor::new(&[5.0, 5.0], &[1, 2]);
        let out = embed.forward(&ids).unwrap();
        let data = out.data();
        assert_eq!(&data[0..4], &data[4..8]);
    }

    #[test]
    fn test_out_of_range_id_is_error() {
        let embed = TokenEmbedding::new(10, 4, Some(42));
        let ids = Tensor::new(&[10.0], &[1, 1]);
        assert!(embed.forward(&ids).is_err());
    }
}
