//! Encoder stack, masked mean pooling, and classification head

use crate::config::ClassifierConfig;
use crate::embedding::TokenEmbedding;
use crate::mask::attention_bias;
use anyhow::{bail, Result};
use aprender::autograd::Tensor;
use aprender::nn::{
    LayerNorm, Linear, Module, PositionalEncoding, TransformerEncoderLayer,
};

/// Transformer sequence classifier
///
/// Pipeline: token embedding, sinusoidal positional encoding, pre-norm
/// encoder layers with padding-masked attention, final layer norm, mean
/// pooling over unmasked positions, linear head to class logits.
pub struct SequenceClassifier {
    config: ClassifierConfig,
    embed: TokenEmbedding,
    pos: PositionalEncoding,
    layers: Vec<TransformerEncoderLayer>,
    norm: LayerNorm,
    head: Linear,
    training: bool,
}

impl SequenceClassifier {
    /// Create a classifier from a configuration.
    ///
    /// # Panics
    /// Panics if `n_embd` is not divisible by `n_head`.
    pub fn new(config: ClassifierConfig) -> Self {
        let dropout = config.dropout.unwrap_or(0.0);
        let embed = TokenEmbedding::new(config.vocab_size, config.n_embd, config.seed);
        let pos = PositionalEncoding::new(config.n_embd, config.max_seq_len).with_dropout(dropout);
        let layers = (0..config.n_layer)
            .map(|_| {
                TransformerEncoderLayer::new(config.n_embd, config.n_head, 4 * config.n_embd)
                    .with_dropout(dropout)
            })
            .collect();
        let norm = LayerNorm::new(&[config.n_embd]);
        let head = Linear::with_seed(config.n_embd, config.num_classes, config.seed);

        Self {
            config,
            embed,
            pos,
            layers,
            norm,
            head,
            training: true,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn num_classes(&self) -> usize {
        self.config.num_classes
    }

    /// Forward pass over a padded batch.
    ///
    /// # Arguments
    /// * `context` - Token ids [batch, seq]
    /// * `mask` - 0/1 padding mask [batch, seq]
    ///
    /// # Returns
    /// Class logits [batch, num_classes]
    pub fn forward(&self, context: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let shape = context.shape();
        if shape.len() != 2 {
            bail!("expected 2D token-id tensor, got shape {:?}", shape);
        }
        let (batch, seq) = (shape[0], shape[1]);
        if mask.shape() != [batch, seq] {
            bail!(
                "mask shape {:?} does not match input shape {:?}",
                mask.shape(),
                shape
            );
        }
        if seq > self.config.max_seq_len {
            bail!(
                "sequence length {} exceeds maximum {}",
                seq,
                self.config.max_seq_len
            );
        }

        let x = self.embed.forward(context)?;
        let mut x = self.pos.forward(&x);

        let bias = attention_bias(mask, self.config.n_head);
        for layer in &self.layers {
            x = layer.forward_with_mask(&x, Some(&bias));
        }
        let x = self.norm.forward(&x);

        let pooled = self.mean_pool(&x, mask)?;
        Ok(self.head.forward(&pooled))
    }

    /// Mean-pool hidden states over unmasked positions.
    ///
    /// Implemented as a constant pooling matrix [batch, batch * seq]
    /// against the flattened hidden states, so gradients flow back into
    /// the encoder through the matmul.
    fn mean_pool(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let shape = hidden.shape();
        let (batch, seq, embd) = (shape[0], shape[1], shape[2]);
        let mask_data = mask.data();
        let mut weights = vec![0.0f32; batch * batch * seq];
        for i in 0..batch {
            let row = &mask_data[i * seq..(i + 1) * seq];
            let count: f32 = row.iter().sum();
            if count == 0.0 {
                bail!("example {} has no unmasked positions", i);
            }
            for (j, &m) in row.iter().enumerate() {
                weights[i * batch * seq + i * seq + j] = m / count;
            }
        }
        let pool = Tensor::new(&weights, &[batch, batch * seq]);
        let flat = hidden.view(&[batch * seq, embd]);
        Ok(pool.matmul(&flat))
    }
}

impl Module for SequenceClassifier {
    /// Forward with an all-ones mask (no padding).
    ///
    /// # Panics
    /// Panics if the fallible forward fails, e.g. on a non-2D input,
    /// an overlong sequence, or an out-of-vocabulary token id. Use
    /// [`SequenceClassifier::forward`] to handle these as errors.
    fn forward(&self, input: &Tensor) -> Tensor {
        let shape = input.shape();
        let mask = Tensor::ones(&[shape[0], shape[1]]);
        self.forward(input, &mask).expect("classifier forward failed")
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = self.embed.parameters();
        for layer in &self.layers {
            params.extend(layer.parameters());
        }
        params.extend(self.norm.parameters());
        params.extend(self.head.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = self.embed.parameters_mut();
        for layer in &mut self.layers {
            params.extend(layer.parameters_mut());
        }
        params.extend(self.norm.parameters_mut());
        params.extend(self.head.parameters_mut());
        params
    }

    fn train(&mut self) {
        self.training = true;
        self.pos.train();
        for layer in &mut self.layers {
            layer.train();
        }
    }

    fn eval(&mut self) {
        self.training = false;
        self.pos.eval();
        for layer in &mut self.layers {
            layer.eval();
        }
    }

    fn training(&self) -> bool {
        self.training
    }
}
