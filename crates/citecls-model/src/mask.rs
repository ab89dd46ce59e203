//! Padding-mask construction
//!
//! Batches are padded to a common width; the mask distinguishes real
//! positions from padding so attention and pooling ignore the latter.

use anyhow::Result;
use aprender::autograd::Tensor;

/// Build a `[batch, max_len]` 0/1 mask from per-example lengths.
///
/// Row `i` is 1.0 for the first `lengths[i]` positions and 0.0 after.
/// A row whose length equals `max_len` is all ones.
///
/// # Errors
/// Returns an error if any length exceeds `max_len`.
pub fn padding_mask(lengths: &[usize], max_len: usize) -> Result<Tensor> {
    let batch = lengths.len();
    let mut data = vec![0.0f32; batch * max_len];
    for (i, &len) in lengths.iter().enumerate() {
        if len > max_len {
            anyhow::bail!(
                "example length {} exceeds padded width {}",
                len,
                max_len
            );
        }
        for slot in &mut data[i * max_len..i * max_len + len] {
            *slot = 1.0;
        }
    }
    Ok(Tensor::new(&data, &[batch, max_len]))
}

/// Expand a `[batch, seq]` padding mask into the additive attention bias
/// consumed by the encoder.
///
/// Output shape is `[batch, n_head, seq, seq]`: columns for padded key
/// positions are `-inf`, everything else 0. The shape must match the
/// attention score tensor exactly; the scores' broadcast path does not
/// handle partial shapes.
pub fn attention_bias(mask: &Tensor, n_head: usize) -> Tensor {
    let shape = mask.shape();
    let (batch, seq) = (shape[0], shape[1]);
    let mask_data = mask.data();
    let mut data = vec![0.0f32; batch * n_head * seq * seq];
    for b in 0..batch {
        for k in 0..seq {
            if mask_data[b * seq + k] != 0.0 {
                continue;
            }
            for h in 0..n_head {
                let base = ((b * n_head + h) * seq) * seq;
                for q in 0..seq {
                    data[base + q * seq + k] = f32::NEG_INFINITY;
                }
            }
        }
    }
    Tensor::new(&data, &[batch, n_head, seq, seq])
}
