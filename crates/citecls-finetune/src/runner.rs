//! Single forward iteration over one batch

use anyhow::Result;
use aprender::autograd::{no_grad, Tensor};
use citecls_data::Batch;
use citecls_model::mask::padding_mask;
use citecls_model::SequenceClassifier;

/// Run one forward pass over a batch and return its logits.
///
/// The padding mask is rebuilt from the batch's per-row lengths and
/// padded width. With `training == false` the pass runs without
/// recording the autograd graph; dropout mode flags are the caller's
/// responsibility.
pub fn run_iter(model: &SequenceClassifier, batch: &Batch, training: bool) -> Result<Tensor> {
    let mask = padding_mask(&batch.lengths, batch.width())?;
    if training {
        model.forward(&batch.context, &mask)
    } else {
        no_grad(|| model.forward(&batch.context, &mask))
    }
}
