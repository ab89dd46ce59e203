//! Fine-tuning and evaluation pipeline for the citation classifier
//!
//! - [`metrics`] - Accuracy accumulator and progress logging
//! - [`optimizer`] - AdamW setup and learning-rate schedule
//! - [`runner`] - Single forward iteration over one batch
//! - [`train`] - Epoch loop with validation-gated checkpointing
//! - [`eval`] - Inference-only pass over a held-out split
//! - [`report`] - Final evaluation report

pub mod eval;
pub mod metrics;
pub mod optimizer;
pub mod report;
pub mod runner;
pub mod train;
