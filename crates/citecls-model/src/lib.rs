//! Transformer sequence classifier for citation classification
//!
//! This crate implements a small encoder-only transformer that maps a
//! padded batch of token-id sequences to per-class logits:
//!
//! - [`config`] - Model hyperparameters
//! - [`mask`] - Padding-mask construction and attention-bias expansion
//! - [`embedding`] - Token embedding lookup
//! - [`classifier`] - Encoder stack, masked mean pooling, classification head
//! - [`checkpoint`] - SafeTensors weight persistence with JSON metadata

pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod embedding;
mod init;
pub mod mask;

pub use classifier::SequenceClassifier;
pub use config::ClassifierConfig;
