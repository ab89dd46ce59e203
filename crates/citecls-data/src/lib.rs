//! Data loading for citation classification
//!
//! - [`splits`] - JSON data config naming the train/valid/test files,
//!   each a JSONL file of pre-tokenized examples
//! - [`dataset`] - Length-bounded dataset, batch collation, and the
//!   shuffling batch loader

pub mod dataset;
pub mod splits;

pub use dataset::{Batch, BatchLoader, CitationDataset};
pub use splits::{load_splits, DataConfig, Example, Splits};
