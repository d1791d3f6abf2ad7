//! Gapped k-mer string-kernel SVM for sequence classification
//!
//! Counts co-occurring gapped k-mers across a merged train+test corpus into
//! a shared triangular kernel matrix, trains a maximum-margin classifier on
//! the train block, and scores the test block with calibrated probabilities.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod persistence;
pub mod predictor;
pub mod solver;
pub mod trainer;

// Re-export main types for convenience
pub use crate::api::Gksvm;
pub use crate::cache::KernelCache;
pub use crate::core::error::{GksvmError, Result};
pub use crate::core::types::*;
pub use crate::data::{Dictionary, RawCorpus, SequencePool};
pub use crate::kernel::{construct_kernel, tri_index, GapPattern, TriMatrix};
pub use crate::persistence::SerializableSession;
pub use crate::predictor::pairwise_auc;
pub use crate::solver::{SmoSolver, SolveResult};
pub use crate::trainer::Model;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
