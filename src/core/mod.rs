//! Core types and errors for the gapped k-mer SVM

pub mod error;
pub mod types;

pub use self::error::*;
pub use self::types::*;
