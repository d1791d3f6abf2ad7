//! Corpus loading and sequence encoding
//!
//! Parses labelled sequence corpora, builds or loads the symbol dictionary,
//! and numericizes everything into a single arena shared by train and test.

pub mod corpus;
pub mod dictionary;

pub use self::corpus::{RawCorpus, SequencePool};
pub use self::dictionary::Dictionary;
