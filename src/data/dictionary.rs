//! Symbol dictionary mapping sequence characters to small integer codes
//!
//! Codes start at 1; 0 is reserved so a code can never collide with the
//! counting-sort sentinel bucket.

use crate::core::{GksvmError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Ordered alphabet of the corpus. Built from the training sequences when no
/// dictionary file is supplied.
#[derive(Debug, Clone)]
pub struct Dictionary {
    symbols: Vec<u8>,
    codes: [u16; 256],
}

impl Dictionary {
    fn empty() -> Self {
        Self {
            symbols: Vec::new(),
            codes: [0; 256],
        }
    }

    fn insert(&mut self, symbol: u8) {
        let upper = symbol.to_ascii_uppercase();
        if self.codes[upper as usize] == 0 {
            self.symbols.push(upper);
            self.codes[upper as usize] = self.symbols.len() as u16;
        }
    }

    /// Build the dictionary from raw sequences, first-appearance order.
    pub fn from_sequences<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dict = Self::empty();
        for seq in sequences {
            for &b in seq.as_bytes() {
                if !b.is_ascii_whitespace() {
                    dict.insert(b);
                }
            }
        }
        dict
    }

    /// Load a dictionary file: every non-whitespace character, in file order.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path).map_err(GksvmError::IoError)?;
        let reader = BufReader::new(file);
        let mut dict = Self::empty();
        for line in reader.lines() {
            let line = line.map_err(GksvmError::IoError)?;
            for &b in line.as_bytes() {
                if !b.is_ascii_whitespace() {
                    dict.insert(b);
                }
            }
        }
        if dict.is_empty() {
            return Err(GksvmError::ParseError(format!(
                "Dictionary file {} contains no symbols",
                path.as_ref().display()
            )));
        }
        Ok(dict)
    }

    /// Number of distinct symbols; codes run `1..=size()`.
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Code for a symbol, or `None` if it is not in the alphabet.
    pub fn code(&self, symbol: u8) -> Option<u16> {
        match self.codes[symbol.to_ascii_uppercase() as usize] {
            0 => None,
            c => Some(c),
        }
    }

    /// Numericize one sequence. Unknown symbols are reported with their
    /// character and the corpus they came from.
    pub fn encode(&self, sequence: &str, corpus: &str) -> Result<Vec<u16>> {
        let mut out = Vec::with_capacity(sequence.len());
        for &b in sequence.as_bytes() {
            if b.is_ascii_whitespace() {
                continue;
            }
            match self.code(b) {
                Some(c) => out.push(c),
                None => {
                    return Err(GksvmError::ParseError(format!(
                        "Symbol '{}' in {} is not in the dictionary",
                        b as char, corpus
                    )))
                }
            }
        }
        Ok(out)
    }
}
