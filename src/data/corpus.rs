//! Labelled sequence corpora and the shared encoded-sequence arena
//!
//! Corpus files are FASTA-like: a header line `>LABEL` (any integer; values
//! greater than zero map to +1, the rest to -1) followed by the sequence on
//! the next line(s). The arena keeps train sequences first and test
//! sequences second, so a sequence id doubles as its merged matrix index.

use crate::core::{GksvmError, Result};
use crate::data::Dictionary;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A parsed but not yet numericized corpus.
#[derive(Debug, Clone)]
pub struct RawCorpus {
    /// Display name used in diagnostics (file path or array-source tag).
    pub name: String,
    sequences: Vec<String>,
    labels: Vec<i32>,
}

impl RawCorpus {
    /// Parse a corpus file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let file = File::open(&path).map_err(GksvmError::IoError)?;
        Self::from_reader(BufReader::new(file), name)
    }

    /// Parse corpus records from a reader (for testing and flexibility).
    pub fn from_reader<R: BufRead>(reader: R, name: String) -> Result<Self> {
        let mut sequences: Vec<String> = Vec::new();
        let mut labels = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(GksvmError::IoError)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('>') {
                let raw: i32 = header.trim().parse().map_err(|_| {
                    GksvmError::ParseError(format!(
                        "{name}:{}: invalid label '{}'",
                        line_num + 1,
                        header.trim()
                    ))
                })?;
                labels.push(if raw > 0 { 1 } else { -1 });
                sequences.push(String::new());
            } else {
                match sequences.last_mut() {
                    Some(seq) => seq.push_str(line),
                    None => {
                        return Err(GksvmError::ParseError(format!(
                            "{name}:{}: sequence data before the first '>' header",
                            line_num + 1
                        )))
                    }
                }
            }
        }

        if sequences.is_empty() {
            return Err(GksvmError::EmptyCorpus(name));
        }
        if let Some(pos) = sequences.iter().position(|s| s.is_empty()) {
            return Err(GksvmError::ParseError(format!(
                "{name}: record {} has a header but no sequence",
                pos + 1
            )));
        }

        Ok(Self {
            name,
            sequences,
            labels,
        })
    }

    /// Build a corpus from in-memory parallel arrays.
    pub fn from_arrays(name: &str, sequences: &[String], labels: &[i32]) -> Result<Self> {
        if sequences.len() != labels.len() {
            return Err(GksvmError::InvalidParameter(format!(
                "{name}: {} sequences but {} labels",
                sequences.len(),
                labels.len()
            )));
        }
        if sequences.is_empty() {
            return Err(GksvmError::EmptyCorpus(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            sequences: sequences.to_vec(),
            labels: labels.iter().map(|&l| if l > 0 { 1 } else { -1 }).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Iterate over the raw sequence strings.
    pub fn sequences(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(String::as_str)
    }
}

/// One block of the arena, with the statistics the precondition check needs.
#[derive(Debug, Clone)]
struct BlockStats {
    name: String,
    min_len: usize,
    max_len: usize,
}

/// The single owner of every encoded sequence: train ids `0..n_train`, test
/// ids `n_train..total`. Immutable once built.
#[derive(Debug)]
pub struct SequencePool {
    sequences: Vec<Vec<u16>>,
    labels: Vec<i32>,
    n_train: usize,
    dict_size: usize,
    train_stats: BlockStats,
    test_stats: Option<BlockStats>,
}

impl SequencePool {
    /// Numericize train (and optionally test) records into one arena.
    ///
    /// The dictionary is taken from `dict` when given, otherwise built from
    /// the training sequences. Test sequences are always encoded with the
    /// training dictionary; a test symbol outside it means the two corpora
    /// disagree on the alphabet and is reported as a dictionary mismatch.
    pub fn build(
        train: &RawCorpus,
        test: Option<&RawCorpus>,
        dict: Option<Dictionary>,
    ) -> Result<(Self, Dictionary)> {
        let dict = match dict {
            Some(d) => d,
            None => Dictionary::from_sequences(train.sequences()),
        };

        let mut sequences = Vec::with_capacity(train.len() + test.map_or(0, RawCorpus::len));
        let mut labels = Vec::with_capacity(sequences.capacity());

        for (seq, &label) in train.sequences().zip(&train.labels) {
            sequences.push(dict.encode(seq, &train.name)?);
            labels.push(label);
        }
        let n_train = sequences.len();
        let train_stats = block_stats(&train.name, &sequences);

        let test_stats = if let Some(test) = test {
            let test_alphabet = Dictionary::from_sequences(test.sequences());
            for seq in test.sequences() {
                if dict.encode(seq, &test.name).is_err() {
                    return Err(GksvmError::DictionaryMismatch {
                        train: dict.size(),
                        test: test_alphabet.size(),
                    });
                }
            }
            for (seq, &label) in test.sequences().zip(&test.labels) {
                sequences.push(dict.encode(seq, &test.name)?);
                labels.push(label);
            }
            Some(block_stats(&test.name, &sequences[n_train..]))
        } else {
            None
        };

        info!(
            "encoded {} train + {} test sequences over a {}-symbol dictionary",
            n_train,
            sequences.len() - n_train,
            dict.size()
        );

        let pool = Self {
            sequences,
            labels,
            n_train,
            dict_size: dict.size(),
            train_stats,
            test_stats,
        };
        Ok((pool, dict))
    }

    /// Check the window-length precondition against every block, before any
    /// parallel work starts.
    pub fn validate_window(&self, g: usize) -> Result<()> {
        if g > self.train_stats.min_len {
            return Err(GksvmError::WindowTooLong {
                g,
                min_len: self.train_stats.min_len,
                corpus: self.train_stats.name.clone(),
            });
        }
        if let Some(stats) = &self.test_stats {
            if g > stats.min_len {
                return Err(GksvmError::WindowTooLong {
                    g,
                    min_len: stats.min_len,
                    corpus: stats.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.sequences.len()
    }

    pub fn n_train(&self) -> usize {
        self.n_train
    }

    pub fn n_test(&self) -> usize {
        self.sequences.len() - self.n_train
    }

    pub fn dict_size(&self) -> usize {
        self.dict_size
    }

    /// Encoded symbols of one sequence by merged id.
    pub fn sequence(&self, id: usize) -> &[u16] {
        &self.sequences[id]
    }

    pub fn label(&self, id: usize) -> i32 {
        self.labels[id]
    }

    /// Labels of the train block.
    pub fn train_labels(&self) -> &[i32] {
        &self.labels[..self.n_train]
    }

    /// Labels of the test block, in original test order.
    pub fn test_labels(&self) -> &[i32] {
        &self.labels[self.n_train..]
    }

    /// Longest sequence over both blocks.
    pub fn max_len(&self) -> usize {
        let test_max = self.test_stats.as_ref().map_or(0, |s| s.max_len);
        self.train_stats.max_len.max(test_max)
    }
}

fn block_stats(name: &str, sequences: &[Vec<u16>]) -> BlockStats {
    let min_len = sequences.iter().map(Vec::len).min().unwrap_or(0);
    let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
    BlockStats {
        name: name.to_string(),
        min_len,
        max_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn corpus(records: &[(i32, &str)]) -> RawCorpus {
        let text: String = records
            .iter()
            .map(|(label, seq)| format!(">{label}\n{seq}\n"))
            .collect();
        RawCorpus::from_reader(Cursor::new(text), "mem".to_string()).unwrap()
    }

    #[test]
    fn test_parse_fasta_like_corpus() {
        let c = corpus(&[(1, "ACGT"), (0, "GGTA")]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.labels, vec![1, -1]);
    }

    #[test]
    fn test_multiline_sequences_are_joined() {
        let text = ">1\nACG\nTAC\n>0\nGG\n";
        let c = RawCorpus::from_reader(Cursor::new(text), "mem".to_string()).unwrap();
        let seqs: Vec<&str> = c.sequences().collect();
        assert_eq!(seqs, vec!["ACGTAC", "GG"]);
    }

    #[test]
    fn test_sequence_before_header_is_rejected() {
        let err = RawCorpus::from_reader(Cursor::new("ACGT\n"), "mem".to_string()).unwrap_err();
        assert!(matches!(err, GksvmError::ParseError(_)));
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let err = RawCorpus::from_reader(Cursor::new(""), "empty".to_string()).unwrap_err();
        assert!(matches!(err, GksvmError::EmptyCorpus(name) if name == "empty"));
    }

    #[test]
    fn test_pool_orders_train_before_test() {
        let train = corpus(&[(1, "AABB"), (-1, "ABAB")]);
        let test = corpus(&[(1, "ABBB")]);
        let (pool, dict) = SequencePool::build(&train, Some(&test), None).unwrap();

        assert_eq!(pool.total(), 3);
        assert_eq!(pool.n_train(), 2);
        assert_eq!(pool.n_test(), 1);
        assert_eq!(pool.dict_size(), 2);
        assert_eq!(pool.sequence(0), &[1, 1, 2, 2]);
        assert_eq!(pool.sequence(2), &[1, 2, 2, 2]);
        assert_eq!(pool.train_labels(), &[1, -1]);
        assert_eq!(pool.test_labels(), &[1]);
        assert_eq!(dict.size(), 2);
    }

    #[test]
    fn test_window_validation_names_the_offending_corpus() {
        let train = corpus(&[(1, "ABCDEF"), (-1, "ABCDE")]);
        let test = corpus(&[(1, "ABC")]);
        let (pool, _) = SequencePool::build(&train, Some(&test), None).unwrap();

        assert!(pool.validate_window(3).is_ok());
        match pool.validate_window(6) {
            Err(GksvmError::WindowTooLong { g, min_len, corpus }) => {
                assert_eq!(g, 6);
                assert_eq!(min_len, 5);
                assert_eq!(corpus, "mem");
            }
            other => panic!("expected WindowTooLong, got {other:?}"),
        }
    }

    #[test]
    fn test_test_window_checked_too() {
        let train = corpus(&[(1, "ABCDEF")]);
        let test = corpus(&[(1, "ABC")]);
        let (pool, _) = SequencePool::build(&train, Some(&test), None).unwrap();
        match pool.validate_window(4) {
            Err(GksvmError::WindowTooLong { min_len, .. }) => assert_eq!(min_len, 3),
            other => panic!("expected WindowTooLong, got {other:?}"),
        }
    }

    #[test]
    fn test_dictionary_mismatch_between_corpora() {
        let train = corpus(&[(1, "AABB")]);
        let test = corpus(&[(1, "AACX")]);
        let err = SequencePool::build(&train, Some(&test), None).unwrap_err();
        match err {
            GksvmError::DictionaryMismatch { train, test } => {
                assert_eq!(train, 2);
                assert_eq!(test, 3);
            }
            other => panic!("expected DictionaryMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_label_arrays_must_be_parallel() {
        let seqs = vec!["ACGT".to_string()];
        let labels = vec![1, -1];
        assert!(RawCorpus::from_arrays("arrays", &seqs, &labels).is_err());
    }
}
