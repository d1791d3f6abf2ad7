//! High-level API for gapped k-mer SVM classification
//!
//! A [`Gksvm`] session owns the configuration, builds the kernel matrix
//! during `fit`, and scores the held-out test block during `predict`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gksvm::api::Gksvm;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut svm = Gksvm::new(7, 2)?
//!     .with_kernel_name("gakco")?
//!     .with_c(1.0);
//! svm.fit("train.fasta", Some("test.fasta"), None::<&str>, None::<&str>)?;
//! let report = svm.predict("predictions.txt")?;
//! println!("accuracy: {:.4}, auc: {:.4}", report.accuracy, report.auc);
//! # Ok(())
//! # }
//! ```

use crate::core::{GksvmConfig, GksvmError, KernelSpec, PredictionReport, Result};
use crate::data::{Dictionary, RawCorpus, SequencePool};
use crate::kernel::{construct_kernel, TriMatrix};
use crate::predictor;
use crate::trainer::{train_model, Model};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Everything `predict` needs, produced once by `fit`.
#[derive(Debug)]
pub(crate) struct FittedState {
    pub(crate) matrix: Arc<TriMatrix>,
    pub(crate) model: Model,
    pub(crate) test_labels: Vec<i32>,
}

/// A gapped k-mer SVM classification session.
#[derive(Debug)]
pub struct Gksvm {
    config: GksvmConfig,
    state: Option<FittedState>,
}

impl Gksvm {
    /// Create a session for window length `g` and mismatch budget `m`.
    pub fn new(g: usize, m: usize) -> Result<Self> {
        Ok(Self {
            config: GksvmConfig::new(g, m)?,
            state: None,
        })
    }

    /// Select the kernel family by wire name; unknown names fail before any
    /// computation.
    pub fn with_kernel_name(mut self, name: &str) -> Result<Self> {
        self.config.kernel = name.parse()?;
        Ok(self)
    }

    pub fn with_kernel(mut self, kernel: KernelSpec) -> Self {
        self.config.kernel = kernel;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    pub fn with_nu(mut self, nu: f64) -> Self {
        self.config.nu = nu;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.config.eps = eps;
        self
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.config.num_threads = num_threads;
        self
    }

    pub fn with_shards(mut self, num_shards: usize) -> Self {
        self.config.num_shards = num_shards;
        self
    }

    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.config.shrinking = shrinking;
        self
    }

    pub fn with_probability(mut self, probability: bool) -> Self {
        self.config.probability = probability;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }

    pub fn config(&self) -> &GksvmConfig {
        &self.config
    }

    /// Build the kernel matrix from corpus files and train the model.
    pub fn fit<P: AsRef<Path>>(
        &mut self,
        train_path: P,
        test_path: Option<P>,
        dict_path: Option<P>,
        kernel_dump_path: Option<P>,
    ) -> Result<()> {
        let train = RawCorpus::from_file(&train_path)?;
        let test = match &test_path {
            Some(path) => Some(RawCorpus::from_file(path)?),
            None => None,
        };
        let dict = match &dict_path {
            Some(path) => Some(Dictionary::from_file(path)?),
            None => None,
        };
        self.fit_corpora(train, test, dict, kernel_dump_path)
    }

    /// In-memory variant of `fit`: parallel arrays of raw sequences and ±1
    /// labels for train and test.
    pub fn fit_from_arrays(
        &mut self,
        train_sequences: &[String],
        train_labels: &[i32],
        test_sequences: &[String],
        test_labels: &[i32],
        kernel_dump_path: Option<&Path>,
    ) -> Result<()> {
        let train = RawCorpus::from_arrays("train arrays", train_sequences, train_labels)?;
        let test = if test_sequences.is_empty() {
            None
        } else {
            Some(RawCorpus::from_arrays(
                "test arrays",
                test_sequences,
                test_labels,
            )?)
        };
        self.fit_corpora(train, test, None, kernel_dump_path)
    }

    fn fit_corpora<P: AsRef<Path>>(
        &mut self,
        train: RawCorpus,
        test: Option<RawCorpus>,
        dict: Option<Dictionary>,
        kernel_dump_path: Option<P>,
    ) -> Result<()> {
        // Row kernels size their working structures over train+test rows,
        // so the test corpus is mandatory for them.
        if self.config.kernel.requires_test_corpus() && test.is_none() {
            return Err(GksvmError::MissingTestCorpus(self.config.kernel.name()));
        }

        let (pool, _dict) = SequencePool::build(&train, test.as_ref(), dict)?;
        pool.validate_window(self.config.g)?;

        let matrix = Arc::new(construct_kernel(&pool, &self.config)?);

        if let Some(path) = kernel_dump_path {
            info!("writing kernel to {}", path.as_ref().display());
            dump_kernel(&matrix, path)?;
        }

        let model = train_model(&matrix, pool.train_labels(), &self.config)?;
        self.state = Some(FittedState {
            matrix,
            model,
            test_labels: pool.test_labels().to_vec(),
        });
        Ok(())
    }

    /// Score the test block, write one integer label per line to
    /// `predictions_path`, and return the aggregate report.
    pub fn predict<P: AsRef<Path>>(&self, predictions_path: P) -> Result<PredictionReport> {
        let state = self.state.as_ref().ok_or(GksvmError::ModelNotTrained)?;
        let report = predictor::evaluate(&state.matrix, &state.model, &state.test_labels);
        predictor::write_labels(&report, predictions_path)?;

        if !self.config.quiet {
            eprintln!("Accuracy: {:.6}", report.accuracy);
            eprintln!("AUC: {:.6}", report.auc);
            eprintln!(
                "false positives: {}\tfalse negatives: {}",
                report.false_positives, report.false_negatives
            );
            eprintln!(
                "num positive: {} ({:.4} of test set)",
                report.num_positive,
                report.percent_positive()
            );
        }
        Ok(report)
    }

    /// The trained model, if `fit` has run.
    pub fn model(&self) -> Option<&Model> {
        self.state.as_ref().map(|s| &s.model)
    }

    /// The frozen kernel matrix, if `fit` has run.
    pub fn kernel_matrix(&self) -> Option<&TriMatrix> {
        self.state.as_ref().map(|s| s.matrix.as_ref())
    }

    /// True labels of the test block, if `fit` has run.
    pub fn test_labels(&self) -> Option<&[i32]> {
        self.state.as_ref().map(|s| s.test_labels.as_slice())
    }

    pub(crate) fn from_parts(
        config: GksvmConfig,
        matrix: TriMatrix,
        model: Model,
        test_labels: Vec<i32>,
    ) -> Self {
        Self {
            config,
            state: Some(FittedState {
                matrix: Arc::new(matrix),
                model,
                test_labels,
            }),
        }
    }
}

/// Solver-compatible sparse-row dump: every column of every row emitted as
/// `"<j+1>:<value> "` with a scientific-notation value, one line per row.
fn dump_kernel<P: AsRef<Path>>(matrix: &TriMatrix, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let n = matrix.n();
    for i in 0..n {
        for j in 0..n {
            write!(writer, "{}:{:e} ", j + 1, matrix.value(i, j))?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn corpus_file(records: &[(i32, &str)]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        for (label, seq) in records {
            writeln!(file, ">{label}\n{seq}").expect("write");
        }
        file.flush().expect("flush");
        file
    }

    fn train_file() -> NamedTempFile {
        corpus_file(&[
            (1, "AAAAAA"),
            (1, "AAABAA"),
            (1, "AABAAA"),
            (-1, "BBBBBB"),
            (-1, "BBABBB"),
            (-1, "BBBABB"),
        ])
    }

    fn test_file() -> NamedTempFile {
        corpus_file(&[(1, "AAAABA"), (-1, "BBBBAB")])
    }

    #[test]
    fn test_builder_configures_the_session() {
        let svm = Gksvm::new(6, 2)
            .unwrap()
            .with_kernel_name("gakco")
            .unwrap()
            .with_c(2.0)
            .with_eps(0.01)
            .with_threads(2)
            .with_quiet(true);
        assert_eq!(svm.config().kernel, KernelSpec::ExactKmer);
        assert_eq!(svm.config().c, 2.0);
        assert_eq!(svm.config().eps, 0.01);
        assert_eq!(svm.config().num_threads, 2);
    }

    #[test]
    fn test_unknown_kernel_name_fails_before_fit() {
        let err = Gksvm::new(4, 1)
            .unwrap()
            .with_kernel_name("sigmoid")
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_linear_kernel_requires_a_test_corpus() {
        let mut svm = Gksvm::new(2, 0).unwrap().with_quiet(true);
        let train = train_file();
        let err = svm
            .fit(train.path(), None, None, None)
            .unwrap_err();
        assert!(matches!(err, GksvmError::MissingTestCorpus("linear")));
    }

    #[test]
    fn test_gakco_fit_and_predict_end_to_end() {
        let train = train_file();
        let test = test_file();
        let mut svm = Gksvm::new(2, 0)
            .unwrap()
            .with_kernel_name("gakco")
            .unwrap()
            .with_quiet(true);
        svm.fit(train.path(), Some(test.path()), None, None).unwrap();

        let out = NamedTempFile::new().expect("temp file");
        let report = svm.predict(out.path()).unwrap();
        assert_eq!(report.predictions.len(), 2);
        assert!(report.accuracy >= 0.5);
        assert!((0.0..=1.0).contains(&report.auc));

        let lines: Vec<String> = fs::read_to_string(out.path())
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(line == "1" || line == "-1" || line == "0");
        }
    }

    #[test]
    fn test_predict_before_fit_is_an_error() {
        let svm = Gksvm::new(3, 1).unwrap();
        let out = NamedTempFile::new().expect("temp file");
        assert!(matches!(
            svm.predict(out.path()),
            Err(GksvmError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_fit_from_arrays_matches_file_based_fit() {
        let train_seqs: Vec<String> = ["AAAAAA", "AAABAA", "BBBBBB", "BBABBB"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let train_labels = vec![1, 1, -1, -1];
        let test_seqs = vec!["AABAAA".to_string(), "BBBABB".to_string()];
        let test_labels = vec![1, -1];

        let mut svm = Gksvm::new(2, 0)
            .unwrap()
            .with_kernel_name("gakco")
            .unwrap()
            .with_quiet(true);
        svm.fit_from_arrays(&train_seqs, &train_labels, &test_seqs, &test_labels, None)
            .unwrap();
        assert!(svm.model().is_some());
        assert_eq!(svm.test_labels(), Some(&test_labels[..]));
    }

    #[test]
    fn test_kernel_dump_format() {
        let train = train_file();
        let test = test_file();
        let dump = NamedTempFile::new().expect("temp file");
        let mut svm = Gksvm::new(2, 0)
            .unwrap()
            .with_kernel_name("gakco")
            .unwrap()
            .with_quiet(true);
        svm.fit(
            train.path(),
            Some(test.path()),
            None,
            Some(dump.path()),
        )
        .unwrap();

        let text = fs::read_to_string(dump.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // One line per sequence, train + test.
        assert_eq!(lines.len(), 8);
        for line in &lines {
            let entries: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(entries.len(), 8);
            // 1-indexed columns in order.
            assert!(entries[0].starts_with("1:"));
            assert!(entries[7].starts_with("8:"));
        }
    }

    #[test]
    fn test_window_longer_than_shortest_sequence_fails_fit() {
        let train = corpus_file(&[(1, "ABC"), (-1, "ABCDEF")]);
        let test = corpus_file(&[(1, "ABCDEF")]);
        let mut svm = Gksvm::new(5, 0)
            .unwrap()
            .with_kernel_name("gakco")
            .unwrap()
            .with_quiet(true);
        let err = svm.fit(train.path(), Some(test.path()), None, None).unwrap_err();
        match err {
            GksvmError::WindowTooLong { g, min_len, .. } => {
                assert_eq!(g, 5);
                assert_eq!(min_len, 3);
            }
            other => panic!("expected WindowTooLong, got {other:?}"),
        }
    }
}
