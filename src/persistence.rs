//! Session serialization and persistence
//!
//! Saves a fitted classification session — the trained model, the frozen
//! kernel matrix, and the test labels — so a later invocation can predict
//! without rebuilding the kernel. The precomputed kernel type needs the
//! matrix at prediction time, which is why the whole session is persisted
//! rather than the model alone.

use crate::api::Gksvm;
use crate::core::{GksvmConfig, GksvmError, Result};
use crate::kernel::{triangular_len, TriMatrix};
use crate::trainer::Model;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable form of a fitted session.
#[derive(Serialize, Deserialize)]
pub struct SerializableSession {
    /// Trained model.
    pub model: Model,
    /// Dimension of the kernel matrix (train + test sequences).
    pub matrix_n: usize,
    /// Flat triangular matrix values.
    pub matrix_values: Vec<f64>,
    /// True labels of the test block, original order.
    pub test_labels: Vec<i32>,
    /// Session metadata.
    pub metadata: SessionMetadata,
}

/// Metadata for tracking and validation.
#[derive(Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Library version that wrote the file.
    pub library_version: String,
    /// Full pipeline configuration the session was fitted with.
    pub config: GksvmConfig,
    /// Creation timestamp.
    pub created_at: String,
}

impl SerializableSession {
    /// Capture a fitted session. Fails if `fit` has not run.
    pub fn from_session(session: &Gksvm) -> Result<Self> {
        let model = session.model().ok_or(GksvmError::ModelNotTrained)?.clone();
        let matrix = session.kernel_matrix().ok_or(GksvmError::ModelNotTrained)?;
        let test_labels = session
            .test_labels()
            .ok_or(GksvmError::ModelNotTrained)?
            .to_vec();

        let n = matrix.n();
        let matrix_values: Vec<f64> = (0..n)
            .flat_map(|i| (i..n).map(move |j| matrix.value(i, j)))
            .collect();

        Ok(Self {
            model,
            matrix_n: n,
            matrix_values,
            test_labels,
            metadata: SessionMetadata {
                library_version: crate::VERSION.to_string(),
                config: session.config().clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        })
    }

    /// Save as JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(GksvmError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)
            .map_err(|e| GksvmError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load from JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(GksvmError::IoError)?;
        let reader = BufReader::new(file);
        let session = serde_json::from_reader(reader)
            .map_err(|e| GksvmError::SerializationError(e.to_string()))?;
        Ok(session)
    }

    /// Reconstruct a ready-to-predict session.
    pub fn into_session(self) -> Result<Gksvm> {
        let expected = triangular_len(self.matrix_n).ok_or(GksvmError::Resource {
            what: "kernel matrix",
            cells: usize::MAX,
        })?;
        if self.matrix_values.len() != expected {
            return Err(GksvmError::SerializationError(format!(
                "matrix has {} cells, expected {}",
                self.matrix_values.len(),
                expected
            )));
        }
        let matrix = TriMatrix::from_parts(self.matrix_values, self.matrix_n);
        Ok(Gksvm::from_parts(
            self.metadata.config,
            matrix,
            self.model,
            self.test_labels,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fitted_session() -> Gksvm {
        let mut train = NamedTempFile::new().expect("temp file");
        for (label, seq) in [
            (1, "AAAAAA"),
            (1, "AAABAA"),
            (-1, "BBBBBB"),
            (-1, "BBABBB"),
        ] {
            writeln!(train, ">{label}\n{seq}").expect("write");
        }
        train.flush().expect("flush");

        let mut test = NamedTempFile::new().expect("temp file");
        for (label, seq) in [(1, "AABAAA"), (-1, "BBBABB")] {
            writeln!(test, ">{label}\n{seq}").expect("write");
        }
        test.flush().expect("flush");

        let mut svm = Gksvm::new(2, 0)
            .unwrap()
            .with_kernel_name("gakco")
            .unwrap()
            .with_quiet(true);
        svm.fit(train.path(), Some(test.path()), None, None).unwrap();
        svm
    }

    #[test]
    fn test_session_round_trip_preserves_predictions() {
        let session = fitted_session();
        let out = NamedTempFile::new().expect("temp file");
        let original = session.predict(out.path()).unwrap();

        let file = NamedTempFile::new().expect("temp file");
        SerializableSession::from_session(&session)
            .unwrap()
            .save_to_file(file.path())
            .unwrap();

        let restored = SerializableSession::load_from_file(file.path())
            .unwrap()
            .into_session()
            .unwrap();
        let replayed = restored.predict(out.path()).unwrap();

        assert_eq!(original.predictions.len(), replayed.predictions.len());
        for (a, b) in original.predictions.iter().zip(&replayed.predictions) {
            assert_eq!(a.label, b.label);
            assert_relative_eq!(a.decision_value, b.decision_value);
        }
        assert_relative_eq!(original.accuracy, replayed.accuracy);
        assert_relative_eq!(original.auc, replayed.auc);
    }

    #[test]
    fn test_unfitted_session_cannot_be_serialized() {
        let svm = Gksvm::new(3, 1).unwrap();
        assert!(matches!(
            SerializableSession::from_session(&svm),
            Err(GksvmError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_corrupt_matrix_length_is_rejected() {
        let session = fitted_session();
        let mut serializable = SerializableSession::from_session(&session).unwrap();
        serializable.matrix_values.pop();
        assert!(matches!(
            serializable.into_session(),
            Err(GksvmError::SerializationError(_))
        ));
    }

    #[test]
    fn test_metadata_carries_the_configuration() {
        let session = fitted_session();
        let serializable = SerializableSession::from_session(&session).unwrap();
        assert_eq!(serializable.metadata.config.g, 2);
        assert_eq!(serializable.metadata.config.m, 0);
        assert!(!serializable.metadata.library_version.is_empty());
    }
}
