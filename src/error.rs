//! Error types for windowing, partitioning and evaluation.

use thiserror::Error;

/// Error reported by a classifier capability (`fit`, `update`, `predict`).
pub type ClassifierError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Which side of a train/test partition an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Training,
    Test,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Training => write!(f, "training"),
            Partition::Test => write!(f, "test"),
        }
    }
}

/// Main error type for the evaluation core.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(
        "invalid window configuration: size={window_size}, overlap={overlap} \
         (requires size >= 2 and size > overlap >= 0)"
    )]
    InvalidWindowConfig { window_size: usize, overlap: usize },

    #[error("window holds {len} instance(s), standard deviation needs at least 2")]
    InsufficientWindowSize { len: usize },

    #[error("{partition} set is empty")]
    EmptyDataset { partition: Partition },

    #[error("invalid {name} fraction: {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("classifier #{index} ({name}) failed: {source}")]
    Classifier {
        index: usize,
        name: String,
        #[source]
        source: ClassifierError,
    },
}

impl EvalError {
    /// Wrap a capability failure with the offending classifier's position and name.
    pub fn classifier(index: usize, name: &str, source: ClassifierError) -> Self {
        EvalError::Classifier {
            index,
            name: name.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_error_display() {
        let err = EvalError::classifier(2, "KNearest", "model not fitted".into());
        assert_eq!(
            err.to_string(),
            "classifier #2 (KNearest) failed: model not fitted"
        );
    }

    #[test]
    fn test_empty_dataset_display() {
        let err = EvalError::EmptyDataset {
            partition: Partition::Test,
        };
        assert_eq!(err.to_string(), "test set is empty");
    }
}
