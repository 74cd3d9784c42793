//! Synheart Activity Eval - windowing and evaluation toolkit for
//! accelerometer-based activity recognition.
//!
//! Raw sensor streams are condensed into fixed-size feature windows,
//! partitioned into training and test sets, and used to compare pluggable
//! classifiers under two training regimes.
//!
//! # Evaluation Strategies
//!
//! - **Offline**: every classifier is rebuilt from scratch on the whole
//!   training prefix before each evaluation
//! - **Online**: every classifier absorbs the training stream one instance
//!   at a time
//!
//! Both strategies evaluate against the same fixed test set and report a
//! confusion matrix per classifier, either once or at regular checkpoints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Synheart Activity Eval                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Dataset   │──▶│  Windowing  │──▶│  Splitter   │        │
//! │  │    (CSV)    │   │ (features)  │   │(train/test) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                                             │               │
//! │                                             ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Protocol   │◀──│   Report    │◀──│ Evaluation  │        │
//! │  │    Log      │   │ (text/JSON) │   │(off/online) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use synheart_activity_eval::{core, dataset, protocol};
//!
//! let log = protocol::create_shared_log(chrono_tz::Tz::UTC);
//! let raw = dataset::load_csv(Path::new("phones_accelerometer.csv"), &Default::default())
//!     .expect("Failed to load data");
//!
//! let engine = core::WindowEngine::new(raw.dataset.schema_arc(), &Default::default())
//!     .expect("Missing sensor channels");
//! let windows = engine
//!     .windowify(&raw.dataset, 256, 128, &log)
//!     .expect("Windowing failed");
//!
//! let parts = core::split(&core::shuffle(&windows, 42), 0.7, 0.3).expect("Split failed");
//! let mut evaluation = core::OfflineEvaluation::new(parts.test, log).expect("Empty test set");
//! // evaluation.register(Box::new(MyClassifier::default()));
//! ```

pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
pub mod protocol;
pub mod report;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    Checkpoint, ConfusionMatrix, EvaluationResult, Evaluator, FeatureWindow, OfflineEvaluation,
    OnlineEvaluation, Predictive, Splitter, Trainable, Updatable, WindowEngine,
};
pub use dataset::{Dataset, Instance, Label, Schema};
pub use error::{ClassifierError, EvalError, Result};
pub use protocol::{ProtocolLog, ProtocolStats, SharedProtocolLog};
pub use report::{EvaluationReport, ReportBuilder, StepwiseReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
