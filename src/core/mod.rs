//! Core functionality of the activity evaluation toolkit.
//!
//! This module contains:
//! - Sliding-window feature extraction over raw sensor streams
//! - Train/test partitioning
//! - Confusion matrix accounting
//! - Offline and online classifier evaluation

pub mod classifier;
pub mod confusion;
pub mod evaluation;
pub mod offline;
pub mod online;
pub mod split;
pub mod windowing;

// Re-export commonly used types
pub use classifier::{Predictive, Trainable, Updatable};
pub use confusion::ConfusionMatrix;
pub use evaluation::{clamp_step, Checkpoint, EvaluationResult, Evaluator};
pub use offline::OfflineEvaluation;
pub use online::OnlineEvaluation;
pub use split::{shuffle, split, Splitter, TrainTestSplit};
pub use windowing::{
    window_count, window_schema, ChannelNames, FeatureWindow, SensorChannels, WindowAccumulator,
    WindowEngine, Windows, WINDOW_ATTRIBUTES,
};
