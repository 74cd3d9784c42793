//! Capability traits for pluggable classifiers.
//!
//! Concrete models live outside this crate. The evaluation harness only
//! calls these operations and never inspects model state.

use crate::dataset::{Dataset, Instance, Label, Schema};
use crate::error::ClassifierError;

/// A model that can label an instance.
pub trait Predictive {
    /// Display name used in protocols and reports.
    fn name(&self) -> &str;

    /// Predict the class label of `instance`.
    fn predict(&self, instance: &Instance) -> Result<Label, ClassifierError>;
}

/// A batch model, (re)built from a full dataset on every call.
pub trait Trainable: Predictive {
    /// Discard any previous state and build the model from `data`.
    fn fit(&mut self, data: &Dataset) -> Result<(), ClassifierError>;
}

/// An incremental model that absorbs one instance at a time.
pub trait Updatable: Predictive {
    /// Prepare internal structures for data of `schema`, discarding prior state.
    fn initialize(&mut self, schema: &Schema) -> Result<(), ClassifierError> {
        let _ = schema;
        Ok(())
    }

    /// Incorporate one instance without discarding prior state.
    fn update(&mut self, instance: &Instance) -> Result<(), ClassifierError>;
}
