//! Shared contract and result types of the offline and online evaluators.

use crate::core::classifier::Predictive;
use crate::core::confusion::ConfusionMatrix;
use crate::dataset::Dataset;
use crate::error::{EvalError, Partition, Result};
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one classifier against the test set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Classifier display name
    pub classifier: String,
    /// Confusion matrix over the test set
    pub matrix: ConfusionMatrix,
    /// Number of training instances the classifier had seen
    pub training_size: usize,
    /// Class distribution of those training instances
    pub training_class_counts: Vec<u64>,
}

impl EvaluationResult {
    pub fn accuracy(&self) -> f64 {
        self.matrix.accuracy()
    }

    /// Accuracy of always predicting the most frequent training class.
    pub fn majority_baseline(&self) -> f64 {
        let total = self.matrix.total();
        if total == 0 || self.training_size == 0 {
            return 0.0;
        }
        let majority = self
            .training_class_counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (label, &count)| {
                if count > best.1 {
                    (label, count)
                } else {
                    best
                }
            })
            .0;
        self.matrix.row_sum(majority) as f64 / total as f64
    }
}

/// All classifiers' results at one point of a stepwise run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Training instances incorporated when the checkpoint was taken
    pub training_size: usize,
    /// One result per classifier, in registration order
    pub results: Vec<EvaluationResult>,
}

/// Drives registered classifiers through training and evaluation on a fixed test set.
pub trait Evaluator {
    fn classifier_count(&self) -> usize;

    /// Display name of the classifier registered at `index`.
    fn classifier_name(&self, index: usize) -> Option<&str>;

    fn test_set(&self) -> &Dataset;

    /// Train on the whole stream once, then evaluate every classifier.
    fn evaluate_cumulated(&mut self, stream: &Dataset) -> Result<Vec<EvaluationResult>>;

    /// Evaluate every classifier after each `step_size` training instances.
    ///
    /// `step_size` is clamped to `[1, stream.len()]`. Instances after the last
    /// full step are still trained on but produce no checkpoint.
    fn evaluate_stepwise(&mut self, stream: &Dataset, step_size: usize) -> Result<Vec<Checkpoint>>;
}

/// Clamp a step size to `[1, len]`.
pub fn clamp_step(step_size: usize, len: usize) -> usize {
    step_size.min(len).max(1)
}

pub(crate) fn ensure_test_set(test_set: &Dataset) -> Result<()> {
    if test_set.is_empty() {
        return Err(EvalError::EmptyDataset {
            partition: Partition::Test,
        });
    }
    Ok(())
}

pub(crate) fn ensure_same_schema(stream: &Dataset, test_set: &Dataset) -> Result<()> {
    if stream.schema() != test_set.schema() {
        return Err(EvalError::Schema(
            "training stream and test set have different schemas".to_string(),
        ));
    }
    Ok(())
}

/// Run `model` over the test set and tally its predictions.
pub(crate) fn evaluate_model<P: Predictive + ?Sized>(
    index: usize,
    model: &P,
    test_set: &Dataset,
    training: &Dataset,
) -> Result<EvaluationResult> {
    let schema = test_set.schema();
    let num_classes = schema.num_classes();
    let mut matrix = ConfusionMatrix::new(schema.class_values().to_vec());

    for instance in test_set {
        let predicted = model
            .predict(instance)
            .map_err(|e| EvalError::classifier(index, model.name(), e))?;
        if predicted >= num_classes {
            return Err(EvalError::classifier(
                index,
                model.name(),
                format!("predicted label {predicted} outside {num_classes} class values").into(),
            ));
        }
        matrix.accumulate(predicted, instance.label())?;
    }

    Ok(EvaluationResult {
        classifier: model.name().to_string(),
        matrix,
        training_size: training.len(),
        training_class_counts: training.class_counts(),
    })
}
