//! Evaluator for batch classifiers.
//!
//! Every checkpoint retrains each classifier from scratch on the full prefix
//! of the training stream seen so far.

use crate::core::classifier::Trainable;
use crate::core::evaluation::{
    clamp_step, ensure_same_schema, ensure_test_set, evaluate_model, Checkpoint, EvaluationResult,
    Evaluator,
};
use crate::dataset::Dataset;
use crate::error::{EvalError, Result};
use crate::protocol::SharedProtocolLog;

/// Offline (batch retraining) evaluation strategy.
pub struct OfflineEvaluation {
    classifiers: Vec<Box<dyn Trainable>>,
    test_set: Dataset,
    log: SharedProtocolLog,
}

impl OfflineEvaluation {
    /// Create an evaluator over a fixed, non-empty test set.
    pub fn new(test_set: Dataset, log: SharedProtocolLog) -> Result<Self> {
        ensure_test_set(&test_set)?;
        Ok(Self {
            classifiers: Vec::new(),
            test_set,
            log,
        })
    }

    /// Add a classifier; evaluation order follows registration order.
    pub fn register(&mut self, classifier: Box<dyn Trainable>) {
        self.log.log(format!("Added classifier {} to set.", classifier.name()));
        self.classifiers.push(classifier);
    }

    /// Rebuild every classifier on `training`.
    fn train_all(&mut self, training: &Dataset) -> Result<()> {
        let total = self.classifiers.len();
        for (index, classifier) in self.classifiers.iter_mut().enumerate() {
            self.log.log(format!(
                "\t({} of {total}) Training classifier '{}' on {} instances...",
                index + 1,
                classifier.name(),
                training.len()
            ));
            classifier
                .fit(training)
                .map_err(|e| EvalError::classifier(index, classifier.name(), e))?;
            self.log.record_training();
        }
        Ok(())
    }

    fn evaluate_all(&self, training: &Dataset) -> Result<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(self.classifiers.len());
        for (index, classifier) in self.classifiers.iter().enumerate() {
            self.log.log(format!("Evaluating {}...", classifier.name()));
            results.push(evaluate_model(
                index,
                classifier.as_ref(),
                &self.test_set,
                training,
            )?);
            self.log.record_evaluation();
        }
        Ok(results)
    }
}

impl Evaluator for OfflineEvaluation {
    fn classifier_count(&self) -> usize {
        self.classifiers.len()
    }

    fn classifier_name(&self, index: usize) -> Option<&str> {
        self.classifiers.get(index).map(|c| c.name())
    }

    fn test_set(&self) -> &Dataset {
        &self.test_set
    }

    fn evaluate_cumulated(&mut self, stream: &Dataset) -> Result<Vec<EvaluationResult>> {
        ensure_same_schema(stream, &self.test_set)?;
        self.log.log(format!(
            "Classifier evaluation ({} training | {} testing)",
            stream.len(),
            self.test_set.len()
        ));

        self.train_all(stream)?;
        self.evaluate_all(stream)
    }

    fn evaluate_stepwise(&mut self, stream: &Dataset, step_size: usize) -> Result<Vec<Checkpoint>> {
        ensure_same_schema(stream, &self.test_set)?;
        let step_size = clamp_step(step_size, stream.len());
        self.log.log(format!("Evaluation step size: {step_size}..."));

        let mut checkpoints = Vec::with_capacity(stream.len() / step_size);
        for training_size in (step_size..=stream.len()).step_by(step_size) {
            let prefix = stream.head(training_size);
            self.train_all(&prefix)?;
            let results = self.evaluate_all(&prefix)?;

            self.log.record_checkpoint();
            self.log.log(format!("Current training set size: {training_size}"));
            checkpoints.push(Checkpoint {
                training_size,
                results,
            });
        }

        // Trailing instances still reach the models, without a checkpoint.
        if stream.len() % step_size != 0 {
            self.train_all(stream)?;
        }

        Ok(checkpoints)
    }
}
