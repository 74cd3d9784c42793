//! Evaluator for incremental classifiers.
//!
//! Each classifier absorbs the stream one instance at a time. The evaluator
//! also keeps every instance seen so far, which supplies the training-set
//! statistics attached to each result.

use crate::core::classifier::Updatable;
use crate::core::evaluation::{
    clamp_step, ensure_same_schema, ensure_test_set, evaluate_model, Checkpoint, EvaluationResult,
    Evaluator,
};
use crate::dataset::{Dataset, Instance, Schema};
use crate::error::{EvalError, Result};
use crate::protocol::SharedProtocolLog;

/// Online (incremental update) evaluation strategy.
pub struct OnlineEvaluation {
    classifiers: Vec<Box<dyn Updatable>>,
    test_set: Dataset,
    /// Instances incorporated since the last (re)start
    seen: Dataset,
    log: SharedProtocolLog,
}

impl OnlineEvaluation {
    /// Create an evaluator over a fixed, non-empty test set.
    pub fn new(test_set: Dataset, log: SharedProtocolLog) -> Result<Self> {
        ensure_test_set(&test_set)?;
        let seen = test_set.empty_like();
        Ok(Self {
            classifiers: Vec::new(),
            test_set,
            seen,
            log,
        })
    }

    /// Add a classifier; evaluation order follows registration order.
    pub fn register(&mut self, classifier: Box<dyn Updatable>) {
        self.log.log(format!("Added classifier {} to set.", classifier.name()));
        self.classifiers.push(classifier);
    }

    /// Training instances accumulated by the most recent run.
    pub fn seen(&self) -> &Dataset {
        &self.seen
    }

    /// Reset the accumulation and set up every classifier for `schema`.
    fn restart(&mut self, schema: &Schema) -> Result<()> {
        self.seen = self.test_set.empty_like();
        for (index, classifier) in self.classifiers.iter_mut().enumerate() {
            classifier
                .initialize(schema)
                .map_err(|e| EvalError::classifier(index, classifier.name(), e))?;
            self.log.record_training();
        }
        Ok(())
    }

    /// Feed one instance to every classifier, then record it.
    fn incorporate(&mut self, instance: &Instance) -> Result<()> {
        for (index, classifier) in self.classifiers.iter_mut().enumerate() {
            classifier
                .update(instance)
                .map_err(|e| EvalError::classifier(index, classifier.name(), e))?;
        }
        self.seen.push(instance.clone())
    }

    fn evaluate_all(&self) -> Result<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(self.classifiers.len());
        for (index, classifier) in self.classifiers.iter().enumerate() {
            self.log.log(format!("Evaluating {}...", classifier.name()));
            results.push(evaluate_model(
                index,
                classifier.as_ref(),
                &self.test_set,
                &self.seen,
            )?);
            self.log.record_evaluation();
        }
        Ok(results)
    }
}

impl Evaluator for OnlineEvaluation {
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
            "Online classifier evaluation ({} training | {} testing)",
            stream.len(),
            self.test_set.len()
        ));

        self.restart(stream.schema())?;
        for instance in stream {
            self.incorporate(instance)?;
        }
        self.evaluate_all()
    }

    fn evaluate_stepwise(&mut self, stream: &Dataset, step_size: usize) -> Result<Vec<Checkpoint>> {
        ensure_same_schema(stream, &self.test_set)?;
        let step_size = clamp_step(step_size, stream.len());
        self.log.log(format!("Evaluation step size: {step_size}..."));

        self.restart(stream.schema())?;
        let mut checkpoints = Vec::with_capacity(stream.len() / step_size);
        for instance in stream {
            self.incorporate(instance)?;

            if self.seen.len() % step_size == 0 {
                let results = self.evaluate_all()?;
                self.log.record_checkpoint();
                self.log.log(format!("Current training set size: {}", self.seen.len()));
                checkpoints.push(Checkpoint {
                    training_size: self.seen.len(),
                    results,
                });
            }
        }

        Ok(checkpoints)
    }
}
