//! Test classifiers and data builders shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use synheart_activity_eval::dataset::Attribute;
use synheart_activity_eval::{
    ClassifierError, Dataset, Instance, Label, Predictive, Schema, Trainable, Updatable,
};

/// Two numeric attributes `a`, `b` and classes `lo`, `hi`.
pub fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(
            "Synthetic",
            vec![Attribute::numeric("a"), Attribute::numeric("b")],
            Attribute::categorical("label", ["lo", "hi"]),
        )
        .unwrap(),
    )
}

/// Dataset whose label is `hi` exactly when `a >= threshold`.
pub fn threshold_data(values: impl IntoIterator<Item = f64>, threshold: f64) -> Dataset {
    let instances = values
        .into_iter()
        .map(|a| Instance::new(vec![a, -a], usize::from(a >= threshold)))
        .collect();
    Dataset::from_instances(schema(), instances).unwrap()
}

/// Predicts the most frequent class seen so far (lowest label on ties).
#[derive(Debug, Default)]
pub struct MajorityClass {
    counts: Vec<u64>,
}

impl MajorityClass {
    fn observe(&mut self, label: Label) {
        if self.counts.len() <= label {
            self.counts.resize(label + 1, 0);
        }
        self.counts[label] += 1;
    }
}

impl Predictive for MajorityClass {
    fn name(&self) -> &str {
        "MajorityClass"
    }

    fn predict(&self, _instance: &Instance) -> Result<Label, ClassifierError> {
        let mut best = (0, 0);
        for (label, &count) in self.counts.iter().enumerate() {
            if count > best.1 {
                best = (label, count);
            }
        }
        Ok(best.0)
    }
}

impl Trainable for MajorityClass {
    fn fit(&mut self, data: &Dataset) -> Result<(), ClassifierError> {
        self.counts.clear();
        for instance in data {
            self.observe(instance.label());
        }
        Ok(())
    }
}

impl Updatable for MajorityClass {
    fn initialize(&mut self, schema: &Schema) -> Result<(), ClassifierError> {
        self.counts = vec![0; schema.num_classes()];
        Ok(())
    }

    fn update(&mut self, instance: &Instance) -> Result<(), ClassifierError> {
        self.observe(instance.label());
        Ok(())
    }
}

/// Assigns the class whose mean vector is closest.
#[derive(Debug, Default)]
pub struct NearestCentroid {
    sums: Vec<Vec<f64>>,
    counts: Vec<u64>,
}

impl NearestCentroid {
    fn reset(&mut self, classes: usize, attributes: usize) {
        self.sums = vec![vec![0.0; attributes]; classes];
        self.counts = vec![0; classes];
    }

    fn observe(&mut self, instance: &Instance) -> Result<(), ClassifierError> {
        let label = instance.label();
        let sum = self
            .sums
            .get_mut(label)
            .ok_or_else(|| format!("label {label} unknown to the model"))?;
        for (acc, value) in sum.iter_mut().zip(instance.values()) {
            *acc += value;
        }
        self.counts[label] += 1;
        Ok(())
    }
}

impl Predictive for NearestCentroid {
    fn name(&self) -> &str {
        "NearestCentroid"
    }

    fn predict(&self, instance: &Instance) -> Result<Label, ClassifierError> {
        let mut best: Option<(Label, f64)> = None;
        for (label, (sum, &count)) in self.sums.iter().zip(&self.counts).enumerate() {
            if count == 0 {
                continue;
            }
            let distance: f64 = sum
                .iter()
                .zip(instance.values())
                .map(|(s, v)| (s / count as f64 - v).powi(2))
                .sum();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((label, distance));
            }
        }
        best.map(|(label, _)| label)
            .ok_or_else(|| "model has not seen any instance".into())
    }
}

impl Trainable for NearestCentroid {
    fn fit(&mut self, data: &Dataset) -> Result<(), ClassifierError> {
        self.reset(data.schema().num_classes(), data.schema().num_attributes());
        for instance in data {
            self.observe(instance)?;
        }
        Ok(())
    }
}

impl Updatable for NearestCentroid {
    fn initialize(&mut self, schema: &Schema) -> Result<(), ClassifierError> {
        self.reset(schema.num_classes(), schema.num_attributes());
        Ok(())
    }

    fn update(&mut self, instance: &Instance) -> Result<(), ClassifierError> {
        self.observe(instance)
    }
}

/// What a `Recording` classifier was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fit(usize),
    Initialize,
    Update(Vec<f64>),
}

/// Records every training call into a shared journal; always predicts label 0.
#[derive(Debug, Clone)]
pub struct Recording {
    name: String,
    journal: Arc<Mutex<Vec<Call>>>,
}

impl Recording {
    pub fn new(name: &str) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let recorder = Self {
            name: name.to_string(),
            journal: Arc::clone(&journal),
        };
        (recorder, journal)
    }
}

impl Predictive for Recording {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, _instance: &Instance) -> Result<Label, ClassifierError> {
        Ok(0)
    }
}

impl Trainable for Recording {
    fn fit(&mut self, data: &Dataset) -> Result<(), ClassifierError> {
        self.journal.lock().unwrap().push(Call::Fit(data.len()));
        Ok(())
    }
}

impl Updatable for Recording {
    fn initialize(&mut self, _schema: &Schema) -> Result<(), ClassifierError> {
        self.journal.lock().unwrap().push(Call::Initialize);
        Ok(())
    }

    fn update(&mut self, instance: &Instance) -> Result<(), ClassifierError> {
        self.journal
            .lock()
            .unwrap()
            .push(Call::Update(instance.values().to_vec()));
        Ok(())
    }
}

/// Which capability a `Failing` classifier rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Train,
    Predict,
}

/// Fails deterministically on one capability.
#[derive(Debug)]
pub struct Failing {
    pub fail_on: FailOn,
}

impl Predictive for Failing {
    fn name(&self) -> &str {
        "Failing"
    }

    fn predict(&self, _instance: &Instance) -> Result<Label, ClassifierError> {
        match self.fail_on {
            FailOn::Predict => Err("prediction refused".into()),
            FailOn::Train => Ok(0),
        }
    }
}

impl Trainable for Failing {
    fn fit(&mut self, _data: &Dataset) -> Result<(), ClassifierError> {
        match self.fail_on {
            FailOn::Train => Err("training refused".into()),
            FailOn::Predict => Ok(()),
        }
    }
}

impl Updatable for Failing {
    fn update(&mut self, _instance: &Instance) -> Result<(), ClassifierError> {
        match self.fail_on {
            FailOn::Train => Err("update refused".into()),
            FailOn::Predict => Ok(()),
        }
    }
}

/// Always predicts a label outside the class range.
#[derive(Debug)]
pub struct OutOfRange;

impl Predictive for OutOfRange {
    fn name(&self) -> &str {
        "OutOfRange"
    }

    fn predict(&self, _instance: &Instance) -> Result<Label, ClassifierError> {
        Ok(99)
    }
}

impl Trainable for OutOfRange {
    fn fit(&mut self, _data: &Dataset) -> Result<(), ClassifierError> {
        Ok(())
    }
}
