//! Labeled, ordered datasets with a fixed schema.
//!
//! Row order is significant: it is the temporal order used for windowing
//! and it determines where train/test partitions are cut.

pub mod loader;
pub mod schema;

pub use loader::{load_csv, read_csv, save_csv, write_csv, CsvOptions, LoadError, LoadOutcome};
pub use schema::{Attribute, AttributeKind, Label, Schema};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single row: attribute values in schema column order plus a class label.
///
/// Categorical values are stored as the index of the value in the attribute's
/// legal value list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    values: Vec<f64>,
    label: Label,
}

impl Instance {
    pub fn new(values: Vec<f64>, label: Label) -> Self {
        Self { values, label }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at a column index, `NaN` if out of range.
    pub fn value(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn label(&self) -> Label {
        self.label
    }
}

/// Ordered sequence of instances sharing one schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    instances: Vec<Instance>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            instances: Vec::new(),
        }
    }

    pub fn with_capacity(schema: Arc<Schema>, capacity: usize) -> Self {
        Self {
            schema,
            instances: Vec::with_capacity(capacity),
        }
    }

    /// Build a dataset, validating every row against the schema.
    pub fn from_instances(schema: Arc<Schema>, instances: Vec<Instance>) -> Result<Self> {
        for instance in &instances {
            schema.validate(&instance.values, instance.label)?;
        }
        Ok(Self { schema, instances })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Shared handle to the schema, for building datasets of the same shape.
    pub fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Append an instance after validating it.
    pub fn push(&mut self, instance: Instance) -> Result<()> {
        self.schema.validate(&instance.values, instance.label)?;
        self.instances.push(instance);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }

    /// Empty dataset with the same schema.
    pub fn empty_like(&self) -> Self {
        Self::new(self.schema_arc())
    }

    /// Copy of the first `count` instances (fewer if the dataset is shorter).
    pub fn head(&self, count: usize) -> Self {
        self.range(0, count)
    }

    /// Copy of `count` instances starting at `start`, clipped to the dataset bounds.
    pub fn range(&self, start: usize, count: usize) -> Self {
        let start = start.min(self.instances.len());
        let end = start.saturating_add(count).min(self.instances.len());
        Self {
            schema: self.schema_arc(),
            instances: self.instances[start..end].to_vec(),
        }
    }

    /// Number of instances per class label, indexed by label.
    pub fn class_counts(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.schema.num_classes()];
        for instance in &self.instances {
            counts[instance.label] += 1;
        }
        counts
    }

    pub(crate) fn into_parts(self) -> (Arc<Schema>, Vec<Instance>) {
        (self.schema, self.instances)
    }

    /// Rebuild from rows that already belong to `schema`.
    pub(crate) fn from_trusted(schema: Arc<Schema>, instances: Vec<Instance>) -> Self {
        Self { schema, instances }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
