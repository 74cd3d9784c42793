//! Sliding-window aggregation of time-ordered sensor instances.
//!
//! A window of consecutive raw instances collapses into one feature row:
//! mean and standard deviation of the x, y and z channels, the mean of the
//! device identifier and the majority label. Windows advance by
//! `stride = window_size - overlap`; a trailing window that would run past
//! the end of the data is dropped.

use crate::dataset::{Attribute, Dataset, Instance, Label, Schema};
use crate::error::{EvalError, Result};
use crate::protocol::ProtocolLog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Attribute names of the windowed schema, in column order.
pub const WINDOW_ATTRIBUTES: [&str; 7] = [
    "xMean", "xStDev", "yMean", "yStDev", "zMean", "zStDev", "Device",
];

/// Names of the raw columns that feed the window features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelNames {
    pub x: String,
    pub y: String,
    pub z: String,
    pub device: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            x: "x".to_string(),
            y: "y".to_string(),
            z: "z".to_string(),
            device: "Device".to_string(),
        }
    }
}

/// Column indices of the sensor channels, resolved once against a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorChannels {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub device: usize,
}

impl SensorChannels {
    /// Resolve channel names to column indices.
    ///
    /// The x/y/z channels must be numeric. The device column may be numeric
    /// or categorical; categorical devices contribute their value index.
    pub fn resolve(schema: &Schema, names: &ChannelNames) -> Result<Self> {
        let numeric = |name: &str| -> Result<usize> {
            let index = lookup(schema, name)?;
            match schema.attribute(index) {
                Some(attr) if attr.is_numeric() => Ok(index),
                _ => Err(EvalError::Schema(format!(
                    "sensor channel '{name}' must be numeric"
                ))),
            }
        };

        Ok(Self {
            x: numeric(&names.x)?,
            y: numeric(&names.y)?,
            z: numeric(&names.z)?,
            device: lookup(schema, &names.device)?,
        })
    }
}

fn lookup(schema: &Schema, name: &str) -> Result<usize> {
    schema.index_of(name).ok_or_else(|| {
        EvalError::Schema(format!(
            "attribute '{name}' not found in relation '{}'",
            schema.relation()
        ))
    })
}

/// Aggregated features of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWindow {
    x_mean: f64,
    x_std_dev: f64,
    y_mean: f64,
    y_std_dev: f64,
    z_mean: f64,
    z_std_dev: f64,
    device: f64,
    label: Label,
    /// Number of raw instances aggregated
    size: usize,
}

impl FeatureWindow {
    pub fn x_mean(&self) -> f64 {
        self.x_mean
    }

    pub fn x_std_dev(&self) -> f64 {
        self.x_std_dev
    }

    pub fn y_mean(&self) -> f64 {
        self.y_mean
    }

    pub fn y_std_dev(&self) -> f64 {
        self.y_std_dev
    }

    pub fn z_mean(&self) -> f64 {
        self.z_mean
    }

    pub fn z_std_dev(&self) -> f64 {
        self.z_std_dev
    }

    /// Mean of the (encoded) device identifier.
    pub fn device(&self) -> f64 {
        self.device
    }

    /// Majority label of the window.
    pub fn label(&self) -> Label {
        self.label
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Feature values in `WINDOW_ATTRIBUTES` order.
    pub fn values(&self) -> [f64; 7] {
        [
            self.x_mean,
            self.x_std_dev,
            self.y_mean,
            self.y_std_dev,
            self.z_mean,
            self.z_std_dev,
            self.device,
        ]
    }

    pub fn to_instance(&self) -> Instance {
        Instance::new(self.values().to_vec(), self.label)
    }
}

/// Running mean and sum of squared deviations (Welford's update).
///
/// `variance = M2 / (n - 1)`, which equals `(Σx² - n·mean²) / (n - 1)`.
#[derive(Debug, Clone, Copy, Default)]
struct RunningMoments {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn sample_std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let variance = self.m2 / (self.count - 1) as f64;
        variance.max(0.0).sqrt()
    }
}

/// Streaming per-window state: summed statistics and label counts only.
#[derive(Debug, Clone)]
pub struct WindowAccumulator {
    channels: SensorChannels,
    x: RunningMoments,
    y: RunningMoments,
    z: RunningMoments,
    device: RunningMoments,
    label_counts: Vec<usize>,
    leader: Label,
    leader_count: usize,
}

impl WindowAccumulator {
    pub fn new(channels: SensorChannels, num_classes: usize) -> Self {
        Self {
            channels,
            x: RunningMoments::default(),
            y: RunningMoments::default(),
            z: RunningMoments::default(),
            device: RunningMoments::default(),
            label_counts: vec![0; num_classes],
            leader: 0,
            leader_count: 0,
        }
    }

    /// Add one raw instance.
    ///
    /// A label whose running count reaches the current maximum takes the
    /// lead, so among equally frequent labels the one that got there last wins.
    pub fn push(&mut self, instance: &Instance) {
        self.x.push(instance.value(self.channels.x));
        self.y.push(instance.value(self.channels.y));
        self.z.push(instance.value(self.channels.z));
        self.device.push(instance.value(self.channels.device));

        let label = instance.label();
        if label >= self.label_counts.len() {
            self.label_counts.resize(label + 1, 0);
        }
        self.label_counts[label] += 1;
        if self.label_counts[label] >= self.leader_count {
            self.leader = label;
            self.leader_count = self.label_counts[label];
        }
    }

    pub fn len(&self) -> usize {
        self.x.count
    }

    pub fn is_empty(&self) -> bool {
        self.x.count == 0
    }

    /// Emit the window. Fails if fewer than 2 instances were pushed.
    pub fn finish(self) -> Result<FeatureWindow> {
        if self.len() < 2 {
            return Err(EvalError::InsufficientWindowSize { len: self.len() });
        }
        Ok(self.build())
    }

    fn build(self) -> FeatureWindow {
        FeatureWindow {
            x_mean: self.x.mean,
            x_std_dev: self.x.sample_std_dev(),
            y_mean: self.y.mean,
            y_std_dev: self.y.sample_std_dev(),
            z_mean: self.z.mean,
            z_std_dev: self.z.sample_std_dev(),
            device: self.device.mean,
            label: self.leader,
            size: self.x.count,
        }
    }
}

/// Converts raw instance streams of one schema into feature windows.
#[derive(Debug, Clone)]
pub struct WindowEngine {
    source: Arc<Schema>,
    target: Arc<Schema>,
    channels: SensorChannels,
}

impl WindowEngine {
    /// Bind an engine to the schema of the raw data.
    pub fn new(source: Arc<Schema>, names: &ChannelNames) -> Result<Self> {
        let channels = SensorChannels::resolve(&source, names)?;
        let target = Arc::new(window_schema(&source)?);
        Ok(Self {
            source,
            target,
            channels,
        })
    }

    pub fn channels(&self) -> SensorChannels {
        self.channels
    }

    /// Schema of the windowed dataset.
    pub fn window_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.target)
    }

    /// Aggregate a single window of at least 2 instances.
    pub fn windowify_single(&self, window: &[Instance]) -> Result<FeatureWindow> {
        self.accumulate(window).finish()
    }

    fn accumulate(&self, window: &[Instance]) -> WindowAccumulator {
        let mut accumulator = WindowAccumulator::new(self.channels, self.source.num_classes());
        for instance in window {
            accumulator.push(instance);
        }
        accumulator
    }

    /// Lazily slide a window over `dataset`.
    pub fn windowify_stream<'a>(
        &'a self,
        dataset: &'a Dataset,
        window_size: usize,
        overlap: usize,
    ) -> Result<Windows<'a>> {
        let stride = validate_window(window_size, overlap)?;
        if dataset.schema() != self.source.as_ref() {
            return Err(EvalError::Schema(format!(
                "dataset relation '{}' does not match the engine schema",
                dataset.schema().relation()
            )));
        }

        Ok(Windows {
            engine: self,
            instances: dataset.instances(),
            window_size,
            stride,
            next_start: 0,
        })
    }

    /// Window a whole dataset into a new dataset with the window schema.
    pub fn windowify(
        &self,
        dataset: &Dataset,
        window_size: usize,
        overlap: usize,
        log: &ProtocolLog,
    ) -> Result<Dataset> {
        log.log(format!(
            "Applying sliding window with size={window_size} and overlap={overlap}..."
        ));

        let windows = self.windowify_stream(dataset, window_size, overlap)?;
        let mut windowed = Dataset::with_capacity(self.window_schema(), windows.len());
        for window in windows {
            windowed.push(window.to_instance())?;
        }

        log.record_windows(windowed.len() as u64);
        log.log(format!(
            "Created {} windows from {} instances",
            windowed.len(),
            dataset.len()
        ));
        Ok(windowed)
    }
}

/// Number of windows produced for `len` instances.
pub fn window_count(len: usize, window_size: usize, overlap: usize) -> Result<usize> {
    let stride = validate_window(window_size, overlap)?;
    if len < window_size {
        return Ok(0);
    }
    Ok((len - window_size) / stride + 1)
}

/// Check window parameters and return the stride.
fn validate_window(window_size: usize, overlap: usize) -> Result<usize> {
    if window_size < 2 || overlap >= window_size {
        return Err(EvalError::InvalidWindowConfig {
            window_size,
            overlap,
        });
    }
    Ok(window_size - overlap)
}

/// Build the windowed schema for a raw schema; the class attribute is carried over.
pub fn window_schema(source: &Schema) -> Result<Schema> {
    let attributes = WINDOW_ATTRIBUTES
        .iter()
        .map(|name| Attribute::numeric(*name))
        .collect();
    Schema::new(
        source.relation(),
        attributes,
        source.class_attribute().clone(),
    )
}

/// Lazy, single-pass iterator over the windows of a dataset.
#[derive(Debug)]
pub struct Windows<'a> {
    engine: &'a WindowEngine,
    instances: &'a [Instance],
    window_size: usize,
    stride: usize,
    next_start: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = FeatureWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.next_start.checked_add(self.window_size)?;
        let window = self.instances.get(self.next_start..end)?;
        self.next_start += self.stride;

        // window_size >= 2 was checked when the iterator was created
        Some(self.engine.accumulate(window).build())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .instances
            .len()
            .checked_sub(self.next_start + self.window_size)
            .map(|slack| slack / self.stride + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Windows<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::statistics::Statistics;

    fn raw_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "ActivityRecognition",
                vec![
                    Attribute::numeric("Arrival_Time"),
                    Attribute::numeric("x"),
                    Attribute::numeric("y"),
                    Attribute::numeric("z"),
                    Attribute::categorical("Device", ["nexus4_1", "nexus4_2"]),
                ],
                Attribute::categorical("gt", ["stand", "walk", "bike"]),
            )
            .unwrap(),
        )
    }

    fn reading(x: f64, y: f64, z: f64, device: f64, label: Label) -> Instance {
        Instance::new(vec![0.0, x, y, z, device], label)
    }

    fn engine() -> WindowEngine {
        WindowEngine::new(raw_schema(), &ChannelNames::default()).unwrap()
    }

    fn stream(len: usize) -> Dataset {
        let instances = (0..len)
            .map(|i| reading(i as f64, 0.0, 9.0, 0.0, i % 3))
            .collect();
        Dataset::from_instances(raw_schema(), instances).unwrap()
    }

    fn labels(sequence: &[Label]) -> Vec<Instance> {
        sequence
            .iter()
            .map(|&l| reading(1.0, 1.0, 1.0, 0.0, l))
            .collect()
    }

    #[test]
    fn test_channels_resolved_by_name() {
        let channels = engine().channels();
        assert_eq!(
            channels,
            SensorChannels {
                x: 1,
                y: 2,
                z: 3,
                device: 4
            }
        );
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let names = ChannelNames {
            x: "acc_x".to_string(),
            ..ChannelNames::default()
        };
        let result = WindowEngine::new(raw_schema(), &names);
        assert!(matches!(result, Err(EvalError::Schema(_))));
    }

    #[test]
    fn test_categorical_axis_rejected() {
        let names = ChannelNames {
            z: "Device".to_string(),
            ..ChannelNames::default()
        };
        assert!(WindowEngine::new(raw_schema(), &names).is_err());
    }

    #[test]
    fn test_constant_channel_has_zero_std_dev() {
        let window: Vec<Instance> = (0..5).map(|_| reading(9.81, -0.3, 0.1, 1.0, 0)).collect();
        let features = engine().windowify_single(&window).unwrap();

        assert_eq!(features.x_mean(), 9.81);
        assert_eq!(features.x_std_dev(), 0.0);
        assert_eq!(features.y_mean(), -0.3);
        assert_eq!(features.y_std_dev(), 0.0);
        assert_eq!(features.z_std_dev(), 0.0);
        assert_eq!(features.device(), 1.0);
    }

    #[test]
    fn test_std_dev_is_sample_std_dev() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let window: Vec<Instance> = xs.iter().map(|&x| reading(x, 0.0, 0.0, 0.0, 0)).collect();
        let features = engine().windowify_single(&window).unwrap();

        let expected_mean = xs.iter().mean();
        let expected_std = xs.iter().std_dev();
        assert!((features.x_mean() - expected_mean).abs() < 1e-12);
        assert!((features.x_std_dev() - expected_std).abs() < 1e-12);
        // Population std-dev of this series is exactly 2; the sample form is larger.
        assert!(features.x_std_dev() > 2.0);
    }

    #[test]
    fn test_device_mean() {
        let window = vec![
            reading(0.0, 0.0, 0.0, 0.0, 0),
            reading(0.0, 0.0, 0.0, 1.0, 0),
            reading(0.0, 0.0, 0.0, 1.0, 0),
            reading(0.0, 0.0, 0.0, 1.0, 0),
        ];
        let features = engine().windowify_single(&window).unwrap();
        assert!((features.device() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_majority_label() {
        let features = engine().windowify_single(&labels(&[0, 1, 0])).unwrap();
        assert_eq!(features.label(), 0);

        let features = engine().windowify_single(&labels(&[1, 2, 2, 2, 1])).unwrap();
        assert_eq!(features.label(), 2);
    }

    #[test]
    fn test_tie_goes_to_label_reaching_maximum_last() {
        // A, B, A, B: B reaches count 2 after A does
        let features = engine().windowify_single(&labels(&[0, 1, 0, 1])).unwrap();
        assert_eq!(features.label(), 1);

        let features = engine().windowify_single(&labels(&[1, 0, 0, 1])).unwrap();
        assert_eq!(features.label(), 1);

        let features = engine().windowify_single(&labels(&[1, 1, 0, 0])).unwrap();
        assert_eq!(features.label(), 0);
    }

    #[test]
    fn test_single_instance_window_rejected() {
        let result = engine().windowify_single(&labels(&[0]));
        assert!(matches!(
            result,
            Err(EvalError::InsufficientWindowSize { len: 1 })
        ));
        assert!(engine().windowify_single(&[]).is_err());
    }

    #[test]
    fn test_invalid_window_config() {
        let data = stream(10);
        let engine = engine();
        for (size, overlap) in [(1, 0), (0, 0), (4, 4), (4, 5)] {
            let result = engine.windowify_stream(&data, size, overlap);
            assert!(
                matches!(result, Err(EvalError::InvalidWindowConfig { .. })),
                "size={size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn test_window_count_formula() {
        let engine = engine();
        for len in 0..40 {
            let data = stream(len);
            for (size, overlap) in [(2, 0), (4, 2), (5, 1), (8, 7), (10, 5)] {
                let expected = if len >= size {
                    (len - size) / (size - overlap) + 1
                } else {
                    0
                };
                let windows = engine.windowify_stream(&data, size, overlap).unwrap();
                assert_eq!(windows.len(), expected);
                assert_eq!(windows.count(), expected, "len={len} size={size}");
                assert_eq!(window_count(len, size, overlap).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_windows_follow_stride_and_drop_partial_tail() {
        let data = stream(11);
        let means: Vec<f64> = engine()
            .windowify_stream(&data, 4, 1)
            .unwrap()
            .map(|w| w.x_mean())
            .collect();
        // Windows start at 0, 3, 6; a window starting at 9 would need 13 rows.
        assert_eq!(means, vec![1.5, 4.5, 7.5]);
    }

    #[test]
    fn test_stream_matches_single_window() {
        let data = stream(10);
        let engine = engine();
        let streamed: Vec<FeatureWindow> =
            engine.windowify_stream(&data, 4, 2).unwrap().collect();
        let single: Vec<FeatureWindow> = data
            .instances()
            .windows(4)
            .step_by(2)
            .map(|window| engine.windowify_single(window).unwrap())
            .collect();
        assert_eq!(streamed.len(), 4);
        assert_eq!(streamed, single);
    }

    #[test]
    fn test_windowify_builds_new_dataset() {
        let data = stream(20);
        let log = ProtocolLog::default();
        let windowed = engine().windowify(&data, 8, 4, &log).unwrap();

        assert_eq!(windowed.len(), 4);
        assert_eq!(data.len(), 20);
        let names: Vec<&str> = windowed
            .schema()
            .attributes()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, WINDOW_ATTRIBUTES.to_vec());
        assert_eq!(windowed.schema().class_values(), data.schema().class_values());

        assert_eq!(log.stats().windows_emitted, 4);
        assert!(log.protocol().contains("size=8 and overlap=4"));
    }

    #[test]
    fn test_foreign_dataset_rejected() {
        let other = Arc::new(window_schema(&raw_schema()).unwrap());
        let data = Dataset::new(other);
        assert!(matches!(
            engine().windowify_stream(&data, 4, 2),
            Err(EvalError::Schema(_))
        ));
    }
}
