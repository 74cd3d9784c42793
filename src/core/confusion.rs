//! Confusion matrix accounting and summary statistics.
//!
//! Rows are the true class, columns the predicted class:
//! `counts[actual][predicted]`.

use crate::dataset::Label;
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Minimum width of one rendered table cell, in characters.
const CELL_WIDTH: usize = 16;

/// Minimum width of the class column in the summary.
const CLASS_WIDTH: usize = 20;

/// Square predicted-vs-actual tally over a fixed label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    /// Empty matrix over the given class labels.
    pub fn new(labels: Vec<String>) -> Self {
        let dimension = labels.len();
        Self {
            labels,
            counts: vec![vec![0; dimension]; dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw counts, indexed `[actual][predicted]`.
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Record one prediction.
    pub fn accumulate(&mut self, predicted: Label, actual: Label) -> Result<()> {
        let dimension = self.dimension();
        if predicted >= dimension || actual >= dimension {
            return Err(EvalError::Schema(format!(
                "label pair (predicted {predicted}, actual {actual}) \
                 outside a {dimension}x{dimension} matrix"
            )));
        }
        self.counts[actual][predicted] += 1;
        Ok(())
    }

    pub fn count(&self, actual: Label, predicted: Label) -> u64 {
        self.counts
            .get(actual)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn trace(&self) -> u64 {
        (0..self.dimension()).map(|i| self.counts[i][i]).sum()
    }

    /// Number of instances whose true class is `actual`.
    pub fn row_sum(&self, actual: Label) -> u64 {
        self.counts.get(actual).map(|row| row.iter().sum()).unwrap_or(0)
    }

    /// Number of instances predicted as `predicted`.
    pub fn column_sum(&self, predicted: Label) -> u64 {
        self.counts
            .iter()
            .map(|row| row.get(predicted).copied().unwrap_or(0))
            .sum()
    }

    pub fn correct(&self) -> u64 {
        self.trace()
    }

    pub fn incorrect(&self) -> u64 {
        self.total() - self.trace()
    }

    /// `trace / total`, or 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.trace() as f64 / total as f64
    }

    pub fn error_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        1.0 - self.accuracy()
    }

    /// Cohen's kappa: agreement corrected for chance.
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let chance: f64 = (0..self.dimension())
            .map(|i| self.row_sum(i) as f64 * self.column_sum(i) as f64)
            .sum::<f64>()
            / (total * total);
        if chance < 1.0 {
            (self.accuracy() - chance) / (1.0 - chance)
        } else {
            1.0
        }
    }

    /// Share of predictions of `label` that were right; `None` if never predicted.
    pub fn precision(&self, label: Label) -> Option<f64> {
        let predicted = self.column_sum(label);
        (predicted > 0).then(|| self.count(label, label) as f64 / predicted as f64)
    }

    /// Share of true `label` instances found; `None` if the class never occurs.
    pub fn recall(&self, label: Label) -> Option<f64> {
        let actual = self.row_sum(label);
        (actual > 0).then(|| self.count(label, label) as f64 / actual as f64)
    }

    pub fn f1(&self, label: Label) -> Option<f64> {
        let precision = self.precision(label)?;
        let recall = self.recall(label)?;
        if precision + recall == 0.0 {
            return Some(0.0);
        }
        Some(2.0 * precision * recall / (precision + recall))
    }

    /// Width of every cell in [`render`](Self::render): `CELL_WIDTH`, or
    /// wider when a label would not fit with one space of padding.
    pub fn cell_width(&self) -> usize {
        self.label_width(CELL_WIDTH)
    }

    fn label_width(&self, minimum: usize) -> usize {
        self.labels
            .iter()
            .map(|label| label.chars().count() + 1)
            .max()
            .unwrap_or(0)
            .max(minimum)
    }

    /// Fixed-width table: header of label names, one row per true class with
    /// its row sum, a bottom row of column sums and the grand total.
    pub fn render(&self) -> String {
        let width = self.cell_width();
        let cell = |text: &str| format!("{text:>width$}");
        let label_cell = |text: &str| format!("{text:<width$}");
        let mut out = String::new();

        out.push_str(&" ".repeat(width));
        for label in &self.labels {
            out.push_str(&cell(label));
        }
        out.push_str(&cell("sum"));
        out.push('\n');

        for (actual, row) in self.counts.iter().enumerate() {
            out.push_str(&label_cell(&self.labels[actual]));
            for count in row {
                out.push_str(&cell(&count.to_string()));
            }
            out.push_str(&cell(&self.row_sum(actual).to_string()));
            out.push('\n');
        }

        out.push_str(&label_cell("sum"));
        for predicted in 0..self.dimension() {
            out.push_str(&cell(&self.column_sum(predicted).to_string()));
        }
        out.push_str(&cell(&self.total().to_string()));
        out
    }

    /// Summary block in the style of a classifier evaluation report.
    pub fn summary(&self) -> String {
        let total = self.total();
        let pct = |n: u64| {
            if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            }
        };

        let mut out = format!(
            "{:<40}{:>10}{:>12.4} %\n\
             {:<40}{:>10}{:>12.4} %\n\
             {:<40}{:>22.4}\n\
             {:<40}{:>10}\n",
            "Correctly Classified Instances",
            self.correct(),
            pct(self.correct()),
            "Incorrectly Classified Instances",
            self.incorrect(),
            pct(self.incorrect()),
            "Kappa statistic",
            self.kappa(),
            "Total Number of Instances",
            total,
        );

        let width = self.label_width(CLASS_WIDTH);
        out.push('\n');
        out.push_str(&format!(
            "{:<width$}{:>12}{:>12}{:>12}\n",
            "Class", "Precision", "Recall", "F1"
        ));
        for (label, name) in self.labels.iter().enumerate() {
            out.push_str(&format!(
                "{:<width$}{:>12}{:>12}{:>12}\n",
                name,
                fmt_metric(self.precision(label)),
                fmt_metric(self.recall(label)),
                fmt_metric(self.f1(label)),
            ));
        }
        out
    }
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
