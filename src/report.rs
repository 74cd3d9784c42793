//! Evaluation reports.
//!
//! A report wraps evaluation results with producer metadata so runs can be
//! archived and compared later. Reports render either as the plain-text
//! results block or as JSON.

use crate::core::{Checkpoint, EvaluationResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "synheart-activity-eval";

const BANNER_RULE: &str = "------------------------------------------------";
const BANNER_TITLE: &str = "-------------------- RESULTS -------------------";

/// Which evaluation strategy produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    Offline,
    Online,
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationMode::Offline => write!(f, "offline"),
            EvaluationMode::Online => write!(f, "online"),
        }
    }
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique run identifier (UUID)
    pub run_id: String,
    /// Host the run executed on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Report of a single cumulative evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Report schema version
    pub report_version: String,
    /// When this report was produced (RFC3339)
    pub created_at_utc: String,
    pub producer: ReportProducer,
    pub mode: EvaluationMode,
    /// Relation name of the evaluated dataset
    pub relation: String,
    /// One result per classifier, in registration order
    pub results: Vec<EvaluationResult>,
}

impl EvaluationReport {
    /// Plain-text results block: one section per classifier with its
    /// summary statistics and confusion matrix.
    pub fn render_text(&self) -> String {
        let mut out = banner();
        for result in &self.results {
            out.push_str(&render_result(result));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Accuracy development of one classifier across checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyTrend {
    pub classifier: String,
    /// Number of checkpoints the trend covers
    pub checkpoints: usize,
    pub mean_accuracy: f64,
    /// Sample standard deviation; absent with fewer than 2 checkpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev_accuracy: Option<f64>,
    pub best_accuracy: f64,
    /// Training size at the first checkpoint reaching `best_accuracy`
    pub best_training_size: usize,
    pub final_accuracy: f64,
}

impl AccuracyTrend {
    /// Trend of the classifier at `index` over `checkpoints`.
    ///
    /// Returns `None` when no checkpoint holds a result for that index.
    pub fn from_checkpoints(index: usize, checkpoints: &[Checkpoint]) -> Option<Self> {
        let points: Vec<(usize, &EvaluationResult)> = checkpoints
            .iter()
            .filter_map(|c| c.results.get(index).map(|r| (c.training_size, r)))
            .collect();
        let (_, last) = points.last()?;

        let accuracies: Vec<f64> = points.iter().map(|(_, r)| r.accuracy()).collect();
        let (best_training_size, best_accuracy) = points
            .iter()
            .map(|(size, r)| (*size, r.accuracy()))
            .fold((0, f64::NEG_INFINITY), |best, point| {
                if point.1 > best.1 {
                    point
                } else {
                    best
                }
            });

        let std_dev_accuracy = if accuracies.len() >= 2 {
            Some(accuracies.iter().std_dev())
        } else {
            None
        };

        Some(Self {
            classifier: last.classifier.clone(),
            checkpoints: accuracies.len(),
            mean_accuracy: accuracies.iter().mean(),
            std_dev_accuracy,
            best_accuracy,
            best_training_size,
            final_accuracy: last.accuracy(),
        })
    }
}

/// Report of a stepwise evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepwiseReport {
    pub report_version: String,
    pub created_at_utc: String,
    pub producer: ReportProducer,
    pub mode: EvaluationMode,
    pub relation: String,
    /// Effective step size between checkpoints
    pub step_size: usize,
    pub checkpoints: Vec<Checkpoint>,
    /// One trend per classifier, in registration order
    pub trends: Vec<AccuracyTrend>,
}

impl StepwiseReport {
    /// Accuracy table over all checkpoints, trend statistics, and the full
    /// results block of the final checkpoint.
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Stepwise {} evaluation of '{}' (step size {})\n\n",
            self.mode, self.relation, self.step_size
        );

        let width = self
            .trends
            .iter()
            .map(|trend| trend.classifier.chars().count() + 1)
            .fold(20, usize::max);
        out.push_str(&format!("{:>14}", "training size"));
        for trend in &self.trends {
            out.push_str(&format!("{:>width$}", trend.classifier));
        }
        out.push('\n');
        for checkpoint in &self.checkpoints {
            out.push_str(&format!("{:>14}", checkpoint.training_size));
            for result in &checkpoint.results {
                out.push_str(&format!("{:>width$.4}", result.accuracy()));
            }
            out.push('\n');
        }

        out.push('\n');
        for trend in &self.trends {
            let std_dev = trend
                .std_dev_accuracy
                .map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
            out.push_str(&format!(
                "{}: mean {:.4}, std-dev {}, best {:.4} at {} instances, final {:.4}\n",
                trend.classifier,
                trend.mean_accuracy,
                std_dev,
                trend.best_accuracy,
                trend.best_training_size,
                trend.final_accuracy
            ));
        }

        if let Some(last) = self.checkpoints.last() {
            out.push_str(&banner());
            for result in &last.results {
                out.push_str(&render_result(result));
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builder for evaluation reports.
pub struct ReportBuilder {
    run_id: Uuid,
    host: Option<String>,
    mode: EvaluationMode,
}

impl ReportBuilder {
    /// Create a new builder with a unique run ID, tagged with the local host name.
    pub fn new(mode: EvaluationMode) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok());
        Self {
            run_id: Uuid::new_v4(),
            host,
            mode,
        }
    }

    /// Override the recorded host name.
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    fn producer(&self) -> ReportProducer {
        ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: crate::VERSION.to_string(),
            run_id: self.run_id.to_string(),
            host: self.host.clone(),
        }
    }

    /// Build a report from the results of a cumulative evaluation.
    pub fn build(&self, relation: &str, results: Vec<EvaluationResult>) -> EvaluationReport {
        EvaluationReport {
            report_version: REPORT_VERSION.to_string(),
            created_at_utc: Utc::now().to_rfc3339(),
            producer: self.producer(),
            mode: self.mode,
            relation: relation.to_string(),
            results,
        }
    }

    /// Build a report from the checkpoints of a stepwise evaluation.
    pub fn build_stepwise(
        &self,
        relation: &str,
        step_size: usize,
        checkpoints: Vec<Checkpoint>,
    ) -> StepwiseReport {
        let classifiers = checkpoints
            .iter()
            .map(|c| c.results.len())
            .max()
            .unwrap_or(0);
        let trends = (0..classifiers)
            .filter_map(|index| AccuracyTrend::from_checkpoints(index, &checkpoints))
            .collect();

        StepwiseReport {
            report_version: REPORT_VERSION.to_string(),
            created_at_utc: Utc::now().to_rfc3339(),
            producer: self.producer(),
            mode: self.mode,
            relation: relation.to_string(),
            step_size,
            checkpoints,
            trends,
        }
    }
}

fn banner() -> String {
    format!("\n{BANNER_RULE}\n{BANNER_TITLE}\n{BANNER_RULE}\n")
}

fn render_result(result: &EvaluationResult) -> String {
    let heading = format!("Classifier {}", result.classifier);
    format!(
        "\n{heading}\n{}\n{}{:<40}{:>22}\n{:<40}{:>22.4}\n\n{}\n",
        "-".repeat(heading.chars().count() + 2),
        result.matrix.summary(),
        "Training instances",
        result.training_size,
        "Majority class baseline",
        result.majority_baseline(),
        result.matrix.render(),
    )
}
