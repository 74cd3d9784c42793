//! Append-only evaluation protocol.
//!
//! Every major operation (loading, filtering, windowing, partitioning,
//! training, evaluation) appends one timestamped line. Counters track how
//! much work a run performed and can be persisted next to the protocol.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Timestamp layout of protocol lines, e.g. `Tue, 03 Mar 2026 14:02:11 CET`.
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

#[derive(Debug, Default)]
struct ProtocolBuffer {
    lines: Vec<String>,
    /// Number of lines already written by `flush`
    flushed: usize,
}

/// Protocol of a single evaluation run.
#[derive(Debug)]
pub struct ProtocolLog {
    buffer: Mutex<ProtocolBuffer>,
    /// Number of feature windows emitted
    windows_emitted: AtomicU64,
    /// Number of raw instances dropped by filtering
    instances_filtered: AtomicU64,
    /// Number of fit/initialize calls made on classifiers
    classifiers_trained: AtomicU64,
    /// Number of stepwise checkpoints taken
    checkpoints_taken: AtomicU64,
    /// Number of evaluation results produced
    evaluations: AtomicU64,
    /// Run start time
    session_start: DateTime<Utc>,
    /// Time zone used for line timestamps
    timezone: Tz,
    /// Echo lines through `tracing`
    console: bool,
    /// File that `flush` appends to
    persist_path: Option<PathBuf>,
}

impl ProtocolLog {
    /// Open a new, empty protocol.
    pub fn open(timezone: Tz) -> Self {
        Self {
            buffer: Mutex::new(ProtocolBuffer::default()),
            windows_emitted: AtomicU64::new(0),
            instances_filtered: AtomicU64::new(0),
            classifiers_trained: AtomicU64::new(0),
            checkpoints_taken: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            session_start: Utc::now(),
            timezone,
            console: false,
            persist_path: None,
        }
    }

    /// Echo every appended line as a `tracing` info event.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Append lines to `path` whenever the protocol is flushed.
    pub fn with_persistence(mut self, path: PathBuf) -> Self {
        self.persist_path = Some(path);
        self
    }

    /// Append a timestamped line.
    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let timestamp = Utc::now().with_timezone(&self.timezone);
        let line = format!("[{}] - {message}", timestamp.format(TIMESTAMP_FORMAT));

        if self.console {
            tracing::info!("{message}");
        }
        self.buffer().lines.push(line);
    }

    /// All lines appended so far.
    pub fn lines(&self) -> Vec<String> {
        self.buffer().lines.clone()
    }

    /// The full protocol as one string.
    pub fn protocol(&self) -> String {
        self.buffer().lines.join("\n")
    }

    pub fn record_windows(&self, count: u64) {
        self.windows_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_filtered(&self, count: u64) {
        self.instances_filtered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_training(&self) {
        self.classifiers_trained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkpoint(&self) {
        self.checkpoints_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evaluation(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ProtocolStats {
        ProtocolStats {
            lines: self.buffer().lines.len() as u64,
            windows_emitted: self.windows_emitted.load(Ordering::Relaxed),
            instances_filtered: self.instances_filtered.load(Ordering::Relaxed),
            classifiers_trained: self.classifiers_trained.load(Ordering::Relaxed),
            checkpoints_taken: self.checkpoints_taken.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Protocol lines: {}\n\
             - Instances filtered: {}\n\
             - Windows emitted: {}\n\
             - Classifier trainings: {}\n\
             - Checkpoints taken: {}\n\
             - Evaluations produced: {}\n\
             - Run duration: {} seconds",
            stats.lines,
            stats.instances_filtered,
            stats.windows_emitted,
            stats.classifiers_trained,
            stats.checkpoints_taken,
            stats.evaluations,
            stats.session_duration_secs
        )
    }

    /// Append lines not yet written to the persistence file.
    pub fn flush(&self) -> Result<(), std::io::Error> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut buffer = self.buffer();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        for line in &buffer.lines[buffer.flushed..] {
            writeln!(file, "{line}")?;
        }
        buffer.flushed = buffer.lines.len();
        Ok(())
    }

    /// Write the complete protocol to `path`.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.protocol() + "\n")
    }

    /// Write the run statistics as JSON to `path`.
    pub fn save_stats(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.stats()).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    fn buffer(&self) -> MutexGuard<'_, ProtocolBuffer> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProtocolLog {
    fn default() -> Self {
        Self::open(Tz::UTC)
    }
}

/// Snapshot of protocol statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub lines: u64,
    pub windows_emitted: u64,
    pub instances_filtered: u64,
    pub classifiers_trained: u64,
    pub checkpoints_taken: u64,
    pub evaluations: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Protocol shared between the windowing step and the evaluation harness.
pub type SharedProtocolLog = Arc<ProtocolLog>;

/// Create a new shared protocol.
pub fn create_shared_log(timezone: Tz) -> SharedProtocolLog {
    Arc::new(ProtocolLog::open(timezone))
}
