//! Run statistics.
//!
//! Every run owns one [`RunStats`]. Stages bump its counters with atomic
//! increments, so it can be read from another thread while the run is in
//! flight (values are approximate until the run returns, exact afterwards).
//!
//! # Example
//!
//! ```no_run
//! use linebeam::{Identity, Pipeline, PipelineConfig};
//! use linebeam::sink::{MemorySink, SharedBuffer};
//! # fn main() -> anyhow::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default(), Identity)?;
//! let stats = pipeline.stats();
//!
//! let mut sink = MemorySink::new(SharedBuffer::new());
//! let snapshot = pipeline.run(&b"a\nb\n"[..], &mut sink)?;
//! assert_eq!(snapshot, stats.snapshot());
//!
//! snapshot.print();
//! snapshot.save_to_file("run-stats.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Live counters for a single run.
#[derive(Debug, Default)]
pub struct RunStats {
    input: AtomicU64,
    transformed: AtomicU64,
    aggregated: AtomicU64,
    timing: Mutex<Timing>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Timing {
    start: Option<Instant>,
    end: Option<Instant>,
}

impl RunStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines read from the input.
    #[must_use]
    pub fn input(&self) -> u64 {
        self.input.load(Ordering::Relaxed)
    }

    /// Records whose payload survived the transform stage.
    #[must_use]
    pub fn transformed(&self) -> u64 {
        self.transformed.load(Ordering::Relaxed)
    }

    /// Records emitted by the aggregation stage, or by the transform stage
    /// when no aggregation stage is configured.
    #[must_use]
    pub fn aggregated(&self) -> u64 {
        self.aggregated.load(Ordering::Relaxed)
    }

    pub(crate) fn add_input(&self) {
        self.input.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_transformed(&self) {
        self.transformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_aggregated(&self) {
        self.aggregated.fetch_add(1, Ordering::Relaxed);
    }

    fn timing(&self) -> Timing {
        *self.timing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_start(&self) {
        self.timing.lock().unwrap_or_else(PoisonError::into_inner).start = Some(Instant::now());
    }

    pub(crate) fn record_end(&self) {
        self.timing.lock().unwrap_or_else(PoisonError::into_inner).end = Some(Instant::now());
    }

    /// Wall-clock time of the run: up to now while running, final once finished.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let t = self.timing();
        let start = t.start?;
        Some(t.end.unwrap_or_else(Instant::now).duration_since(start))
    }

    /// Point-in-time copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let t = self.timing();
        StatsSnapshot {
            input: self.input(),
            transformed: self.transformed(),
            aggregated: self.aggregated(),
            elapsed_ms: match (t.start, t.end) {
                (Some(start), Some(end)) => {
                    Some(u64::try_from(end.duration_since(start).as_millis()).unwrap_or(u64::MAX))
                }
                _ => None,
            },
        }
    }
}

/// Counters of a run, as returned by [`Pipeline::run`](crate::Pipeline::run).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub input: u64,
    pub transformed: u64,
    pub aggregated: u64,
    /// Total run time, present once the run has finished.
    pub elapsed_ms: Option<u64>,
}

impl StatsSnapshot {
    /// The counters as a JSON object, each with a value and a description.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert(
            "input_lines".to_string(),
            json!({ "value": self.input, "description": "Lines read from the input" }),
        );
        out.insert(
            "transformed".to_string(),
            json!({ "value": self.transformed, "description": "Records kept by the transform stage" }),
        );
        out.insert(
            "aggregated".to_string(),
            json!({ "value": self.aggregated, "description": "Records emitted towards the sink" }),
        );
        if let Some(ms) = self.elapsed_ms {
            out.insert(
                "execution_time_ms".to_string(),
                json!({ "value": ms, "description": "Total pipeline execution time in milliseconds" }),
            );
        }
        Value::Object(out)
    }

    /// Print the counters to stdout in a human-readable format.
    pub fn print(&self) {
        println!("\n========== Pipeline Stats ==========");
        if let Some(ms) = self.elapsed_ms {
            println!("Execution Time: {:.3}s ({ms} ms)", Duration::from_millis(ms).as_secs_f64());
            println!("------------------------------------");
        }
        println!("input_lines: {}", self.input);
        println!("transformed: {}", self.transformed);
        println!("aggregated: {}", self.aggregated);
        println!("====================================\n");
    }

    /// Save the counters to a pretty-printed JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
