//! Error type shared by the pipeline engine and the sink chain.
//!
//! Transform and aggregate capabilities cannot fail a run; they absorb their own
//! failures into the payload they return. Everything else that can go wrong
//! during a run is a [`PipelineError`], and the first fatal one becomes the
//! run's result.

use std::io;
use std::path::PathBuf;

/// Boxed error produced by a [`SinkHooks`](crate::SinkHooks) implementation.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Which stage of a run an error or panic originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Transform,
    Aggregate,
    Sink,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Transform => "transform",
            Stage::Aggregate => "aggregate",
            Stage::Sink => "sink",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An input line exceeded the configured maximum length.
    #[error("input line {line} exceeds the maximum line length of {limit} bytes")]
    LineTooLong { line: u64, limit: usize },

    /// The input file could not be opened.
    #[error("open input {}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input stream failed to read.
    #[error("read input near line {line}")]
    Read {
        line: u64,
        #[source]
        source: io::Error,
    },

    /// A destination could not be created, written, flushed or removed.
    #[error("{op} {}", .path.display())]
    Destination {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A sink was used outside its `unopened -> open -> closed` lifecycle.
    #[error("sink {target} is {state}")]
    SinkState { target: String, state: &'static str },

    /// A before/after hook rejected a destination.
    #[error("{hook} hook failed for {target}")]
    Hook {
        hook: &'static str,
        target: String,
        #[source]
        source: HookError,
    },

    /// The ordering sink was closed while records were still held back,
    /// meaning some index never reached the sink.
    #[error("ordering sink closed with {pending} held-back record(s); index {expected} never arrived (next held index {next_held})")]
    OrderingGap {
        expected: u64,
        pending: usize,
        next_held: u64,
    },

    /// The ordering sink saw the same index twice.
    #[error("record index {index} delivered twice (next expected {expected})")]
    DuplicateIndex { index: u64, expected: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A stage's worker threads could not be started.
    #[error("start {stage} workers")]
    Spawn {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A user capability or stage worker panicked.
    #[error("{stage} worker panicked: {message}")]
    WorkerPanicked { stage: Stage, message: String },

    /// The run was cancelled before the input was fully consumed.
    #[error("pipeline run was cancelled")]
    Cancelled,
}

impl PipelineError {
    pub(crate) fn destination(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Destination {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether this error is the cancellation indicator rather than a root cause.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }

    /// Build a [`PipelineError::WorkerPanicked`] from a caught panic payload.
    pub(crate) fn from_panic(stage: Stage, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        PipelineError::WorkerPanicked { stage, message }
    }
}
