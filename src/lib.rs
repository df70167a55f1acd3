//! # linebeam
//!
//! A **parallel line-processing pipeline** for Rust. linebeam reads a byte
//! stream line by line, maps every line on a pool of worker threads, optionally
//! folds the results on a single aggregation worker, and writes them through a
//! composable chain of sinks.
//!
//! ## Key Features
//!
//! - **Bounded stages** - ingestion, transform, aggregation and sink stages
//!   connected by queues that never hold more than `workers` records
//! - **Order restoration** - [`OrderingSink`](sink::OrderingSink) writes records
//!   in input order no matter which worker finished first
//! - **Output rotation** - [`RotatingSink`](sink::RotatingSink) splits output into
//!   numbered fragments and removes fragments left by earlier runs
//! - **Clean failure** - a failing stage cancels the run and every other stage
//!   drains and stops; no thread is left blocked
//! - **Run statistics** - live counters and a JSON report per run
//!
//! ## Quick Start
//!
//! ```
//! use linebeam::sink::{MemorySink, OrderingSink, SharedBuffer};
//! use linebeam::{Pipeline, PipelineConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = b"3\tapples\n5\tpears\n1\tplums\n";
//!
//! // keep lines whose count is at least 2, and put the fruit first
//! let swap = |line: Vec<u8>| -> Option<Vec<u8>> {
//!     let text = String::from_utf8(line).ok()?;
//!     let (count, fruit) = text.split_once('\t')?;
//!     (count.parse::<u32>().ok()? >= 2).then(|| format!("{fruit}={count}").into_bytes())
//! };
//!
//! let out = SharedBuffer::new();
//! let mut sink = OrderingSink::new(MemorySink::new(out.clone()).with_line_terminator(true));
//! let config = PipelineConfig { workers: 2, ..PipelineConfig::default() };
//! let stats = Pipeline::new(config, swap)?.run(&input[..], &mut sink)?;
//!
//! assert_eq!(out.contents(), b"apples=3\npears=5\n");
//! assert_eq!((stats.input, stats.transformed), (3, 2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! Every input line becomes a [`Record`]: the line's zero-based position in the
//! input plus a payload. A stage that filters a line leaves the record
//! *absent* instead of dropping it, so the ordering sink can still account for
//! its index.
//!
//! ### Capabilities
//!
//! - [`Transform`] - stateless per-line mapping, run concurrently
//! - [`Aggregate`] - stateful fold, run on one worker in delivery order
//! - [`SinkHooks`] - callbacks when a destination opens and before it closes
//!
//! Closures implement [`Transform`] and [`Aggregate`] directly.
//!
//! ### Sinks
//!
//! A [`Sink`] is opened once, written once per record and closed once. Basic
//! sinks own one destination; [`RotatingSink`](sink::RotatingSink) and
//! [`OrderingSink`](sink::OrderingSink) wrap other sinks.
//! [`PipelineConfig::build_sink`] assembles the usual file-backed chain.
//!
//! ### Failure
//!
//! Capabilities cannot fail a run. Input errors, sink errors, hook errors and
//! panics in user code do: the first of them fires the run's
//! [`CancelToken`], the remaining stages drain their queues, and
//! [`Pipeline::run`] returns the root cause as a [`PipelineError`].
//!
//! ## Logging
//!
//! linebeam logs through the [`log`] facade: run start and end at `info`,
//! stage shutdown at `debug`, cancellation at `warn`. Install any logger in
//! the binary to see them.
//!
//! ## Testing
//!
//! The [`testing`] module has seeded input generators, a keyed summing fold,
//! temporary paths and a [`FailingSink`](testing::FailingSink) for fault
//! injection.

pub mod cancel;
pub mod capability;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod record;
mod runner;
pub mod sink;
pub mod stats;
pub mod testing;

pub use cancel::CancelToken;
pub use capability::{Aggregate, AppendNewline, Identity, NoopHooks, SinkHooks, Transform};
pub use config::{DEFAULT_MAX_LINE_LEN, OutputConfig, PipelineConfig};
pub use error::{HookError, PipelineError, Result, Stage};
pub use pipeline::Pipeline;
pub use reader::LineReader;
pub use record::Record;
pub use sink::Sink;
pub use stats::{RunStats, StatsSnapshot};
