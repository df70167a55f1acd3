//! The run orchestrator.
//!
//! A [`Pipeline`] wires four stages together with bounded queues:
//!
//! ```text
//! ingest ──▶ transform × workers ──▶ [aggregate × 1] ──▶ sink × 1
//! ```
//!
//! Ingestion runs on the calling thread. The transform stage is a dedicated
//! rayon pool with one long-lived worker per thread; aggregation and the sink
//! each get a named thread. Every queue holds at most `workers` records, so a
//! slow stage blocks the ones before it.
//!
//! Transform workers complete in any order. Input order is restored only by an
//! [`OrderingSink`](crate::sink::OrderingSink) at the end of the chain, and the
//! aggregation stage sees records in delivery order, not input order.

use crate::cancel::CancelToken;
use crate::capability::{Aggregate, SinkHooks, Transform};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, Stage};
use crate::reader::LineReader;
use crate::runner::{aggregate_worker, ingest, sink_worker, transform_worker};
use crate::sink::Sink;
use crate::stats::{RunStats, StatsSnapshot};
use crossbeam_channel::bounded;
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// One run of the line pipeline.
///
/// Statistics and the cancellation signal belong to this instance and are
/// handed to every stage; [`run`](Self::run) consumes it.
///
/// # Example
///
/// ```
/// use linebeam::{Pipeline, PipelineConfig};
/// use linebeam::sink::{MemorySink, OrderingSink, SharedBuffer};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = PipelineConfig { workers: 4, ..PipelineConfig::default() };
/// let upper = |line: Vec<u8>| Some(line.to_ascii_uppercase());
///
/// let out = SharedBuffer::new();
/// let mut sink = OrderingSink::new(MemorySink::new(out.clone()).with_line_terminator(true));
/// let stats = Pipeline::new(config, upper)?.run(&b"a\nb\nc\n"[..], &mut sink)?;
///
/// assert_eq!(out.contents(), b"A\nB\nC\n");
/// assert_eq!(stats.input, 3);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    transform: Arc<dyn Transform>,
    aggregate: Option<Box<dyn Aggregate>>,
    stats: Arc<RunStats>,
    cancel: CancelToken,
}

impl Pipeline {
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: PipelineConfig, transform: impl Transform + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transform: Arc::new(transform),
            aggregate: None,
            stats: Arc::new(RunStats::new()),
            cancel: CancelToken::new(),
        })
    }

    /// Add the single-worker aggregation stage after the transform stage.
    #[must_use]
    pub fn with_aggregate(mut self, aggregate: impl Aggregate + 'static) -> Self {
        self.aggregate = Some(Box::new(aggregate));
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Live statistics of this run, readable from any thread.
    #[must_use]
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Handle that aborts the run when fired.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the pipeline over `reader`, writing through `sink`.
    ///
    /// Returns the final statistics, or the first fatal error: an input error,
    /// then a worker panic, then a sink error, and finally
    /// [`PipelineError::Cancelled`] if the run was cancelled from outside.
    ///
    /// # Errors
    /// See above. Output already written is left in place.
    pub fn run<R, S>(self, reader: R, sink: &mut S) -> Result<StatsSnapshot>
    where
        R: BufRead,
        S: Sink + ?Sized,
    {
        let Pipeline {
            config,
            transform,
            aggregate,
            stats,
            cancel,
        } = self;
        let workers = config.workers;
        info!(
            "starting run: {workers} transform worker(s), aggregation {}, order {}",
            if aggregate.is_some() { "on" } else { "off" },
            if config.preserve_order { "preserved" } else { "unordered" },
        );
        stats.record_start();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("linebeam-transform-{i}"))
            .build()
            .map_err(|e| PipelineError::Spawn {
                stage: Stage::Transform,
                source: Box::new(e),
            })?;

        let outcome = thread::scope(|scope| -> Result<StageOutcome> {
            let (ingest_tx, transform_rx) = bounded(workers);
            let (sink_tx, sink_rx) = bounded(workers);

            // Without an aggregation stage the transform stage feeds the sink directly.
            let (transform_tx, aggregate_stage) = match aggregate {
                Some(mut aggregate) => {
                    let (transform_tx, aggregate_rx) = bounded(workers);
                    let cancel = &cancel;
                    let stats = &*stats;
                    let handle = thread::Builder::new()
                        .name("linebeam-aggregate".to_string())
                        .spawn_scoped(scope, move || {
                            aggregate_worker(&aggregate_rx, &sink_tx, aggregate.as_mut(), cancel, stats)
                        })
                        .map_err(|e| spawn_error(Stage::Aggregate, e))?;
                    (transform_tx, Some(handle))
                }
                None => (sink_tx, None),
            };
            let terminal = aggregate_stage.is_none();

            let transform_stage = {
                let (pool, transform, cancel, stats) = (&pool, &*transform, &cancel, &*stats);
                thread::Builder::new()
                    .name("linebeam-transform".to_string())
                    .spawn_scoped(scope, move || {
                        let results = pool.broadcast(|ctx| {
                            transform_worker(
                                ctx.index(),
                                &transform_rx,
                                &transform_tx,
                                transform,
                                cancel,
                                stats,
                                terminal,
                            )
                        });
                        // a worker that failed outright says more than one that saw it cancelled
                        results
                            .into_iter()
                            .filter_map(Result::err)
                            .min_by_key(PipelineError::is_cancelled)
                            .map_or(Ok(()), Err)
                    })
                    .map_err(|e| spawn_error(Stage::Transform, e))?
            };

            let sink_stage = {
                let cancel = &cancel;
                thread::Builder::new()
                    .name("linebeam-sink".to_string())
                    .spawn_scoped(scope, move || sink_worker(&sink_rx, sink, cancel))
                    .map_err(|e| spawn_error(Stage::Sink, e))?
            };

            let lines = LineReader::new(reader, config.max_line_len);
            let ingested = ingest(lines, ingest_tx, &cancel, &stats);

            let mut stages = vec![(Stage::Transform, join(Stage::Transform, transform_stage))];
            if let Some(handle) = aggregate_stage {
                stages.push((Stage::Aggregate, join(Stage::Aggregate, handle)));
            }
            stages.push((Stage::Sink, join(Stage::Sink, sink_stage)));
            Ok(StageOutcome { ingested, stages })
        });
        stats.record_end();

        let result = outcome.and_then(StageOutcome::resolve);
        let snapshot = stats.snapshot();
        match &result {
            Ok(()) => info!(
                "run finished: {} in, {} transformed, {} aggregated",
                snapshot.input, snapshot.transformed, snapshot.aggregated
            ),
            Err(e) => warn!("run failed after {} line(s): {e}", snapshot.input),
        }
        result.map(|()| snapshot)
    }

    /// Run over `reader` into the sink chain described by the configured output.
    ///
    /// # Errors
    /// Same as [`run`](Self::run), plus an invalid output configuration.
    pub fn run_to_output<R: BufRead>(self, reader: R, hooks: Arc<dyn SinkHooks>) -> Result<StatsSnapshot> {
        let mut sink = self.config.build_sink(hooks)?;
        self.run(reader, &mut sink)
    }

    /// Run over the file at `path` into the configured output.
    ///
    /// # Errors
    /// Same as [`run_to_output`](Self::run_to_output), plus failure to open `path`.
    pub fn run_file(self, path: impl AsRef<Path>, hooks: Arc<dyn SinkHooks>) -> Result<StatsSnapshot> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|source| PipelineError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        self.run_to_output(BufReader::new(f), hooks)
    }
}

fn spawn_error(stage: Stage, e: std::io::Error) -> PipelineError {
    PipelineError::Spawn {
        stage,
        source: Box::new(e),
    }
}

fn join(stage: Stage, handle: thread::ScopedJoinHandle<'_, Result<()>>) -> Result<()> {
    handle
        .join()
        .unwrap_or_else(|panic| Err(PipelineError::from_panic(stage, panic)))
}

struct StageOutcome {
    ingested: Result<u64>,
    stages: Vec<(Stage, Result<()>)>,
}

impl StageOutcome {
    /// Pick the run's result: an input error, then a panic, then a sink
    /// error, then any other stage error, then plain cancellation.
    fn resolve(self) -> Result<()> {
        let mut errors: Vec<(Stage, PipelineError)> = Vec::new();
        if let Err(e) = self.ingested {
            errors.push((Stage::Ingest, e));
        }
        errors.extend(self.stages.into_iter().filter_map(|(stage, r)| r.err().map(|e| (stage, e))));

        let rank = |(stage, e): &(Stage, PipelineError)| match (stage, e) {
            (_, PipelineError::Cancelled) => 4,
            (Stage::Ingest, _) => 0,
            (_, PipelineError::WorkerPanicked { .. }) => 1,
            (Stage::Sink, _) => 2,
            _ => 3,
        };
        match errors.into_iter().min_by_key(rank) {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }
}
