//! Stage workers.
//!
//! Each function here is the body of one stage of a run. They share two rules:
//!
//! - a record is never dropped on the happy path, absent or not, so the
//!   ordering sink can account for every index;
//! - a stage that gives up fires the [`CancelToken`] and then keeps receiving
//!   and discarding until its input queue closes, so no upstream producer is
//!   left blocked on a full queue.

use crate::cancel::CancelToken;
use crate::capability::{Aggregate, Transform};
use crate::error::{PipelineError, Result, Stage};
use crate::reader::LineReader;
use crate::record::Record;
use crate::sink::Sink;
use crate::stats::RunStats;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use std::io::BufRead;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Discard everything left in `rx` until every sender is gone.
fn drain(rx: &Receiver<Record>, stage: Stage) {
    let discarded = rx.iter().count();
    debug!("{stage} stage drained {discarded} record(s)");
}

/// Cancel the run, drain the input queue and hand back `err`.
fn abort(rx: &Receiver<Record>, cancel: &CancelToken, stage: Stage, err: PipelineError) -> PipelineError {
    if cancel.cancel() {
        warn!("{stage} stage cancelled the run: {err}");
    }
    drain(rx, stage);
    err
}

/// Read lines, number them from 0 and push them to the transform stage.
///
/// Returns the number of records produced. Dropping `tx` on return closes
/// the transform stage's queue.
pub(crate) fn ingest<R: BufRead>(
    mut lines: LineReader<R>,
    tx: Sender<Record>,
    cancel: &CancelToken,
    stats: &RunStats,
) -> Result<u64> {
    let mut index = 0u64;
    loop {
        if cancel.is_cancelled() {
            debug!("ingest stopped by cancellation after {index} line(s)");
            return Err(PipelineError::Cancelled);
        }
        let line = match lines.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                cancel.cancel();
                return Err(e);
            }
        };
        stats.add_input();
        if tx.send(Record::new(index, line)).is_err() {
            // every transform worker is gone; whoever failed reports why
            cancel.cancel();
            return Err(PipelineError::Cancelled);
        }
        index += 1;
    }
    debug!("ingest finished: {index} line(s)");
    Ok(index)
}

/// One transform worker: pull, transform, push until the queue closes.
///
/// `terminal` marks the transform stage as the last one before the sink, in
/// which case kept records also count as aggregated.
pub(crate) fn transform_worker(
    worker: usize,
    rx: &Receiver<Record>,
    tx: &Sender<Record>,
    transform: &dyn Transform,
    cancel: &CancelToken,
    stats: &RunStats,
    terminal: bool,
) -> Result<()> {
    let mut handled = 0u64;
    for mut record in rx {
        if let Some(payload) = record.take_payload() {
            match catch_unwind(AssertUnwindSafe(|| transform.transform(payload))) {
                Ok(out) => record.set_payload(out),
                Err(panic) => {
                    let err = PipelineError::from_panic(Stage::Transform, panic);
                    return Err(abort(rx, cancel, Stage::Transform, err));
                }
            }
            if !record.is_absent() {
                stats.add_transformed();
                if terminal {
                    stats.add_aggregated();
                }
            }
        }
        if tx.send(record).is_err() {
            return Err(abort(rx, cancel, Stage::Transform, PipelineError::Cancelled));
        }
        handled += 1;
    }
    debug!("transform worker {worker} finished after {handled} record(s)");
    Ok(())
}

/// The single aggregation worker, folding records in delivery order.
///
/// Records that reach it already absent are forwarded without calling the fold.
pub(crate) fn aggregate_worker(
    rx: &Receiver<Record>,
    tx: &Sender<Record>,
    aggregate: &mut dyn Aggregate,
    cancel: &CancelToken,
    stats: &RunStats,
) -> Result<()> {
    for mut record in rx {
        if let Some(payload) = record.take_payload() {
            match catch_unwind(AssertUnwindSafe(|| aggregate.aggregate(payload))) {
                Ok(out) => record.set_payload(out),
                Err(panic) => {
                    let err = PipelineError::from_panic(Stage::Aggregate, panic);
                    return Err(abort(rx, cancel, Stage::Aggregate, err));
                }
            }
            if !record.is_absent() {
                stats.add_aggregated();
            }
        }
        if tx.send(record).is_err() {
            return Err(abort(rx, cancel, Stage::Aggregate, PipelineError::Cancelled));
        }
    }
    debug!("aggregate worker finished");
    Ok(())
}

/// The single sink worker: open, write every record, close.
///
/// A failed open or write cancels the run and drains the queue without
/// closing the sink; a failed close cancels the run.
pub(crate) fn sink_worker<S: Sink + ?Sized>(
    rx: &Receiver<Record>,
    sink: &mut S,
    cancel: &CancelToken,
) -> Result<()> {
    if let Err(e) = sink.open() {
        return Err(abort(rx, cancel, Stage::Sink, e));
    }
    let mut bytes = 0usize;
    for record in rx {
        match sink.write(record) {
            Ok(n) => bytes += n,
            Err(e) => return Err(abort(rx, cancel, Stage::Sink, e)),
        }
    }
    if let Err(e) = sink.close() {
        if cancel.cancel() {
            warn!("sink close cancelled the run: {e}");
        }
        return Err(e);
    }
    debug!("sink finished: {bytes} byte(s) written");
    Ok(())
}
