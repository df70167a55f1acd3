//! User-supplied capabilities plugged into the pipeline.
//!
//! - [`Transform`] runs on every transform worker, once per record, in no
//!   particular order.
//! - [`Aggregate`] runs on the single aggregation worker and may keep private
//!   state between calls.
//! - [`SinkHooks`] is invoked around the lifetime of every output destination.
//!
//! Transform and aggregate cannot report errors. An implementation that fails
//! must still decide a payload, either passing its input through or returning
//! `None`, so that every ingested index keeps flowing to the sink.
//!
//! Closures implement the first two traits directly:
//!
//! ```
//! use linebeam::{Aggregate, Transform};
//!
//! let upper = |line: Vec<u8>| Some(line.to_ascii_uppercase());
//! assert_eq!(upper.transform(b"abc".to_vec()), Some(b"ABC".to_vec()));
//!
//! let mut seen = 0usize;
//! let mut every_other = move |line: Vec<u8>| {
//!     seen += 1;
//!     (seen % 2 == 0).then_some(line)
//! };
//! assert_eq!(every_other.aggregate(b"a".to_vec()), None);
//! assert_eq!(every_other.aggregate(b"b".to_vec()), Some(b"b".to_vec()));
//! ```

use crate::error::HookError;
use std::io::Write;

/// Stateless one-record-in, one-record-out mapping.
pub trait Transform: Send + Sync {
    /// Map a payload. Returning `None` filters the record.
    fn transform(&self, payload: Vec<u8>) -> Option<Vec<u8>>;
}

impl<F> Transform for F
where
    F: Fn(Vec<u8>) -> Option<Vec<u8>> + Send + Sync,
{
    fn transform(&self, payload: Vec<u8>) -> Option<Vec<u8>> {
        self(payload)
    }
}

/// Passes every payload through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Transform for Identity {
    fn transform(&self, payload: Vec<u8>) -> Option<Vec<u8>> {
        Some(payload)
    }
}

/// Re-terminates every payload with `\n`, for sinks that write verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppendNewline;

impl Transform for AppendNewline {
    fn transform(&self, mut payload: Vec<u8>) -> Option<Vec<u8>> {
        payload.push(b'\n');
        Some(payload)
    }
}

/// Stateful fold over the record stream.
///
/// Called in delivery order, which is not input order when more than one
/// transform worker is configured.
pub trait Aggregate: Send {
    /// Fold a payload into the accumulator. Returns `Some` when an aggregate
    /// is ready to be written, `None` otherwise.
    fn aggregate(&mut self, payload: Vec<u8>) -> Option<Vec<u8>>;
}

impl<F> Aggregate for F
where
    F: FnMut(Vec<u8>) -> Option<Vec<u8>> + Send,
{
    fn aggregate(&mut self, payload: Vec<u8>) -> Option<Vec<u8>> {
        self(payload)
    }
}

/// Callbacks around an output destination, typically used for headers and footers.
///
/// `before_write` runs once right after the destination is created;
/// `after_write` runs once after the last payload, before the destination is
/// released. A hook error fails the run.
pub trait SinkHooks: Send + Sync {
    fn before_write(&self, _out: &mut dyn Write) -> Result<(), HookError> {
        Ok(())
    }

    fn after_write(&self, _out: &mut dyn Write) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl SinkHooks for NoopHooks {}
