use super::Sink;
use crate::error::{PipelineError, Result};
use crate::record::Record;
use log::warn;
use std::collections::BTreeMap;

/// Restores input order before delegating to the wrapped sink.
///
/// Keeps the next index it needs (`expected`, starting at 0) and an
/// index-sorted buffer of records that arrived early. A record carrying
/// `expected` is written immediately, followed by every buffered record that
/// continues the run. Anything else is buffered.
///
/// Absent records take part like any other: they occupy their index and
/// advance `expected`, they just write nothing downstream.
///
/// Closing with records still buffered means some index never arrived, which
/// is reported as [`PipelineError::OrderingGap`].
pub struct OrderingSink<S> {
    inner: S,
    expected: u64,
    pending: BTreeMap<u64, Record>,
}

impl<S: Sink> OrderingSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            expected: 0,
            pending: BTreeMap::new(),
        }
    }

    /// The next index that will be written.
    #[must_use]
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Number of records currently held back.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink> Sink for OrderingSink<S> {
    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn write(&mut self, record: Record) -> Result<usize> {
        let index = record.index();
        if index < self.expected || self.pending.contains_key(&index) {
            return Err(PipelineError::DuplicateIndex {
                index,
                expected: self.expected,
            });
        }
        if index != self.expected {
            self.pending.insert(index, record);
            return Ok(0);
        }

        let mut written = self.inner.write(record)?;
        self.expected += 1;
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.expected {
                break;
            }
            written += self.inner.write(entry.remove())?;
            self.expected += 1;
        }
        Ok(written)
    }

    fn close(&mut self) -> Result<()> {
        let closed = self.inner.close();
        let Some(&next_held) = self.pending.keys().next() else {
            return closed;
        };
        if let Err(e) = closed {
            warn!("inner sink close failed behind an ordering gap: {e}");
        }
        Err(PipelineError::OrderingGap {
            expected: self.expected,
            pending: self.pending.len(),
            next_held,
        })
    }
}
