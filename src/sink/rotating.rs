use super::{Destination, FileSink, Sink};
use crate::error::{PipelineError, Result};
use crate::record::Record;
use log::{debug, info};
use std::fs::remove_file;
use std::io::ErrorKind;

/// Splits accepted writes across `base_<n>.<ext>` files, `split_size` per file.
///
/// Files are opened lazily: the first present record after a rotation opens
/// `base_<accepted / split_size>`, and the file is closed as soon as it has
/// received `split_size` records. Absent records neither open a file nor
/// advance the count.
///
/// On close, rotation indices past the last file this sink opened are
/// removed one by one until the first index that does not exist. This
/// reclaims fragments left by an earlier, larger run at the same base name.
pub struct RotatingSink {
    dest: Destination,
    split_size: usize,
    accepted: usize,
    current: Option<FileSink>,
    last_opened: Option<usize>,
}

impl RotatingSink {
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] if `split_size` is zero.
    pub fn new(dest: Destination, split_size: usize) -> Result<Self> {
        if split_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "rotation split size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            dest,
            split_size,
            accepted: 0,
            current: None,
            last_opened: None,
        })
    }

    /// Number of present records written so far.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Highest rotation index opened so far, if any.
    #[must_use]
    pub fn last_opened(&self) -> Option<usize> {
        self.last_opened
    }

    fn open_next(&mut self) -> Result<FileSink> {
        let rotation = self.accepted / self.split_size;
        let mut sink = self.dest.sink(Some(rotation));
        sink.open()?;
        self.last_opened = Some(rotation);
        Ok(sink)
    }

    fn remove_stale(&self) -> Result<()> {
        let mut rotation = self.last_opened.map_or(0, |n| n + 1);
        loop {
            let path = self.dest.path(Some(rotation));
            match remove_file(&path) {
                Ok(()) => info!("removed stale fragment {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(PipelineError::destination("remove", path, e)),
            }
            rotation += 1;
        }
    }
}

impl Sink for RotatingSink {
    fn open(&mut self) -> Result<()> {
        debug!(
            "rotating sink for {} ready, {} records per file",
            self.dest.path(None).display(),
            self.split_size
        );
        Ok(())
    }

    fn write(&mut self, record: Record) -> Result<usize> {
        if record.is_absent() {
            return Ok(0);
        }
        let mut sink = match self.current.take() {
            Some(sink) => sink,
            None => self.open_next()?,
        };
        let n = match sink.write(record) {
            Ok(n) => n,
            Err(e) => {
                self.current = Some(sink);
                return Err(e);
            }
        };
        self.accepted += 1;
        if self.accepted % self.split_size == 0 {
            sink.close()?;
        } else {
            self.current = Some(sink);
        }
        Ok(n)
    }

    fn close(&mut self) -> Result<()> {
        let closed = self.current.take().map_or(Ok(()), |mut sink| sink.close());
        let cleaned = self.remove_stale();
        closed.and(cleaned)
    }
}
