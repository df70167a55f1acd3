use super::Sink;
use crate::capability::{NoopHooks, SinkHooks};
use crate::error::{PipelineError, Result};
use crate::record::Record;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to the bytes written by a [`MemorySink`].
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Written bytes split on `\n`, without a trailing empty line.
    #[must_use]
    pub fn lines(&self) -> Vec<Vec<u8>> {
        let buf = self.lock();
        let mut lines: Vec<Vec<u8>> = buf.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
        if buf.last() == Some(&b'\n') || buf.is_empty() {
            lines.pop();
        }
        lines
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Basic sink writing into an in-memory [`SharedBuffer`].
///
/// Follows the same lifecycle and hook protocol as [`FileSink`](super::FileSink).
pub struct MemorySink {
    buffer: SharedBuffer,
    hooks: Arc<dyn SinkHooks>,
    terminate_lines: bool,
    open: bool,
}

impl MemorySink {
    /// A verbatim sink writing into `buffer`.
    #[must_use]
    pub fn new(buffer: SharedBuffer) -> Self {
        Self {
            buffer,
            hooks: Arc::new(NoopHooks),
            terminate_lines: false,
            open: false,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SinkHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_line_terminator(mut self, terminate_lines: bool) -> Self {
        self.terminate_lines = terminate_lines;
        self
    }

    #[must_use]
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }
}

impl Sink for MemorySink {
    fn open(&mut self) -> Result<()> {
        self.hooks
            .before_write(&mut self.buffer)
            .map_err(|source| PipelineError::Hook {
                hook: "before-write",
                target: "memory".to_string(),
                source,
            })?;
        self.open = true;
        Ok(())
    }

    fn write(&mut self, record: Record) -> Result<usize> {
        let Some(payload) = record.payload() else {
            return Ok(0);
        };
        if !self.open {
            return Err(PipelineError::SinkState {
                target: "memory".to_string(),
                state: "not open",
            });
        }
        let mut buf = self.buffer.lock();
        buf.extend_from_slice(payload);
        if self.terminate_lines {
            buf.push(b'\n');
            return Ok(payload.len() + 1);
        }
        Ok(payload.len())
    }

    fn close(&mut self) -> Result<()> {
        if !std::mem::replace(&mut self.open, false) {
            return Ok(());
        }
        self.hooks
            .after_write(&mut self.buffer)
            .map_err(|source| PipelineError::Hook {
                hook: "after-write",
                target: "memory".to_string(),
                source,
            })
    }
}
