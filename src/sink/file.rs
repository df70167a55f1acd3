use super::{Sink, destination_path};
use crate::capability::{NoopHooks, SinkHooks};
use crate::error::{PipelineError, Result};
use crate::record::Record;
use log::debug;
use std::fmt;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Template describing where output files go and how they are written.
///
/// A [`FileSink`] is built from it for a single file, and a
/// [`RotatingSink`](super::RotatingSink) builds one per rotation index.
#[derive(Clone)]
pub struct Destination {
    dir: PathBuf,
    base: String,
    ext: String,
    hooks: Arc<dyn SinkHooks>,
    terminate_lines: bool,
}

impl Destination {
    /// Files named `<dir>/<base>.<ext>`, written verbatim, with no hooks.
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            ext: ext.into(),
            hooks: Arc::new(NoopHooks),
            terminate_lines: false,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SinkHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Append `\n` after every present payload.
    #[must_use]
    pub fn with_line_terminator(mut self, terminate_lines: bool) -> Self {
        self.terminate_lines = terminate_lines;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Path for the given rotation index, or the unrotated path for `None`.
    #[must_use]
    pub fn path(&self, rotation: Option<usize>) -> PathBuf {
        destination_path(&self.dir, &self.base, &self.ext, rotation)
    }

    /// An unopened sink for the given rotation index.
    #[must_use]
    pub fn sink(&self, rotation: Option<usize>) -> FileSink {
        FileSink {
            path: self.path(rotation),
            hooks: Arc::clone(&self.hooks),
            terminate_lines: self.terminate_lines,
            state: State::Unopened,
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("dir", &self.dir)
            .field("base", &self.base)
            .field("ext", &self.ext)
            .field("terminate_lines", &self.terminate_lines)
            .finish_non_exhaustive()
    }
}

enum State {
    Unopened,
    Open(BufWriter<File>),
    Closed,
}

/// Basic sink owning exactly one output file.
///
/// Lifecycle is `unopened -> open -> closed`. `open` creates the file
/// (and any missing parent directories) and runs the before-write hook;
/// `close` runs the after-write hook, flushes and releases the file.
pub struct FileSink {
    path: PathBuf,
    hooks: Arc<dyn SinkHooks>,
    terminate_lines: bool,
    state: State,
}

impl FileSink {
    /// Single-file sink at `<dir>/<base>.<ext>`.
    pub fn new(dest: &Destination) -> Self {
        dest.sink(None)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    fn state_error(&self, state: &'static str) -> PipelineError {
        PipelineError::SinkState {
            target: self.path.display().to_string(),
            state,
        }
    }
}

impl Sink for FileSink {
    fn open(&mut self) -> Result<()> {
        match self.state {
            State::Unopened => {}
            State::Open(_) => return Err(self.state_error("already open")),
            State::Closed => return Err(self.state_error("closed")),
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).map_err(|e| PipelineError::destination("mkdir -p", parent, e))?;
        }
        let f = File::create(&self.path).map_err(|e| PipelineError::destination("create", &self.path, e))?;
        let mut w = BufWriter::new(f);
        self.hooks
            .before_write(&mut w)
            .map_err(|source| PipelineError::Hook {
                hook: "before-write",
                target: self.path.display().to_string(),
                source,
            })?;
        debug!("opened {}", self.path.display());
        self.state = State::Open(w);
        Ok(())
    }

    fn write(&mut self, record: Record) -> Result<usize> {
        let Some(payload) = record.payload() else {
            return Ok(0);
        };
        let State::Open(w) = &mut self.state else {
            return Err(self.state_error("not open"));
        };
        let mut n = payload.len();
        let res = if self.terminate_lines {
            n += 1;
            w.write_all(payload).and_then(|()| w.write_all(b"\n"))
        } else {
            w.write_all(payload)
        };
        res.map_err(|e| PipelineError::destination("write", &self.path, e))?;
        Ok(n)
    }

    fn close(&mut self) -> Result<()> {
        let State::Open(mut w) = std::mem::replace(&mut self.state, State::Closed) else {
            return Ok(());
        };
        let hook = self.hooks.after_write(&mut w);
        let flushed = w.flush();
        drop(w);
        debug!("closed {}", self.path.display());
        hook.map_err(|source| PipelineError::Hook {
            hook: "after-write",
            target: self.path.display().to_string(),
            source,
        })?;
        flushed.map_err(|e| PipelineError::destination("flush", &self.path, e))
    }
}
