//! Mock I/O helpers: temporary paths, output readers and a sink that fails
//! on demand.

use crate::error::{PipelineError, Result as PipelineResult};
use crate::record::Record;
use crate::sink::{Sink, destination_path};
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

/// A temporary file that is deleted when dropped.
pub struct TempFilePath {
    _temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn new() -> io::Result<Self> {
        let temp_file = NamedTempFile::new()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self {
            _temp_file: temp_file,
            path,
        })
    }

    /// Create a temporary file holding `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn with_contents(contents: &[u8]) -> io::Result<Self> {
        let temp = Self::new()?;
        fs::write(&temp.path, contents)?;
        Ok(temp)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory that is deleted, with its contents, when dropped.
pub struct TempDirPath {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path for `filename` within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

/// Read a file and split it into `\n`-separated lines, without a trailing
/// empty line.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut lines: Vec<Vec<u8>> = data.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
    if data.is_empty() || data.last() == Some(&b'\n') {
        lines.pop();
    }
    Ok(lines)
}

/// The rotation fragments `base_0.ext`, `base_1.ext`, ... present in `dir`,
/// stopping at the first missing index.
#[must_use]
pub fn existing_fragments(dir: &Path, base: &str, ext: &str) -> Vec<PathBuf> {
    (0..)
        .map(|n| destination_path(dir, base, ext, Some(n)))
        .take_while(|p| p.exists())
        .collect()
}

/// Create `count` placeholder fragments `base_0.ext` onwards, as left by an
/// earlier run.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn seed_fragments(dir: &Path, base: &str, ext: &str, count: usize) -> Result<Vec<PathBuf>> {
    (0..count)
        .map(|n| {
            let path = destination_path(dir, base, ext, Some(n));
            fs::write(&path, b"stale\n").with_context(|| format!("write {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

/// A sink that records accepted records and fails at a chosen point.
///
/// ```
/// use linebeam::Record;
/// use linebeam::sink::Sink;
/// use linebeam::testing::FailingSink;
///
/// let mut sink = FailingSink::new().fail_after(1);
/// sink.open().unwrap();
/// assert!(sink.write(Record::new(0, b"a".to_vec())).is_ok());
/// assert!(sink.write(Record::new(1, b"b".to_vec())).is_err());
/// assert_eq!(sink.written().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FailingSink {
    fail_open: bool,
    fail_after: Option<usize>,
    fail_close: bool,
    delay: Option<Duration>,
    written: Vec<Record>,
    opened: bool,
    closed: bool,
}

impl FailingSink {
    /// A sink that never fails until told to.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Accept `writes` records, then fail every further write.
    #[must_use]
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    #[must_use]
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Sleep for `delay` in every write.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Records accepted so far, in write order.
    #[must_use]
    pub fn written(&self) -> &[Record] {
        &self.written
    }

    #[must_use]
    pub fn was_opened(&self) -> bool {
        self.opened
    }

    #[must_use]
    pub fn was_closed(&self) -> bool {
        self.closed
    }

    fn injected(op: &'static str) -> PipelineError {
        PipelineError::destination(op, "failing-sink", io::Error::other(format!("injected {op} failure")))
    }
}

impl Sink for FailingSink {
    fn open(&mut self) -> PipelineResult<()> {
        if self.fail_open {
            return Err(Self::injected("create"));
        }
        self.opened = true;
        Ok(())
    }

    fn write(&mut self, record: Record) -> PipelineResult<usize> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_after.is_some_and(|n| self.written.len() >= n) {
            return Err(Self::injected("write"));
        }
        let n = record.len();
        self.written.push(record);
        Ok(n)
    }

    fn close(&mut self) -> PipelineResult<()> {
        self.closed = true;
        if self.fail_close {
            return Err(Self::injected("flush"));
        }
        Ok(())
    }
}
