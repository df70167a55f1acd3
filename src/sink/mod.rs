//! Output sinks and the decorators that compose over them.
//!
//! A run writes through a chain built once per run:
//!
//! - [`FileSink`] / [`MemorySink`] - basic sinks owning exactly one destination
//! - [`RotatingSink`] - splits accepted writes across `base_<n>.<ext>` files
//! - [`OrderingSink`] - holds back out-of-order records until their turn
//!
//! Every piece implements [`Sink`], so decorators wrap either a concrete sink
//! or a `Box<dyn Sink>`.
//!
//! # Example
//!
//! ```no_run
//! use linebeam::sink::{Destination, OrderingSink, RotatingSink, Sink};
//! use linebeam::Record;
//! # fn main() -> linebeam::Result<()> {
//! let dest = Destination::new("out", "events", "log").with_line_terminator(true);
//! let mut sink = OrderingSink::new(RotatingSink::new(dest, 1000)?);
//! sink.open()?;
//! sink.write(Record::new(1, b"second".to_vec()))?; // held back
//! sink.write(Record::new(0, b"first".to_vec()))?; // writes both
//! sink.close()?;
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;
mod ordering;
mod rotating;

pub use file::{Destination, FileSink};
pub use memory::{MemorySink, SharedBuffer};
pub use ordering::OrderingSink;
pub use rotating::RotatingSink;

use crate::error::Result;
use crate::record::Record;
use std::path::{Path, PathBuf};

/// Common capability of every sink in the chain.
pub trait Sink: Send {
    /// Prepare the sink for writing. Called once before the first write.
    ///
    /// # Errors
    /// Returns an error if the destination cannot be created or its
    /// before-write hook fails.
    fn open(&mut self) -> Result<()>;

    /// Write one record, returning the number of bytes that reached a
    /// destination. Absent records write nothing.
    ///
    /// # Errors
    /// Returns an error if the underlying destination rejects the write.
    fn write(&mut self, record: Record) -> Result<usize>;

    /// Finish writing and release every destination.
    ///
    /// # Errors
    /// Returns an error if flushing, the after-write hook, or releasing a
    /// destination fails.
    fn close(&mut self) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn write(&mut self, record: Record) -> Result<usize> {
        (**self).write(record)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Path of an output destination.
///
/// `<dir>/<base>.<ext>` without rotation, `<dir>/<base>_<n>.<ext>` with it.
/// A leading dot on `ext` is ignored and an empty `ext` adds no dot.
///
/// ```
/// use linebeam::sink::destination_path;
/// use std::path::Path;
///
/// let dir = Path::new("out");
/// assert_eq!(destination_path(dir, "run", "txt", None), dir.join("run.txt"));
/// assert_eq!(destination_path(dir, "run", ".txt", Some(3)), dir.join("run_3.txt"));
/// assert_eq!(destination_path(dir, "run", "", Some(0)), dir.join("run_0"));
/// ```
#[must_use]
pub fn destination_path(dir: &Path, base: &str, ext: &str, rotation: Option<usize>) -> PathBuf {
    let mut name = match rotation {
        Some(n) => format!("{base}_{n}"),
        None => base.to_string(),
    };
    let ext = ext.trim_start_matches('.');
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    dir.join(name)
}
