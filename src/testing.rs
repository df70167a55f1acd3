//! Testing utilities for linebeam pipelines.
//!
//! Helpers for writing tests against a pipeline without hand-building inputs
//! and outputs:
//!
//! - **Assertions**: compare produced lines with expected ones, with or
//!   without regard to order
//! - **Fixtures**: seeded random input lines and a keyed summing fold
//! - **Mock I/O**: temporary files and directories, output readers and a
//!   sink that fails on demand
//!
//! # Quick Start
//!
//! ```
//! use linebeam::sink::{MemorySink, OrderingSink, SharedBuffer};
//! use linebeam::testing::*;
//! use linebeam::{Identity, Pipeline, PipelineConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let lines = random_lines(100, 20, 7);
//! let out = SharedBuffer::new();
//! let mut sink = OrderingSink::new(MemorySink::new(out.clone()).with_line_terminator(true));
//!
//! let config = PipelineConfig { workers: 4, ..PipelineConfig::default() };
//! Pipeline::new(config, Identity)?.run(&lines_to_input(&lines)[..], &mut sink)?;
//!
//! assert_lines_equal(&out.lines(), &lines);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
