//! Run configuration.
//!
//! [`PipelineConfig`] sizes the worker pool and bounds input lines;
//! [`OutputConfig`] describes where output goes and whether it rotates.
//! Both deserialize from JSON with every field optional:
//!
//! ```
//! use linebeam::PipelineConfig;
//!
//! let config = PipelineConfig::from_json_str(r#"{
//!     "workers": 4,
//!     "output": { "dir": "out", "base": "events", "ext": "log", "split_size": 10000 }
//! }"#).unwrap();
//! assert_eq!(config.workers, 4);
//! assert!(config.preserve_order);
//! assert_eq!(config.max_line_len, linebeam::DEFAULT_MAX_LINE_LEN);
//! ```

use crate::capability::SinkHooks;
use crate::error::{PipelineError, Result};
use crate::sink::{Destination, FileSink, OrderingSink, RotatingSink, Sink};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Longest accepted input line, in bytes, unless configured otherwise.
pub const DEFAULT_MAX_LINE_LEN: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Transform workers; also the capacity of every stage queue.
    pub workers: usize,
    /// Longest accepted input line in bytes, delimiter excluded.
    pub max_line_len: usize,
    /// Restore input order at the sink.
    pub preserve_order: bool,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            preserve_order: true,
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or fails [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parse pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load config {}", path.display()))
    }

    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.max_line_len == 0 {
            return Err(PipelineError::InvalidConfig("max_line_len must be at least 1".into()));
        }
        self.output.validate()
    }

    /// Build the sink chain for [`output`](Self::output): a single file or a
    /// rotating set, wrapped in an ordering sink when `preserve_order` is set.
    ///
    /// # Errors
    /// Returns an error if the output configuration is invalid.
    pub fn build_sink(&self, hooks: Arc<dyn SinkHooks>) -> Result<Box<dyn Sink>> {
        self.output.validate()?;
        let dest = self.output.destination(hooks);
        let basic: Box<dyn Sink> = if self.output.split_size > 0 {
            Box::new(RotatingSink::new(dest, self.output.split_size)?)
        } else {
            Box::new(FileSink::new(&dest))
        };
        if self.preserve_order {
            Ok(Box::new(OrderingSink::new(basic)))
        } else {
            Ok(basic)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub base: String,
    /// Extension without the leading dot; empty for none.
    pub ext: String,
    /// Records per file; `0` writes a single unrotated file.
    pub split_size: usize,
    /// Append `\n` after every written payload.
    pub terminate_lines: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            base: "output".to_string(),
            ext: "out".to_string(),
            split_size: 0,
            terminate_lines: true,
        }
    }
}

impl OutputConfig {
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] if the base name is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.base.is_empty() {
            return Err(PipelineError::InvalidConfig("output base name is empty".into()));
        }
        if self.base.contains(['/', '\\']) {
            return Err(PipelineError::InvalidConfig(format!(
                "output base name {:?} contains a path separator",
                self.base
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn destination(&self, hooks: Arc<dyn SinkHooks>) -> Destination {
        Destination::new(&self.dir, &self.base, &self.ext)
            .with_hooks(hooks)
            .with_line_terminator(self.terminate_lines)
    }
}
