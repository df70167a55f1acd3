//! Tests for configuration loading and validation.

use anyhow::Result;
use linebeam::testing::*;
use linebeam::{DEFAULT_MAX_LINE_LEN, Identity, NoopHooks, OutputConfig, Pipeline, PipelineConfig, PipelineError};
use std::path::PathBuf;
use std::sync::Arc;

#[macro_use]
mod macros;

#[test]
fn defaults_are_usable() -> Result<()> {
    let cfg = PipelineConfig::default();
    assert!(cfg.workers >= 1);
    assert_eq!(cfg.max_line_len, DEFAULT_MAX_LINE_LEN);
    assert!(cfg.preserve_order);
    assert_eq!(cfg.output.split_size, 0);
    assert!(cfg.output.terminate_lines);
    cfg.validate()?;
    Ok(())
}

#[test]
fn json_fills_missing_fields_with_defaults() -> Result<()> {
    let cfg = PipelineConfig::from_json_str(r#"{ "workers": 6, "output": { "base": "events" } }"#)?;
    assert_eq!(cfg.workers, 6);
    assert_eq!(cfg.output.base, "events");
    assert_eq!(cfg.output.ext, "out");
    assert_eq!(cfg.output.dir, PathBuf::from("."));
    Ok(())
}

#[test]
fn json_file_is_loaded() -> Result<()> {
    let file = TempFilePath::with_contents(
        br#"{ "workers": 2, "max_line_len": 64, "preserve_order": false,
              "output": { "dir": "/tmp/x", "base": "b", "ext": "log", "split_size": 100, "terminate_lines": false } }"#,
    )?;
    let cfg = PipelineConfig::from_json_file(file.path())?;
    assert_eq!(
        cfg,
        PipelineConfig {
            workers: 2,
            max_line_len: 64,
            preserve_order: false,
            output: OutputConfig {
                dir: PathBuf::from("/tmp/x"),
                base: "b".to_string(),
                ext: "log".to_string(),
                split_size: 100,
                terminate_lines: false,
            },
        }
    );
    Ok(())
}

#[test]
fn malformed_json_is_an_error() {
    assert!(PipelineConfig::from_json_str("{ workers: ").is_err());
}

#[test]
fn missing_config_file_names_the_path() {
    let err = PipelineConfig::from_json_file("/definitely/not/here.json")
        .err()
        .map(|e| format!("{e:#}"))
        .unwrap_or_default();
    assert!(err.contains("/definitely/not/here.json"), "error: {err}");
}

#[test]
fn zero_workers_is_rejected() {
    let cfg = PipelineConfig {
        workers: 0,
        ..PipelineConfig::default()
    };
    assert_err_matches!(cfg.validate(), PipelineError::InvalidConfig(_));
    assert!(PipelineConfig::from_json_str(r#"{ "workers": 0 }"#).is_err());
    assert!(Pipeline::new(cfg, Identity).is_err());
}

#[test]
fn zero_line_limit_is_rejected() {
    let cfg = PipelineConfig {
        max_line_len: 0,
        ..PipelineConfig::default()
    };
    assert_err_matches!(cfg.validate(), PipelineError::InvalidConfig(_));
}

#[test]
fn bad_base_names_are_rejected() {
    for base in ["", "a/b", "a\\b"] {
        let cfg = PipelineConfig {
            output: OutputConfig {
                base: base.to_string(),
                ..OutputConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert_err_matches!(cfg.validate(), PipelineError::InvalidConfig(_));
        assert!(cfg.build_sink(Arc::new(NoopHooks)).is_err());
    }
}

#[test]
fn config_round_trips_through_json() -> Result<()> {
    let cfg = PipelineConfig {
        workers: 3,
        ..PipelineConfig::default()
    };
    let text = serde_json::to_string(&cfg)?;
    assert_eq!(PipelineConfig::from_json_str(&text)?, cfg);
    Ok(())
}
