//! Tests for run statistics.

use anyhow::Result;
use linebeam::testing::*;
use linebeam::{Identity, Pipeline, PipelineConfig, RunStats, StatsSnapshot};
use serde_json::json;

#[macro_use]
mod macros;

#[test]
fn fresh_stats_are_zero() {
    let stats = RunStats::new();
    assert_eq!(stats.input(), 0);
    assert_eq!(stats.transformed(), 0);
    assert_eq!(stats.aggregated(), 0);
    assert!(stats.elapsed().is_none());
    assert_eq!(stats.snapshot(), StatsSnapshot::default());
}

#[test]
fn live_stats_match_the_returned_snapshot() -> Result<()> {
    init_logging!();
    let pipeline = Pipeline::new(PipelineConfig { workers: 3, ..PipelineConfig::default() }, Identity)?;
    let stats = pipeline.stats();

    let mut sink = FailingSink::new();
    let snapshot = pipeline.run(&lines_to_input(&random_lines(120, 5, 1))[..], &mut sink)?;

    assert_eq!(snapshot, stats.snapshot());
    assert_eq!(snapshot.input, 120);
    assert!(snapshot.elapsed_ms.is_some());
    assert!(stats.elapsed().is_some());
    Ok(())
}

#[test]
fn filtered_records_are_not_counted_as_transformed() -> Result<()> {
    let only_a = |line: Vec<u8>| -> Option<Vec<u8>> { line.starts_with(b"a").then_some(line) };
    let mut sink = FailingSink::new();
    let snapshot = Pipeline::new(PipelineConfig { workers: 2, ..PipelineConfig::default() }, only_a)?
        .run(&b"a1\nb1\na2\nc\n"[..], &mut sink)?;
    assert_eq!((snapshot.input, snapshot.transformed, snapshot.aggregated), (4, 2, 2));
    Ok(())
}

#[test]
fn snapshot_to_json_describes_every_counter() {
    let snapshot = StatsSnapshot {
        input: 10,
        transformed: 8,
        aggregated: 3,
        elapsed_ms: Some(42),
    };
    let value = snapshot.to_json();
    assert_eq!(value["input_lines"]["value"], json!(10));
    assert_eq!(value["transformed"]["value"], json!(8));
    assert_eq!(value["aggregated"]["value"], json!(3));
    assert_eq!(value["execution_time_ms"]["value"], json!(42));
    assert!(value["input_lines"]["description"].is_string());
}

#[test]
fn snapshot_without_timing_omits_execution_time() {
    let value = StatsSnapshot::default().to_json();
    assert!(value.get("execution_time_ms").is_none());
}

#[test]
fn save_snapshot_to_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("stats.json");
    let snapshot = StatsSnapshot {
        input: 5,
        transformed: 5,
        aggregated: 1,
        elapsed_ms: Some(7),
    };
    snapshot.save_to_file(&path)?;

    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(saved, snapshot.to_json());
    Ok(())
}

#[test]
fn snapshot_serde_round_trip() -> Result<()> {
    let snapshot = StatsSnapshot {
        input: 1,
        transformed: 2,
        aggregated: 3,
        elapsed_ms: None,
    };
    let text = serde_json::to_string(&snapshot)?;
    assert_eq!(serde_json::from_str::<StatsSnapshot>(&text)?, snapshot);
    Ok(())
}
