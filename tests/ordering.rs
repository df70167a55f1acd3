//! Tests for the ordering sink.

use anyhow::Result;
use linebeam::sink::{MemorySink, OrderingSink, SharedBuffer, Sink};
use linebeam::testing::*;
use linebeam::{PipelineError, Record};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[macro_use]
mod macros;

fn rec(index: u64) -> Record {
    Record::new(index, index.to_string().into_bytes())
}

fn ordering_over_memory() -> (OrderingSink<MemorySink>, SharedBuffer) {
    let buf = SharedBuffer::new();
    let sink = OrderingSink::new(MemorySink::new(buf.clone()).with_line_terminator(true));
    (sink, buf)
}

#[test]
fn in_order_records_pass_straight_through() -> Result<()> {
    let (mut sink, buf) = ordering_over_memory();
    sink.open()?;
    for i in 0..3 {
        sink.write(rec(i))?;
        assert_eq!(sink.pending_len(), 0);
    }
    sink.close()?;
    assert_eq!(buf.contents(), b"0\n1\n2\n");
    Ok(())
}

#[test]
fn early_records_are_held_until_their_turn() -> Result<()> {
    let (mut sink, buf) = ordering_over_memory();
    sink.open()?;
    assert_eq!(sink.write(rec(2))?, 0);
    assert_eq!(sink.write(rec(1))?, 0);
    assert_eq!(sink.pending_len(), 2);
    assert!(buf.contents().is_empty());

    // 0 releases 1 and 2 in the same call
    assert_eq!(sink.write(rec(0))?, 6);
    assert_eq!(sink.pending_len(), 0);
    assert_eq!(sink.expected(), 3);
    sink.close()?;
    assert_eq!(buf.contents(), b"0\n1\n2\n");
    Ok(())
}

#[test]
fn absent_records_advance_the_expected_index() -> Result<()> {
    let (mut sink, buf) = ordering_over_memory();
    sink.open()?;
    sink.write(rec(2))?;
    sink.write(rec(0))?;
    sink.write(Record::absent(1))?;
    assert_eq!(sink.expected(), 3);
    sink.close()?;
    assert_eq!(buf.contents(), b"0\n2\n");
    Ok(())
}

#[test]
fn shuffled_delivery_is_written_in_index_order() -> Result<()> {
    let mut indices: Vec<u64> = (0..500).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(11));

    let (mut sink, buf) = ordering_over_memory();
    sink.open()?;
    for i in indices {
        sink.write(rec(i))?;
    }
    sink.close()?;

    let expected: Vec<Vec<u8>> = (0..500u64).map(|i| i.to_string().into_bytes()).collect();
    assert_lines_equal(&buf.lines(), &expected);
    Ok(())
}

#[test]
fn close_with_missing_index_reports_gap() -> Result<()> {
    init_logging!();
    let (mut sink, buf) = ordering_over_memory();
    sink.open()?;
    sink.write(rec(0))?;
    sink.write(rec(2))?;
    sink.write(rec(3))?;
    assert_err_matches!(
        sink.close(),
        PipelineError::OrderingGap {
            expected: 1,
            pending: 2,
            next_held: 2
        }
    );
    // the inner sink is closed regardless
    assert_eq!(buf.contents(), b"0\n");
    Ok(())
}

#[test]
fn duplicate_index_is_rejected() -> Result<()> {
    let (mut sink, _buf) = ordering_over_memory();
    sink.open()?;
    sink.write(rec(0))?;
    assert_err_matches!(sink.write(rec(0)), PipelineError::DuplicateIndex { index: 0, expected: 1 });

    sink.write(rec(3))?;
    assert_err_matches!(sink.write(rec(3)), PipelineError::DuplicateIndex { index: 3, expected: 1 });
    Ok(())
}

#[test]
fn inner_write_failure_propagates() -> Result<()> {
    let mut sink = OrderingSink::new(FailingSink::new().fail_after(2));
    sink.open()?;
    sink.write(rec(1))?;
    sink.write(rec(2))?;
    assert_err_matches!(sink.write(rec(0)), PipelineError::Destination { .. });
    assert_eq!(sink.inner().written().len(), 2);
    Ok(())
}

#[test]
fn boxed_inner_sink_is_supported() -> Result<()> {
    let buf = SharedBuffer::new();
    let inner: Box<dyn Sink> = Box::new(MemorySink::new(buf.clone()));
    let mut sink = OrderingSink::new(inner);
    sink.open()?;
    sink.write(Record::new(1, b"b".to_vec()))?;
    sink.write(Record::new(0, b"a".to_vec()))?;
    sink.close()?;
    assert_eq!(buf.contents(), b"ab");
    Ok(())
}
