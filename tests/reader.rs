//! Tests for line splitting.

use anyhow::Result;
use linebeam::{LineReader, PipelineError};
use std::io::{BufReader, Read};

#[macro_use]
mod macros;

fn read_all(input: &[u8], max_len: usize) -> linebeam::Result<Vec<Vec<u8>>> {
    LineReader::new(input, max_len).collect()
}

#[test]
fn splits_on_newline_and_strips_it() -> Result<()> {
    let lines = read_all(b"one\ntwo\nthree\n", 64)?;
    assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    Ok(())
}

#[test]
fn final_line_without_newline_is_yielded() -> Result<()> {
    let lines = read_all(b"one\ntwo", 64)?;
    assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec()]);
    Ok(())
}

#[test]
fn empty_input_yields_nothing() -> Result<()> {
    assert!(read_all(b"", 64)?.is_empty());
    Ok(())
}

#[test]
fn empty_lines_are_kept() -> Result<()> {
    let lines = read_all(b"\n\na\n\n", 64)?;
    assert_eq!(lines, vec![vec![], vec![], b"a".to_vec(), vec![]]);
    Ok(())
}

#[test]
fn carriage_return_is_part_of_the_line() -> Result<()> {
    let lines = read_all(b"a\r\nb\n", 64)?;
    assert_eq!(lines, vec![b"a\r".to_vec(), b"b".to_vec()]);
    Ok(())
}

#[test]
fn line_at_limit_is_accepted() -> Result<()> {
    let lines = read_all(b"abcd\nef\n", 4)?;
    assert_eq!(lines.len(), 2);
    Ok(())
}

#[test]
fn line_over_limit_fails_with_its_number() {
    let mut reader = LineReader::new(&b"ok\nabcde\nnever\n"[..], 4);
    assert_eq!(reader.next_line().ok().flatten(), Some(b"ok".to_vec()));
    assert_err_matches!(reader.next_line(), PipelineError::LineTooLong { line: 2, limit: 4 });
    // nothing after a failure
    assert!(matches!(reader.next_line(), Ok(None)));
    assert_eq!(reader.lines_read(), 1);
}

#[test]
fn long_line_spanning_buffer_refills_is_assembled() -> Result<()> {
    let long = vec![b'x'; 100];
    let mut input = long.clone();
    input.extend_from_slice(b"\nshort\n");
    // a tiny buffer forces many fill_buf calls per line
    let reader = BufReader::with_capacity(7, &input[..]);
    let lines: Vec<Vec<u8>> = LineReader::new(reader, 128).collect::<linebeam::Result<_>>()?;
    assert_eq!(lines, vec![long, b"short".to_vec()]);
    Ok(())
}

#[test]
fn over_limit_detected_across_refills() {
    let input = vec![b'y'; 50];
    let reader = BufReader::with_capacity(8, &input[..]);
    let result: linebeam::Result<Vec<Vec<u8>>> = LineReader::new(reader, 20).collect();
    assert_err_matches!(result, PipelineError::LineTooLong { line: 1, limit: 20 });
}

struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("device gone"))
    }
}

#[test]
fn read_failure_is_reported() {
    let mut reader = LineReader::new(BufReader::new(BrokenReader), 16);
    assert_err_matches!(reader.next_line(), PipelineError::Read { line: 1, .. });
}
