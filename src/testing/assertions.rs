//! Assertion functions for comparing pipeline output lines.
//!
//! Lines are byte strings; failure messages render them lossily as UTF-8.

use std::borrow::Cow;

fn show(line: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(line)
}

fn show_all(lines: &[Vec<u8>]) -> Vec<Cow<'_, str>> {
    lines.iter().map(|l| show(l)).collect()
}

/// Assert that two sequences of lines are equal in order and content.
///
/// # Panics
///
/// Panics if the sequences differ in length or at any position.
///
/// # Example
///
/// ```
/// use linebeam::testing::assert_lines_equal;
///
/// let actual = vec![b"a".to_vec(), b"b".to_vec()];
/// assert_lines_equal(&actual, &[b"a".to_vec(), b"b".to_vec()]);
/// ```
pub fn assert_lines_equal(actual: &[Vec<u8>], expected: &[Vec<u8>]) {
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a,
            e,
            "Line mismatch at index {i}:\n  Expected: {:?}\n  Actual: {:?}",
            show(e),
            show(a)
        );
    }
    assert_eq!(
        actual.len(),
        expected.len(),
        "Line count mismatch:\n  Expected: {} line(s)\n  Actual: {} line(s)\n  Actual tail: {:?}",
        expected.len(),
        actual.len(),
        show_all(&actual[expected.len().min(actual.len())..])
    );
}

/// Assert that two sequences hold the same lines, ignoring order.
///
/// Duplicates count: `[a, a, b]` and `[a, b, b]` are not equal.
///
/// # Panics
///
/// Panics if the sorted sequences differ.
pub fn assert_lines_unordered_equal(actual: &[Vec<u8>], expected: &[Vec<u8>]) {
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort_unstable();
    e.sort_unstable();
    if a != e {
        let missing: Vec<_> = e.iter().filter(|l| !a.contains(l)).map(|l| show(l)).collect();
        let extra: Vec<_> = a.iter().filter(|l| !e.contains(l)).map(|l| show(l)).collect();
        panic!(
            "Line content mismatch:\n  Expected: {} line(s)\n  Actual: {} line(s)\n  Missing: {missing:?}\n  Extra: {extra:?}",
            e.len(),
            a.len()
        );
    }
}
