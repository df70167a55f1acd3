//! Pre-built inputs, folds and hooks for common testing scenarios.

use crate::capability::{Aggregate, SinkHooks};
use crate::error::HookError;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::io::Write;

/// Generate `count` alphanumeric lines of 1 to `max_len` bytes.
///
/// The same seed always produces the same lines.
///
/// # Example
///
/// ```
/// use linebeam::testing::random_lines;
///
/// let lines = random_lines(1000, 20, 42);
/// assert_eq!(lines.len(), 1000);
/// assert!(lines.iter().all(|l| (1..=20).contains(&l.len())));
/// assert_eq!(lines, random_lines(1000, 20, 42));
/// ```
#[must_use]
pub fn random_lines(count: usize, max_len: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_len = max_len.max(1);
    (0..count)
        .map(|_| {
            let len = rng.random_range(1..=max_len);
            (&mut rng).sample_iter(Alphanumeric).take(len).collect()
        })
        .collect()
}

/// Join lines into a `\n`-terminated input stream.
#[must_use]
pub fn lines_to_input(lines: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out
}

/// Input for [`SumFold`]: for every key, `parts` lines `j\tkey` with `j` in `0..parts`.
///
/// Lines of one key are adjacent, so a keyed fold completes keys in input order.
#[must_use]
pub fn keyed_parts_input(keys: &[Vec<u8>], parts: u64) -> Vec<u8> {
    let mut out = Vec::new();
    for key in keys {
        for j in 0..parts {
            out.extend_from_slice(j.to_string().as_bytes());
            out.push(b'\t');
            out.extend_from_slice(key);
            out.push(b'\n');
        }
    }
    out
}

/// Keyed summing fold over `value\tkey` lines.
///
/// Accumulates the values of each key and, once `parts` lines of a key have
/// been seen, emits `key\tsum` and forgets the key. Lines that do not parse
/// are dropped.
///
/// ```
/// use linebeam::Aggregate;
/// use linebeam::testing::SumFold;
///
/// let mut fold = SumFold::new(2);
/// assert_eq!(fold.aggregate(b"3\tk".to_vec()), None);
/// assert_eq!(fold.aggregate(b"4\tk".to_vec()), Some(b"k\t7".to_vec()));
/// assert_eq!(fold.pending_keys(), 0);
/// ```
#[derive(Debug, Default)]
pub struct SumFold {
    parts: u64,
    cache: HashMap<Vec<u8>, (u64, u64)>,
}

impl SumFold {
    #[must_use]
    pub fn new(parts: u64) -> Self {
        Self {
            parts,
            cache: HashMap::new(),
        }
    }

    /// Keys seen but not yet complete.
    #[must_use]
    pub fn pending_keys(&self) -> usize {
        self.cache.len()
    }

    fn parse(line: &[u8]) -> Option<(u64, &[u8])> {
        let tab = line.iter().position(|b| *b == b'\t')?;
        let value = std::str::from_utf8(&line[..tab]).ok()?.parse().ok()?;
        Some((value, &line[tab + 1..]))
    }
}

impl Aggregate for SumFold {
    fn aggregate(&mut self, payload: Vec<u8>) -> Option<Vec<u8>> {
        let (value, key) = Self::parse(&payload)?;
        let entry = self.cache.entry(key.to_vec()).or_default();
        entry.0 += value;
        entry.1 += 1;
        if entry.1 < self.parts {
            return None;
        }
        let (sum, _) = self.cache.remove(key)?;
        let mut out = key.to_vec();
        out.push(b'\t');
        out.extend_from_slice(sum.to_string().as_bytes());
        Some(out)
    }
}

/// Hooks writing a fixed header when a destination opens and a footer
/// before it closes.
#[derive(Clone, Debug, Default)]
pub struct HeaderFooter {
    pub header: Vec<u8>,
    pub footer: Vec<u8>,
}

impl HeaderFooter {
    #[must_use]
    pub fn new(header: impl Into<Vec<u8>>, footer: impl Into<Vec<u8>>) -> Self {
        Self {
            header: header.into(),
            footer: footer.into(),
        }
    }
}

impl SinkHooks for HeaderFooter {
    fn before_write(&self, out: &mut dyn Write) -> Result<(), HookError> {
        out.write_all(&self.header)?;
        Ok(())
    }

    fn after_write(&self, out: &mut dyn Write) -> Result<(), HookError> {
        out.write_all(&self.footer)?;
        Ok(())
    }
}
