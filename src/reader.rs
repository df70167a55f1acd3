use crate::error::{PipelineError, Result};
use std::io::{BufRead, ErrorKind};

/// Splits a byte stream into `\n`-delimited lines with a length limit.
///
/// The delimiter is stripped and nothing else is: a `\r` before it stays part
/// of the line. A final line without a trailing `\n` is still yielded, while a
/// stream ending in `\n` yields no extra empty line. A line longer than
/// `max_len` bytes is an error, detected without buffering past the limit.
///
/// ```
/// use linebeam::LineReader;
///
/// let lines: Vec<Vec<u8>> = LineReader::new(&b"a\n\nbc"[..], 16)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(lines, vec![b"a".to_vec(), b"".to_vec(), b"bc".to_vec()]);
/// ```
pub struct LineReader<R> {
    inner: R,
    max_len: usize,
    lines: u64,
    failed: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            max_len,
            lines: 0,
            failed: false,
        }
    }

    /// Lines yielded so far.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.lines
    }

    /// Read the next line, or `None` at end of stream.
    ///
    /// # Errors
    /// Returns [`PipelineError::LineTooLong`] or [`PipelineError::Read`]; the
    /// reader yields nothing after an error.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        if self.failed {
            return Ok(None);
        }
        let res = self.read_line();
        if res.is_err() {
            self.failed = true;
        }
        res
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut started = false;
        loop {
            let buf = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(PipelineError::Read {
                        line: self.lines + 1,
                        source,
                    });
                }
            };
            if buf.is_empty() {
                if !started {
                    return Ok(None);
                }
                self.lines += 1;
                return Ok(Some(line));
            }
            started = true;

            let (chunk, done) = match buf.iter().position(|b| *b == b'\n') {
                Some(pos) => (&buf[..pos], true),
                None => (buf, false),
            };
            if line.len() + chunk.len() > self.max_len {
                return Err(PipelineError::LineTooLong {
                    line: self.lines + 1,
                    limit: self.max_len,
                });
            }
            line.extend_from_slice(chunk);
            let used = chunk.len() + usize::from(done);
            self.inner.consume(used);
            if done {
                self.lines += 1;
                return Ok(Some(line));
            }
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
