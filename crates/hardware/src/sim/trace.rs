//! Request trace ingestion.
//!
//! A trace is a text file with one request per line: an operation (`r` or `w`) followed by
//! a hexadecimal address, optionally prefixed with `0x`. Blank lines and lines starting
//! with `#` are ignored. Anything after the address is ignored too.
//!
//! ```text
//! # warm up
//! r 0x34
//! w 74
//! ```
//!
//! Malformed lines are fatal in [`TraceMode::Strict`]. [`TraceMode::Lenient`] logs them
//! with `warn!` and skips them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::common::{OpKind, Request, TraceError};

/// Handling of malformed trace lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// Stop at the first malformed line.
    #[default]
    Strict,
    /// Log and skip malformed lines.
    Lenient,
}

/// Parses one trace line. `line_no` is 1-based and only used for error context.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns a [`TraceError`] naming the line and the offending token.
///
/// # Examples
///
/// ```
/// use cachesim_core::common::Request;
/// use cachesim_core::sim::trace::parse_line;
///
/// assert_eq!(parse_line(1, "w 0x7f").unwrap(), Some(Request::store(0x7f)));
/// assert_eq!(parse_line(2, "  # comment").unwrap(), None);
/// assert!(parse_line(3, "x 10").is_err());
/// ```
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Request>, TraceError> {
    let mut tokens = line.split_whitespace();
    let Some(op) = tokens.next() else {
        return Ok(None);
    };
    if op.starts_with('#') {
        return Ok(None);
    }
    let op = match op {
        "r" | "R" => OpKind::Load,
        "w" | "W" => OpKind::Store,
        _ => {
            return Err(TraceError::InvalidOp {
                line: line_no,
                token: op.to_string(),
            });
        }
    };
    let token = tokens
        .next()
        .ok_or(TraceError::MissingAddress { line: line_no })?;
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    let address = u64::from_str_radix(digits, 16).map_err(|_| TraceError::InvalidAddress {
        line: line_no,
        token: token.to_string(),
    })?;
    Ok(Some(Request::new(op, address)))
}

/// Reads every request from `reader`.
///
/// `source` names the input in I/O errors.
///
/// # Errors
///
/// Returns [`TraceError::Io`] on a read failure, or the first parse error in
/// [`TraceMode::Strict`].
pub fn read_trace<R: BufRead>(
    reader: R,
    source: &Path,
    mode: TraceMode,
) -> Result<Vec<Request>, TraceError> {
    let mut requests = Vec::new();
    let mut skipped = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source_err| TraceError::Io {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        match parse_line(index + 1, &line) {
            Ok(Some(request)) => requests.push(request),
            Ok(None) => {}
            Err(err) if mode == TraceMode::Lenient => {
                warn!(%err, "skipping malformed trace line");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }
    info!(
        source = %source.display(),
        requests = requests.len(),
        skipped,
        "loaded trace"
    );
    Ok(requests)
}

/// Opens and reads the trace at `path`.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be opened or read, or a parse error as
/// described in [`read_trace`].
pub fn load_trace(path: impl AsRef<Path>, mode: TraceMode) -> Result<Vec<Request>, TraceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_trace(BufReader::new(file), path, mode)
}
