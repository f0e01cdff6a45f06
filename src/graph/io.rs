//! Text formats shared by [`Graph`](super::Graph) and [`Hypergraph`](super::Hypergraph).
//!
//! # Partition file
//!
//! ```text
//! 0
//! 0
//! -1
//! 1
//! ```
//!
//! One integer block label per line, in node order. `-1` marks an
//! unassigned node. Blank lines are skipped. The file must hold exactly
//! `n` labels.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Read `n` labels from a partition file.
pub(crate) fn read_partition_file(path: &Path, n: usize) -> Result<Vec<Option<usize>>> {
    let file = File::open(path)?;
    parse_partition(BufReader::new(file), n)
}

/// Parse `n` labels from a reader in the partition format.
pub(crate) fn parse_partition<R: BufRead>(reader: R, n: usize) -> Result<Vec<Option<usize>>> {
    let mut labels = Vec::with_capacity(n);

    let mut extra = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        if labels.len() == n {
            extra += 1;
            continue;
        }
        let value: i64 = parse_token(token, line_no + 1)?;
        let label = match value {
            -1 => None,
            v if v >= 0 => Some(v as usize),
            _ => {
                return Err(Error::Parse {
                    line: line_no + 1,
                    token: token.to_string(),
                })
            }
        };
        labels.push(label);
    }

    if labels.len() < n {
        return Err(Error::TruncatedPartition {
            expected: n,
            found: labels.len(),
        });
    }
    if extra > 0 {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: n + extra,
        });
    }
    Ok(labels)
}

/// Parse a single whitespace-free token, reporting the 1-based line on failure.
pub(crate) fn parse_token<T: FromStr>(token: &str, line: usize) -> Result<T> {
    token.parse().map_err(|_| Error::Parse {
        line,
        token: token.to_string(),
    })
}

/// Split a header line into exactly `N` numbers.
pub(crate) fn parse_header<const N: usize>(line: &str) -> Result<[usize; N]> {
    let mut out = [0usize; N];
    let mut tokens = line.split_whitespace();
    for slot in out.iter_mut() {
        let token = tokens.next().ok_or_else(|| Error::Parse {
            line: 1,
            token: line.to_string(),
        })?;
        *slot = parse_token(token, 1)?;
    }
    Ok(out)
}
