//! Minimal reader for the `.npy` bitmap dumps published by Quick Draw.
//!
//! Only what those files use is supported: a 2-D, C-ordered array of
//! unsigned bytes (`|u1`). Format versions 1.0, 2.0 and 3.0 differ only in
//! the width of the header-length field.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

const MAGIC: &[u8] = b"\x93NUMPY";

/// A 2-D byte array loaded from disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpyU8 {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<u8>,
}

impl NpyU8 {
    pub fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }
}

fn npy_err(path: &Path, reason: impl Into<String>) -> Error {
    Error::Npy {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Read a 2-D `|u1` array from `path`.
pub fn read_u8_2d<P: AsRef<Path>>(path: P) -> Result<NpyU8> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    parse_u8_2d(&bytes).map_err(|reason| npy_err(path, reason))
}

/// Parse an in-memory `.npy` file.
pub fn parse_u8_2d(bytes: &[u8]) -> std::result::Result<NpyU8, String> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err("missing NUMPY magic".into());
    }
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated header length".into());
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(format!("unsupported format version {v}")),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated header".into());
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| "header is not valid text".to_string())?;

    let descr = dict_value(header, "descr").ok_or("header has no descr")?;
    let descr = descr.trim_matches(|c| c == '\'' || c == '"');
    if descr != "|u1" && descr != "<u1" && descr != "u1" {
        return Err(format!("expected dtype |u1, found {descr}"));
    }
    let order = dict_value(header, "fortran_order").ok_or("header has no fortran_order")?;
    if order != "False" {
        return Err("fortran-ordered arrays are not supported".into());
    }
    let shape = dict_value(header, "shape").ok_or("header has no shape")?;
    let dims: Vec<usize> = shape
        .trim_matches(|c| c == '(' || c == ')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| format!("bad dimension {s:?}")))
        .collect::<std::result::Result<_, _>>()?;
    let &[rows, cols] = dims.as_slice() else {
        return Err(format!("expected a 2-D array, found shape {shape}"));
    };

    let data = &bytes[data_start..];
    if data.len() != rows * cols {
        return Err(format!(
            "expected {} data bytes, found {}",
            rows * cols,
            data.len()
        ));
    }
    Ok(NpyU8 {
        rows,
        cols,
        data: data.to_vec(),
    })
}

/// Extract the raw value for `key` from the header's Python dict literal.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle_single = format!("'{key}'");
    let needle_double = format!("\"{key}\"");
    let start = header
        .find(&needle_single)
        .map(|i| i + needle_single.len())
        .or_else(|| header.find(&needle_double).map(|i| i + needle_double.len()))?;
    let rest = header[start..].trim_start().strip_prefix(':')?.trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else {
        rest.find(|c| c == ',' || c == '}').unwrap_or(rest.len())
    };
    Some(rest[..end].trim())
}

/// Encode a 2-D byte array as a version 1.0 `.npy` file.
pub fn encode_u8_2d(rows: usize, cols: usize, data: &[u8]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '|u1', 'fortran_order': False, 'shape': ({rows}, {cols}), }}"
    );
    // Pad so that the data starts on a 64-byte boundary, newline terminated.
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let pad = (64 - unpadded % 64) % 64;
    header.push_str(&" ".repeat(pad));
    header.push('\n');

    let mut out = Vec::with_capacity(10 + header.len() + data.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}
