// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Typed reads of kernel pseudo-files
//!
//! Files under `/proc` and `/sys` commonly report a size of 0 or a page size no matter
//! what they contain, so reads never trust the reported length and are capped at
//! [`MEGA`] bytes instead.

use std::{
    fs,
    io::Read,
    num::{IntErrorKind, ParseIntError},
    path::{Path, PathBuf},
};

use crate::{Error, FieldError, MEGA};

/// A pseudo-filesystem rooted at a fixed directory (e.g. `/proc` or `/sys`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoFs {
    root: PathBuf,
}

impl PseudoFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory of this filesystem.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns a new pseudo-filesystem rooted at `subpath` below this one.
    pub fn sub(&self, subpath: impl AsRef<Path>) -> Self {
        Self::new(self.root.join(subpath))
    }

    /// Joins the path segments onto the root.
    pub fn resolve(&self, segments: &[&str]) -> PathBuf {
        segments.iter().fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Reads the full content of a file, bounded to [`MEGA`] bytes.
    pub fn read(&self, segments: &[&str]) -> Result<String, Error> {
        read_text_file(&self.resolve(segments))
    }

    /// Reads a file and strips surrounding whitespace.
    pub fn read_trim(&self, segments: &[&str]) -> Result<String, Error> {
        Ok(self.read(segments)?.trim().to_owned())
    }

    pub fn read_bool(&self, segments: &[&str]) -> Result<bool, Error> {
        self.read_with(segments, parse_bool)
    }

    pub fn read_int(&self, segments: &[&str]) -> Result<i32, Error> {
        self.read_with(segments, parse_int)
    }

    pub fn read_u32(&self, segments: &[&str]) -> Result<u32, Error> {
        self.read_with(segments, parse_u32)
    }

    pub fn read_u64(&self, segments: &[&str]) -> Result<u64, Error> {
        self.read_with(segments, parse_u64)
    }

    pub fn read_lines(&self, segments: &[&str]) -> Result<Vec<String>, Error> {
        Ok(self.read(segments)?.lines().map(str::to_owned).collect())
    }

    pub fn read_fields(&self, segments: &[&str]) -> Result<Vec<String>, Error> {
        Ok(self.read(segments)?.split_whitespace().map(str::to_owned).collect())
    }

    /// Lists the entry names of a directory, sorted.
    pub fn read_dir(&self, segments: &[&str]) -> Result<Vec<String>, Error> {
        let path = self.resolve(segments);
        let entries = fs::read_dir(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;

        let mut names: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Whether the path resolves to a directory, following symlinks.
    pub fn is_dir(&self, segments: &[&str]) -> Result<bool, Error> {
        let path = self.resolve(segments);
        fs::metadata(&path)
            .map(|meta| meta.is_dir())
            .map_err(|source| Error::Io { path, source })
    }

    fn read_with<T>(&self, segments: &[&str], parse: fn(&str) -> Result<T, FieldError>) -> Result<T, Error> {
        let path = self.resolve(segments);
        let text = read_text_file(&path)?;
        parse(&text).map_err(|source| Error::Field {
            what: path.display().to_string(),
            source,
        })
    }
}

/// Splits a line on whitespace, requiring at least `min` fields.
pub fn split_fields<'a>(what: &str, line: &'a str, min: usize) -> Result<Vec<&'a str>, Error> {
    let fields: Vec<_> = line.split_whitespace().collect();
    if fields.len() < min {
        return Err(Error::Malformed {
            what: what.to_owned(),
            reason: format!("only {} fields, expected {min}", fields.len()),
        });
    }
    Ok(fields)
}

/// Any non-zero integer is `true`.
pub fn parse_bool(s: &str) -> Result<bool, FieldError> {
    Ok(parse_int(s)? != 0)
}

pub fn parse_int(s: &str) -> Result<i32, FieldError> {
    let s = s.trim();
    let value: i64 = s.parse().map_err(|e| int_error("int", s, e))?;
    i32::try_from(value).map_err(|_| out_of_range("int", s))
}

pub fn parse_u32(s: &str) -> Result<u32, FieldError> {
    let s = s.trim();
    let value: u64 = s.parse().map_err(|e| int_error("uint32", s, e))?;
    u32::try_from(value).map_err(|_| out_of_range("uint32", s))
}

pub fn parse_u64(s: &str) -> Result<u64, FieldError> {
    let s = s.trim();
    s.parse().map_err(|e| int_error("uint64", s, e))
}

/// Parses an unsigned value and multiplies it by `mul`, e.g. sectors to bytes.
pub fn parse_scaled_u64(s: &str, mul: u64) -> Result<u64, FieldError> {
    parse_u64(s)?
        .checked_mul(mul)
        .ok_or_else(|| out_of_range("uint64", s.trim()))
}

pub fn parse_float(s: &str) -> Result<f64, FieldError> {
    let s = s.trim();
    s.parse().map_err(|_| FieldError::Invalid {
        kind: "float",
        value: s.to_owned(),
    })
}

fn int_error(kind: &'static str, value: &str, e: ParseIntError) -> FieldError {
    match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range(kind, value),
        _ => FieldError::Invalid {
            kind,
            value: value.to_owned(),
        },
    }
}

fn out_of_range(kind: &'static str, value: &str) -> FieldError {
    FieldError::OutOfRange {
        kind,
        value: value.to_owned(),
    }
}

fn read_text_file(path: &Path) -> Result<String, Error> {
    let io_error = |source| Error::Io {
        path: path.to_owned(),
        source,
    };
    let mut bytes = Vec::new();
    fs::File::open(path)
        .and_then(|file| file.take(MEGA).read_to_end(&mut bytes))
        .map_err(io_error)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
