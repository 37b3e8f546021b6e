// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Parser for `ssacli ctrl all show config detail`
//!
//! The transcript is a sequence of controller paragraphs:
//!
//! ```text
//! Smart HBA H240 in Slot 1 (RAID Mode)
//!    Slot: 1
//!    ...
//!    Physical Drives
//!       physicaldrive 1I:1:1 (port 1I:box 1:bay 1, SATA HDD, 1 TB, OK)
//!
//!    Array: A
//!       Status: OK
//!
//!       Logical Drive: 1
//!          Disk Name: /dev/sda
//!
//!       physicaldrive 1I:1:2
//!          Serial Number: BTHV603000TL400NGN
//! ```
//!
//! Nesting is implied by section headers rather than by exact indentation, and
//! blank lines close the current drive section. Summary listings such as
//! `Physical Drives` and `Port Name` repeat information found elsewhere and are
//! skipped so their attributes are never attributed to the wrong entity.

use std::{collections::BTreeMap, ops::Deref};

use log::trace;

/// Headers of summary sub-sections whose content is ignored
const IGNORED_SECTIONS: &[&str] = &["Internal Drive Cage", "Physical Drives", "Port Name"];

/// A section header line and the attributes listed below it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// The raw (trimmed) header line, e.g. `Array: A`
    pub title: String,
    pub values: BTreeMap<String, String>,
}

impl Entry {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            values: BTreeMap::new(),
        }
    }

    /// Returns the value of an attribute, or an empty string when absent.
    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Returns the value of the first attribute whose key starts with `prefix`.
    ///
    /// ssacli embeds units in some keys, e.g. `Current Temperature (C)`.
    pub fn value_by_prefix(&self, prefix: &str) -> &str {
        self.values
            .iter()
            .find(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }

    /// Returns the part of the title after `": "`, e.g. `A` for `Array: A`.
    pub fn name(&self) -> &str {
        key_value(&self.title).map(|(_, value)| value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalDrive(pub Entry);

impl Deref for LogicalDrive {
    type Target = Entry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhysicalDrive(pub Entry);

impl Deref for PhysicalDrive {
    type Target = Entry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A RAID array and the drives it is built from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Array {
    pub entry: Entry,
    pub logical_drives: Vec<LogicalDrive>,
    pub physical_drives: Vec<PhysicalDrive>,
}

impl Deref for Array {
    type Target = Entry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// A controller, named after the slot it sits in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub entry: Entry,
    pub arrays: Vec<Array>,
}

impl Deref for Slot {
    type Target = Entry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// Parsed output of `ctrl all show config detail`, in transcript order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerConfig {
    pub slots: Vec<Slot>,
}

impl ControllerConfig {
    /// Parses a complete transcript. Unrecognised lines are ignored.
    pub fn parse(text: &str) -> Self {
        let mut parser = Parser::default();
        for line in text.lines() {
            parser.feed(line);
        }
        parser.finish()
    }
}

/// Parses a complete `ctrl all show config detail` transcript.
pub fn parse_show_config(text: &str) -> ControllerConfig {
    ControllerConfig::parse(text)
}

/// Classification of a single transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Blank,
    Slot(&'a str),
    IgnoredSection,
    Array(&'a str),
    LogicalDrive(&'a str),
    PhysicalDrive(&'a str),
    KeyValue(&'a str, &'a str),
    Other,
}

impl<'a> Line<'a> {
    /// Classifies a raw line. Section headers are only recognised when indented;
    /// the `physicaldrive` summary form with extra tokens is not a header.
    pub(crate) fn classify(raw: &'a str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            return Line::Blank;
        }
        if line.find("Slot ").is_some_and(|at| at > 0) {
            return Line::Slot(line);
        }

        if raw.starts_with(' ') {
            if IGNORED_SECTIONS.iter().any(|section| line.starts_with(section)) {
                return Line::IgnoredSection;
            }
            if line.starts_with("Array: ") {
                return Line::Array(line);
            }
            if line.starts_with("Logical Drive: ") {
                return Line::LogicalDrive(line);
            }
            if line.starts_with("physicaldrive ") && line.split(' ').count() <= 2 {
                return Line::PhysicalDrive(line);
            }
        }

        match key_value(line) {
            Some((key, value)) => Line::KeyValue(key, value),
            None => Line::Other,
        }
    }
}

/// Innermost open section below the current slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Scope {
    #[default]
    Slot,
    Array,
    LogicalDrive,
    PhysicalDrive,
}

/// Line driven state machine building a [`ControllerConfig`].
///
/// Open sections are always the most recently appended ones, so the scope alone
/// identifies them.
#[derive(Debug, Default)]
struct Parser {
    slots: Vec<Slot>,
    slot: Option<Slot>,
    scope: Scope,
    /// A blank line was seen since the slot header; later attributes no longer
    /// belong to the slot itself
    crossed: bool,
}

impl Parser {
    fn feed(&mut self, raw: &str) {
        let line = Line::classify(raw);
        trace!("{line:?}");

        match line {
            Line::Blank => {
                if matches!(self.scope, Scope::LogicalDrive | Scope::PhysicalDrive) {
                    self.scope = Scope::Array;
                }
                self.crossed = true;
            }
            Line::Slot(title) => {
                self.flush();
                self.slot = Some(Slot {
                    entry: Entry::new(title),
                    arrays: Vec::new(),
                });
                self.scope = Scope::Slot;
                self.crossed = false;
            }
            line => self.feed_slot(line),
        }
    }

    fn feed_slot(&mut self, line: Line) {
        let Some(slot) = self.slot.as_mut() else {
            self.scope = Scope::Slot;
            return;
        };
        let in_array = self.scope != Scope::Slot;

        match line {
            Line::IgnoredSection => self.scope = Scope::Slot,
            Line::Array(title) => {
                slot.arrays.push(Array {
                    entry: Entry::new(title),
                    ..Default::default()
                });
                self.scope = Scope::Array;
            }
            Line::LogicalDrive(title) if in_array => {
                if let Some(array) = slot.arrays.last_mut() {
                    array.logical_drives.push(LogicalDrive(Entry::new(title)));
                    self.scope = Scope::LogicalDrive;
                }
            }
            Line::PhysicalDrive(title) if in_array => {
                if let Some(array) = slot.arrays.last_mut() {
                    array.physical_drives.push(PhysicalDrive(Entry::new(title)));
                    self.scope = Scope::PhysicalDrive;
                }
            }
            // Headers outside of an array are plain lines
            Line::LogicalDrive(title) | Line::PhysicalDrive(title) => {
                if let Some((key, value)) = key_value(title) {
                    record(slot, self.scope, self.crossed, key, value);
                }
            }
            Line::KeyValue(key, value) => record(slot, self.scope, self.crossed, key, value),
            Line::Blank | Line::Slot(_) | Line::Other => {}
        }
    }

    fn flush(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.slots.push(slot);
        }
    }

    fn finish(mut self) -> ControllerConfig {
        self.flush();
        ControllerConfig { slots: self.slots }
    }
}

/// Stores an attribute in the innermost open section
fn record(slot: &mut Slot, scope: Scope, crossed: bool, key: &str, value: &str) {
    let entry = match scope {
        Scope::PhysicalDrive => slot
            .arrays
            .last_mut()
            .and_then(|array| array.physical_drives.last_mut())
            .map(|drive| &mut drive.0),
        Scope::LogicalDrive => slot
            .arrays
            .last_mut()
            .and_then(|array| array.logical_drives.last_mut())
            .map(|drive| &mut drive.0),
        Scope::Array => slot.arrays.last_mut().map(|array| &mut array.entry),
        Scope::Slot if !crossed => Some(&mut slot.entry),
        Scope::Slot => None,
    };

    if let Some(entry) = entry {
        entry.values.insert(key.to_owned(), value.to_owned());
    }
}

/// Splits `key: value`. The line must contain exactly one `": "` separator and
/// both sides must be non-empty after trimming.
pub(crate) fn key_value(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(": ");
    let (key, value) = (parts.next()?.trim(), parts.next()?.trim());
    if parts.next().is_some() || key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
