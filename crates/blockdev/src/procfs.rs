// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Readers for `/proc` files

use std::{collections::BTreeMap, ops::Deref, path::PathBuf};

use itertools::{Either, Itertools};
use log::warn;
use serde::Serialize;

use crate::{
    pseudofs::{parse_float, parse_u32, split_fields},
    BlockDeviceId, BlockDeviceIoInfo, BlockDeviceIoStat, Error, PseudoFs,
};

pub const PROC_DEFAULT_MOUNT_POINT: &str = "/proc";

/// The procfs pseudo-filesystem
#[derive(Debug, Clone)]
pub struct ProcFs(PseudoFs);

impl Deref for ProcFs {
    type Target = PseudoFs;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::with_root(PROC_DEFAULT_MOUNT_POINT)
    }
}

/// System load averages over 1, 5 and 15 minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Registered device drivers, keyed by major number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Devices {
    pub character: BTreeMap<u32, String>,
    pub block: BTreeMap<u32, String>,
}

impl ProcFs {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self(PseudoFs::new(root))
    }

    /// Parses every line of `diskstats`.
    ///
    /// Malformed lines are logged and skipped; blank lines are ignored.
    /// See the kernel's `Documentation/ABI/testing/procfs-diskstats`.
    pub fn disk_stats(&self) -> Result<Vec<BlockDeviceIoInfo>, Error> {
        let text = self.read(&["diskstats"])?;

        let (stats, errors): (Vec<_>, Vec<_>) = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .partition_map(|line| match parse_disk_stats_line(line) {
                Ok(info) => Either::Left(info),
                Err(e) => Either::Right(e),
            });

        for e in errors {
            warn!("skipping diskstats line: {e}");
        }

        Ok(stats)
    }

    pub fn load_avg(&self) -> Result<LoadAvg, Error> {
        let fields = self.read_fields(&["loadavg"])?;
        if fields.len() < 3 {
            return Err(Error::Malformed {
                what: "loadavg".to_owned(),
                reason: format!("{fields:?}"),
            });
        }

        let load = |index: usize| {
            parse_float(&fields[index]).map_err(|source| Error::Field {
                what: "loadavg".to_owned(),
                source,
            })
        };

        Ok(LoadAvg {
            load1: load(0)?,
            load5: load(1)?,
            load15: load(2)?,
        })
    }

    /// Parses `devices` into its character and block sections. See proc(5).
    pub fn devices(&self) -> Result<Devices, Error> {
        #[derive(Clone, Copy)]
        enum Section {
            Unknown,
            Character,
            Block,
        }

        let mut devices = Devices::default();
        let mut section = Section::Unknown;

        for line in self.read_lines(&["devices"])? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("Character devices") {
                section = Section::Character;
                continue;
            }
            if line.starts_with("Block devices") {
                section = Section::Block;
                continue;
            }

            let fields = split_fields("devices line", line, 2)?;
            let major = parse_u32(fields[0]).map_err(|source| Error::Field {
                what: "devices major".to_owned(),
                source,
            })?;
            let name = fields[1].to_owned();

            match section {
                Section::Character => devices.character.insert(major, name),
                Section::Block => devices.block.insert(major, name),
                Section::Unknown => None,
            };
        }

        Ok(devices)
    }
}

/// Decodes one 14+ field line of `/proc/diskstats`.
///
/// Newer kernels append discard and flush counters; those are ignored.
pub fn parse_disk_stats_line(line: &str) -> Result<BlockDeviceIoInfo, Error> {
    let fields = split_fields("diskstats line", line, 14)?;
    let number = |index: usize| {
        parse_u32(fields[index]).map_err(|source| Error::Field {
            what: format!("diskstats field {}", index + 1),
            source,
        })
    };

    let id = BlockDeviceId {
        major: number(0)?,
        minor: number(1)?,
        name: fields[2].to_owned(),
    };
    let stat = BlockDeviceIoStat::from_fields("diskstats", &fields[3..])?;

    Ok(BlockDeviceIoInfo { id, stat })
}
