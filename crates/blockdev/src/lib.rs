// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Block device inventory from Linux pseudo-filesystems
//!
//! Two views of the same devices are combined here: the global `/proc/diskstats`
//! table and the per-device directories under `/sys/block`. Only names that the
//! global table reports *and* that exist as a directory under `/sys/block` are
//! treated as block devices, which filters out partitions and other entries.

use std::{collections::BTreeMap, io, path::PathBuf};

use log::{debug, warn};
use thiserror::Error;

mod device;
pub mod procfs;
pub mod pseudofs;
pub mod sysfs;

pub use device::*;
pub use procfs::ProcFs;
pub use pseudofs::PseudoFs;
pub use sysfs::SysFs;

/// Size of a kernel sector in bytes, regardless of the device's real block size.
pub const SECTOR_SIZE: u64 = 512;

/// Upper bound for a single pseudo-file read.
pub const MEGA: u64 = 1 << 20;

/// Errors that can occur while reading pseudo-files
#[derive(Debug, Error)]
pub enum Error {
    /// The file or directory could not be read
    #[error("io: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value was read but could not be decoded
    #[error("invalid {what}: {source}")]
    Field {
        what: String,
        #[source]
        source: FieldError,
    },

    /// The content does not have the expected shape
    #[error("malformed {what}: {reason}")]
    Malformed { what: String, reason: String },
}

/// Decoding failure of a single textual value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("not a valid {kind}: {value:?}")]
    Invalid { kind: &'static str, value: String },

    /// The value is well formed but does not fit the target type
    #[error("{value:?} is out of range for {kind}")]
    OutOfRange { kind: &'static str, value: String },
}

/// Per-device statistics of every block device, keyed by device name
#[derive(Debug, Default)]
pub struct BlockDeviceMap {
    pub ids: BTreeMap<String, BlockDeviceId>,
    pub io_stats: BTreeMap<String, BlockDeviceIoStat>,
    pub queue_stats: BTreeMap<String, BlockDeviceQueueStats>,
}

/// Discovers identity, IO and queue statistics of all block devices.
///
/// Devices whose `stat` or `queue/` attributes cannot be read are left out of the
/// corresponding map; they do not abort the scan.
///
/// # Errors
///
/// Fails only when `/proc/diskstats` itself cannot be read.
pub fn discover_block_device_stats(procfs: &ProcFs, sysfs: &SysFs) -> Result<BlockDeviceMap, Error> {
    let mut map = BlockDeviceMap::default();

    for info in block_devices_io(procfs, sysfs)? {
        let name = info.id.name.clone();

        match sysfs.block_stat(&name) {
            Ok(stat) => {
                map.io_stats.insert(name.clone(), stat);
            }
            Err(e) => warn!("{name}: no IO statistics: {e}"),
        }

        match sysfs.block_queue_stats(&name) {
            Ok(stats) => {
                map.queue_stats.insert(name.clone(), stats);
            }
            Err(e) => warn!("{name}: no queue statistics: {e}"),
        }

        map.ids.insert(name, info.id);
    }

    Ok(map)
}

/// Reads the sysfs attributes of every block device, in diskstats order.
pub fn discover_block_device_info(procfs: &ProcFs, sysfs: &SysFs) -> Result<Vec<BlockDeviceInfo>, Error> {
    Ok(block_devices_io(procfs, sysfs)?
        .into_iter()
        .map(|info| sysfs.block_device_info(&info.id.name))
        .collect())
}

/// Returns the diskstats entries that belong to real block devices.
pub fn enumerate_block_device_io(procfs: &ProcFs, sysfs: &SysFs) -> Result<Vec<BlockDeviceIoInfo>, Error> {
    block_devices_io(procfs, sysfs)
}

fn block_devices_io(procfs: &ProcFs, sysfs: &SysFs) -> Result<Vec<BlockDeviceIoInfo>, Error> {
    Ok(procfs
        .disk_stats()?
        .into_iter()
        .filter(|info| {
            let name = &info.id.name;
            let is_block = sysfs.is_block(name).unwrap_or(false);
            if !is_block {
                debug!("{name}: not a block device");
            }
            is_block
        })
        .collect())
}
