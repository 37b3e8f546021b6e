// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Helper functions for interacting with Linux sysfs interfaces

use std::{
    ops::Deref,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    pseudofs::parse_u32, BlockDeviceInfo, BlockDeviceIoStat, BlockDeviceQueueStats, Error, PseudoFs,
};

pub const SYS_DEFAULT_MOUNT_POINT: &str = "/sys";

/// The sysfs pseudo-filesystem
#[derive(Debug, Clone)]
pub struct SysFs(PseudoFs);

impl Deref for SysFs {
    type Target = PseudoFs;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for SysFs {
    fn default() -> Self {
        Self::with_root(SYS_DEFAULT_MOUNT_POINT)
    }
}

/// Falls back to the default value of an attribute that some kernels or devices
/// do not provide.
///
/// # Arguments
///
/// * `attr` - Name of the attribute, for logging
/// * `result` - Outcome of the read
///
/// # Returns
///
/// The read value, or `T::default()` if the read failed
fn optional<T: Default>(attr: &str, result: Result<T, Error>) -> T {
    result.unwrap_or_else(|e| {
        debug!("defaulting optional attribute {attr}: {e}");
        T::default()
    })
}

impl SysFs {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self(PseudoFs::new(root))
    }

    /// Returns the `block/<dev>` sub-filesystem.
    pub fn block_device(&self, dev: &str) -> PseudoFs {
        self.sub(Path::new("block").join(dev))
    }

    /// Returns the `block/<dev>/queue` sub-filesystem.
    pub fn block_device_queue(&self, dev: &str) -> PseudoFs {
        self.sub(Path::new("block").join(dev).join("queue"))
    }

    /// Lists the entry names under `block/`.
    pub fn list_block_devices(&self) -> Result<Vec<String>, Error> {
        self.read_dir(&["block"])
    }

    /// Whether `block/<name>` is a directory, i.e. a real block device rather than
    /// a partition or some other entry of the same name.
    pub fn is_block(&self, name: &str) -> Result<bool, Error> {
        self.is_dir(&["block", name])
    }

    /// Parses the single line of `block/<dev>/stat`.
    ///
    /// See the kernel's `Documentation/block/stat.rst`.
    pub fn block_stat(&self, dev: &str) -> Result<BlockDeviceIoStat, Error> {
        let what = format!("block/{dev}/stat");
        let text = self.read(&["block", dev, "stat"])?;
        let lines: Vec<_> = text.lines().collect();
        if lines.len() != 1 {
            return Err(Error::Malformed {
                what,
                reason: format!("expected one line, found {}", lines.len()),
            });
        }

        let fields: Vec<_> = lines[0].split_whitespace().collect();
        BlockDeviceIoStat::from_fields(&what, &fields)
    }

    /// Reads the request queue settings of a block device.
    ///
    /// `dax`, `io_timeout`, `write_same_max_bytes`, `wbt_lat_usec`, `zoned` and
    /// `zone_write_granularity` are not present on every kernel and default to
    /// false, zero or empty. Every other attribute is mandatory.
    pub fn block_queue_stats(&self, dev: &str) -> Result<BlockDeviceQueueStats, Error> {
        let queue = self.block_device_queue(dev);

        Ok(BlockDeviceQueueStats {
            add_random: queue.read_bool(&["add_random"])?,
            dax: optional("dax", queue.read_bool(&["dax"])),
            discard_granularity: queue.read_u64(&["discard_granularity"])?,
            discard_max_hw_bytes: queue.read_u64(&["discard_max_hw_bytes"])?,
            discard_max_bytes: queue.read_u64(&["discard_max_bytes"])?,
            fua: queue.read_bool(&["fua"])?,
            hw_sector_size: queue.read_u32(&["hw_sector_size"])?,
            io_poll: queue.read_bool(&["io_poll"])?,
            io_poll_delay: queue.read_int(&["io_poll_delay"])?,
            io_timeout: optional("io_timeout", queue.read_u64(&["io_timeout"])),
            iostats: queue.read_bool(&["iostats"])?,
            logical_block_size: queue.read_u64(&["logical_block_size"])?,
            max_hw_sectors_kb: queue.read_u64(&["max_hw_sectors_kb"])?,
            max_integrity_segments: queue.read_u64(&["max_integrity_segments"])?,
            max_sectors_kb: queue.read_u64(&["max_sectors_kb"])?,
            max_segments: queue.read_u64(&["max_segments"])?,
            max_segment_size: queue.read_u64(&["max_segment_size"])?,
            minimum_io_size: queue.read_u64(&["minimum_io_size"])?,
            nomerges: queue.read_u32(&["nomerges"])?,
            nr_requests: queue.read_u64(&["nr_requests"])?,
            optimal_io_size: queue.read_u64(&["optimal_io_size"])?,
            physical_block_size: queue.read_u64(&["physical_block_size"])?,
            read_ahead_kb: queue.read_u64(&["read_ahead_kb"])?,
            rotational: queue.read_bool(&["rotational"])?,
            rq_affinity: queue.read_u32(&["rq_affinity"])?,
            scheduler: queue.read_trim(&["scheduler"])?,
            write_cache: queue.read_trim(&["write_cache"])?,
            write_same_max_bytes: optional("write_same_max_bytes", queue.read_u64(&["write_same_max_bytes"])),
            wbt_lat_usec: optional("wbt_lat_usec", queue.read_int(&["wbt_lat_usec"])),
            zoned: optional("zoned", queue.read_trim(&["zoned"])),
            zone_write_granularity: optional("zone_write_granularity", queue.read_int(&["zone_write_granularity"])),
        })
    }

    /// Reads the identity and description of a block device.
    ///
    /// Every attribute here is best effort: a missing `dev`, `size`, `ro` or
    /// `device/{vendor,model}` yields zero, false or an empty string.
    pub fn block_device_info(&self, dev: &str) -> BlockDeviceInfo {
        let node = self.block_device(dev);

        let (major, minor) = optional("dev", node.read_trim(&["dev"]))
            .split_once(':')
            .map(|(major, minor)| (parse_u32(major).unwrap_or(0), parse_u32(minor).unwrap_or(0)))
            .unwrap_or_default();

        BlockDeviceInfo {
            major,
            minor,
            name: dev.to_owned(),
            sectors: optional("size", node.read_u64(&["size"])),
            vendor: optional("device/vendor", node.read_trim(&["device", "vendor"])),
            model: optional("device/model", node.read_trim(&["device", "model"])),
            readonly: optional("ro", node.read_bool(&["ro"])),
        }
    }
}
