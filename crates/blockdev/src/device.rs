// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use core::fmt;

use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::{
    pseudofs::{parse_scaled_u64, parse_u64},
    Error, FieldError, SECTOR_SIZE,
};

/// Identity of a block device as listed in `/proc/diskstats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockDeviceId {
    pub major: u32,
    pub minor: u32,
    /// Device name (e.g. sda, nvme0n1)
    pub name: String,
}

/// Cumulative IO counters of a block device.
///
/// Sector counts are converted to bytes on parse. See the kernel's
/// `Documentation/admin-guide/iostats.rst` for the meaning of each counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockDeviceIoStat {
    pub reads_ios: u64,
    pub reads_merged: u64,
    pub reads_bytes: u64,
    pub read_time_ms: u64,
    pub writes_ios: u64,
    pub writes_merged: u64,
    pub writes_bytes: u64,
    pub write_time_ms: u64,
    pub in_flight: u64,
    pub io_time_ms: u64,
    pub weighted_io_time_ms: u64,
}

impl BlockDeviceIoStat {
    /// Number of leading fields a stat line must provide
    pub const FIELDS: usize = 11;

    /// Decodes the eleven counters shared by `/sys/block/<dev>/stat` and
    /// the tail of a `/proc/diskstats` line.
    ///
    /// # Arguments
    ///
    /// * `what` - Name of the source, used to tag decoding errors
    /// * `fields` - At least [`Self::FIELDS`] whitespace separated values
    pub(crate) fn from_fields(what: &str, fields: &[&str]) -> Result<Self, Error> {
        if fields.len() < Self::FIELDS {
            return Err(Error::Malformed {
                what: what.to_owned(),
                reason: format!("only {} fields", fields.len()),
            });
        }

        let tag = |name: &'static str| {
            move |source: FieldError| Error::Field {
                what: format!("{what} {name}"),
                source,
            }
        };
        let counter = |index: usize, name| parse_u64(fields[index]).map_err(tag(name));
        let sectors = |index: usize, name| parse_scaled_u64(fields[index], SECTOR_SIZE).map_err(tag(name));

        Ok(Self {
            reads_ios: counter(0, "reads_ios")?,
            reads_merged: counter(1, "reads_merged")?,
            reads_bytes: sectors(2, "reads_bytes")?,
            read_time_ms: counter(3, "read_time_ms")?,
            writes_ios: counter(4, "writes_ios")?,
            writes_merged: counter(5, "writes_merged")?,
            writes_bytes: sectors(6, "writes_bytes")?,
            write_time_ms: counter(7, "write_time_ms")?,
            in_flight: counter(8, "in_flight")?,
            io_time_ms: counter(9, "io_time_ms")?,
            weighted_io_time_ms: counter(10, "weighted_io_time_ms")?,
        })
    }
}

/// One decoded line of `/proc/diskstats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockDeviceIoInfo {
    #[serde(flatten)]
    pub id: BlockDeviceId,
    #[serde(flatten)]
    pub stat: BlockDeviceIoStat,
}

/// Request queue settings from `/sys/block/<dev>/queue`.
///
/// See the kernel's `Documentation/block/queue-sysfs.rst`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockDeviceQueueStats {
    pub add_random: bool,
    pub dax: bool,
    pub discard_granularity: u64,
    pub discard_max_hw_bytes: u64,
    pub discard_max_bytes: u64,
    pub fua: bool,
    pub hw_sector_size: u32,
    pub io_poll: bool,
    pub io_poll_delay: i32,
    pub io_timeout: u64,
    pub iostats: bool,
    pub logical_block_size: u64,
    pub max_hw_sectors_kb: u64,
    pub max_integrity_segments: u64,
    pub max_sectors_kb: u64,
    pub max_segments: u64,
    pub max_segment_size: u64,
    pub minimum_io_size: u64,
    pub nomerges: u32,
    pub nr_requests: u64,
    pub optimal_io_size: u64,
    pub physical_block_size: u64,
    pub read_ahead_kb: u64,
    pub rotational: bool,
    pub rq_affinity: u32,
    pub scheduler: String,
    pub write_cache: String,
    pub write_same_max_bytes: u64,
    pub wbt_lat_usec: i32,
    pub zoned: String,
    pub zone_write_granularity: i32,
}

/// Identity and description of a block device from `/sys/block/<dev>`
///
/// Serializes with an additional `size` field holding [`BlockDeviceInfo::size`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockDeviceInfo {
    pub major: u32,
    pub minor: u32,
    /// Device name (e.g. sda, nvme0n1)
    pub name: String,
    /// Total number of 512-byte sectors
    pub sectors: u64,
    pub vendor: String,
    pub model: String,
    pub readonly: bool,
}

impl BlockDeviceInfo {
    /// Returns the size of the device in bytes.
    pub fn size(&self) -> u64 {
        self.sectors.saturating_mul(SECTOR_SIZE)
    }
}

impl Serialize for BlockDeviceInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BlockDeviceInfo", 8)?;
        state.serialize_field("major", &self.major)?;
        state.serialize_field("minor", &self.minor)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("sectors", &self.sectors)?;
        state.serialize_field("size", &self.size())?;
        state.serialize_field("vendor", &self.vendor)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("readonly", &self.readonly)?;
        state.end()
    }
}

impl fmt::Display for BlockDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let gib = self.size() as f64 / 1_073_741_824.0;

        write!(f, "{} [{}:{}] ({:.2} GiB)", self.name, self.major, self.minor, gib)?;

        if !self.vendor.is_empty() {
            write!(f, " - {}", self.vendor)?;
        }

        if !self.model.is_empty() {
            write!(f, " {}", self.model)?;
        }

        Ok(())
    }
}
