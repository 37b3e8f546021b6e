// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Joining kernel block devices with controller logical drives

use std::collections::BTreeMap;

use blockdev::{BlockDeviceInfo, BlockDeviceIoStat, BlockDeviceMap};
use log::debug;
use serde::Serialize;
use ssacli::{LogicalDriveInfo, LogicalDriveMap};

/// Everything known about one block device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageDeviceInfo {
    #[serde(flatten)]
    pub device: BlockDeviceInfo,
    /// IO counters, when `/sys/block/<dev>/stat` could be read
    pub io: Option<BlockDeviceIoStat>,
    /// The controller's logical drive backing this device, if any
    pub logical_drive: Option<LogicalDriveInfo>,
}

/// Keeps only the logical drives the kernel currently exposes as block devices.
pub fn filter_logical_drives(
    drives: LogicalDriveMap,
    io_stats: &BTreeMap<String, BlockDeviceIoStat>,
) -> LogicalDriveMap {
    drives
        .into_iter()
        .filter(|(name, _)| {
            let exposed = io_stats.contains_key(name);
            if !exposed {
                debug!("{name}: logical drive has no block device");
            }
            exposed
        })
        .collect()
}

/// Builds one record per kernel block device, attaching the matching logical
/// drive by device name.
///
/// Devices unknown to the controller are kept with no logical drive; logical
/// drives without an exposed block device are dropped.
pub fn reconcile(
    devices: Vec<BlockDeviceInfo>,
    stats: &BlockDeviceMap,
    drives: LogicalDriveMap,
) -> Vec<StorageDeviceInfo> {
    let mut drives = filter_logical_drives(drives, &stats.io_stats);

    devices
        .into_iter()
        .map(|device| {
            let logical_drive = drives.remove(&device.name);
            let io = stats.io_stats.get(&device.name).cloned();
            StorageDeviceInfo {
                device,
                io,
                logical_drive,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> BlockDeviceInfo {
        BlockDeviceInfo {
            name: name.to_owned(),
            major: 8,
            ..Default::default()
        }
    }

    fn drive(disk_name: &str) -> LogicalDriveInfo {
        LogicalDriveInfo {
            disk_name: disk_name.to_owned(),
            status: "OK".to_owned(),
            ..Default::default()
        }
    }

    fn stats(names: &[&str]) -> BlockDeviceMap {
        let mut map = BlockDeviceMap::default();
        for name in names {
            map.io_stats.insert(name.to_string(), BlockDeviceIoStat::default());
        }
        map
    }

    #[test]
    fn test_filter_logical_drives() {
        let drives = LogicalDriveMap::from([
            ("sda".to_owned(), drive("/dev/sda")),
            ("sdz".to_owned(), drive("/dev/sdz")),
        ]);
        let filtered = filter_logical_drives(drives, &stats(&["sda", "sdb"]).io_stats);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), ["sda"]);
    }

    #[test_log::test]
    fn test_reconcile() {
        let drives = LogicalDriveMap::from([
            ("sda".to_owned(), drive("/dev/sda")),
            ("sdb".to_owned(), drive("/dev/sdb")),
            ("sdz".to_owned(), drive("/dev/sdz")),
        ]);
        // sdb is a block device but its stat file could not be read
        let devices = vec![device("sda"), device("sdb"), device("nvme0n1")];
        let records = reconcile(devices, &stats(&["sda", "nvme0n1", "sdz"]), drives);

        let names: Vec<_> = records.iter().map(|r| r.device.name.as_str()).collect();
        assert_eq!(names, ["sda", "sdb", "nvme0n1"]);
        assert_eq!(
            records[0].logical_drive.as_ref().map(|ld| ld.disk_name.as_str()),
            Some("/dev/sda")
        );
        assert!(records[0].io.is_some());
        assert!(records[1].logical_drive.is_none());
        assert!(records[1].io.is_none());
        assert!(records[2].logical_drive.is_none());
        assert!(records[2].io.is_some());

        // Every attached drive is present on both sides
        for record in &records {
            if record.logical_drive.is_some() {
                assert!(record.io.is_some());
            }
        }
    }

    #[test]
    fn test_reconcile_without_controller() {
        let devices = vec![device("sda"), device("sdb")];
        let records = reconcile(devices, &stats(&["sda", "sdb"]), LogicalDriveMap::new());
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.logical_drive.is_none()));
    }
}
