// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Typed logical drive records derived from a [`ControllerConfig`]

use std::{collections::BTreeMap, path::Path};

use log::debug;
use serde::Serialize;

use crate::{Array, ControllerConfig, PhysicalDrive, SizeUnit};

/// Logical drives keyed by kernel device name (e.g. `sda`)
pub type LogicalDriveMap = BTreeMap<String, LogicalDriveInfo>;

/// A physical disk backing a logical drive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhysicalDriveInfo {
    /// Section title, e.g. `physicaldrive 1I:1:2`
    pub id: String,
    #[serde(rename = "box")]
    pub box_id: String,
    pub bay: String,
    pub size: String,
    pub size_bytes: u64,
    pub status: String,
    pub serial: String,
    /// Current temperature in °C
    pub temp_curr: i64,
    /// Maximum recorded temperature in °C
    pub temp_maxi: i64,
    pub unique_id: String,
    /// `-1` when not reported
    pub power_hours: i64,
}

/// A logical drive exposed to the OS as one block device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogicalDriveInfo {
    /// Logical drive number, e.g. `1`
    pub id: String,
    /// Device path, e.g. `/dev/sda`
    pub disk_name: String,
    pub size: String,
    pub size_bytes: u64,
    pub status: String,
    pub unique_id: String,
    pub array_name: String,
    pub physical_drives: Vec<PhysicalDriveInfo>,
}

impl LogicalDriveInfo {
    /// `0` when the status is `OK`, `1` otherwise
    pub fn status_value(&self) -> u8 {
        status_value(&self.status)
    }
}

impl PhysicalDriveInfo {
    /// `0` when the status is `OK`, `1` otherwise
    pub fn status_value(&self) -> u8 {
        status_value(&self.status)
    }
}

impl From<&PhysicalDrive> for PhysicalDriveInfo {
    fn from(drive: &PhysicalDrive) -> Self {
        let size = drive.value("Size").to_owned();
        Self {
            id: drive.title.clone(),
            box_id: drive.value("Box").to_owned(),
            bay: drive.value("Bay").to_owned(),
            size_bytes: parse_size_bytes(&size),
            size,
            status: drive.value("Status").to_owned(),
            serial: drive.value("Serial Number").to_owned(),
            temp_curr: parse_temperature(drive.value_by_prefix("Current Temperature")),
            temp_maxi: parse_temperature(drive.value_by_prefix("Maximum Temperature")),
            unique_id: drive.value("Drive Unique ID").to_owned(),
            power_hours: parse_power_hours(drive.value("Power On Hours")),
        }
    }
}

/// Flattens the configuration into logical drives keyed by device name.
///
/// Only arrays holding exactly one logical drive are considered, since the
/// physical drives of an array cannot otherwise be attributed to a single
/// device. Logical drives without a `Disk Name` are skipped.
pub fn to_logical_map(config: &ControllerConfig) -> LogicalDriveMap {
    let mut map = LogicalDriveMap::new();

    for slot in &config.slots {
        for array in &slot.arrays {
            if let Some((name, info)) = logical_drive_info(array) {
                map.insert(name, info);
            }
        }
    }

    map
}

fn logical_drive_info(array: &Array) -> Option<(String, LogicalDriveInfo)> {
    let [drive] = array.logical_drives.as_slice() else {
        debug!(
            "{}: skipping array with {} logical drives",
            array.title,
            array.logical_drives.len()
        );
        return None;
    };

    let disk_name = drive.value("Disk Name");
    let Some(name) = Path::new(disk_name).file_name() else {
        debug!("{}: no usable disk name {disk_name:?}", drive.title);
        return None;
    };

    let size = drive.value("Size").to_owned();
    let info = LogicalDriveInfo {
        id: drive.name().to_owned(),
        disk_name: disk_name.to_owned(),
        size_bytes: parse_size_bytes(&size),
        size,
        status: drive.value("Status").to_owned(),
        unique_id: drive.value("Unique Identifier").to_owned(),
        array_name: array.name().to_owned(),
        physical_drives: array.physical_drives.iter().map(PhysicalDriveInfo::from).collect(),
    };

    Some((name.to_string_lossy().into_owned(), info))
}

/// Converts sizes such as `372.58 GB` to bytes.
///
/// Unknown or missing units leave the number unscaled, and a value that is not a
/// number yields zero.
pub fn parse_size_bytes(s: &str) -> u64 {
    let (number, unit) = match s.trim().split_once(' ') {
        Some((number, unit)) => (number, Some(unit.trim())),
        None => (s.trim(), None),
    };

    let Ok(value) = number.parse::<f64>() else {
        return 0;
    };

    let scale = unit
        .and_then(|unit| unit.parse::<SizeUnit>().ok())
        .map_or(1.0, |unit| unit.bytes() as f64);

    (value * scale) as u64
}

fn parse_temperature(s: &str) -> i64 {
    s.trim().parse::<f64>().map_or(0, |value| value as i64)
}

fn parse_power_hours(s: &str) -> i64 {
    s.trim().parse().unwrap_or(-1)
}

fn status_value(status: &str) -> u8 {
    u8::from(!status.eq_ignore_ascii_case("OK"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::parse_show_config;

    const GIB: u64 = 1 << 30;
    const TIB: u64 = 1 << 40;

    fn logical_map(name: &str) -> LogicalDriveMap {
        let text = fs::read_to_string(format!("tests/{name}")).expect("Cannot find test transcript");
        to_logical_map(&parse_show_config(&text))
    }

    #[test]
    fn test_parse_size_bytes() {
        let bytes = parse_size_bytes("372.58 GB");
        assert!(bytes > 372 * GIB);
        assert!(bytes < 373 * GIB);
        assert_eq!(parse_size_bytes("1 TB"), TIB);
        assert_eq!(parse_size_bytes("256 kb"), 256 * 1024);
        assert_eq!(parse_size_bytes("2 PB"), 2 << 50);
        assert_eq!(parse_size_bytes("512 MB"), 512 << 20);
        assert_eq!(parse_size_bytes("4096"), 4096);
        assert_eq!(parse_size_bytes("12 bogons"), 12);
        assert_eq!(parse_size_bytes("0 MB (0.00%)"), 0);
        assert_eq!(parse_size_bytes("lots"), 0);
        assert_eq!(parse_size_bytes(""), 0);
    }

    #[test]
    fn test_scalar_parsers() {
        assert_eq!(parse_temperature("35"), 35);
        assert_eq!(parse_temperature("35.7"), 35);
        assert_eq!(parse_temperature(""), 0);
        assert_eq!(parse_power_hours("40698"), 40698);
        assert_eq!(parse_power_hours("-3"), -3);
        assert_eq!(parse_power_hours(""), -1);
        assert_eq!(parse_power_hours("n/a"), -1);
        assert_eq!(status_value("OK"), 0);
        assert_eq!(status_value("ok"), 0);
        assert_eq!(status_value("Failed"), 1);
        assert_eq!(status_value(""), 1);
    }

    #[test_log::test]
    fn test_to_logical_map_h240() {
        let map = logical_map("show-config-detail-h240.txt");
        assert_eq!(map.keys().collect::<Vec<_>>(), ["sda", "sdb"]);

        let sda = &map["sda"];
        assert_eq!(sda.id, "1");
        assert_eq!(sda.disk_name, "/dev/sda");
        assert_eq!(sda.size, "372.58 GB");
        assert!(sda.size_bytes > 372 * GIB && sda.size_bytes < 373 * GIB);
        assert_eq!(sda.status, "OK");
        assert_eq!(sda.unique_id, "600508B1001C90DB4A1FDCBCCB744F14");
        assert_eq!(sda.array_name, "A");

        let [pd] = sda.physical_drives.as_slice() else {
            panic!("expected one physical drive");
        };
        assert_eq!(pd.id, "physicaldrive 1I:1:2");
        assert_eq!(pd.box_id, "1");
        assert_eq!(pd.bay, "2");
        assert_eq!(pd.size_bytes, 400 * GIB);
        assert_eq!(pd.serial, "BTHV603000TL400NGN");
        assert_eq!(pd.temp_curr, 17);
        assert_eq!(pd.temp_maxi, 35);
        assert_eq!(pd.power_hours, 40698);

        let sdb = &map["sdb"];
        assert_eq!(sdb.size, "931.48 GB");
        assert!(sdb.size_bytes > 931 * GIB && sdb.size_bytes < 932 * GIB);
        assert_eq!(sdb.array_name, "B");
        assert_eq!(sdb.physical_drives[0].size_bytes, TIB);
        assert_eq!(sdb.physical_drives[0].power_hours, -1);

        for info in map.values() {
            for pd in &info.physical_drives {
                assert!(pd.size_bytes > 0);
                assert!(pd.temp_curr > 0);
                assert!(pd.temp_maxi > 0);
                assert!(pd.power_hours > 0 || pd.power_hours == -1);
            }
        }
    }

    #[test_log::test]
    fn test_to_logical_map_p816i() {
        let map = logical_map("show-config-detail-p816i.txt");
        assert_eq!(map.len(), 3);

        let sdb = &map["sdb"];
        assert_eq!(sdb.unique_id, "600508B1001CCD7B72DB95E459CDDCCC");
        assert_eq!(sdb.physical_drives.len(), 4);
        assert_eq!(map["sdd"].physical_drives.len(), 2);
        assert_eq!(map["sdd"].physical_drives[0].power_hours, 29441);

        for info in map.values() {
            for pd in &info.physical_drives {
                assert!(pd.size_bytes > 0);
                assert!(pd.temp_curr > 0);
                assert!(pd.temp_maxi > 0);
                assert!(pd.power_hours > 0 || pd.power_hours == -1);
            }
        }
    }

    #[test]
    fn test_array_selection() {
        let text = "\
Controller in Slot 3
   Array: A
      Logical Drive: 1
         Disk Name: /dev/sdc
      Logical Drive: 2
         Disk Name: /dev/sdd

   Array: B
      Status: OK

   Array: C
      Logical Drive: 3
         Size: 10 GB

   Array: D
      Logical Drive: 4
         Disk Name: /dev/nvme0n1
         Status: Interim Recovery Mode
      physicaldrive 1I:1:1
         Status: Failed
";
        let map = to_logical_map(&parse_show_config(text));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["nvme0n1"]);
        let info = &map["nvme0n1"];
        assert_eq!(info.array_name, "D");
        assert_eq!(info.status_value(), 1);
        assert_eq!(info.physical_drives[0].status_value(), 1);
        assert_eq!(info.physical_drives[0].power_hours, -1);
        assert_eq!(info.physical_drives[0].temp_curr, 0);
    }
}
