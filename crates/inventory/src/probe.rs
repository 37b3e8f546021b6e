// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! One full rebuild of the storage inventory

use blockdev::{BlockDeviceInfo, BlockDeviceIoInfo, BlockDeviceMap, ProcFs, SysFs};
use log::{debug, error, info};
use ssacli::{LogicalDriveMap, Ssacli};

use crate::{filter_logical_drives, reconcile, Config, Error, Ident, StorageDeviceInfo};

/// Reads the kernel and controller views of the host's storage.
///
/// Nothing is cached: every `probe_*` call reads the pseudo-filesystems and runs
/// the vendor tool again.
#[derive(Debug)]
pub struct StorageDevicesProbe {
    config: Config,
    procfs: ProcFs,
    sysfs: SysFs,
}

impl StorageDevicesProbe {
    pub fn new(config: Config) -> Self {
        let procfs = ProcFs::with_root(&config.procfs_root);
        let sysfs = SysFs::with_root(&config.sysfs_root);
        Self { config, procfs, sysfs }
    }

    /// Locates ssacli and logs its version.
    ///
    /// A missing tool is reported but not an error; the controller side of the
    /// inventory stays empty until it shows up.
    pub fn init(&self) -> Result<(), Error> {
        let progname = &self.config.ident.progname;
        match self.locate() {
            Ok(ssacli) => {
                info!("{progname}: using {}", ssacli.path().display());
                info!("{progname}: ssacli version {}", ssacli.version()?);
            }
            Err(ssacli::Error::NotFound) => info!("{progname}: ssacli not found, controller data disabled"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn ident(&self) -> &Ident {
        &self.config.ident
    }

    pub fn has_ssacli(&self) -> bool {
        self.locate().is_ok()
    }

    /// Identity, IO and queue statistics of every block device
    pub fn probe_block_devices(&self) -> Result<BlockDeviceMap, Error> {
        Ok(blockdev::discover_block_device_stats(&self.procfs, &self.sysfs)?)
    }

    /// Diskstats entries of every block device
    pub fn probe_block_devices_io(&self) -> Result<Vec<BlockDeviceIoInfo>, Error> {
        Ok(blockdev::enumerate_block_device_io(&self.procfs, &self.sysfs)?)
    }

    /// Runs ssacli and returns the logical drives the kernel exposes.
    ///
    /// Without ssacli the map is empty.
    pub fn probe_logical_drives(&self, stats: &BlockDeviceMap) -> Result<LogicalDriveMap, Error> {
        let ssacli = match self.locate() {
            Ok(ssacli) => ssacli,
            Err(ssacli::Error::NotFound) => {
                debug!("ssacli not found, no logical drives");
                return Ok(LogicalDriveMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let config = ssacli.show_config()?;
        let drives = ssacli::to_logical_map(&config);
        debug!("ssacli reports {} logical drives", drives.len());

        Ok(filter_logical_drives(drives, &stats.io_stats))
    }

    /// Performs a full rebuild and returns one record per kernel block device.
    ///
    /// A failing ssacli only loses the controller side for this call; the kernel
    /// records are still returned.
    pub fn probe_devices(&self) -> Result<Vec<StorageDeviceInfo>, Error> {
        let stats = self.probe_block_devices()?;
        let devices: Vec<BlockDeviceInfo> = blockdev::discover_block_device_info(&self.procfs, &self.sysfs)?;

        let drives = self.probe_logical_drives(&stats).unwrap_or_else(|e| {
            error!("logical drives: {e}");
            LogicalDriveMap::new()
        });

        let records = reconcile(devices, &stats, drives);
        debug!(
            "{} block devices, {} backed by logical drives",
            records.len(),
            records.iter().filter(|r| r.logical_drive.is_some()).count()
        );
        Ok(records)
    }

    fn locate(&self) -> Result<Ssacli, ssacli::Error> {
        Ssacli::locate_in(&self.config.ssacli_locations)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        os::unix::fs::PermissionsExt,
        path::{Path, PathBuf},
    };

    use super::*;

    const DISKSTATS: &str = "\
   8       0 sda 1200 30 96000 800 400 10 32000 900 0 1500 1700 0 0 0 0
   8      16 sdb 50 0 4000 20 0 0 0 0 0 30 20 0 0 0 0
 259       0 nvme0n1 10 0 80 1 0 0 0 0 0 1 1 0 0 0 0
";

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn block_device(sys: &Path, name: &str, dev: &str, stat: &str) {
        write(sys, &format!("block/{name}/dev"), &format!("{dev}\n"));
        write(sys, &format!("block/{name}/size"), "585871964\n");
        write(sys, &format!("block/{name}/ro"), "0\n");
        write(sys, &format!("block/{name}/device/vendor"), "HP      \n");
        write(sys, &format!("block/{name}/device/model"), "LOGICAL VOLUME  \n");
        write(sys, &format!("block/{name}/stat"), &format!("{stat}\n"));
    }

    fn fake_host(root: &Path) {
        write(root, "proc/diskstats", DISKSTATS);
        let sys = root.join("sys");
        block_device(&sys, "sda", "8:0", "1200 30 96000 800 400 10 32000 900 0 1500 1700");
        block_device(&sys, "sdb", "8:16", "50 0 4000 20 0 0 0 0 0 30 20");
        block_device(&sys, "nvme0n1", "259:0", "10 0 80 1 0 0 0 0 0 1 1");
    }

    fn fake_ssacli(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("ssacli");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config(root: &Path, ssacli: &[PathBuf]) -> Config {
        Config::new(Ident::new("inventory-test", "0.0.0"))
            .with_host_root(root)
            .with_ssacli_locations(ssacli)
    }

    #[test_log::test]
    fn test_probe_without_ssacli() {
        let root = tempfile::tempdir().unwrap();
        fake_host(root.path());

        let probe = StorageDevicesProbe::new(config(root.path(), &[root.path().join("missing")]));
        probe.init().unwrap();
        assert!(!probe.has_ssacli());
        assert_eq!(probe.ident().progname, "inventory-test");

        let stats = probe.probe_block_devices().unwrap();
        assert!(probe.probe_logical_drives(&stats).unwrap().is_empty());
        assert_eq!(probe.probe_block_devices_io().unwrap().len(), 3);

        let records = probe.probe_devices().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.logical_drive.is_none() && r.io.is_some()));
    }

    #[test_log::test]
    fn test_probe_with_ssacli() {
        let root = tempfile::tempdir().unwrap();
        fake_host(root.path());

        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("../ssacli/tests");
        let script = fake_ssacli(
            root.path(),
            &format!(
                "case \"$1\" in\n  version) cat '{}' ;;\n  *) cat '{}' ;;\nesac",
                fixtures.join("version.txt").display(),
                fixtures.join("show-config-detail-h240.txt").display(),
            ),
        );

        let probe = StorageDevicesProbe::new(config(root.path(), &[script.clone()]));
        probe.init().unwrap();
        assert!(probe.has_ssacli());

        let records = probe.probe_devices().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.device.name.as_str()).collect();
        assert_eq!(names, ["sda", "sdb", "nvme0n1"]);

        let sda = records[0].logical_drive.as_ref().unwrap();
        assert_eq!(sda.disk_name, "/dev/sda");
        assert_eq!(sda.array_name, "A");
        assert_eq!(sda.physical_drives.len(), 1);
        assert_eq!(records[1].logical_drive.as_ref().unwrap().array_name, "B");
        assert!(records[2].logical_drive.is_none());
        assert_eq!(records[0].device.vendor, "HP");

        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["name"], "sda");
        assert_eq!(json["major"], 8);
        assert_eq!(json["size"], 585871964u64 * 512);
        assert_eq!(json["io"]["reads_ios"], 1200);
        assert_eq!(json["logical_drive"]["disk_name"], "/dev/sda");
        assert!(json["logical_drive"]["physical_drives"][0].get("box").is_some());

        // A failing tool costs only the controller side of the inventory
        fs::write(&script, "#!/bin/sh\necho broken >&2\nexit 3\n").unwrap();
        let stats = probe.probe_block_devices().unwrap();
        assert!(matches!(
            probe.probe_logical_drives(&stats),
            Err(Error::Ssacli(ssacli::Error::Execution { .. }))
        ));
        let records = probe.probe_devices().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.logical_drive.is_none()));
    }
}
