// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use blockdev::{procfs::PROC_DEFAULT_MOUNT_POINT, sysfs::SYS_DEFAULT_MOUNT_POINT};

use crate::Ident;

/// Settings of a [`crate::StorageDevicesProbe`]
#[derive(Debug, Clone)]
pub struct Config {
    pub ident: Ident,
    /// Mount point of procfs
    pub procfs_root: PathBuf,
    /// Mount point of sysfs
    pub sysfs_root: PathBuf,
    /// Candidate ssacli executables, in order of preference
    pub ssacli_locations: Vec<PathBuf>,
}

impl Config {
    /// Creates a configuration using the host's pseudo-filesystems and the
    /// standard ssacli install locations.
    pub fn new(ident: Ident) -> Self {
        Self {
            ident,
            procfs_root: PROC_DEFAULT_MOUNT_POINT.into(),
            sysfs_root: SYS_DEFAULT_MOUNT_POINT.into(),
            ssacli_locations: ssacli::KNOWN_LOCATIONS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Reads procfs and sysfs below `root` instead of `/`
    pub fn with_host_root(self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            procfs_root: root.join("proc"),
            sysfs_root: root.join("sys"),
            ..self
        }
    }

    pub fn with_procfs_root(self, root: impl Into<PathBuf>) -> Self {
        Self {
            procfs_root: root.into(),
            ..self
        }
    }

    pub fn with_sysfs_root(self, root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
            ..self
        }
    }

    /// Replaces the ssacli candidates.
    pub fn with_ssacli_locations<I, P>(self, locations: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            ssacli_locations: locations.into_iter().map(Into::into).collect(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_config() {
        let config = Config::new(Ident::new("test", "0"));
        assert_eq!(config.procfs_root, Path::new("/proc"));
        assert_eq!(config.sysfs_root, Path::new("/sys"));
        assert_eq!(config.ssacli_locations[0], Path::new("/usr/sbin/ssacli"));
        assert_eq!(config.ssacli_locations.len(), 3);

        let config = config
            .with_host_root("/host")
            .with_ssacli_locations(["/usr/local/bin/ssacli"]);
        assert_eq!(config.procfs_root, Path::new("/host/proc"));
        assert_eq!(config.sysfs_root, Path::new("/host/sys"));
        assert_eq!(config.ssacli_locations, [PathBuf::from("/usr/local/bin/ssacli")]);
    }
}
