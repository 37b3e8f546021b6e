// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Locating and running the ssacli executable

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, trace};

use crate::{ControllerConfig, Error};

/// Where the vendor packages install ssacli, in order of preference
pub const KNOWN_LOCATIONS: &[&str] = &[
    "/usr/sbin/ssacli",
    "/opt/smartstorageadmin/ssacli/bin/ssacli",
    "/opt/hp/ssacli/bld/ssacli",
];

/// A located ssacli executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssacli {
    path: PathBuf,
}

impl Ssacli {
    /// Finds ssacli in one of the [`KNOWN_LOCATIONS`].
    pub fn locate() -> Result<Self, Error> {
        Self::locate_in(KNOWN_LOCATIONS)
    }

    /// Returns the first candidate that is a regular file with any execute bit set.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if none of the candidates qualifies
    pub fn locate_in<I, P>(candidates: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        candidates
            .into_iter()
            .map(|candidate| candidate.as_ref().to_path_buf())
            .find(|candidate| is_executable(candidate))
            .map(|path| Self { path })
            .ok_or(Error::NotFound)
    }

    /// Returns the path to the executable.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `ssacli version` and extracts the version string.
    pub fn version(&self) -> Result<String, Error> {
        parse_version(&self.execute(&["version"])?)
    }

    /// Runs `ssacli ctrl all show config detail` and parses its output.
    pub fn show_config(&self) -> Result<ControllerConfig, Error> {
        let output = self.execute(&["ctrl", "all", "show", "config", "detail"])?;
        Ok(ControllerConfig::parse(&output))
    }

    /// Runs the tool to completion and returns its trimmed standard output.
    fn execute(&self, args: &[&str]) -> Result<String, Error> {
        let command = format!("{} {}", self.path.display(), args.join(" "));
        debug!("running {command}");

        let output = Command::new(&self.path)
            .args(args)
            .output()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::Execution {
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                command,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        trace!("{command}: {} bytes of output", stdout.len());
        Ok(stdout)
    }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Extracts the version from `ssacli version` output, e.g. `4.21.7.0 2020-07-15`
/// from the line `SSACLI Version: 4.21.7.0 2020-07-15`.
pub fn parse_version(text: &str) -> Result<String, Error> {
    text.lines()
        .find_map(|line| {
            let mut parts = line.trim().split(": ");
            let key = parts.next()?;
            let value = parts.next()?;
            key.starts_with("SSACLI Version").then(|| value.to_owned())
        })
        .ok_or(Error::Version)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join(name)
    }

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_parse_version() {
        let text = fs::read_to_string(fixture_path("version.txt")).unwrap();
        assert_eq!(parse_version(&text).unwrap(), "4.21.7.0 2020-07-15");
        assert!(matches!(parse_version("SOULAPI Version: 1.0"), Err(Error::Version)));
        assert!(matches!(parse_version(""), Err(Error::Version)));
    }

    #[test]
    fn test_locate() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        fs::write(&plain, "").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::set_permissions(&subdir, fs::Permissions::from_mode(0o755)).unwrap();
        let exec = dir.path().join("exec");
        fs::write(&exec, "").unwrap();
        fs::set_permissions(&exec, fs::Permissions::from_mode(0o100)).unwrap();

        let missing = dir.path().join("missing");
        let found = Ssacli::locate_in([&missing, &plain, &subdir, &exec]).unwrap();
        assert_eq!(found.path(), exec);
        assert!(matches!(
            Ssacli::locate_in([&missing, &plain, &subdir]),
            Err(Error::NotFound)
        ));
    }

    // Scripts are written and executed from a single test to keep other test
    // threads from holding them open while they are exec'd.
    #[test_log::test]
    fn test_execute() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "case \"$1\" in\n  version) cat '{}' ;;\n  ctrl) cat '{}' ;;\n  *) exit 2 ;;\nesac",
            fixture_path("version.txt").display(),
            fixture_path("show-config-detail-h240.txt").display(),
        );
        let good = script(dir.path(), "ssacli", &body);
        let bad = script(dir.path(), "broken", "echo 'Error: no controllers' >&2\nexit 3");

        let ssacli = Ssacli::locate_in([&good]).unwrap();
        assert_eq!(ssacli.version().unwrap(), "4.21.7.0 2020-07-15");
        let config = ssacli.show_config().unwrap();
        assert_eq!(config.slots.len(), 1);
        assert_eq!(config.slots[0].arrays.len(), 2);

        let broken = Ssacli::locate_in([&bad]).unwrap();
        match broken.version() {
            Err(Error::Execution { command, reason }) => {
                assert!(command.ends_with("broken version"));
                assert!(reason.contains("no controllers"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
