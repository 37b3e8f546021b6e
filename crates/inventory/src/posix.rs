// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use serde::Serialize;

use crate::Error;

/// System identification as reported by uname(2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Uname {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
}

pub fn uname() -> Result<Uname, Error> {
    let uts = nix::sys::utsname::uname()?;
    Ok(Uname {
        sysname: uts.sysname().to_string_lossy().into_owned(),
        nodename: uts.nodename().to_string_lossy().into_owned(),
        release: uts.release().to_string_lossy().into_owned(),
        version: uts.version().to_string_lossy().into_owned(),
        machine: uts.machine().to_string_lossy().into_owned(),
    })
}
