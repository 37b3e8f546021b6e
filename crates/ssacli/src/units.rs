// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::str::FromStr;

/// Size suffix printed by ssacli. All of them are powers of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SizeUnit {
    Kilobytes = 1 << 10,
    Megabytes = 1 << 20,
    Gigabytes = 1 << 30,
    Terabytes = 1 << 40,
    Petabytes = 1 << 50,
}

impl SizeUnit {
    /// Number of bytes in one unit
    pub fn bytes(self) -> u64 {
        self as u64
    }
}

impl FromStr for SizeUnit {
    type Err = ();

    /// Case-insensitive match of the unit suffix
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "KB" => Ok(Self::Kilobytes),
            "MB" => Ok(Self::Megabytes),
            "GB" => Ok(Self::Gigabytes),
            "TB" => Ok(Self::Terabytes),
            "PB" => Ok(Self::Petabytes),
            _ => Err(()),
        }
    }
}
