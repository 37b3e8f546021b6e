// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Storage device inventory
//!
//! Joins the kernel's view of block devices with the RAID controller's view of
//! logical and physical drives, keyed by kernel device name.

use thiserror::Error;

mod config;
mod ident;
mod posix;
mod probe;
mod reconcile;

pub use blockdev;
pub use config::Config;
pub use ident::{Ident, UserInfo};
pub use posix::{uname, Uname};
pub use probe::StorageDevicesProbe;
pub use reconcile::{filter_logical_drives, reconcile, StorageDeviceInfo};
pub use ssacli;

/// Errors that can occur while building the inventory
#[derive(Debug, Error)]
pub enum Error {
    #[error("block devices: {0}")]
    BlockDevice(#[from] blockdev::Error),

    #[error("ssacli: {0}")]
    Ssacli(#[from] ssacli::Error),

    #[error("posix: {0}")]
    Posix(#[from] nix::Error),
}
