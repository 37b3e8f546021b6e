// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! HPE Smart Storage Administrator CLI support
//!
//! `ssacli ctrl all show config detail` prints a human oriented, indentation
//! structured description of every controller. This crate locates and runs the
//! tool, parses that transcript into a [`ControllerConfig`] tree and flattens the
//! tree into typed [`LogicalDriveInfo`] records keyed by kernel device name.

use std::io;

use thiserror::Error;

mod cli;
mod config;
mod logical;
mod units;

pub use cli::*;
pub use config::*;
pub use logical::*;
pub use units::SizeUnit;

/// Errors that can occur when talking to ssacli
#[derive(Debug, Error)]
pub enum Error {
    /// The tool is not installed in any of the known locations
    #[error("failed to locate ssacli")]
    NotFound,

    /// The tool was found but could not be run, or exited unsuccessfully
    #[error("{command}: {reason}")]
    Execution { command: String, reason: String },

    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The version output has no `SSACLI Version` line
    #[error("failed to parse ssacli version")]
    Version,
}
