// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};

use inventory::{Config, Ident, StorageDevicesProbe};

#[derive(Parser, Debug)]
#[command(name = "inventory-probe", about = "Reconciled storage inventory as JSON", version)]
struct Cli {
    /// procfs mount point
    #[arg(long = "proc", value_name = "DIR")]
    procfs: Option<PathBuf>,

    /// sysfs mount point
    #[arg(long = "sys", value_name = "DIR")]
    sysfs: Option<PathBuf>,

    /// ssacli executable, tried before the standard install locations
    #[arg(long, value_name = "PATH")]
    ssacli: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    pretty_env_logger::init();

    let ident = Ident::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    ident.log();

    let mut config = Config::new(ident);
    if let Some(root) = cli.procfs {
        config = config.with_procfs_root(root);
    }
    if let Some(root) = cli.sysfs {
        config = config.with_sysfs_root(root);
    }
    if let Some(path) = cli.ssacli {
        let locations = std::iter::once(path).chain(config.ssacli_locations.clone());
        config = config.with_ssacli_locations(locations.collect::<Vec<_>>());
    }
    debug!("{config:?}");

    let probe = StorageDevicesProbe::new(config);
    probe.init()?;

    let uname = inventory::uname()?;
    info!("{} {} {}", uname.sysname, uname.release, uname.machine);

    let devices = probe.probe_devices()?;
    info!("{} block devices", devices.len());

    let report = serde_json::json!({
        "ident": probe.ident(),
        "uname": uname,
        "devices": devices,
    });
    let output = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{output}");

    Ok(())
}
