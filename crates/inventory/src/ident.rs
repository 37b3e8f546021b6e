// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::env;

use log::info;
use nix::unistd::{getuid, User};
use serde::Serialize;

const HOSTNAME_ENV_KEY: &str = "HOSTNAME";
const POD_NAME_ENV_KEY: &str = "POD_NAME";
const POD_NAMESPACE_ENV_KEY: &str = "POD_NAMESPACE";
const POD_IP_ENV_KEY: &str = "POD_IP";
const HOST_IP_ENV_KEY: &str = "HOST_IP";

const UNKNOWN: &str = "unknown";

/// The account the process runs as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub home: String,
}

impl UserInfo {
    fn current() -> Self {
        match User::from_uid(getuid()) {
            Ok(Some(user)) => Self {
                username: user.name,
                uid: Some(user.uid.as_raw()),
                gid: Some(user.gid.as_raw()),
                home: user.dir.to_string_lossy().into_owned(),
            },
            _ => Self {
                username: UNKNOWN.to_owned(),
                uid: None,
                gid: None,
                home: String::new(),
            },
        }
    }
}

/// Identity of the running program, built once at startup and passed to
/// whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub progname: String,
    pub version: String,
    pub hostname: String,
    /// Pod name when running inside a cluster
    pub name: String,
    pub namespace: String,
    pub host_ip: String,
    pub pod_ip: String,
    pub user: UserInfo,
}

impl Ident {
    /// Captures the identity from the environment.
    ///
    /// # Arguments
    ///
    /// * `progname` - Program name, usually the binary's file name
    /// * `version` - Version string of the program
    pub fn new(progname: impl Into<String>, version: impl Into<String>) -> Self {
        let var = |key: &str| env::var(key).unwrap_or_default();
        Self {
            progname: progname.into(),
            version: version.into(),
            hostname: var(HOSTNAME_ENV_KEY),
            name: var(POD_NAME_ENV_KEY),
            namespace: var(POD_NAMESPACE_ENV_KEY),
            host_ip: var(HOST_IP_ENV_KEY),
            pod_ip: var(POD_IP_ENV_KEY),
            user: UserInfo::current(),
        }
    }

    /// Logs the identity at info level.
    pub fn log(&self) {
        let progname = &self.progname;
        info!("{progname}: version {}", self.version);
        info!("{progname}: user {}", self.user.username);
        if !self.hostname.is_empty() {
            info!("{progname}: hostname {}", self.hostname);
        }
        if !self.name.is_empty() {
            info!("{progname}: pod {}/{} ({})", self.namespace, self.name, self.pod_ip);
        }
        if !self.host_ip.is_empty() {
            info!("{progname}: host ip {}", self.host_ip);
        }
        info!("{progname}: {} {}", env::consts::OS, env::consts::ARCH);
    }
}
