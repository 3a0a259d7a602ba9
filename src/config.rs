//! Environment configuration and in-cluster constants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{OomWatchError, Result};

/// In-cluster API server address.
pub const APISERVER: &str = "https://kubernetes.default.svc";

/// Mount point for the platform-injected service account credentials.
pub const SERVICEACCOUNT: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Bearer token file inside the service account mount.
pub fn token_path() -> PathBuf {
    Path::new(SERVICEACCOUNT).join("token")
}

/// CA bundle file inside the service account mount.
pub fn ca_path() -> PathBuf {
    Path::new(SERVICEACCOUNT).join("ca.crt")
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Pause between scan cycles.
    pub interval: Duration,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function, so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = match lookup("INTERVAL") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    OomWatchError::Config(format!("INTERVAL must be an integer, got {raw:?}"))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_INTERVAL_SECS),
        };

        Ok(Self { interval })
    }
}
