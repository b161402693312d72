use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::stats::{CgroupStats, Stats};

use super::OsClient;

/// Client for platforms without taskstats. Every operation fails with
/// [`Error::Unsupported`].
#[derive(Debug, Default)]
pub struct UnsupportedClient;

impl UnsupportedClient {
    /// Always fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`].
    pub fn open(_config: &Config) -> Result<Self> {
        Err(unsupported())
    }
}

fn unsupported() -> Error {
    Error::Unsupported {
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    }
}

impl OsClient for UnsupportedClient {
    fn pid(&mut self, _pid: u32) -> Result<Stats> {
        Err(unsupported())
    }

    fn tgid(&mut self, _tgid: u32) -> Result<Stats> {
        Err(unsupported())
    }

    fn cgroup_stats(&mut self, _path: &Path) -> Result<CgroupStats> {
        Err(unsupported())
    }

    fn close(self) -> Result<()> {
        Err(unsupported())
    }
}
