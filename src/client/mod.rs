//! The public client facade.
//!
//! [`Client`] wraps a platform implementation of [`OsClient`]. On Linux that
//! is [`LinuxClient`] over a generic netlink [`Conn`](crate::netlink::Conn);
//! elsewhere it is [`UnsupportedClient`], which fails every call.

#[cfg(target_os = "linux")]
mod linux;
mod unsupported;

use std::path::Path;

#[cfg(target_os = "linux")]
pub use linux::LinuxClient;
pub use unsupported::UnsupportedClient;

use crate::config::Config;
use crate::error::Result;
use crate::stats::{CgroupStats, Stats};

/// Platform-specific taskstats operations.
pub trait OsClient {
    /// Statistics of a single task.
    fn pid(&mut self, pid: u32) -> Result<Stats>;

    /// Statistics aggregated over a thread group.
    fn tgid(&mut self, tgid: u32) -> Result<Stats>;

    /// Task state counts of the cgroup at `path`.
    fn cgroup_stats(&mut self, path: &Path) -> Result<CgroupStats>;

    /// Releases the underlying resources.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[cfg(target_os = "linux")]
pub type DefaultClient = LinuxClient;

#[cfg(not(target_os = "linux"))]
pub type DefaultClient = UnsupportedClient;

/// A taskstats client.
///
/// Queries take `&mut self`; one request is in flight at a time. Share a
/// client across threads behind a `Mutex`.
///
/// # Example
///
/// ```no_run
/// let mut client = taskstats::Client::new()?;
/// let stats = client.self_stats()?;
/// println!("user time: {:?}", stats.user_cpu_time);
/// client.close()?;
/// # Ok::<(), taskstats::Error>(())
/// ```
#[derive(Debug)]
pub struct Client<C: OsClient = DefaultClient> {
    inner: C,
}

impl Client<DefaultClient> {
    /// Opens a client configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the connection cannot
    /// be opened, or taskstats is unavailable.
    pub fn new() -> Result<Self> {
        Self::with_config(&Config::from_env()?)
    }

    /// Opens a client with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or taskstats is
    /// unavailable.
    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self {
            inner: DefaultClient::open(config)?,
        })
    }
}

impl<C: OsClient> Client<C> {
    pub fn from_os_client(inner: C) -> Self {
        Self { inner }
    }

    /// Statistics of the calling process.
    pub fn self_stats(&mut self) -> Result<Stats> {
        self.inner.pid(std::process::id())
    }

    /// Statistics of the task `pid`.
    ///
    /// Use [`Error::is_not_exist`](crate::Error::is_not_exist) to tell a
    /// missing task apart from other failures.
    pub fn pid(&mut self, pid: u32) -> Result<Stats> {
        self.inner.pid(pid)
    }

    /// Statistics aggregated over the thread group `tgid`.
    pub fn tgid(&mut self, tgid: u32) -> Result<Stats> {
        self.inner.tgid(tgid)
    }

    /// Task state counts of the cgroup at `path`, e.g. a directory below the
    /// cgroup v1 `cpu` controller mount.
    pub fn cgroup_stats(&mut self, path: impl AsRef<Path>) -> Result<CgroupStats> {
        self.inner.cgroup_stats(path.as_ref())
    }

    pub fn close(self) -> Result<()> {
        self.inner.close()
    }
}
