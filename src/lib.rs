//! Linux per-task, per-thread-group and per-cgroup accounting statistics.
//!
//! This library talks to the kernel's `TASKSTATS` generic netlink family and
//! decodes the versioned `struct taskstats` and `struct cgroupstats` replies into
//! typed [`Stats`] and [`CgroupStats`] values. Replies from kernels with any
//! known taskstats layout (versions 8 through 14, and 16) are accepted; unknown
//! layout sizes are rejected rather than guessed at.
//!
//! Querying other processes requires `CAP_NET_ADMIN`.
//!
//! ```no_run
//! use taskstats::Client;
//!
//! let mut client = Client::new()?;
//! match client.pid(1) {
//!     Ok(stats) => println!("{} started at {:?}", stats.command, stats.begin_time),
//!     Err(err) if err.is_not_exist() => println!("no such task"),
//!     Err(err) => return Err(err),
//! }
//! client.close()?;
//! # Ok::<(), taskstats::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod mountinfo;
pub mod netlink;
pub mod stats;

pub use client::{Client, DefaultClient, OsClient};
pub use config::Config;
pub use error::{Error, Result};
pub use stats::{CgroupStats, Delay, IoAccounting, MemoryAccounting, Stats, TaskstatsVersion};
