use std::os::fd::AsRawFd;
use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::fsutil;
use crate::netlink::message::NLM_F_REQUEST;
use crate::netlink::{Conn, Family, GenlMessage, Transport};
use crate::stats::abi::{TASKSTATS_GENL_NAME, TASKSTATS_TYPE_AGGR_PID, TASKSTATS_TYPE_AGGR_TGID};
use crate::stats::decode::{parse_cgroup_message, parse_task_message, single_reply};
use crate::stats::{CgroupStats, QueryTarget, Stats, build_request};

use super::OsClient;

/// Taskstats client bound to a resolved `TASKSTATS` family.
#[derive(Debug)]
pub struct LinuxClient<T: Transport = Conn> {
    transport: T,
    family: Family,
}

impl LinuxClient<Conn> {
    /// Opens a generic netlink connection and resolves the `TASKSTATS` family.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be opened or the kernel does not
    /// provide the family.
    pub fn open(config: &Config) -> Result<Self> {
        Self::with_transport(Conn::dial(config)?)
    }
}

impl<T: Transport> LinuxClient<T> {
    /// Resolves the `TASKSTATS` family over an existing transport.
    ///
    /// The transport is closed if the family cannot be resolved.
    ///
    /// # Errors
    ///
    /// Returns the family lookup error.
    pub fn with_transport(mut transport: T) -> Result<Self> {
        match transport.get_family(TASKSTATS_GENL_NAME) {
            Ok(family) => {
                log::debug!(
                    "Resolved generic netlink family `{}`: id={}, version={}",
                    family.name,
                    family.id,
                    family.version
                );
                Ok(Self { transport, family })
            }
            Err(err) => {
                if let Err(close_err) = transport.close() {
                    log::warn!("Failed to close transport after family lookup error: {close_err}");
                }
                Err(err.into())
            }
        }
    }

    /// The resolved `TASKSTATS` family.
    pub fn family(&self) -> &Family {
        &self.family
    }

    fn query(&mut self, target: QueryTarget) -> Result<GenlMessage> {
        let request = build_request(target)?;
        let replies = self
            .transport
            .execute(&request, self.family.id, NLM_F_REQUEST)?;
        single_reply(replies)
    }
}

impl<T: Transport> OsClient for LinuxClient<T> {
    fn pid(&mut self, pid: u32) -> Result<Stats> {
        let msg = self.query(QueryTarget::Pid(pid))?;
        parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID)
    }

    fn tgid(&mut self, tgid: u32) -> Result<Stats> {
        let msg = self.query(QueryTarget::Tgid(tgid))?;
        parse_task_message(&msg, TASKSTATS_TYPE_AGGR_TGID)
    }

    fn cgroup_stats(&mut self, path: &Path) -> Result<CgroupStats> {
        // The kernel resolves the descriptor while handling the request, so the
        // file stays open until the reply has been received.
        let cgroup = fsutil::open_cgroup(path)?;
        let msg = self.query(QueryTarget::CgroupFd(cgroup.as_raw_fd()))?;
        drop(cgroup);

        parse_cgroup_message(&msg)
    }

    fn close(self) -> Result<()> {
        self.transport.close()?;
        Ok(())
    }
}
