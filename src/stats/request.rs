//! Builds `TASKSTATS_CMD_GET` and `CGROUPSTATS_CMD_GET` requests.

use std::os::fd::RawFd;

use crate::netlink::{AttrError, Attribute, GenlMessage, Header, attr};

use super::abi::{
    CGROUPSTATS_CMD_ATTR_FD, CGROUPSTATS_CMD_GET, TASKSTATS_CMD_ATTR_PID, TASKSTATS_CMD_ATTR_TGID,
    TASKSTATS_CMD_GET, TASKSTATS_VERSION,
};

/// What a single accounting request asks the kernel about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    /// A single task, by thread id.
    Pid(u32),
    /// A whole thread group, by thread group id.
    Tgid(u32),
    /// A cgroup, by an open descriptor on its directory.
    CgroupFd(RawFd),
}

impl QueryTarget {
    fn command(self) -> u8 {
        match self {
            QueryTarget::Pid(_) | QueryTarget::Tgid(_) => TASKSTATS_CMD_GET,
            QueryTarget::CgroupFd(_) => CGROUPSTATS_CMD_GET,
        }
    }

    fn attribute(self) -> Attribute {
        match self {
            QueryTarget::Pid(pid) => Attribute::u32(TASKSTATS_CMD_ATTR_PID, pid),
            QueryTarget::Tgid(tgid) => Attribute::u32(TASKSTATS_CMD_ATTR_TGID, tgid),
            // The kernel reads the descriptor as a u32 attribute.
            QueryTarget::CgroupFd(fd) => Attribute::u32(CGROUPSTATS_CMD_ATTR_FD, fd as u32),
        }
    }
}

/// Builds the generic netlink message for `target`.
///
/// # Errors
///
/// Returns an [`AttrError`] if the attribute cannot be encoded.
pub fn build_request(target: QueryTarget) -> Result<GenlMessage, AttrError> {
    let data = attr::marshal_attributes(&[target.attribute()])?;
    Ok(GenlMessage {
        header: Header {
            command: target.command(),
            version: TASKSTATS_VERSION,
        },
        data,
    })
}
