//! Kernel ABI constants from `include/uapi/linux/taskstats.h` and
//! `include/uapi/linux/cgroupstats.h`.

pub const TASKSTATS_GENL_NAME: &str = "TASKSTATS";

/// Version of the accounting protocol sent in every request header.
pub const TASKSTATS_VERSION: u8 = 8;

// Commands.
pub const TASKSTATS_CMD_GET: u8 = 1;
pub const CGROUPSTATS_CMD_GET: u8 = 4;

// Request attributes.
pub const TASKSTATS_CMD_ATTR_PID: u16 = 1;
pub const TASKSTATS_CMD_ATTR_TGID: u16 = 2;
pub const CGROUPSTATS_CMD_ATTR_FD: u16 = 1;

// Reply attributes.
pub const TASKSTATS_TYPE_PID: u16 = 1;
pub const TASKSTATS_TYPE_TGID: u16 = 2;
pub const TASKSTATS_TYPE_STATS: u16 = 3;
pub const TASKSTATS_TYPE_AGGR_PID: u16 = 4;
pub const TASKSTATS_TYPE_AGGR_TGID: u16 = 5;
pub const TASKSTATS_TYPE_NULL: u16 = 6;
pub const CGROUPSTATS_TYPE_CGROUP_STATS: u16 = 1;

/// Length of `ac_comm`.
pub const TS_COMM_LEN: usize = 32;
