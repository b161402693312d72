//! Locating cgroup v1 controller hierarchies through `/proc/[pid]/mountinfo`.

mod detect;
mod error;
mod parser;

pub use detect::{
    detect_cgroup_controller_mount_point, detect_validated_cgroup_controller_mount_point,
};
pub use error::{Error, ResolveStep, Result};
pub use parser::{MountInfo, ParseError, parse_mount_info_line};
