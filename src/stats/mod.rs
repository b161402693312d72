//! Taskstats and cgroupstats requests, reply decoding and the public result types.

pub mod abi;
pub mod decode;
mod error;
pub mod layout;
pub mod raw;
pub mod request;
mod types;

pub use error::DecodeError;
pub use layout::{StructKind, TaskstatsVersion};
pub use request::{QueryTarget, build_request};
pub use types::{CgroupStats, Delay, IoAccounting, MemoryAccounting, Stats};
