//! Locates the accounting structure inside a reply and decodes it.
//!
//! A taskstats reply nests the structure one level down:
//!
//! ```text
//! TASKSTATS_TYPE_AGGR_PID | TASKSTATS_TYPE_AGGR_TGID
//! ├── TASKSTATS_TYPE_PID | TASKSTATS_TYPE_TGID   (ignored)
//! └── TASKSTATS_TYPE_STATS                       struct taskstats
//! ```
//!
//! A cgroupstats reply carries `CGROUPSTATS_TYPE_CGROUP_STATS` at the top level.

use crate::error::{Error, Result};
use crate::netlink::{Attribute, GenlMessage, attr};

use super::abi::{CGROUPSTATS_TYPE_CGROUP_STATS, TASKSTATS_TYPE_STATS};
use super::error::DecodeError;
use super::raw::{RawCgroupStats, RawTaskstats};
use super::types::{CgroupStats, Stats};

/// Returns the only message of a reply.
///
/// # Errors
///
/// Returns [`Error::ProtocolViolation`] if the reply holds zero or several messages.
pub fn single_reply(replies: Vec<GenlMessage>) -> Result<GenlMessage> {
    let messages = replies.len();
    let mut replies = replies.into_iter();
    match (replies.next(), replies.next()) {
        (Some(msg), None) => Ok(msg),
        _ => Err(Error::ProtocolViolation { messages }),
    }
}

fn attributes(data: &[u8]) -> Result<Vec<Attribute>> {
    attr::unmarshal_attributes(data)
        .map_err(|err| Error::Decode(DecodeError::Malformed(err)))
}

/// Takes the first attribute of type `kind`, skipping the others.
fn find(attrs: Vec<Attribute>, kind: u16) -> Option<Attribute> {
    attrs.into_iter().find(|a| {
        if a.kind == kind {
            return true;
        }
        log::trace!("Skipping attribute type {} while looking for {kind}", a.kind);
        false
    })
}

/// Decodes the task statistics nested under the `aggregate` attribute.
///
/// # Errors
///
/// Returns [`Error::NotExist`] if the aggregate or the inner stats attribute is
/// absent, or [`Error::Decode`] if the attributes or the structure are malformed.
pub fn parse_task_message(msg: &GenlMessage, aggregate: u16) -> Result<Stats> {
    let outer = find(attributes(&msg.data)?, aggregate).ok_or(Error::NotExist)?;
    let stats = find(attributes(&outer.data)?, TASKSTATS_TYPE_STATS).ok_or(Error::NotExist)?;

    let raw = RawTaskstats::decode(&stats.data)?;
    log::debug!(
        "Decoded taskstats {} layout ({} bytes, kernel version {})",
        raw.layout,
        stats.data.len(),
        raw.version
    );
    Ok(raw.into())
}

/// Decodes the cgroup statistics of a `CGROUPSTATS_CMD_GET` reply.
///
/// # Errors
///
/// Returns [`Error::NotExist`] if the reply carries no cgroup stats, or
/// [`Error::Decode`] if the attributes or the structure are malformed.
pub fn parse_cgroup_message(msg: &GenlMessage) -> Result<CgroupStats> {
    let stats =
        find(attributes(&msg.data)?, CGROUPSTATS_TYPE_CGROUP_STATS).ok_or(Error::NotExist)?;
    Ok(RawCgroupStats::decode(&stats.data)?.into())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::netlink::Header;
    use crate::stats::abi::{TASKSTATS_CMD_GET, TASKSTATS_TYPE_PID, TASKSTATS_VERSION};

    /// A taskstats reply whose aggregate carries a PID and the given payload.
    pub fn task_reply(aggregate: u16, id: u32, payload: Vec<u8>) -> GenlMessage {
        let nested = Attribute::nested(
            aggregate,
            &[
                Attribute::u32(TASKSTATS_TYPE_PID, id),
                Attribute::new(TASKSTATS_TYPE_STATS, payload),
            ],
        )
        .unwrap();
        reply(vec![nested])
    }

    pub fn reply(attrs: Vec<Attribute>) -> GenlMessage {
        GenlMessage {
            header: Header {
                command: TASKSTATS_CMD_GET,
                version: TASKSTATS_VERSION,
            },
            data: attr::marshal_attributes(&attrs).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::testing::*;
    use super::*;
    use crate::netlink::AttrError;
    use crate::stats::abi::{TASKSTATS_TYPE_AGGR_PID, TASKSTATS_TYPE_AGGR_TGID, TASKSTATS_TYPE_NULL};
    use crate::stats::layout::{StructKind, TaskstatsVersion};
    use crate::stats::raw::testing::{TaskstatsBuilder, cgroupstats_bytes, offset};
    use crate::stats::types::Delay;

    #[test]
    fn test_single_reply() {
        let msg = reply(Vec::new());
        assert_eq!(single_reply(vec![msg.clone()]).unwrap(), msg);

        let err = single_reply(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation { messages: 0 }));

        let err = single_reply(vec![msg.clone(), msg]).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation { messages: 2 }));
        assert!(!err.is_not_exist());
    }

    #[test]
    fn test_no_attributes_is_not_exist() {
        let err = parse_task_message(&reply(Vec::new()), TASKSTATS_TYPE_AGGR_PID).unwrap_err();
        assert!(err.is_not_exist());
    }

    #[test]
    fn test_only_null_attribute_is_not_exist() {
        let msg = reply(vec![Attribute::new(TASKSTATS_TYPE_NULL, Vec::new())]);
        let err = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID).unwrap_err();
        assert!(matches!(err, Error::NotExist));
    }

    #[test]
    fn test_wrong_aggregate_is_not_exist() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V8).build();
        let msg = task_reply(TASKSTATS_TYPE_AGGR_TGID, 1, data);
        let err = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID).unwrap_err();
        assert!(matches!(err, Error::NotExist));
    }

    #[test]
    fn test_missing_inner_stats_is_not_exist() {
        let nested = Attribute::nested(
            TASKSTATS_TYPE_AGGR_PID,
            &[Attribute::u32(crate::stats::abi::TASKSTATS_TYPE_PID, 1)],
        )
        .unwrap();
        let err = parse_task_message(&reply(vec![nested]), TASKSTATS_TYPE_AGGR_PID).unwrap_err();
        assert!(matches!(err, Error::NotExist));
    }

    #[test]
    fn test_size_mismatch() {
        let msg = task_reply(TASKSTATS_TYPE_AGGR_PID, 1, vec![0]);
        let err = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID).unwrap_err();
        match err {
            Error::Decode(DecodeError::SizeMismatch {
                kind,
                expected,
                actual,
            }) => {
                assert_eq!(kind, StructKind::Taskstats);
                assert_eq!(expected, StructKind::Taskstats.known_sizes());
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_attributes() {
        let msg = GenlMessage {
            data: vec![0xff, 0x00, 0x04],
            ..reply(Vec::new())
        };
        let err = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::Malformed(AttrError::Malformed(_)))
        ));
    }

    #[test]
    fn test_every_layout_decodes() {
        for layout in TaskstatsVersion::all() {
            let data = TaskstatsBuilder::new(layout)
                .u32(offset::AC_PID, 7)
                .build();
            let msg = task_reply(TASKSTATS_TYPE_AGGR_PID, 7, data);
            let stats = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID).unwrap();
            assert_eq!(stats.version, layout);
            assert_eq!(stats.pid, 7);
        }
    }

    #[test]
    fn test_skips_unknown_attributes() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V8)
            .u32(offset::AC_PID, 3)
            .build();
        let nested = Attribute::nested(
            TASKSTATS_TYPE_AGGR_TGID,
            &[
                Attribute::new(99, vec![1_u8, 2, 3]),
                Attribute::new(TASKSTATS_TYPE_STATS, data),
            ],
        )
        .unwrap();
        let msg = reply(vec![Attribute::new(TASKSTATS_TYPE_NULL, Vec::new()), nested]);

        let stats = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_TGID).unwrap();
        assert_eq!(stats.pid, 3);
    }

    #[test]
    fn test_round_trip_exact() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V8)
            .u16(offset::VERSION, 8)
            .u32(offset::AC_BTIME, 1_700_000_123)
            .u64(offset::AC_ETIME, 2_000_001)
            .u64(offset::AC_UTIME, 999_999)
            .u64(offset::AC_STIME, 3)
            .u64(offset::AC_MINFLT, 1234)
            .u64(offset::AC_MAJFLT, 5)
            .u64(offset::CPU_COUNT, 10)
            .u64(offset::CPU_DELAY_TOTAL, 1_000)
            .u64(offset::BLKIO_COUNT, 20)
            .u64(offset::BLKIO_DELAY_TOTAL, 2_000_000_000)
            .u64(offset::SWAPIN_COUNT, 30)
            .u64(offset::SWAPIN_DELAY_TOTAL, 1)
            .u64(offset::FREEPAGES_COUNT, 40)
            .u64(offset::FREEPAGES_DELAY_TOTAL, 123_456_789)
            .build();
        let msg = task_reply(TASKSTATS_TYPE_AGGR_PID, 1, data);

        let stats = parse_task_message(&msg, TASKSTATS_TYPE_AGGR_PID).unwrap();
        assert_eq!(
            stats.begin_time,
            UNIX_EPOCH + Duration::from_secs(1_700_000_123)
        );
        assert_eq!(stats.elapsed_time, Duration::new(2, 1_000));
        assert_eq!(stats.user_cpu_time, Duration::from_micros(999_999));
        assert_eq!(stats.system_cpu_time, Duration::from_micros(3));
        assert_eq!(stats.minor_page_faults, 1234);
        assert_eq!(stats.major_page_faults, 5);
        assert_eq!(
            stats.cpu_delay,
            Delay {
                count: 10,
                total: Duration::from_micros(1),
                ..Delay::default()
            }
        );
        assert_eq!(
            stats.block_io_delay,
            Delay {
                count: 20,
                total: Duration::from_secs(2),
                ..Delay::default()
            }
        );
        assert_eq!(
            stats.swap_in_delay,
            Delay {
                count: 30,
                total: Duration::from_nanos(1),
                ..Delay::default()
            }
        );
        assert_eq!(
            stats.free_pages_delay,
            Delay {
                count: 40,
                total: Duration::new(0, 123_456_789),
                ..Delay::default()
            }
        );
    }

    #[test]
    fn test_cgroup_message() {
        let msg = reply(vec![Attribute::new(
            CGROUPSTATS_TYPE_CGROUP_STATS,
            cgroupstats_bytes([4, 1, 0, 2, 3]),
        )]);
        let stats = parse_cgroup_message(&msg).unwrap();
        assert_eq!(stats.sleeping, 4);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.uninterruptible, 2);
        assert_eq!(stats.io_wait, 3);
    }

    #[test]
    fn test_cgroup_message_errors() {
        let err = parse_cgroup_message(&reply(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::NotExist));

        let msg = reply(vec![Attribute::new(CGROUPSTATS_TYPE_CGROUP_STATS, vec![0_u8; 8])]);
        let err = parse_cgroup_message(&msg).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::SizeMismatch {
                kind: StructKind::CgroupStats,
                actual: 8,
                ..
            })
        ));
    }
}
