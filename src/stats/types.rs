//! Public accounting values and their conversion from the raw kernel structures.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::layout::TaskstatsVersion;
use super::raw::{RawCgroupStats, RawDelay, RawTaskstats};

/// Number of delays of one kind and the total time spent in them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Delay {
    pub count: u64,
    pub total: Duration,
    /// Longest single delay, reported by version 16 layouts or later.
    pub max: Option<Duration>,
    /// Shortest single delay, reported by version 16 layouts or later.
    pub min: Option<Duration>,
}

impl From<RawDelay> for Delay {
    fn from(raw: RawDelay) -> Self {
        Self {
            count: raw.count,
            total: Duration::from_nanos(raw.total_ns),
            max: raw.extremes.map(|e| Duration::from_nanos(e.max_ns)),
            min: raw.extremes.map(|e| Duration::from_nanos(e.min_ns)),
        }
    }
}

/// Storage I/O performed by the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IoAccounting {
    /// Bytes passed through `read`-like syscalls.
    pub read_chars: u64,
    /// Bytes passed through `write`-like syscalls.
    pub write_chars: u64,
    pub read_syscalls: u64,
    pub write_syscalls: u64,
    /// Bytes fetched from the storage layer.
    pub read_bytes: u64,
    /// Bytes sent to the storage layer.
    pub write_bytes: u64,
    /// Bytes whose write-out was cancelled by truncation.
    pub cancelled_write_bytes: u64,
}

/// Extended memory accounting, in the kernel's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryAccounting {
    /// Accumulated RSS usage in MB-usec.
    pub coremem: u64,
    /// Accumulated virtual memory usage in MB-usec.
    pub virtmem: u64,
    /// High-water RSS usage in KiB.
    pub hiwater_rss: u64,
    /// High-water virtual memory usage in KiB.
    pub hiwater_vm: u64,
}

/// Accounting statistics of a task or thread group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Layout of the structure the kernel replied with.
    pub version: TaskstatsVersion,
    pub pid: u32,
    pub ppid: u32,
    /// Thread group id, reported by kernels with version 12 layouts or later.
    pub tgid: Option<u32>,
    pub uid: u32,
    pub gid: u32,
    /// Command name, at most 32 bytes.
    pub command: String,
    pub exit_code: u32,
    pub nice: i8,

    pub begin_time: SystemTime,
    pub elapsed_time: Duration,
    pub user_cpu_time: Duration,
    pub system_cpu_time: Duration,

    pub minor_page_faults: u64,
    pub major_page_faults: u64,

    pub cpu_delay: Delay,
    pub block_io_delay: Delay,
    pub swap_in_delay: Delay,
    pub free_pages_delay: Delay,
    pub thrashing_delay: Option<Delay>,
    pub compaction_delay: Option<Delay>,
    pub write_protect_copy_delay: Option<Delay>,
    pub irq_delay: Option<Delay>,

    pub voluntary_context_switches: u64,
    pub involuntary_context_switches: u64,

    pub io: IoAccounting,
    pub memory: MemoryAccounting,
}

impl From<RawTaskstats> for Stats {
    fn from(raw: RawTaskstats) -> Self {
        let begin_secs = raw.ac_btime64.unwrap_or(u64::from(raw.ac_btime));

        Self {
            version: raw.layout,
            pid: raw.ac_pid,
            ppid: raw.ac_ppid,
            tgid: raw.thread_group.map(|tg| tg.tgid),
            uid: raw.ac_uid,
            gid: raw.ac_gid,
            command: command_name(&raw.ac_comm),
            exit_code: raw.ac_exitcode,
            nice: raw.ac_nice as i8,

            begin_time: begin_time(begin_secs),
            elapsed_time: Duration::from_micros(raw.ac_etime),
            user_cpu_time: Duration::from_micros(raw.ac_utime),
            system_cpu_time: Duration::from_micros(raw.ac_stime),

            minor_page_faults: raw.ac_minflt,
            major_page_faults: raw.ac_majflt,

            cpu_delay: raw.cpu.into(),
            block_io_delay: raw.blkio.into(),
            swap_in_delay: raw.swapin.into(),
            free_pages_delay: raw.freepages.into(),
            thrashing_delay: raw.thrashing.map(Delay::from),
            compaction_delay: raw.compact.map(Delay::from),
            write_protect_copy_delay: raw.wpcopy.map(Delay::from),
            irq_delay: raw.irq.map(Delay::from),

            voluntary_context_switches: raw.nvcsw,
            involuntary_context_switches: raw.nivcsw,

            io: IoAccounting {
                read_chars: raw.read_char,
                write_chars: raw.write_char,
                read_syscalls: raw.read_syscalls,
                write_syscalls: raw.write_syscalls,
                read_bytes: raw.read_bytes,
                write_bytes: raw.write_bytes,
                cancelled_write_bytes: raw.cancelled_write_bytes,
            },
            memory: MemoryAccounting {
                coremem: raw.coremem,
                virtmem: raw.virtmem,
                hiwater_rss: raw.hiwater_rss,
                hiwater_vm: raw.hiwater_vm,
            },
        }
    }
}

/// Begin times past what `SystemTime` can represent saturate at the latest
/// second a signed 64-bit clock holds.
fn begin_time(secs: u64) -> SystemTime {
    UNIX_EPOCH
        .checked_add(Duration::from_secs(secs))
        .or_else(|| UNIX_EPOCH.checked_add(Duration::from_secs(i64::MAX as u64)))
        .unwrap_or(UNIX_EPOCH)
}

fn command_name(comm: &[u8]) -> String {
    let end = comm.iter().position(|&b| b == 0).unwrap_or(comm.len());
    String::from_utf8_lossy(&comm[..end]).into_owned()
}

/// Task state counts of a cgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CgroupStats {
    pub sleeping: u64,
    pub running: u64,
    pub stopped: u64,
    pub uninterruptible: u64,
    pub io_wait: u64,
}

impl From<RawCgroupStats> for CgroupStats {
    fn from(raw: RawCgroupStats) -> Self {
        Self {
            sleeping: raw.nr_sleeping,
            running: raw.nr_running,
            stopped: raw.nr_stopped,
            uninterruptible: raw.nr_uninterruptible,
            io_wait: raw.nr_io_wait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::raw::testing::{TaskstatsBuilder, offset};

    #[test]
    fn test_begin_time_uses_32_bit_field_before_v10() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V9)
            .u32(offset::AC_BTIME, 1_600_000_000)
            .build();
        let stats = Stats::from(RawTaskstats::decode(&data).unwrap());
        assert_eq!(
            stats.begin_time,
            UNIX_EPOCH + Duration::from_secs(1_600_000_000)
        );
    }

    #[test]
    fn test_begin_time_prefers_64_bit_field() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V10)
            .u32(offset::AC_BTIME, 1)
            .u64(offset::AC_BTIME64, 5_000_000_000)
            .build();
        let stats = Stats::from(RawTaskstats::decode(&data).unwrap());
        assert_eq!(
            stats.begin_time,
            UNIX_EPOCH + Duration::from_secs(5_000_000_000)
        );
    }

    #[test]
    fn test_time_units() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V8)
            .u64(offset::AC_ETIME, 1_500_000)
            .u64(offset::AC_UTIME, 250)
            .u64(offset::AC_STIME, 1)
            .u64(offset::BLKIO_COUNT, 4)
            .u64(offset::BLKIO_DELAY_TOTAL, 1_000_000_001)
            .build();
        let stats = Stats::from(RawTaskstats::decode(&data).unwrap());

        assert_eq!(stats.elapsed_time, Duration::from_millis(1500));
        assert_eq!(stats.user_cpu_time, Duration::from_micros(250));
        assert_eq!(stats.system_cpu_time, Duration::from_micros(1));
        assert_eq!(
            stats.block_io_delay,
            Delay {
                count: 4,
                total: Duration::new(1, 1),
                max: None,
                min: None,
            }
        );
    }

    #[test]
    fn test_begin_time_out_of_range_saturates() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V10)
            .u64(offset::AC_BTIME64, u64::MAX)
            .build();
        let stats = Stats::from(RawTaskstats::decode(&data).unwrap());

        assert!(stats.begin_time > UNIX_EPOCH + Duration::from_secs(u64::from(u32::MAX)));
        assert_eq!(begin_time(u64::MAX), begin_time(u64::MAX - 1));
        assert_eq!(begin_time(0), UNIX_EPOCH);
    }

    #[test]
    fn test_delay_extremes_from_v16() {
        let data = TaskstatsBuilder::new(TaskstatsVersion::V16)
            .u64(offset::BLKIO_COUNT, 2)
            .u64(offset::BLKIO_DELAY_TOTAL, 3_000)
            .u64(offset::BLKIO_DELAY_MAX, 2_000)
            .u64(offset::BLKIO_DELAY_MAX + offset::DELAY_MIN_AFTER_MAX, 1_000)
            .build();
        let stats = Stats::from(RawTaskstats::decode(&data).unwrap());

        assert_eq!(
            stats.block_io_delay,
            Delay {
                count: 2,
                total: Duration::from_micros(3),
                max: Some(Duration::from_micros(2)),
                min: Some(Duration::from_micros(1)),
            }
        );
        assert_eq!(
            stats.irq_delay.and_then(|d| d.max),
            Some(Duration::ZERO)
        );

        let old = Stats::from(
            RawTaskstats::decode(&TaskstatsBuilder::new(TaskstatsVersion::V14).build()).unwrap(),
        );
        assert_eq!(old.block_io_delay.max, None);
        assert_eq!(old.block_io_delay.min, None);
    }

    #[test]
    fn test_optional_fields_follow_layout() {
        let old = Stats::from(
            RawTaskstats::decode(&TaskstatsBuilder::new(TaskstatsVersion::V8).build()).unwrap(),
        );
        assert_eq!(old.tgid, None);
        assert_eq!(old.thrashing_delay, None);
        assert_eq!(old.irq_delay, None);

        let new = Stats::from(
            RawTaskstats::decode(
                &TaskstatsBuilder::new(TaskstatsVersion::V14)
                    .u32(offset::AC_TGID, 10)
                    .build(),
            )
            .unwrap(),
        );
        assert_eq!(new.tgid, Some(10));
        assert_eq!(new.thrashing_delay, Some(Delay::default()));
        assert_eq!(new.irq_delay, Some(Delay::default()));
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name(b"bash\0\0\0"), "bash");
        assert_eq!(command_name(b"full"), "full");
        assert_eq!(command_name(b"\0"), "");
    }

    #[test]
    fn test_cgroup_stats_mapping() {
        let stats = CgroupStats::from(RawCgroupStats {
            nr_sleeping: 10,
            nr_running: 2,
            nr_stopped: 0,
            nr_uninterruptible: 1,
            nr_io_wait: 3,
        });
        assert_eq!(
            stats,
            CgroupStats {
                sleeping: 10,
                running: 2,
                stopped: 0,
                uninterruptible: 1,
                io_wait: 3,
            }
        );
    }
}
