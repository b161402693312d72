//! Field-by-field decoding of the raw kernel structures.
//!
//! Payload bytes are never reinterpreted as an in-memory struct. Each field is
//! read from its documented offset in native byte order, after the payload
//! length has been matched against the layout registry.

use super::abi::TS_COMM_LEN;
use super::error::DecodeError;
use super::layout::{StructKind, TaskstatsVersion};

/// Byte offsets of `struct taskstats` fields. Members declared
/// `__attribute__((aligned(8)))` in the kernel header account for the gaps.
pub(crate) mod offset {
    pub const VERSION: usize = 0;
    pub const AC_EXITCODE: usize = 4;
    pub const AC_FLAG: usize = 8;
    pub const AC_NICE: usize = 9;
    pub const CPU_COUNT: usize = 16;
    pub const CPU_DELAY_TOTAL: usize = 24;
    pub const BLKIO_COUNT: usize = 32;
    pub const BLKIO_DELAY_TOTAL: usize = 40;
    pub const SWAPIN_COUNT: usize = 48;
    pub const SWAPIN_DELAY_TOTAL: usize = 56;
    pub const CPU_RUN_REAL_TOTAL: usize = 64;
    pub const CPU_RUN_VIRTUAL_TOTAL: usize = 72;
    pub const AC_COMM: usize = 80;
    pub const AC_SCHED: usize = 112;
    pub const AC_UID: usize = 120;
    pub const AC_GID: usize = 124;
    pub const AC_PID: usize = 128;
    pub const AC_PPID: usize = 132;
    pub const AC_BTIME: usize = 136;
    pub const AC_ETIME: usize = 144;
    pub const AC_UTIME: usize = 152;
    pub const AC_STIME: usize = 160;
    pub const AC_MINFLT: usize = 168;
    pub const AC_MAJFLT: usize = 176;
    pub const COREMEM: usize = 184;
    pub const VIRTMEM: usize = 192;
    pub const HIWATER_RSS: usize = 200;
    pub const HIWATER_VM: usize = 208;
    pub const READ_CHAR: usize = 216;
    pub const WRITE_CHAR: usize = 224;
    pub const READ_SYSCALLS: usize = 232;
    pub const WRITE_SYSCALLS: usize = 240;
    pub const READ_BYTES: usize = 248;
    pub const WRITE_BYTES: usize = 256;
    pub const CANCELLED_WRITE_BYTES: usize = 264;
    pub const NVCSW: usize = 272;
    pub const NIVCSW: usize = 280;
    pub const AC_UTIMESCALED: usize = 288;
    pub const AC_STIMESCALED: usize = 296;
    pub const CPU_SCALED_RUN_REAL_TOTAL: usize = 304;
    pub const FREEPAGES_COUNT: usize = 312;
    pub const FREEPAGES_DELAY_TOTAL: usize = 320;
    // v9
    pub const THRASHING_COUNT: usize = 328;
    pub const THRASHING_DELAY_TOTAL: usize = 336;
    // v10
    pub const AC_BTIME64: usize = 344;
    // v11
    pub const COMPACT_COUNT: usize = 352;
    pub const COMPACT_DELAY_TOTAL: usize = 360;
    // v12
    pub const AC_TGID: usize = 368;
    pub const AC_TGETIME: usize = 376;
    pub const AC_EXE_DEV: usize = 384;
    pub const AC_EXE_INODE: usize = 392;
    // v13
    pub const WPCOPY_COUNT: usize = 400;
    pub const WPCOPY_DELAY_TOTAL: usize = 408;
    // v14
    pub const IRQ_COUNT: usize = 416;
    pub const IRQ_DELAY_TOTAL: usize = 424;
    // v16, each maximum followed by the matching minimum
    pub const CPU_DELAY_MAX: usize = 432;
    pub const BLKIO_DELAY_MAX: usize = 448;
    pub const SWAPIN_DELAY_MAX: usize = 464;
    pub const FREEPAGES_DELAY_MAX: usize = 480;
    pub const THRASHING_DELAY_MAX: usize = 496;
    pub const COMPACT_DELAY_MAX: usize = 512;
    pub const WPCOPY_DELAY_MAX: usize = 528;
    pub const IRQ_DELAY_MAX: usize = 544;
    pub const DELAY_MIN_AFTER_MAX: usize = 8;
}

/// Byte offsets of `struct cgroupstats` fields.
mod cgroup_offset {
    pub const NR_SLEEPING: usize = 0;
    pub const NR_RUNNING: usize = 8;
    pub const NR_STOPPED: usize = 16;
    pub const NR_UNINTERRUPTIBLE: usize = 24;
    pub const NR_IO_WAIT: usize = 32;
}

/// Bounds-checked native-endian reads over a payload.
struct Fields<'a> {
    data: &'a [u8],
    kind: StructKind,
}

impl Fields<'_> {
    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        self.data
            .get(offset..offset + N)
            .and_then(|b| b.try_into().ok())
            .ok_or(DecodeError::Truncated {
                kind: self.kind,
                offset,
                width: N,
                available: self.data.len(),
            })
    }

    fn u8(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(offset)?[0])
    }

    fn u16(&self, offset: usize) -> Result<u16, DecodeError> {
        self.array(offset).map(u16::from_ne_bytes)
    }

    fn u32(&self, offset: usize) -> Result<u32, DecodeError> {
        self.array(offset).map(u32::from_ne_bytes)
    }

    fn u64(&self, offset: usize) -> Result<u64, DecodeError> {
        self.array(offset).map(u64::from_ne_bytes)
    }

    /// Reads a delay group; `extremes` is the offset of its maximum, if the
    /// layout carries one.
    fn delay(
        &self,
        count: usize,
        total: usize,
        extremes: Option<usize>,
    ) -> Result<RawDelay, DecodeError> {
        let extremes = match extremes {
            Some(max) => Some(RawDelayExtremes {
                max_ns: self.u64(max)?,
                min_ns: self.u64(max + offset::DELAY_MIN_AFTER_MAX)?,
            }),
            None => None,
        };
        Ok(RawDelay {
            count: self.u64(count)?,
            total_ns: self.u64(total)?,
            extremes,
        })
    }
}

/// A delay-accounting group: number of delays and their sum in nanoseconds,
/// plus the longest and shortest single delay from version 16 on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawDelay {
    pub count: u64,
    pub total_ns: u64,
    pub extremes: Option<RawDelayExtremes>,
}

/// Longest and shortest recorded delay, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawDelayExtremes {
    pub max_ns: u64,
    pub min_ns: u64,
}

/// Thread group fields added in taskstats version 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawThreadGroup {
    pub tgid: u32,
    pub elapsed_us: u64,
    pub exe_dev: u64,
    pub exe_inode: u64,
}

/// A decoded `struct taskstats`.
///
/// Fields appended after version 8 are `Some` only when the matched layout
/// carries them. Units follow the kernel header: times in microseconds, delay
/// totals in nanoseconds, begin time in seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTaskstats {
    pub layout: TaskstatsVersion,
    pub version: u16,
    pub ac_exitcode: u32,
    pub ac_flag: u8,
    pub ac_nice: u8,
    pub cpu: RawDelay,
    pub blkio: RawDelay,
    pub swapin: RawDelay,
    pub cpu_run_real_total: u64,
    pub cpu_run_virtual_total: u64,
    pub ac_comm: [u8; TS_COMM_LEN],
    pub ac_sched: u8,
    pub ac_uid: u32,
    pub ac_gid: u32,
    pub ac_pid: u32,
    pub ac_ppid: u32,
    pub ac_btime: u32,
    pub ac_etime: u64,
    pub ac_utime: u64,
    pub ac_stime: u64,
    pub ac_minflt: u64,
    pub ac_majflt: u64,
    pub coremem: u64,
    pub virtmem: u64,
    pub hiwater_rss: u64,
    pub hiwater_vm: u64,
    pub read_char: u64,
    pub write_char: u64,
    pub read_syscalls: u64,
    pub write_syscalls: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub cancelled_write_bytes: u64,
    pub nvcsw: u64,
    pub nivcsw: u64,
    pub ac_utimescaled: u64,
    pub ac_stimescaled: u64,
    pub cpu_scaled_run_real_total: u64,
    pub freepages: RawDelay,
    pub thrashing: Option<RawDelay>,
    pub ac_btime64: Option<u64>,
    pub compact: Option<RawDelay>,
    pub thread_group: Option<RawThreadGroup>,
    pub wpcopy: Option<RawDelay>,
    pub irq: Option<RawDelay>,
}

impl RawTaskstats {
    /// Decodes a `struct taskstats` payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::SizeMismatch`] if the payload length is not a
    /// known layout size, or [`DecodeError::VersionMismatch`] if the version
    /// field predates the layout matched by size.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let layout = TaskstatsVersion::from_size(data.len()).ok_or(DecodeError::SizeMismatch {
            kind: StructKind::Taskstats,
            expected: StructKind::Taskstats.known_sizes(),
            actual: data.len(),
        })?;
        let f = Fields {
            data,
            kind: StructKind::Taskstats,
        };
        use offset::*;

        let version = f.u16(VERSION)?;
        if version < layout.number() {
            return Err(DecodeError::VersionMismatch {
                layout,
                version,
                size: data.len(),
            });
        }
        let extremes = |max: usize| (layout >= TaskstatsVersion::V16).then_some(max);

        Ok(Self {
            layout,
            version,
            ac_exitcode: f.u32(AC_EXITCODE)?,
            ac_flag: f.u8(AC_FLAG)?,
            ac_nice: f.u8(AC_NICE)?,
            cpu: f.delay(CPU_COUNT, CPU_DELAY_TOTAL, extremes(CPU_DELAY_MAX))?,
            blkio: f.delay(BLKIO_COUNT, BLKIO_DELAY_TOTAL, extremes(BLKIO_DELAY_MAX))?,
            swapin: f.delay(SWAPIN_COUNT, SWAPIN_DELAY_TOTAL, extremes(SWAPIN_DELAY_MAX))?,
            cpu_run_real_total: f.u64(CPU_RUN_REAL_TOTAL)?,
            cpu_run_virtual_total: f.u64(CPU_RUN_VIRTUAL_TOTAL)?,
            ac_comm: f.array(AC_COMM)?,
            ac_sched: f.u8(AC_SCHED)?,
            ac_uid: f.u32(AC_UID)?,
            ac_gid: f.u32(AC_GID)?,
            ac_pid: f.u32(AC_PID)?,
            ac_ppid: f.u32(AC_PPID)?,
            ac_btime: f.u32(AC_BTIME)?,
            ac_etime: f.u64(AC_ETIME)?,
            ac_utime: f.u64(AC_UTIME)?,
            ac_stime: f.u64(AC_STIME)?,
            ac_minflt: f.u64(AC_MINFLT)?,
            ac_majflt: f.u64(AC_MAJFLT)?,
            coremem: f.u64(COREMEM)?,
            virtmem: f.u64(VIRTMEM)?,
            hiwater_rss: f.u64(HIWATER_RSS)?,
            hiwater_vm: f.u64(HIWATER_VM)?,
            read_char: f.u64(READ_CHAR)?,
            write_char: f.u64(WRITE_CHAR)?,
            read_syscalls: f.u64(READ_SYSCALLS)?,
            write_syscalls: f.u64(WRITE_SYSCALLS)?,
            read_bytes: f.u64(READ_BYTES)?,
            write_bytes: f.u64(WRITE_BYTES)?,
            cancelled_write_bytes: f.u64(CANCELLED_WRITE_BYTES)?,
            nvcsw: f.u64(NVCSW)?,
            nivcsw: f.u64(NIVCSW)?,
            ac_utimescaled: f.u64(AC_UTIMESCALED)?,
            ac_stimescaled: f.u64(AC_STIMESCALED)?,
            cpu_scaled_run_real_total: f.u64(CPU_SCALED_RUN_REAL_TOTAL)?,
            freepages: f.delay(
                FREEPAGES_COUNT,
                FREEPAGES_DELAY_TOTAL,
                extremes(FREEPAGES_DELAY_MAX),
            )?,
            thrashing: since(layout, TaskstatsVersion::V9, || {
                f.delay(
                    THRASHING_COUNT,
                    THRASHING_DELAY_TOTAL,
                    extremes(THRASHING_DELAY_MAX),
                )
            })?,
            ac_btime64: since(layout, TaskstatsVersion::V10, || f.u64(AC_BTIME64))?,
            compact: since(layout, TaskstatsVersion::V11, || {
                f.delay(
                    COMPACT_COUNT,
                    COMPACT_DELAY_TOTAL,
                    extremes(COMPACT_DELAY_MAX),
                )
            })?,
            thread_group: since(layout, TaskstatsVersion::V12, || {
                Ok(RawThreadGroup {
                    tgid: f.u32(AC_TGID)?,
                    elapsed_us: f.u64(AC_TGETIME)?,
                    exe_dev: f.u64(AC_EXE_DEV)?,
                    exe_inode: f.u64(AC_EXE_INODE)?,
                })
            })?,
            wpcopy: since(layout, TaskstatsVersion::V13, || {
                f.delay(WPCOPY_COUNT, WPCOPY_DELAY_TOTAL, extremes(WPCOPY_DELAY_MAX))
            })?,
            irq: since(layout, TaskstatsVersion::V14, || {
                f.delay(IRQ_COUNT, IRQ_DELAY_TOTAL, extremes(IRQ_DELAY_MAX))
            })?,
        })
    }
}

/// Reads a field group only if `layout` is at least `introduced`.
fn since<T>(
    layout: TaskstatsVersion,
    introduced: TaskstatsVersion,
    read: impl FnOnce() -> Result<T, DecodeError>,
) -> Result<Option<T>, DecodeError> {
    if layout >= introduced {
        read().map(Some)
    } else {
        Ok(None)
    }
}

/// A decoded `struct cgroupstats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawCgroupStats {
    pub nr_sleeping: u64,
    pub nr_running: u64,
    pub nr_stopped: u64,
    pub nr_uninterruptible: u64,
    pub nr_io_wait: u64,
}

impl RawCgroupStats {
    /// Decodes a `struct cgroupstats` payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::SizeMismatch`] if the payload is not exactly the
    /// structure size.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let kind = StructKind::CgroupStats;
        if !kind.accepts(data.len()) {
            return Err(DecodeError::SizeMismatch {
                kind,
                expected: kind.known_sizes(),
                actual: data.len(),
            });
        }
        let f = Fields { data, kind };
        use cgroup_offset::*;

        Ok(Self {
            nr_sleeping: f.u64(NR_SLEEPING)?,
            nr_running: f.u64(NR_RUNNING)?,
            nr_stopped: f.u64(NR_STOPPED)?,
            nr_uninterruptible: f.u64(NR_UNINTERRUPTIBLE)?,
            nr_io_wait: f.u64(NR_IO_WAIT)?,
        })
    }
}
