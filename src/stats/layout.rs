//! Known byte sizes of the kernel accounting structures.
//!
//! The kernel grows `struct taskstats` by appending fields and bumping
//! `TASKSTATS_VERSION`. Every version is a complete, valid structure of its own
//! length, so a payload is accepted when its length is one of the sizes below
//! and rejected otherwise. `struct cgroupstats` has a single layout.
//!
//! Version 15 interleaved the delay extremes with the delay totals at the same
//! total size as version 16, which moved them to the end. Only the version 16
//! arrangement is known for 560-byte payloads.

use std::fmt;

use serde::Serialize;

/// A `struct taskstats` layout, identified by the version that introduced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TaskstatsVersion {
    /// Base layout up to the free-pages delay.
    V8,
    /// Adds the thrashing delay.
    V9,
    /// Adds the 64-bit begin time.
    V10,
    /// Adds the compaction delay.
    V11,
    /// Adds thread group id, thread group elapsed time and executable identity.
    V12,
    /// Adds the write-protect copy delay.
    V13,
    /// Adds the IRQ/softirq delay.
    V14,
    /// Adds the maximum and minimum of every delay category.
    V16,
}

static TASKSTATS_LAYOUTS: [(usize, TaskstatsVersion); 8] = [
    (328, TaskstatsVersion::V8),
    (344, TaskstatsVersion::V9),
    (352, TaskstatsVersion::V10),
    (368, TaskstatsVersion::V11),
    (400, TaskstatsVersion::V12),
    (416, TaskstatsVersion::V13),
    (432, TaskstatsVersion::V14),
    (560, TaskstatsVersion::V16),
];

static TASKSTATS_SIZES: [usize; 8] = [328, 344, 352, 368, 400, 416, 432, 560];

static CGROUPSTATS_SIZES: [usize; 1] = [40];

impl TaskstatsVersion {
    /// Looks up the layout whose size is exactly `len` bytes.
    pub fn from_size(len: usize) -> Option<Self> {
        TASKSTATS_LAYOUTS
            .iter()
            .find(|(size, _)| *size == len)
            .map(|(_, version)| *version)
    }

    /// Size in bytes of this layout.
    pub fn size(self) -> usize {
        TASKSTATS_LAYOUTS
            .iter()
            .find(|(_, version)| *version == self)
            .map(|(size, _)| *size)
            .unwrap_or(TASKSTATS_SIZES[0])
    }

    /// The `TASKSTATS_VERSION` that introduced this layout.
    pub fn number(self) -> u16 {
        match self {
            TaskstatsVersion::V8 => 8,
            TaskstatsVersion::V9 => 9,
            TaskstatsVersion::V10 => 10,
            TaskstatsVersion::V11 => 11,
            TaskstatsVersion::V12 => 12,
            TaskstatsVersion::V13 => 13,
            TaskstatsVersion::V14 => 14,
            TaskstatsVersion::V16 => 16,
        }
    }

    /// Every known layout, oldest first.
    pub fn all() -> impl Iterator<Item = Self> {
        TASKSTATS_LAYOUTS.iter().map(|(_, version)| *version)
    }
}

impl fmt::Display for TaskstatsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// The raw kernel structures this crate decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Taskstats,
    CgroupStats,
}

impl StructKind {
    /// Every byte length accepted for this structure.
    pub fn known_sizes(self) -> &'static [usize] {
        match self {
            StructKind::Taskstats => &TASKSTATS_SIZES,
            StructKind::CgroupStats => &CGROUPSTATS_SIZES,
        }
    }

    /// Returns true if `len` is one of [`StructKind::known_sizes`].
    pub fn accepts(self, len: usize) -> bool {
        self.known_sizes().contains(&len)
    }
}

impl fmt::Display for StructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructKind::Taskstats => f.write_str("taskstats"),
            StructKind::CgroupStats => f.write_str("cgroupstats"),
        }
    }
}
