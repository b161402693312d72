use crate::netlink::AttrError;

use super::layout::{StructKind, TaskstatsVersion};

/// Errors raised while decoding a taskstats or cgroupstats reply.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed reply attributes: {0}")]
    Malformed(#[source] AttrError),

    #[error("unexpected {kind} structure size, want one of {expected:?}, got {actual}")]
    SizeMismatch {
        kind: StructKind,
        expected: &'static [usize],
        actual: usize,
    },

    #[error("{kind} field at offset {offset} ({width} bytes) runs past the {available}-byte payload")]
    Truncated {
        kind: StructKind,
        offset: usize,
        width: usize,
        available: usize,
    },

    #[error("taskstats payload of {size} bytes reports version {version}, older than its {layout} layout")]
    VersionMismatch {
        layout: TaskstatsVersion,
        version: u16,
        size: usize,
    },
}
