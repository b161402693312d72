use std::io;

use netlink_packet_utils::DecodeError;

use super::attr::AttrError;

/// Errors raised by the generic netlink transport.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("netlink `{op}` failed: {source}")]
    Socket {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("netlink request rejected by the kernel: {0}")]
    Kernel(#[source] io::Error),

    #[error("netlink error reply carries code {code}, which is not an errno")]
    InvalidErrorCode { code: i32 },

    #[error("malformed netlink message: {0}")]
    Frame(#[from] DecodeError),

    #[error("malformed netlink attributes: {0}")]
    Attr(#[from] AttrError),

    #[error("generic netlink family `{name}` reply did not carry a family id")]
    MissingFamilyId { name: String },
}

impl Error {
    /// Returns the underlying OS error, if this error came from a syscall or the kernel.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Error::Socket { source, .. } => Some(source),
            Error::Kernel(source) => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
