use std::io;

use crate::config;
use crate::netlink::{self, AttrError};
use crate::stats::DecodeError;

/// Errors returned by the taskstats client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Transport(#[from] netlink::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[from] AttrError),

    #[error("unexpected number of reply messages, want 1, got {messages}")]
    ProtocolViolation { messages: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no statistics found for the requested target")]
    NotExist,

    #[error("taskstats is not supported on {os}/{arch}")]
    Unsupported {
        os: &'static str,
        arch: &'static str,
    },

    #[error(transparent)]
    Config(#[from] config::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn os_error(&self) -> Option<&io::Error> {
        match self {
            Error::Io(err) => Some(err),
            Error::Transport(err) => err.io_error(),
            _ => None,
        }
    }

    /// Returns true if the requested task or cgroup does not exist.
    ///
    /// This covers an empty reply as well as the kernel rejecting the request
    /// with `ESRCH`.
    pub fn is_not_exist(&self) -> bool {
        match self {
            Error::NotExist => true,
            _ => self
                .os_error()
                .and_then(io::Error::raw_os_error)
                .is_some_and(|errno| errno == libc::ESRCH),
        }
    }

    /// Returns true if the caller lacks the privileges for the request.
    pub fn is_permission_denied(&self) -> bool {
        self.os_error().is_some_and(|err| {
            err.kind() == io::ErrorKind::PermissionDenied
                || err.raw_os_error() == Some(libc::EPERM)
        })
    }

    /// Returns true if taskstats is unavailable on this platform or kernel.
    ///
    /// A kernel without the `TASKSTATS` family answers the lookup with `ENOENT`.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Error::Unsupported { .. } => true,
            Error::Transport(netlink::Error::Kernel(err)) => {
                err.raw_os_error() == Some(libc::ENOENT)
            }
            _ => false,
        }
    }
}

/// Converts a `Result` into an `Option`, logging the error.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_exist() {
        assert!(Error::NotExist.is_not_exist());
        assert!(
            Error::Transport(netlink::Error::Kernel(io::Error::from_raw_os_error(
                libc::ESRCH
            )))
            .is_not_exist()
        );
        assert!(Error::Io(io::Error::from_raw_os_error(libc::ESRCH)).is_not_exist());
        assert!(!Error::ProtocolViolation { messages: 2 }.is_not_exist());
        assert!(
            !Error::Transport(netlink::Error::Kernel(io::Error::from_raw_os_error(
                libc::EINVAL
            )))
            .is_not_exist()
        );
    }

    #[test]
    fn test_permission_denied() {
        let err = Error::Transport(netlink::Error::Kernel(io::Error::from_raw_os_error(
            libc::EPERM,
        )));
        assert!(err.is_permission_denied());
        assert!(Error::Io(io::Error::from_raw_os_error(libc::EACCES)).is_permission_denied());
        assert!(!Error::NotExist.is_permission_denied());
    }

    #[test]
    fn test_unsupported() {
        let err = Error::Unsupported {
            os: "macos",
            arch: "aarch64",
        };
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "taskstats is not supported on macos/aarch64");

        let missing_family = Error::Transport(netlink::Error::Kernel(
            io::Error::from_raw_os_error(libc::ENOENT),
        ));
        assert!(missing_family.is_unsupported());
        assert!(!Error::NotExist.is_unsupported());
    }

    #[test]
    fn test_ok_log() {
        let ok: std::result::Result<u32, Error> = Ok(3);
        assert_eq!(ok.ok_log(), Some(3));
        let err: std::result::Result<u32, Error> = Err(Error::NotExist);
        assert_eq!(err.ok_log(), None);
    }
}
