use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::fsutil::FileOpenError;

use super::parser::ParseError;

/// The filesystem call that failed while validating a mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStep {
    Canonicalize,
    Metadata,
}

impl fmt::Display for ResolveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveStep::Canonicalize => f.write_str("canonicalize"),
            ResolveStep::Metadata => f.write_str("stat"),
        }
    }
}

/// Errors raised while locating a cgroup v1 controller hierarchy.
///
/// Line numbers are 1-based and refer to the mountinfo file being scanned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Open(#[from] FileOpenError),

    #[error("reading line {line} of `{path}` failed: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("line {line} of `{path}` is not a mountinfo entry: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("`{path}` lists no cgroup v1 hierarchy carrying the `{controller}` controller")]
    NoController { controller: String, path: PathBuf },

    #[error("cannot {step} cgroup mount point `{path}`: {source}")]
    Resolve {
        path: PathBuf,
        step: ResolveStep,
        #[source]
        source: io::Error,
    },

    #[error("cgroup mount point `{path}` is not a directory")]
    NotADirectory { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
