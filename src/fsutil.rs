use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use taskstats::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/mountinfo")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Opens a cgroup directory read-only, for handing its descriptor to the kernel.
///
/// The descriptor is closed when the returned [`File`] is dropped.
///
/// # Errors
///
/// Returns the [`io::Error`] of the underlying `open` unchanged.
pub fn open_cgroup(path: impl AsRef<Path>) -> io::Result<File> {
    let path = path.as_ref();
    let file = File::open(path)?;
    log::trace!("Opened cgroup `{}`", path.display());
    Ok(file)
}
