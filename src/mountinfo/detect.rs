use crate::fsutil;

use super::error::ResolveStep;
use super::parser::parse_mount_info_line;
use super::{Error, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Detects the mount point of a cgroup v1 controller and validates it.
///
/// Returns the canonicalized mount point, after checking that it exists and
/// is a directory.
///
/// # Errors
///
/// Returns errors from [`detect_cgroup_controller_mount_point`] and:
///
/// - [`Error::Resolve`] if the path cannot be canonicalized or inspected.
/// - [`Error::NotADirectory`] if the resolved path is not a directory.
///
/// # Example
///
/// ```no_run
/// use taskstats::mountinfo::detect_validated_cgroup_controller_mount_point;
///
/// let cpu = detect_validated_cgroup_controller_mount_point("/proc/self/mountinfo", "cpu").unwrap();
/// println!("cpu controller: {}", cpu.display());
/// ```
pub fn detect_validated_cgroup_controller_mount_point(
    path: impl AsRef<Path>,
    controller: &str,
) -> Result<PathBuf> {
    let raw = detect_cgroup_controller_mount_point(&path, controller)?;
    let canonical = std::fs::canonicalize(&raw).map_err(|source| Error::Resolve {
        path: raw.clone(),
        step: ResolveStep::Canonicalize,
        source,
    })?;

    let metadata = std::fs::metadata(&canonical).map_err(|source| Error::Resolve {
        path: canonical.clone(),
        step: ResolveStep::Metadata,
        source,
    })?;

    if !metadata.is_dir() {
        return Err(Error::NotADirectory { path: canonical });
    }

    Ok(canonical)
}

/// Detects the mount point of a cgroup v1 controller from a `mountinfo` file.
///
/// A line matches when its filesystem type is `cgroup` and `controller` is one
/// of its superblock options. The first match wins.
///
/// # Errors
///
/// - [`Error::Open`] if the file can't be opened.
/// - [`Error::Read`] if reading from the file fails.
/// - [`Error::Parse`] if a line is not a mountinfo entry.
/// - [`Error::NoController`] if no hierarchy carries the controller.
pub fn detect_cgroup_controller_mount_point(
    path: impl AsRef<Path>,
    controller: &str,
) -> Result<PathBuf> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    detect_from_reader(buf, path, controller)
}

fn detect_from_reader<R: BufRead>(reader: R, origin: &Path, controller: &str) -> Result<PathBuf> {
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| Error::Read {
            path: origin.to_path_buf(),
            line: line_no,
            source,
        })?;
        let mount_info = parse_mount_info_line(&line).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            line: line_no,
            source,
        })?;

        if mount_info.is_cgroup_controller(controller) {
            log::debug!(
                "Found cgroup `{controller}` controller mount on line {line_no} with root `{}`: {}",
                mount_info.root,
                mount_info.mount_point
            );
            return Ok(PathBuf::from(mount_info.mount_point));
        }
    }

    Err(Error::NoController {
        controller: controller.to_owned(),
        path: origin.to_path_buf(),
    })
}
