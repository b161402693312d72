//! Mountinfo line parser for Linux systems.
//!
//! Parses lines in `/proc/[pid]/mountinfo` format. See
//! [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for details on the structure.

/// Represents a parsed mountinfo line.
#[derive(Debug, PartialEq, Eq)]
pub struct MountInfo<'a> {
    /// Mount ID field.
    pub mount_id: &'a str,
    /// Parent mount ID field.
    pub parent_id: &'a str,
    /// Major:Minor device identifier.
    pub major_minor: &'a str,
    /// Root of the mount within the filesystem.
    pub root: &'a str,
    /// Mount point relative to the process's root.
    pub mount_point: &'a str,
    /// Per-mount options.
    pub mount_options: &'a str,
    /// Optional tagged fields such as `shared:20` (can be empty).
    pub optional_fields: Vec<&'a str>,
    /// Filesystem type (e.g., `ext4`, `cgroup`).
    pub fs_type: &'a str,
    /// Source of the mount (e.g., device).
    pub source: &'a str,
    /// Superblock options. For cgroup v1 mounts these list the bound controllers.
    pub super_options: &'a str,
}

impl MountInfo<'_> {
    /// Returns true if `option` is one of the comma-separated superblock options.
    pub fn has_super_option(&self, option: &str) -> bool {
        self.super_options.split(',').any(|o| o == option)
    }

    /// Returns true if this is a cgroup v1 hierarchy with `controller` attached.
    pub fn is_cgroup_controller(&self, controller: &str) -> bool {
        self.fs_type == "cgroup" && self.has_super_option(controller)
    }
}

/// Named fields in a mountinfo line.
#[derive(Debug)]
pub enum MountInfoField {
    MountId,
    ParentId,
    MajorMinor,
    Root,
    MountPoint,
    MountOptions,
    FsType,
    Source,
    SuperOptions,
}

impl std::fmt::Display for MountInfoField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountInfoField::MountId => "mount_id",
            MountInfoField::ParentId => "parent_id",
            MountInfoField::MajorMinor => "major:minor",
            MountInfoField::Root => "root",
            MountInfoField::MountPoint => "mount_point",
            MountInfoField::MountOptions => "mount_options",
            MountInfoField::FsType => "fs_type",
            MountInfoField::Source => "source",
            MountInfoField::SuperOptions => "super_options",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),

    #[error("missing `{field}` in pre-separator section of line: `{line}`")]
    MissingPreSeparatorField { field: MountInfoField, line: String },

    #[error("missing `{field}` in post-separator section of line: `{line}`")]
    MissingPostSeparatorField { field: MountInfoField, line: String },
}

/// Parses a single line of mountinfo data.
///
/// Fields borrow from `line`; only the optional field list allocates.
///
/// # Errors
///
/// Returns [`ParseError`] variants for missing separator or required fields.
pub fn parse_mount_info_line(line: &str) -> Result<MountInfo<'_>, ParseError> {
    let (pre, post) = line
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(line.to_owned()))?;

    let mut pre_fields = pre.split_whitespace();
    let mut pre_field = |field: MountInfoField| {
        pre_fields
            .next()
            .ok_or_else(|| ParseError::MissingPreSeparatorField {
                field,
                line: line.to_owned(),
            })
    };
    let mount_id = pre_field(MountInfoField::MountId)?;
    let parent_id = pre_field(MountInfoField::ParentId)?;
    let major_minor = pre_field(MountInfoField::MajorMinor)?;
    let root = pre_field(MountInfoField::Root)?;
    let mount_point = pre_field(MountInfoField::MountPoint)?;
    let mount_options = pre_field(MountInfoField::MountOptions)?;

    let optional_fields: Vec<&str> = pre_fields.collect();

    let mut post_fields = post.split_whitespace();
    let mut post_field = |field: MountInfoField| {
        post_fields
            .next()
            .ok_or_else(|| ParseError::MissingPostSeparatorField {
                field,
                line: line.to_owned(),
            })
    };
    let fs_type = post_field(MountInfoField::FsType)?;
    let source = post_field(MountInfoField::Source)?;
    let super_options = post_field(MountInfoField::SuperOptions)?;

    Ok(MountInfo {
        mount_id,
        parent_id,
        major_minor,
        root,
        mount_point,
        mount_options,
        optional_fields,
        fs_type,
        source,
        super_options,
    })
}
