use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use taskstats::error::ResultOkLogExt;
use taskstats::{Client, mountinfo};

const MOUNTINFO_VAR: &str = "TASKSTATS_MOUNTINFO";
const DEFAULT_MOUNTINFO: &str = "/proc/self/mountinfo";
const CGROUP_CONTROLLER: &str = "cpu";

/// Prints Linux taskstats accounting as JSON.
///
/// Logging is controlled with `RUST_LOG`. Querying tasks other than the
/// caller's own requires `CAP_NET_ADMIN`.
#[derive(Parser)]
#[command(name = "taskstats", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Statistics of this process.
    #[command(name = "self")]
    SelfStats,
    /// Statistics of a single task.
    Pid { pid: u32 },
    /// Statistics aggregated over a thread group.
    Tgid { tgid: u32 },
    /// Task state counts of a cgroup.
    ///
    /// Without a path, the root of the cgroup v1 `cpu` hierarchy found in
    /// `$TASKSTATS_MOUNTINFO` (default `/proc/self/mountinfo`) is used.
    Cgroup { path: Option<PathBuf> },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Taskstats(#[from] taskstats::Error),
    #[error(transparent)]
    Mountinfo(#[from] mountinfo::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Taskstats(err) if err.is_not_exist() => ExitCode::from(3),
            CliError::Taskstats(err) if err.is_permission_denied() => ExitCode::from(4),
            CliError::Taskstats(err) if err.is_unsupported() => ExitCode::from(5),
            _ => ExitCode::FAILURE,
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Taskstats(err) if err.is_not_exist() => Some("no such task or cgroup"),
            CliError::Taskstats(err) if err.is_permission_denied() => {
                Some("querying this target requires CAP_NET_ADMIN")
            }
            CliError::Taskstats(err) if err.is_unsupported() => {
                Some("the kernel does not provide taskstats on this system")
            }
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskstats: {err}");
            if let Some(hint) = err.hint() {
                eprintln!("taskstats: {hint}");
            }
            err.exit_code()
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    let mut client = Client::new()?;
    let result = query(&mut client, command);
    client.close().ok_log();
    result
}

fn query(client: &mut Client, command: Command) -> Result<(), CliError> {
    match command {
        Command::SelfStats => print_json(&client.self_stats()?),
        Command::Pid { pid } => print_json(&client.pid(pid)?),
        Command::Tgid { tgid } => print_json(&client.tgid(tgid)?),
        Command::Cgroup { path } => {
            let path = match path {
                Some(path) => path,
                None => default_cgroup()?,
            };
            log::debug!("Querying cgroup `{}`", path.display());
            print_json(&client.cgroup_stats(&path)?)
        }
    }
}

fn default_cgroup() -> Result<PathBuf, mountinfo::Error> {
    let mountinfo = std::env::var_os(MOUNTINFO_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNTINFO));
    log::debug!("Reading mounts from `{}`", mountinfo.display());
    mountinfo::detect_validated_cgroup_controller_mount_point(mountinfo, CGROUP_CONTROLLER)
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout).map_err(serde_json::Error::io)?;
    Ok(())
}
