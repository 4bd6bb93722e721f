use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use stagehand::session;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct BackupArgs {
    /// File to snapshot
    pub file: String,

    /// Backup destination (default `{file}.backup`)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct RevertArgs {
    /// File to restore
    pub file: String,

    /// Backup to restore from (default `{file}.backup`)
    #[arg(long)]
    pub from: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// File to export
    pub file: String,

    /// Destination path; must not exist
    pub to: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum SnapshotOutput {
    #[serde(rename = "backup")]
    Backup { file: String, backup: String },
    #[serde(rename = "revert")]
    Revert { file: String, backup: String },
    #[serde(rename = "export")]
    Export { file: String, target: String },
}

pub fn run_backup(
    args: BackupArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<SnapshotOutput> {
    let to = args.to.as_ref().map(PathBuf::from);
    let backup = session::save_backup(Path::new(&args.file), to.as_deref())?;
    Ok((
        SnapshotOutput::Backup {
            file: args.file,
            backup: backup.display().to_string(),
        },
        0,
    ))
}

pub fn run_revert(
    args: RevertArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<SnapshotOutput> {
    let from = args.from.as_ref().map(PathBuf::from);
    let backup = session::revert(Path::new(&args.file), from.as_deref())?;
    Ok((
        SnapshotOutput::Revert {
            file: args.file,
            backup: backup.display().to_string(),
        },
        0,
    ))
}

pub fn run_export(
    args: ExportArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<SnapshotOutput> {
    session::export(Path::new(&args.file), Path::new(&args.to))?;
    Ok((
        SnapshotOutput::Export {
            file: args.file,
            target: args.to,
        },
        0,
    ))
}
