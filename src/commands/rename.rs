use std::collections::HashMap;
use std::fs;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use stagehand::scene::{self, ChannelKind, RenamedChannel};
use stagehand::session::WorkSession;
use stagehand::table::NameTable;
use stagehand::Error;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RenameArgs {
    /// Scene file to rewrite in place
    pub scene: String,

    /// Rename one channel (repeatable); `OLD=` disables the channel
    #[arg(long = "set", value_name = "OLD=NEW")]
    pub set: Vec<String>,

    /// Load the mapping from a name table instead
    #[arg(long, conflicts_with = "set")]
    pub table: Option<String>,

    /// Variant column to read with --table
    #[arg(long, requires = "table")]
    pub variant: Option<String>,

    /// Channel classes to touch: a (auxin), b (bus), c (channel)
    #[arg(long, default_value = "abc")]
    pub types: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RenameOutput {
    #[serde(rename = "rename")]
    Rename {
        scene: String,
        renamed: Vec<RenamedChannel>,
        not_found: Vec<String>,
    },
}

fn load_mapping(args: &RenameArgs) -> stagehand::Result<HashMap<String, String>> {
    if let Some(table_path) = &args.table {
        let variant = args.variant.as_deref().ok_or_else(|| {
            Error::Table("--variant is required with --table".into())
        })?;
        let table = NameTable::load(Path::new(table_path))?;
        table.mapping(variant)
    } else if args.set.is_empty() {
        Err(Error::Format(
            "nothing to rename: pass --set or --table".into(),
        ))
    } else {
        crate::commands::parse_rename_pairs(&args.set)
    }
}

pub fn run(args: RenameArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RenameOutput> {
    let mapping = load_mapping(&args)?;
    let enabled = ChannelKind::parse_mode(&args.types)?;

    let session = WorkSession::open(Path::new(&args.scene))?;
    let text = fs::read_to_string(session.working_copy())?;
    let outcome = scene::rename(&text, &mapping, &enabled);
    fs::write(session.working_copy(), &outcome.output)?;
    session.commit()?;
    session.close();

    let exit_code = if outcome.renamed.is_empty() { 1 } else { 0 };
    Ok((
        RenameOutput::Rename {
            scene: args.scene,
            renamed: outcome.renamed,
            not_found: outcome.not_found,
        },
        exit_code,
    ))
}
