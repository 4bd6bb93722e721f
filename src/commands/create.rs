use std::path::Path;

use clap::Args;
use serde::Serialize;

use stagehand::paths::{self, InputKind};
use stagehand::replicate::{self, ReplicateSummary};
use stagehand::table::NameTable;
use stagehand::Error;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct CreateArgs {
    /// Base project bundle, scene file, or a directory of them
    pub base: String,

    /// Name table (CSV/TSV); first column header must be `Base`
    #[arg(short, long)]
    pub table: String,

    /// Directory to place the variant copies in
    #[arg(short = 'o', long)]
    pub target: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum CreateOutput {
    #[serde(rename = "create")]
    Create {
        base: String,
        table: String,
        target: String,
        created: usize,
        runs: Vec<ReplicateSummary>,
    },
}

pub fn run(args: CreateArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<CreateOutput> {
    let table = NameTable::load(Path::new(&args.table))?;
    let base = Path::new(&args.base);
    let target = Path::new(&args.target);

    let runs = if base.is_dir() && paths::detect(base) != Some(InputKind::Project) {
        replicate::replicate_all(base, &table, target)?
    } else {
        match paths::detect(base) {
            Some(InputKind::Project) => vec![replicate::replicate_project(base, &table, target)?],
            Some(InputKind::Scene) => vec![replicate::replicate_scene(base, &table, target)?],
            None => {
                return Err(Error::Format(format!(
                    "{} is not a project bundle or scene file",
                    base.display()
                )))
            }
        }
    };

    let created: usize = runs.iter().map(|r| r.created).sum();
    let all_created = runs.iter().all(ReplicateSummary::all_created);
    let exit_code = if created > 0 && all_created { 0 } else { 1 };

    Ok((
        CreateOutput::Create {
            base: args.base,
            table: args.table,
            target: args.target,
            created,
            runs,
        },
        exit_code,
    ))
}
