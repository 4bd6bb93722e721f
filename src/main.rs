use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{backup, create, names, rename, swap, title};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version = VERSION)]
#[command(about = "Batch renaming for Logic Pro projects and X32 mixer scenes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create one renamed copy per name-table column
    #[command(visible_alias = "cr")]
    Create(create::CreateArgs),
    /// Rename channels in a scene file
    #[command(visible_alias = "re")]
    Rename(rename::RenameArgs),
    /// Permute channel numbers in a scene file
    Swap(swap::SwapArgs),
    /// List channel names in a scene file
    Names(names::NamesArgs),
    /// Rewrite the scene title header
    Title(title::TitleArgs),
    /// Snapshot a file before editing
    #[command(visible_alias = "bak")]
    Backup(backup::BackupArgs),
    /// Restore a file from its backup
    #[command(visible_alias = "rev")]
    Revert(backup::RevertArgs),
    /// Copy the current state of a file to a new path
    #[command(visible_alias = "ex")]
    Export(backup::ExportArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
