use std::fs;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use stagehand::scene;
use stagehand::session::WorkSession;
use stagehand::Error;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct SwapArgs {
    /// Scene file to rewrite in place
    pub scene: String,

    /// Swap a pair of channels (repeatable)
    #[arg(long = "pair", value_name = "A:B")]
    pub pairs: Vec<String>,

    /// Move one channel to a new position, shifting the channels between
    #[arg(
        long = "move",
        value_names = ["FROM", "TO"],
        num_args = 2,
        conflicts_with = "pairs"
    )]
    pub chain: Option<Vec<u8>>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum SwapOutput {
    #[serde(rename = "swap")]
    Swap {
        scene: String,
        moved_lines: usize,
        permutation: Vec<Move>,
    },
}

#[derive(Serialize)]
pub struct Move {
    pub from: u8,
    pub to: u8,
}

pub fn run(args: SwapArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<SwapOutput> {
    let permutation = if let Some(chain) = &args.chain {
        crate::commands::chain_permutation(chain[0], chain[1])?
    } else if args.pairs.is_empty() {
        return Err(Error::Format("nothing to swap: pass --pair or --move".into()));
    } else {
        crate::commands::parse_swap_pairs(&args.pairs)?
    };

    let session = WorkSession::open(Path::new(&args.scene))?;
    let text = fs::read_to_string(session.working_copy())?;
    let outcome = scene::swap(&text, &permutation);
    fs::write(session.working_copy(), &outcome.output)?;
    session.commit()?;
    session.close();

    let exit_code = if outcome.moved_lines == 0 { 1 } else { 0 };
    Ok((
        SwapOutput::Swap {
            scene: args.scene,
            moved_lines: outcome.moved_lines,
            permutation: permutation
                .into_iter()
                .map(|(from, to)| Move { from, to })
                .collect(),
        },
        exit_code,
    ))
}
