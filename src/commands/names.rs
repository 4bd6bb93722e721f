use std::fs;

use clap::Args;
use serde::Serialize;

use stagehand::scene::{self, ChannelName};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct NamesArgs {
    /// Scene file to read
    pub scene: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum NamesOutput {
    #[serde(rename = "names")]
    Names {
        scene: String,
        channels: Vec<ChannelName>,
    },
}

pub fn run(args: NamesArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<NamesOutput> {
    let text = fs::read_to_string(&args.scene)?;
    let channels = scene::channel_names(&text);

    let exit_code = if channels.is_empty() { 1 } else { 0 };
    Ok((
        NamesOutput::Names {
            scene: args.scene,
            channels,
        },
        exit_code,
    ))
}
