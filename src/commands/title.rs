use std::fs;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use stagehand::scene;
use stagehand::session::WorkSession;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct TitleArgs {
    /// Scene file to rewrite in place
    pub scene: String,

    /// New scene title
    pub name: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum TitleOutput {
    #[serde(rename = "title")]
    Title { scene: String, name: String },
}

pub fn run(args: TitleArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<TitleOutput> {
    let session = WorkSession::open(Path::new(&args.scene))?;
    let text = fs::read_to_string(session.working_copy())?;
    let output = scene::rename_scene_title(&text, &args.name)?;
    fs::write(session.working_copy(), output)?;
    session.commit()?;
    session.close();

    Ok((
        TitleOutput::Title {
            scene: args.scene,
            name: args.name,
        },
        0,
    ))
}
