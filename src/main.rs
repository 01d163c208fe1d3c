use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;

use cli::command::{Cli, Commands};
use cli::decode::cmd_decode;
use cli::filter::cmd_filter;
use cli::info::cmd_info;

mod cli;
mod input;
mod logging;
mod report;
mod srt;
mod stream;
pub(crate) mod timestamp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let multi = MultiProgress::new();
    let pb = logging::init(&cli, &multi)?.then_some(&multi);

    match cli.command {
        Commands::Info(ref args) => cmd_info(args, &cli, pb)?,
        Commands::Decode(ref args) => cmd_decode(args, &cli, pb)?,
        Commands::Filter(ref args) => cmd_filter(args, &cli, pb)?,
    }

    Ok(())
}
