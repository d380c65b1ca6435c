use anyhow::Result;
use clap::Parser;

use humor_prep::cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    Cli::parse().run()
}
