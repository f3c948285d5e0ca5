mod app;
mod cli;
mod db;
mod http;
mod logging;
mod paths;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    match paths::log_file_path().and_then(|path| logging::init_logging(&path)) {
        Ok(()) => {}
        Err(err) => eprintln!("logging disabled: {err:#}"),
    }
    app::run(cli)
}
