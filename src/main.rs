use clap::Parser;

mod app;
mod audio;
mod cli;
mod config;
mod logging;
mod playback;
mod runtime;
mod source;
mod track;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run(cli::Cli::parse())
}
