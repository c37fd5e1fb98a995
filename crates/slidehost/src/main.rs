mod api;
mod busy;
mod cli;
mod commands;
mod config;
mod gui;
mod index;
mod live_reload;
mod model;
mod storage;
mod term;
mod theme;
mod timer;
mod viewer;

use clap::Parser;
use colored::Colorize;
use tracing::Level;

fn main() {
    let cli = cli::Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose, cli.quiet, cli.no_color);

    if let Err(e) = cli.run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool, no_color: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .init();
}
