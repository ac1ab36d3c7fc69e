use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Command};
use side_quest::janitor;
use side_quest::styling::eprintln;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = janitor::install_signal_sweep() {
        log::warn!("failed to install signal handler: {e}");
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::List { json, branches } => commands::list::run(json, branches),
        Command::Orphans { json, protect } => commands::orphans::run(json, protect),
        Command::Clean { merged, gone, stale_days, dry_run, yes } => {
            commands::clean::run(commands::clean::CleanOptions { merged, gone, stale_days, dry_run, yes })
        }
        Command::Check { branch, target } => commands::check::run(&branch, target.as_deref()),
        Command::Delete { branch, force } => commands::delete::run(&branch, force),
    };

    if let Err(e) = result {
        eprintln!("sq: {e:#}");
        std::process::exit(2);
    }
}
