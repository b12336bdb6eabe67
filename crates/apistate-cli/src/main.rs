//! apistate CLI: the `apistate` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging();

    match cli.command {
        Commands::Normalize {
            input,
            config,
            picks,
        } => commands::normalize::run(input, config, picks),

        Commands::Denormalize {
            resource_type,
            ids,
            store,
            config,
            collection,
            meta,
            references,
            max_objects,
        } => commands::denormalize::run(commands::denormalize::Args {
            resource_type,
            ids,
            store,
            config,
            collection,
            meta,
            references,
            max_objects,
        }),

        Commands::CheckConfig {
            config,
            store,
            json,
        } => commands::check_config::run(config, store, json),
    }
}
