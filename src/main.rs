mod cli;
mod converter;
mod error;
mod extractor;
mod models;
mod rows;
mod settings;
mod table;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            source,
            card_number,
        } => cli::convert::run(&input, &output, &source, card_number),
        Commands::Formats => cli::formats::run(),
        Commands::Init {
            data_dir,
            card_number,
        } => cli::init::run(data_dir, card_number),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
