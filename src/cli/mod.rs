pub mod convert;
pub mod formats;
pub mod init;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ledgerize",
    version,
    about = "Convert bank and credit-card statement exports into a Date/Payee/Memo/Amount ledger CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a statement export into a ledger CSV.
    Convert {
        /// Statement export (.csv or .xlsx). Relative paths not found in the
        /// working directory are looked up in the data directory.
        input: String,
        /// Ledger CSV to write
        output: String,
        /// Source format key (see `ledgerize formats`)
        source: String,
        /// Card to extract from multi-card exports (isracard)
        #[arg(long = "card-number")]
        card_number: Option<String>,
    },
    /// List the supported source formats.
    Formats,
    /// Save default settings.
    Init {
        /// Directory statement exports are downloaded to (default: ~/Downloads)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Default card filter for isracard exports
        #[arg(long = "card-number")]
        card_number: Option<String>,
    },
    /// Show the current settings.
    Status,
}
