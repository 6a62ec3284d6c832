use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "repertuar-bot")]
#[command(author, version, about = "Telegram bot for curating a repertoire of musical compositions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run,

    /// Write a backup of the repertoire without starting the bot
    Backup {
        /// Output file (default: timestamped file in BACKUP_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import compositions from a `title;artist;tags;mark` file
    Import {
        /// File to import
        file: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
