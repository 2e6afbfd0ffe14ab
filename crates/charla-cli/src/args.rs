//! CLI argument definitions using clap
//!
//! - charla list                 # Saved chats, newest first
//! - charla show <name>          # Print a saved chat
//! - charla export <name>        # Write a chat as a standalone JSON file
//! - charla import <file>        # Store an exported chat
//! - charla ingest <file>        # Extract the text of an attachment

use charla_core::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "charla")]
#[command(about = "Charla - keep, name and move chat transcripts")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Directory holding chat records (overrides configuration and
    /// `CHARLA_CHATS_DIR`)
    #[arg(long, global = true)]
    pub chats_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List saved chats, most recently modified first
    List {
        /// Maximum number of chats to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Print the messages of a saved chat
    Show {
        /// Chat name
        name: String,
    },

    /// Delete a saved chat
    Delete {
        /// Chat name
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Rename a saved chat
    Rename {
        /// Current chat name
        from: String,

        /// New chat name (sanitized)
        to: String,
    },

    /// Export a saved chat as a JSON document
    Export {
        /// Chat name
        name: String,

        /// Output path, or `-` for stdout (default: `<name>.json`)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import a JSON document into the chat store
    Import {
        /// Exported chat file
        file: PathBuf,

        /// Store under this name instead of the file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the name a chat file would be saved under
    Name {
        /// Chat file (JSON array of messages)
        file: PathBuf,
    },

    /// Extract the text of an attachment as it would be sent to the model
    Ingest {
        /// File to extract
        file: PathBuf,
    },

    /// List the available models
    Models,

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display current configuration settings
    Show,

    /// Create a new configuration file with defaults
    Init {
        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
