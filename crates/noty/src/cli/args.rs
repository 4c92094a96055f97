//! Command-line argument structures and enums

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use noty_core::SortingMethod;

#[derive(Parser)]
#[command(name = "noty")]
#[command(version)]
#[command(about = "Plain-text notes in a directory, safe against outside edits", long_about = None)]
pub struct Cli {
    /// Use this config file instead of the per-user one
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes
    #[command(alias = "ls")]
    List {
        /// Sort order (default: the configured sorting method)
        #[arg(short, long, value_enum)]
        sort: Option<SortArg>,

        /// Only notes whose name contains this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a note's content
    #[command(alias = "cat")]
    Show {
        /// Note name or path
        note: String,
    },

    /// Create an empty note
    New {
        /// Name of the note (without extension)
        name: String,
    },

    /// Replace a note's content with stdin
    Write {
        /// Note name or path
        note: String,

        /// Overwrite even if the file changed on disk since it was read
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a note
    #[command(alias = "delete")]
    Rm {
        /// Note name or path
        note: String,
    },

    /// Rename a note
    #[command(alias = "rename")]
    Mv {
        /// Note name or path
        note: String,

        /// New name (without extension)
        new_name: String,
    },

    /// Open a note and report changes made to it by other programs
    Watch {
        /// Note name or path
        note: String,

        /// Seconds between checks (default: external_check_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Rescan the notes directory and print a summary
    Reload,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print every setting (default)
    Show,

    /// Print the config file location
    Path,

    /// Print one setting
    Get {
        /// Setting key, e.g. notes_dir
        key: String,
    },

    /// Change a setting. VALUE is parsed as JSON, or taken as a string
    Set {
        /// Setting key, e.g. font_size
        key: String,

        /// New value, e.g. 14, true, dark, '{"width":800,"height":600}'
        value: String,
    },

    /// Restore a setting's default
    Reset {
        /// Setting key
        key: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
    Name,
    DateModified,
}

impl From<SortArg> for SortingMethod {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortingMethod::Name,
            SortArg::DateModified => SortingMethod::DateModified,
        }
    }
}
