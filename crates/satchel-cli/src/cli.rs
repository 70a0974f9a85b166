use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use satchel_core::EntryType;

#[derive(Parser)]
#[command(name = "satchel")]
#[command(about = "Offline-first personal knowledge base from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the local entry store directory
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Work against the local store only; no remote calls
    #[arg(long, global = true)]
    pub offline: bool,

    /// Quick capture: satchel "my thought here"
    #[arg(trailing_var_arg = true)]
    pub entry: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new entry
    #[command(alias = "new")]
    Add {
        /// Entry content
        content: Vec<String>,
        /// Entry title
        #[arg(long)]
        title: Option<String>,
        /// Entry kind
        #[arg(long = "type", value_enum, default_value_t = EntryTypeArg::Note)]
        entry_type: EntryTypeArg,
        /// Entry date (YYYY-MM-DD), e.g. for journal entries
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// List recent entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Filter entries by kind
        #[arg(long = "type", value_enum)]
        entry_type: Option<EntryTypeArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search entries by keyword
    Search {
        /// Search query
        query: String,
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing entry
    Edit {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Delete an existing entry
    Delete {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Push pending local changes to the server
    Sync,
    /// Show connectivity and pending-change status
    Status,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum EntryTypeArg {
    Journal,
    Note,
    Person,
    Place,
    Thing,
}

impl From<EntryTypeArg> for EntryType {
    fn from(arg: EntryTypeArg) -> Self {
        match arg {
            EntryTypeArg::Journal => Self::Journal,
            EntryTypeArg::Note => Self::Note,
            EntryTypeArg::Person => Self::Person,
            EntryTypeArg::Place => Self::Place,
            EntryTypeArg::Thing => Self::Thing,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
