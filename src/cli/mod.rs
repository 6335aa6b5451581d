//! CLI argument definitions for qlog.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("QLOG_GIT_COMMIT"),
    " ",
    env!("QLOG_BUILD_TIMESTAMP"),
    ")"
);

/// qlog - encrypted quest log for tasks, goals and daily quests.
///
/// Start with `qlog init` to create the vault, then `qlog dispatch` actions against it.
#[derive(Parser, Debug)]
#[command(name = "qlog")]
#[command(author, version = VERSION, about = "Encrypted quest log and gamified task tracker", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding the vault artifacts.
    /// Can also be set via QLOG_DATA_DIR or `data-dir` in config.kdl.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// The vault password.
#[derive(Args, Debug)]
pub struct PasswordArgs {
    /// Vault password
    #[arg(long, env = "QLOG_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show whether the vault exists and where it lives
    Status,

    /// Create the vault with a new password
    Init {
        #[command(flatten)]
        auth: PasswordArgs,
    },

    /// Unlock the vault and print the current state
    Show {
        #[command(flatten)]
        auth: PasswordArgs,

        /// Print the full state instead of a summary (JSON output only)
        #[arg(long)]
        full: bool,
    },

    /// Apply one action to the state
    ///
    /// The action is JSON tagged by `type`, e.g.
    /// `{"type": "add_task", "text": "Write report", "xp": 20}`.
    Dispatch {
        #[command(flatten)]
        auth: PasswordArgs,

        /// Action JSON
        action: String,
    },

    /// Apply generated daily quests (a JSON list of quest drafts)
    Quests {
        #[command(flatten)]
        auth: PasswordArgs,

        /// Generator response JSON
        response: String,
    },

    /// Change the vault password
    Rotate {
        #[command(flatten)]
        auth: PasswordArgs,

        /// New vault password
        #[arg(long = "new-password", env = "QLOG_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },

    /// Write the encrypted bundle to a file
    Export {
        #[command(flatten)]
        auth: PasswordArgs,

        /// Destination file
        file: PathBuf,
    },

    /// Replace the vault with a previously exported bundle
    Import {
        /// Bundle file
        file: PathBuf,
    },
}
