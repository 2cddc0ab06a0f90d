//! CLI command definitions for the `chatsearch` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Ask questions in persistent per-user chats, over HTTP or from the terminal.
#[derive(Parser)]
#[command(name = "chatsearch", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML config file (defaults to ./chatsearch.toml if present).
    #[arg(long, global = true, env = "CHATSEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON (log lines too, for `serve`).
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config and APP_PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config and APP_HOST).
        #[arg(long)]
        host: Option<String>,
    },

    /// Ask a question in a chat and print the transcript.
    Ask {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        chat: String,

        /// The question; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// List a user's chats.
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        user: String,

        /// Only chats whose title contains this text (case-insensitive).
        #[arg(long)]
        title: Option<String>,
    },

    /// Show one chat with its messages.
    Show {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        chat: String,
    },

    /// Delete one chat, or every chat of a user when --chat is omitted.
    #[command(alias = "rm")]
    Delete {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        chat: Option<String>,
    },

    /// Count users and chats in the store.
    Stats,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
