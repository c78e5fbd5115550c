//! Command-line interface for ethicslab.

mod commands;

use clap::{Parser, Subcommand};

/// Ethics Lab - time-boxed classroom accounts and activity pages
#[derive(Parser)]
#[command(name = "ethicslab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    #[command(alias = "web")]
    Serve,

    /// Create an account
    #[command(alias = "a")]
    Add {
        username: String,

        /// Initial password (at least 6 characters)
        secret: String,

        /// Days until the account expires
        #[arg(default_value_t = crate::constants::accounts::DEFAULT_EXPIRATION_DAYS)]
        days: i64,
    },

    /// Delete an account permanently
    #[command(alias = "rm")]
    Remove { username: String },

    /// List all accounts with their status
    #[command(alias = "ls")]
    List,

    /// Push an account's expiry out and reactivate it
    Extend {
        username: String,

        /// Days to add; counted from now if the account already expired
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },

    /// Disable an account without deleting it
    Deactivate { username: String },

    /// Show details about one account
    #[command(alias = "i")]
    Info { username: String },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
