//! CLI argument parsing.

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Legacy directory inspector - query the legacy user store the way the platform does.
#[derive(Debug, Parser)]
#[command(name = "kc-legacy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Legacy database URL.
    #[arg(short, long, env = "LEGACY_DB_URL")]
    pub database_url: String,

    /// Provider id rendered into user references.
    #[arg(short, long, env = "LEGACY_PROVIDER_ID", default_value_t = Uuid::nil())]
    pub provider_id: Uuid,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the configuration and test the connection.
    Check,

    /// Count users.
    Count,

    /// List users ordered by display name.
    List(PageArgs),

    /// Search users by display name (SQL LIKE pattern).
    Search {
        /// Pattern, e.g. "Jane%".
        pattern: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Get a user by username.
    User {
        /// Username.
        username: String,
    },

    /// Get a user by email.
    Email {
        /// Email address.
        email: String,
    },

    /// Get a user by platform reference (f:<provider>:<username>).
    Lookup {
        /// User reference.
        reference: String,
    },

    /// Check a password (prompted, never echoed).
    Verify {
        /// Username or user reference.
        user: String,
    },
}

/// Paging arguments.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct PageArgs {
    /// Number of users to skip.
    #[arg(long, default_value_t = 0)]
    pub first: usize,

    /// Maximum number of users to return.
    #[arg(long, default_value_t = kc_federation::provider::DEFAULT_MAX_RESULTS)]
    pub max: usize,
}
