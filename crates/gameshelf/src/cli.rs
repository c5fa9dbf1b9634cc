//! Clap derive structures for the `gameshelf` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gameshelf -- manage your game collections from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "gameshelf",
    version,
    about = "Track game collections from the command line",
    long_about = "A client for the gameshelf collection service.\n\n\
        Log in once, then list, create, and edit collections and the\n\
        games in them. Search the game catalog to find game ids.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "GAMESHELF_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GAMESHELF_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "GAMESHELF_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in, sign up, log out
    Auth(AuthArgs),

    /// Manage collections
    #[command(alias = "col", alias = "c")]
    Collections(CollectionsArgs),

    /// Manage the games in a collection
    #[command(alias = "e")]
    Entries(EntriesArgs),

    /// Search the game catalog
    #[command(alias = "s")]
    Search {
        /// Search text
        query: String,
    },

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in and store the session for this profile
    Login {
        /// Account email (defaults to the profile's email)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },

    /// Create an account and log in
    Signup {
        #[arg(long, short = 'u')]
        username: String,

        #[arg(long, short = 'e')]
        email: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,
}

// ── Collections ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CollectionsArgs {
    #[command(subcommand)]
    pub command: CollectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CollectionsCommand {
    /// List collections with their game counts
    #[command(alias = "ls")]
    List,

    /// Show one collection
    Show {
        /// Collection id
        id: i64,
    },

    /// Create a collection
    Create {
        name: String,

        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Rename or re-describe a collection
    Update {
        /// Collection id
        id: i64,

        #[arg(long, short = 'n')]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Delete a collection and everything in it
    #[command(alias = "rm")]
    Delete {
        /// Collection id
        id: i64,
    },
}

// ── Entries ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntriesArgs {
    /// Collection id
    #[arg(long, short = 'c')]
    pub collection: i64,

    #[command(subcommand)]
    pub command: EntriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntriesCommand {
    /// List the games in a collection
    #[command(alias = "ls")]
    List,

    /// Add a game to a collection
    Add {
        /// Catalog game id (see `gameshelf search`)
        game_id: i64,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// Edit an entry's notes, status, rating, or tags
    Update {
        /// Entry id
        entry_id: i64,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// Remove a game from a collection
    #[command(alias = "rm")]
    Remove {
        /// Entry id
        entry_id: i64,
    },
}

#[derive(Debug, Args)]
pub struct EntryFields {
    #[arg(long)]
    pub notes: Option<String>,

    /// Free-form status (e.g., "playing", "finished")
    #[arg(long)]
    pub status: Option<String>,

    /// Rating from 0 to 10
    #[arg(long, short = 'r')]
    pub rating: Option<u8>,

    /// Custom tag as key=value (repeatable)
    #[arg(long = "tag", short = 't', value_name = "KEY=VALUE")]
    pub tags: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "service_url", "auth_url", "email")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
