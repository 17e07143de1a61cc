use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::{MatchMode, Mode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prismactl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Query and reconcile Prisma Cloud resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to reach and authenticate against the tenant
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Prisma Cloud API URL
    #[arg(long, env = "PRISMA_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Access key ID or username
    #[arg(long, env = "PRISMA_USERNAME", global = true)]
    pub username: Option<String>,

    /// Secret key or password (prompted when missing)
    #[arg(long, env = "PRISMA_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Customer name, for users with access to several tenants
    #[arg(long, env = "PRISMA_CUSTOMER_NAME", global = true)]
    pub customer_name: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the resource kinds prismactl knows about
    Resources,

    /// Query a resource listing
    Query(QueryArgs),

    /// Reconcile one resource towards a desired state
    Apply(ApplyArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Query
// ============================================================================

#[derive(Parser)]
pub struct QueryArgs {
    /// Resource kind (see `prismactl resources`)
    pub kind: String,

    /// Match the primary field (usually the name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// How --name is compared
    #[arg(short, long, value_enum, default_value_t = SearchType::Exact)]
    pub search_type: SearchType,

    /// Require field=value (repeatable, values parse as JSON scalars)
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Listing parameter, e.g. complianceId=<id> (repeatable)
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Fetch the full record of every match
    #[arg(long, conflicts_with = "summary")]
    pub details: bool,

    /// Only return the identifying fields of every match
    #[arg(long)]
    pub summary: bool,
}

impl QueryArgs {
    /// Ternary detail flag: unset, summary or details
    pub fn expand_details(&self) -> Option<bool> {
        if self.details {
            Some(true)
        } else if self.summary {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SearchType {
    Exact,
    Substring,
    Regex,
}

impl From<SearchType> for MatchMode {
    fn from(arg: SearchType) -> Self {
        match arg {
            SearchType::Exact => Self::Exact,
            SearchType::Substring => Self::Substring,
            SearchType::Regex => Self::Regex,
        }
    }
}

// ============================================================================
// Apply
// ============================================================================

#[derive(Parser)]
pub struct ApplyArgs {
    /// Resource kind (see `prismactl resources`)
    pub kind: String,

    /// Desired state file (.json or .toml)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Locate the object by server ID
    #[arg(long)]
    pub id: Option<String>,

    /// Locate the object by name
    #[arg(long)]
    pub name: Option<String>,

    /// Whether the object should exist
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,

    /// Show what would change without changing it
    #[arg(long)]
    pub dry_run: bool,

    /// Show a diff of the object before and after
    #[arg(long)]
    pub diff: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for Mode {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Present => Self::Present,
            StateArg::Absent => Self::Absent,
        }
    }
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (password redacted)
    Show,

    /// Print the config file path
    Path,
}
