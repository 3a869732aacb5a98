//! Clap derive structures for the `netpass` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netpass -- hotspot voucher and subscriber credential engine
#[derive(Debug, Parser)]
#[command(
    name = "netpass",
    version,
    about = "Manage network access credentials and their RADIUS mirror",
    long_about = "Generates and activates prepaid hotspot vouchers, mirrors subscriber and\n\
        voucher credentials into radcheck/radreply rows, and expires them on schedule.",
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
    /// Config file (layered over the platform default)
    #[arg(long, env = "NETPASS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// State file holding vouchers, accounts and authorization rows
    #[arg(long, env = "NETPASS_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Tenant UUID (overrides `default_tenant`)
    #[arg(long, short = 't', env = "NETPASS_TENANT", global = true)]
    pub tenant: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETPASS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate, activate and retire hotspot vouchers
    #[command(alias = "v")]
    Vouchers(VouchersArgs),

    /// Manage subscriber (PPPoE / hotspot) accounts
    #[command(alias = "subs")]
    Subscribers(SubscribersArgs),

    /// Mirror principals into the authorization store
    Sync(SyncArgs),

    /// Show authorization-store rows for a username
    Rows(RowsArgs),

    /// Encode a bandwidth policy as a NAS rate-limit string
    Rate(RateArgs),

    /// Inspect and disconnect accounting sessions
    Sessions(SessionsArgs),

    /// Run the expiration sweeper
    Sweep(SweepArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// Whether the command can change persisted state.
    pub fn mutates(&self) -> bool {
        match self {
            Self::Vouchers(args) => !matches!(
                args.command,
                VouchersCommand::List { .. } | VouchersCommand::Show { .. }
            ),
            Self::Subscribers(args) => !matches!(
                args.command,
                SubscribersCommand::List | SubscribersCommand::Show { .. }
            ),
            Self::Sync(args) => !matches!(args.command, SyncCommand::Plan { .. }),
            Self::Sweep(_) => true,
            Self::Rows(_) | Self::Rate(_) | Self::Sessions(_) | Self::Completions(_) => false,
        }
    }
}

// ── Vouchers ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VouchersArgs {
    #[command(subcommand)]
    pub command: VouchersCommand,
}

#[derive(Debug, Subcommand)]
pub enum VouchersCommand {
    /// Cut a batch of unused vouchers from a package
    #[command(alias = "gen")]
    Generate {
        /// Package UUID
        #[arg(long)]
        package: String,

        /// Number of vouchers
        #[arg(long, short = 'n', default_value = "1")]
        count: u32,

        /// Alphanumeric code prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Activate a voucher, starting its validity window
    Activate {
        code: String,

        /// Client MAC (required for device-bound packages)
        #[arg(long)]
        mac: Option<String>,
    },

    /// List vouchers
    #[command(alias = "ls")]
    List {
        /// Filter by status (unused, active, expired, used)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one voucher
    Show { code: String },

    /// Expire an active voucher now
    Expire { code: String },

    /// Mark an active voucher as fully consumed
    Consume { code: String },

    /// Delete a voucher that is not active
    #[command(alias = "rm")]
    Delete { code: String },
}

// ── Subscribers ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SubscribersArgs {
    #[command(subcommand)]
    pub command: SubscribersCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubscribersCommand {
    /// List subscriber accounts
    #[command(alias = "ls")]
    List,

    /// Show one subscriber account
    Show { username: String },

    /// Create a subscriber account
    Create {
        username: String,

        #[arg(long)]
        password: String,

        /// Billing subscription UUID
        #[arg(long)]
        subscription: Option<String>,

        /// pap, chap or mschapv2
        #[arg(long, default_value = "pap")]
        auth_mode: String,

        /// NAS profile/group override
        #[arg(long)]
        profile: Option<String>,

        #[arg(long)]
        static_ip: Option<IpAddr>,

        /// Hard access cut-off (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
    },

    /// Change credentials or provisioning of an account
    Update {
        username: String,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        auth_mode: Option<String>,

        #[arg(long, conflicts_with = "clear_profile")]
        profile: Option<String>,

        /// Fall back to the plan's profile
        #[arg(long)]
        clear_profile: bool,

        #[arg(long, conflicts_with = "clear_static_ip")]
        static_ip: Option<IpAddr>,

        #[arg(long)]
        clear_static_ip: bool,

        #[arg(long, conflicts_with = "clear_expires")]
        expires: Option<String>,

        #[arg(long)]
        clear_expires: bool,
    },

    /// Suspend network access
    Suspend { username: String },

    /// Restore network access
    Resume { username: String },

    /// Delete the account and retract its rows
    #[command(alias = "rm")]
    Delete { username: String },
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommand,
}

#[derive(Debug, Subcommand)]
pub enum SyncCommand {
    /// Resync one voucher
    Voucher { code: String },

    /// Resync one subscriber
    Subscriber { username: String },

    /// Resync every active principal of a kind
    All {
        #[arg(long, value_enum)]
        kind: PrincipalKindArg,
    },

    /// Delete every row for a username
    Retract { username: String },

    /// Diff domain state against the store and repair drift
    Reconcile,

    /// Show the rows a sync would write, without writing them
    Plan {
        #[arg(long, value_enum)]
        kind: PrincipalKindArg,

        /// Voucher code or subscriber username
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PrincipalKindArg {
    Vouchers,
    Subscribers,
}

// ── Rows / Rate ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RowsArgs {
    pub username: String,
}

#[derive(Debug, Args)]
pub struct RateArgs {
    /// Upload cap in Mbps
    #[arg(long)]
    pub upload: u32,

    /// Download cap in Mbps
    #[arg(long)]
    pub download: u32,

    /// Burst limit in Mbps (enables burst)
    #[arg(long)]
    pub burst_limit: Option<u32>,

    /// Burst threshold in Mbps
    #[arg(long, requires = "burst_limit")]
    pub burst_threshold: Option<u32>,

    /// Burst time in seconds
    #[arg(long, requires = "burst_limit")]
    pub burst_time: Option<u32>,
}

// ── Sessions ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// Accounting sessions without a stop time
    Active,

    /// Usage totals per subscriber over a date range
    Usage {
        /// Range start (RFC 3339, e.g. 2026-03-01 or 2026-03-01T00:00:00Z)
        #[arg(long)]
        from: String,

        /// Range end, exclusive
        #[arg(long)]
        to: String,
    },

    /// Disconnect a session through the NAS
    Disconnect { session_id: String },
}

// ── Sweep ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Keep sweeping on the configured interval until Ctrl-C
    #[arg(long, short = 'w')]
    pub watch: bool,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
