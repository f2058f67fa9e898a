//! PocketLedger CLI - track income and expenses from the terminal.

mod commands;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pocketledger_core::dashboard::Period;
use pocketledger_core::models::{TransactionFilters, TransactionType};
use pocketledger_core::Config;

use commands::{BackendArg, Context, TransactionArgs};
use output::OutputFormat;

/// PocketLedger - personal income and expense tracker.
#[derive(Parser)]
#[command(name = "pocketledger")]
#[command(about = "Track income and expenses against a PocketLedger server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear session
    Logout,

    /// Create an account
    Register {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Show server, session and cache state
    Status,

    /// Manage transactions
    #[command(alias = "tx")]
    Transactions {
        #[command(subcommand)]
        command: TransactionCommands,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Income, expense and balance totals
    Stats {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Totals per category for one transaction type
    Breakdown {
        /// income or expense
        kind: TransactionType,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Overview with charts data and recent activity
    Dashboard {
        /// week, month or year
        #[arg(short, long, default_value = "month")]
        period: Period,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// week, month or year (default month)
    #[arg(short, long)]
    period: Option<Period>,
    /// Start date, YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,
    /// End date, YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl RangeArgs {
    fn filters(&self) -> TransactionFilters {
        commands::resolve_filters(self.period, self.from, self.to)
    }
}

#[derive(Subcommand)]
enum TransactionCommands {
    /// List transactions
    List {
        /// income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<TransactionType>,
        #[arg(short, long)]
        category: Option<String>,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Match category, subcategory or description
        #[arg(short, long)]
        search: Option<String>,
        /// Show at most this many
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one transaction
    Show { id: String },
    /// Add a transaction
    Add {
        #[command(flatten)]
        fields: TransactionArgs,
    },
    /// Change fields of a transaction
    Edit {
        id: String,
        #[command(flatten)]
        fields: TransactionArgs,
    },
    /// Delete a transaction
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    List {
        /// income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<TransactionType>,
    },
    /// Add a category
    Add {
        name: String,
        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: TransactionType,
        /// Hex color, e.g. #22c55e
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Change a category
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a category
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Set the server URL
    SetServer { url: String },
    /// Choose where the session token is stored
    SetBackend { backend: BackendArg },
}

/// Initialize the tracing subscriber: stderr, plus a daily file when
/// `log_dir` is given. The guard must live until exit to flush the file.
fn init_tracing(log_level: &str, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // RUST_LOG overrides --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pocketledger.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let format = cli.format;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("{:#}", e), &format);
            return ExitCode::FAILURE;
        }
    };

    let log_dir = if config.log_to_file {
        config.log_dir().ok()
    } else {
        None
    };
    let _guard = init_tracing(&cli.log_level, log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "PocketLedger starting");

    match run(cli.command, config, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "Command failed");
            output::print_error(&format!("{:#}", e), &format);
            ExitCode::FAILURE
        }
    }
}

fn run_config(command: &ConfigCommands, config: &mut Config, format: &OutputFormat) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => commands::config_show(config, format),
        ConfigCommands::SetServer { url } => commands::config_set_server(config, url, format),
        ConfigCommands::SetBackend { backend } => commands::config_set_backend(config, *backend, format),
    }
}

async fn run(command: Commands, mut config: Config, format: OutputFormat) -> anyhow::Result<()> {
    // Configuration commands work without a client
    if let Commands::Config { command } = &command {
        return run_config(command, &mut config, &format);
    }

    let mut ctx = Context::new(config, format)?;
    let result = match command {
        Commands::Login { email } => commands::login(&mut ctx, email).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Register { name, email } => commands::register(&mut ctx, name, email).await,
        Commands::ForgotPassword { email } => commands::forgot_password(&ctx, email).await,
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Transactions { command } => match command {
            TransactionCommands::List {
                kind,
                category,
                from,
                to,
                search,
                limit,
            } => {
                let filters = TransactionFilters {
                    kind,
                    category,
                    start_date: from,
                    end_date: to,
                };
                commands::transactions_list(&ctx, filters, search, limit).await
            }
            TransactionCommands::Show { id } => commands::transactions_show(&ctx, &id).await,
            TransactionCommands::Add { fields } => commands::transactions_add(&ctx, fields).await,
            TransactionCommands::Edit { id, fields } => commands::transactions_edit(&ctx, &id, fields).await,
            TransactionCommands::Delete { id, yes } => commands::transactions_delete(&ctx, &id, yes).await,
        },
        Commands::Categories { command } => match command {
            CategoryCommands::List { kind } => commands::categories_list(&ctx, kind).await,
            CategoryCommands::Add {
                name,
                kind,
                color,
                icon,
            } => commands::categories_add(&ctx, name, kind, color, icon).await,
            CategoryCommands::Edit { id, name, color, icon } => {
                commands::categories_edit(&ctx, &id, name, color, icon).await
            }
            CategoryCommands::Delete { id, yes } => commands::categories_delete(&ctx, &id, yes).await,
        },
        Commands::Stats { range } => commands::stats(&ctx, range.filters()).await,
        Commands::Breakdown { kind, range } => commands::breakdown(&ctx, kind, range.filters()).await,
        Commands::Dashboard { period } => commands::dashboard(&ctx, period).await,
        Commands::Config { .. } => unreachable!("config commands return before the client is built"),
    };

    ctx.report_session_end();
    result
}
