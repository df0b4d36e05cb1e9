use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use taskmill_cli::commands::Command;
use taskmill_db::{Database, DbError, DbResult, Tenant};

/// Environment variable name for the database path
const TASKMILL_DB_PATH_ENV: &str = "TASKMILL_DB_PATH";

/// Environment variable name for the acting user
const TASKMILL_USER_ENV: &str = "TASKMILL_USER";

/// taskmill - multi-tenant task management
#[derive(Parser)]
#[command(name = "tm")]
#[command(version = "0.1.0")]
#[command(about = "A multi-tenant task manager", long_about = None)]
struct Args {
    /// Path to the database directory (can also be set via TASKMILL_DB_PATH env var)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// User the command acts for (can also be set via TASKMILL_USER env var)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Read a non-empty environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get the database path from command line, environment variable, or default.
///
/// Priority:
/// 1. Command line --db argument
/// 2. TASKMILL_DB_PATH environment variable (if non-empty)
/// 3. Default path (`<git root>/.taskmill/data`)
fn resolve_db_path(cli_db: Option<PathBuf>) -> PathBuf {
    cli_db
        .or_else(|| env_value(TASKMILL_DB_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(Database::default_path)
}

/// Get the acting user from the command line or environment.
///
/// # Errors
///
/// Returns `DbError::ValidationError` if neither names a user.
fn resolve_tenant(cli_user: Option<String>) -> DbResult<Tenant> {
    match cli_user.or_else(|| env_value(TASKMILL_USER_ENV)) {
        Some(user) => Tenant::new(user),
        None => Err(DbError::ValidationError {
            message: format!("no user given; pass --user or set {}", TASKMILL_USER_ENV),
        }),
    }
}

/// Initialize logging from the RUST_LOG environment variable
///
/// Examples:
/// - `RUST_LOG=trace` - show all trace logs, including generated queries
/// - `RUST_LOG=taskmill_db=debug` - show debug and above from the db crate
/// - `RUST_LOG=info` - show info and above
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run_app().await {
        if e.is_user_facing() {
            eprintln!("error: {}", e);
        } else {
            eprintln!("error: {}", e.full_message());
        }
        process::exit(1);
    }
}

/// Main application logic - separated for testability
async fn run_app() -> Result<(), DbError> {
    let args = Args::parse();
    run_with_args(&args).await
}

/// Run the application with the given arguments
async fn run_with_args(args: &Args) -> Result<(), DbError> {
    let Some(cmd) = &args.command else {
        println!("Welcome to taskmill!");
        println!("Use 'tm --help' for usage information.");
        return Ok(());
    };

    let tenant = resolve_tenant(args.user.clone())?;

    let db_path = resolve_db_path(args.db.clone());
    debug!("acting for {} on {}", tenant, db_path.display());
    let db = Database::connect(&db_path).await?;
    db.init().await?;

    let result = cmd.execute(&db, &tenant).await?;
    println!("{}", result);

    Ok(())
}
