//! diradmin - admin console for the business and event directory.
//!
//! Logs in against the directory backend, keeps the token pair between
//! runs and drives users, businesses, events, categories and provinces.

mod app;
mod commands;
mod output;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use diradmin_core::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// JSON file in the data directory
    File,
    /// OS keychain
    Keyring,
    /// Nothing persisted between runs
    Memory,
}

#[derive(Parser)]
#[command(name = "diradmin")]
#[command(about = "Admin console for the business and event directory")]
#[command(version)]
pub struct Cli {
    /// Backend base URL (defaults to the config file, then http://localhost:8000)
    #[arg(long, env = "DIRADMIN_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Where the token pair is kept
    #[arg(long, value_enum, default_value = "file", global = true)]
    pub store: StoreKind,

    /// Also write logs to a daily file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the token pair
    Login {
        /// Username (defaults to the last one used)
        #[arg(long, short)]
        username: Option<String>,
    },

    /// Clear the stored tokens
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show what the route guard decides for a path
    Route {
        /// Path such as /admin/events/3
        path: String,
    },

    /// Manage users
    Users {
        #[command(subcommand)]
        command: commands::users::UsersCommand,
    },

    /// Browse and create businesses
    Businesses {
        #[command(subcommand)]
        command: commands::businesses::BusinessesCommand,
    },

    /// Browse and create events
    Events {
        #[command(subcommand)]
        command: commands::events::EventsCommand,
    },

    /// List business categories
    Categories,

    /// List provinces
    Provinces,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "diradmin.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
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

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_ref());
    info!("diradmin starting");

    let mut app = App::new(cli.api_url.as_deref(), cli.store, cli.json)?;
    app.initialize().await;

    let result = run(cli.command, &mut app).await;

    match result {
        Err(ref e) if is_session_expired(e) => {
            anyhow::bail!("Session expired. Run `diradmin login` to sign in again.")
        }
        other => other,
    }
}

/// Whether any cause in the chain says the session has ended
fn is_session_expired(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(ApiError::is_session_expired)
}

async fn run(command: Commands, app: &mut App) -> Result<()> {
    match command {
        Commands::Login { username } => commands::auth::login(app, username).await,
        Commands::Logout => commands::auth::logout(app),
        Commands::Whoami => commands::auth::whoami(app).await,
        Commands::Route { path } => commands::auth::route(app, &path).await,
        Commands::Users { command } => commands::users::run(command, app).await,
        Commands::Businesses { command } => commands::businesses::run(command, app).await,
        Commands::Events { command } => commands::events::run(command, app).await,
        Commands::Categories => commands::catalog::categories(app).await,
        Commands::Provinces => commands::catalog::provinces(app).await,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_session_expired_found_through_context() {
        let err = Err::<(), _>(ApiError::SessionExpired)
            .context("Failed to load users")
            .unwrap_err();
        assert!(is_session_expired(&err));

        let err = anyhow::Error::from(ApiError::NoRefreshToken).context("Failed to load events");
        assert!(is_session_expired(&err));
    }

    #[test]
    fn test_other_errors_are_not_session_expired() {
        let err = anyhow::Error::from(ApiError::NotFound("missing".into())).context("Failed to load event 9");
        assert!(!is_session_expired(&err));
        assert!(!is_session_expired(&anyhow::anyhow!("Not logged in. Run `diradmin login`.")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "diradmin",
            "users",
            "list",
            "--store",
            "memory",
            "--api-url",
            "http://api.example.org",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.store, StoreKind::Memory);
        assert_eq!(cli.api_url.as_deref(), Some("http://api.example.org"));
        assert!(cli.json);
    }

    #[test]
    fn test_page_zero_rejected() {
        assert!(Cli::try_parse_from(["diradmin", "businesses", "list", "--page", "0"]).is_err());
        assert!(Cli::try_parse_from(["diradmin", "businesses", "list", "--page", "2"]).is_ok());
    }

    #[test]
    fn test_negative_zoom_accepted() {
        assert!(Cli::try_parse_from(["diradmin", "businesses", "list", "--zoom", "-2"]).is_ok());
    }
}
