//! # Clipsync CLI
//!
//! Command-line interface for the clipsync server.
//!
//! ## Usage
//!
//! ```bash
//! clipsync serve    # Start the API server (runs migrations automatically)
//! clipsync migrate  # Run database migrations
//! clipsync --help   # Show help
//! ```

use std::sync::Arc;

use clap::{Args, CommandFactory as _, Parser, Subcommand};
use error::{AppError, Result};
use migration::MigratorTrait;
use server::{
    external::HttpIdentityProvider,
    mail::{HttpMailer, Mailer, NoopMailer},
    AppState,
};

/// Clipsync - clipboard synchronization service
#[derive(Parser, Debug)]
#[command(name = "clipsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (debug, info, warn, error)
    #[arg(short = 'L', long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Output format (json, pretty, compact)
    #[arg(short, long, env = "CLIPSYNC_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the API server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Verify configuration
    Validate,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Server host to bind to
    #[arg(long, env = "CLIPSYNC_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Server port to bind to
    #[arg(short, long, env = "CLIPSYNC_PORT", default_value = "8080")]
    port: u16,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    /// Rollback the last migration
    #[arg(long)]
    rollback: bool,
}

#[derive(Args, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: clap_complete::Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init(&cli.log_level, &cli.log_format, None)
        .map_err(|e| AppError::config(format!("Failed to initialize logging: {e}")))?;

    logging::info!(target: "app", command = ?cli.command, "Clipsync CLI starting...");

    match cli.command {
        Commands::Serve(args) => serve(&args).await?,
        Commands::Migrate(args) => migrate(&args).await?,
        Commands::Completions(args) => completions(&args)?,
        Commands::Validate => validate()?,
    }

    logging::info!(target: "app", "Clipsync CLI completed successfully");
    Ok(())
}

async fn serve(args: &ServeArgs) -> Result<()> {
    let mut config = server::config::AppConfig::from_env()?;
    config.host = args.host.clone();
    config.port = args.port;

    logging::info!(target: "serve",
        host = %config.host,
        port = %config.port,
        "Starting API server..."
    );

    // Connect and migrate on startup
    let db = migration::connect_to_database(&config.database_url).await?;

    logging::info!(target: "serve", "Running database migrations...");
    migration::Migrator::up(&db, None).await?;
    logging::info!(target: "serve", "Database migrations completed successfully");

    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail_config) => Arc::new(HttpMailer::new(mail_config.clone())?),
        None => Arc::new(NoopMailer),
    };
    let identity = Arc::new(HttpIdentityProvider::new(&config.identity_endpoint)?);

    let state = AppState::new(db, config.jwt.clone(), mailer, identity)
        .with_otp_ttl(config.otp_ttl_minutes);

    spawn_expiry_reaper(state.db.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {e}", config.bind_address())))?;

    logging::info!(target: "serve", address = %config.bind_address(), "Server listening");

    axum::serve(listener, server::create_app_router(state))
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Hourly cleanup of expired refresh tokens and OTP challenges. Hygiene
/// only; both stores already treat expired rows as invalid.
fn spawn_expiry_reaper(db: sea_orm::DbConn) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            if let Err(e) = server::auth::refresh_tokens::cleanup_expired(&db).await {
                logging::warn!(target: "reaper", error = %e, "Refresh token cleanup failed");
            }
            if let Err(e) = server::auth::otp::cleanup_expired(&db).await {
                logging::warn!(target: "reaper", error = %e, "OTP cleanup failed");
            }
        }
    });
}

async fn migrate(args: &MigrateArgs) -> Result<()> {
    let config = server::config::AppConfig::from_env()?;
    let db = migration::connect_to_database(&config.database_url).await?;

    if args.rollback {
        logging::info!(target: "migrate", "Rolling back the last migration...");
        migration::Migrator::down(&db, Some(1)).await?;
        logging::info!(target: "migrate", "Rollback completed successfully");
        return Ok(());
    }

    logging::info!(target: "migrate", "Running database migrations...");
    migration::Migrator::up(&db, None).await?;
    logging::info!(target: "migrate", "Migrations completed successfully");
    Ok(())
}

fn completions(args: &CompletionsArgs) -> Result<()> {
    clap_complete::generate(
        args.shell,
        &mut Cli::command(),
        "clipsync",
        &mut std::io::stdout(),
    );
    Ok(())
}

fn validate() -> Result<()> {
    logging::info!(target: "validate", "Validating configuration...");

    let config = server::config::AppConfig::from_env()?;

    logging::info!(target: "validate",
        host = %config.host,
        port = %config.port,
        mail = %config.mail.is_some(),
        "Configuration is valid"
    );
    Ok(())
}
