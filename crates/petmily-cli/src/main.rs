//! Petmily client - command-line interface for the pet social network backend.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use petmily_api::ApiClient;
use petmily_auth::SessionManager;
use petmily_core::{init_logging, Config, Paths};
use petmily_storage::CredentialStore;

/// Petmily command-line interface.
#[derive(Parser)]
#[command(name = "petmily")]
#[command(about = "Petmily client for account and session management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for client files (config, credentials). Defaults to ~/.petmily
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        /// Username (defaults to the saved one from the last remembered login)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Keep the session across restarts
        #[arg(short, long)]
        remember: bool,
    },
    /// Register a new account
    Register {
        #[arg(long)]
        id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone_number: String,
    },
    /// Log out and clear the stored credential
    Logout,
    /// Show the current session
    Status,
    /// Fetch the authenticated account from the backend
    Me,
    /// Log in through Kakao
    KakaoLogin {
        /// Store the session only for this process
        #[arg(long)]
        no_remember: bool,
    },
    /// Complete a pasted OAuth2 redirect (query string from the redirect URL)
    KakaoComplete {
        /// The redirect query, e.g. "token=...&refreshToken=..."
        query: String,
    },
    /// Delete the account permanently
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    let store = Arc::new(CredentialStore::open(&paths));
    let api = Arc::new(ApiClient::new(config.api_url.clone(), store.clone()));
    let session = Arc::new(SessionManager::new(store.clone(), api.clone()));
    SessionManager::install_authorization_hook(&session);

    // One restore at startup; every command starts from whatever
    // credential survived.
    session.restore()?;

    let ctx = commands::Context {
        config,
        store,
        api,
        session,
    };

    match cli.command {
        Commands::Login {
            username,
            password,
            remember,
        } => commands::login::run(&ctx, username, password, remember).await?,
        Commands::Register {
            id,
            password,
            email,
            name,
            phone_number,
        } => commands::register::run(&ctx, id, password, email, name, phone_number).await?,
        Commands::Logout => commands::logout::run(&ctx).await?,
        Commands::Status => commands::status::run(&ctx)?,
        Commands::Me => commands::me::run(&ctx).await?,
        Commands::KakaoLogin { no_remember } => commands::kakao::login(&ctx, no_remember).await?,
        Commands::KakaoComplete { query } => commands::kakao::complete(&ctx, &query).await?,
        Commands::DeleteAccount { yes } => commands::account::delete(&ctx, yes).await?,
    }

    Ok(())
}
