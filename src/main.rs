use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
use config::FileConfig;

mod server;
use server::{run_server, RequestsLoggingLevel, ServerConfig};

mod sqlite_persistence;

mod store;
use store::SqliteLibraryStore;

mod user;
use user::auth::DEFAULT_TOKEN_TTL_SECS;
use user::TokenIssuer;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite library database file.
    #[clap(value_parser = parse_path)]
    pub db_path: PathBuf,

    /// Optional TOML config file. CLI flags take precedence over it.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long)]
    pub port: Option<u16>,

    /// Secret for signing session tokens. Falls back to the config file,
    /// then the JWT_SECRET environment variable.
    #[clap(long)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime in seconds.
    #[clap(long)]
    pub token_ttl_secs: Option<u64>,

    /// The level of logging to perform on each request.
    #[clap(long)]
    pub logging_level: Option<RequestsLoggingLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let port = cli_args.port.or(file_config.port).unwrap_or(3001);
    let token_ttl_secs = cli_args
        .token_ttl_secs
        .or(file_config.token_ttl_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
    let logging_level = cli_args
        .logging_level
        .or_else(|| {
            file_config
                .logging_level
                .as_deref()
                .and_then(|s| <RequestsLoggingLevel as clap::ValueEnum>::from_str(s, true).ok())
        })
        .unwrap_or_default();

    let jwt_secret = cli_args
        .jwt_secret
        .or(file_config.jwt_secret)
        .or_else(|| std::env::var("JWT_SECRET").ok());
    let jwt_secret = match jwt_secret {
        Some(secret) if !secret.is_empty() => secret,
        _ => bail!(
            "No JWT secret configured: pass --jwt-secret, set it in the config file, \
             or export JWT_SECRET"
        ),
    };

    info!("Opening SQLite library database at {:?}...", cli_args.db_path);
    let store = Arc::new(SqliteLibraryStore::new(&cli_args.db_path)?);
    let token_issuer = TokenIssuer::new(&jwt_secret, Duration::from_secs(token_ttl_secs));

    let server_config = ServerConfig {
        requests_logging_level: logging_level,
        port,
    };

    info!("Ready to serve at port {}!", port);
    run_server(store, token_issuer, server_config).await
}
