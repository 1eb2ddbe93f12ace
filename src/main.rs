use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use menu_admin::backend::supabase::SupabaseClient;
use menu_admin::backend::{AuthApi, AuthEvent, BackendError};
use menu_admin::config::{self, ConfigError, HttpTimeouts, PanelConfig};
use menu_admin::panel::PanelController;
use menu_admin::session::TokenStores;
use menu_admin::terminal::{self, TerminalView};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("backend setup failed: {0}")]
    Backend(#[from] BackendError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "menu-admin", about = "Restaurant menu administration panel")]
struct Cli {
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: String,

    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: String,

    #[arg(long, env = "MENU_BUCKET", default_value = config::DEFAULT_BUCKET)]
    bucket: String,

    #[arg(long, env = "MENU_TABLE", default_value = config::DEFAULT_TABLE)]
    table: String,

    /// Where the signed-in session is kept between runs.
    #[arg(long, env = "MENU_ADMIN_SESSION_FILE", default_value = ".menu-admin-session.json")]
    session_file: PathBuf,

    #[arg(long, default_value_t = config::DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, default_value_t = config::DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    /// Log debug output to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Loaded before parsing so `.env` values feed the `env` fallbacks.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }

    let config = PanelConfig::new(&cli.supabase_url, &cli.anon_key)?
        .with_bucket(&cli.bucket)?
        .with_table(&cli.table)?
        .with_timeouts(HttpTimeouts { request_secs: cli.request_timeout_secs, connect_secs: cli.connect_timeout_secs })?;
    tracing::debug!(project = %config.project_ref(), bucket = %config.bucket, table = %config.table, "configured");

    let stores = TokenStores::with_local_file(&cli.session_file);
    let backend = Arc::new(SupabaseClient::new(&config, stores.clone())?);
    let events = backend.subscribe();

    let view = TerminalView::new(tokio::io::BufReader::new(tokio::io::stdin()), std::io::stdout());
    let mut controller = PanelController::new(backend.clone(), stores, view, config.bucket.clone());
    controller.view_mut().say("Menu admin. Set `email` and `password`, then `signin`. Type `help` for commands.");

    if let Err(e) = backend.restore_session().await {
        tracing::warn!(error = %e, "could not restore session");
        controller.handle_auth_event(AuthEvent::SignedOut).await;
    }

    terminal::run(&mut controller, events).await?;
    Ok(())
}
