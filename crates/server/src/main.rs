use migration::{Migrator, MigratorTrait};
use myauth::AppResources;
use myauth::api::start_webserver;
use myauth::config::load_config;
use myauth::issuer::UpstreamIssuer;
use myauth::oauth2::{CodeSender, LogCodeSender, SmtpCodeSender, session::SqlSessionStore};
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use sea_orm::Database;
use std::sync::Arc;
use std::time::Duration;
use tower_sessions::session_store::ExpiredDeletion;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "myauth=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    initialize_tracing();

    let config = Arc::new(load_config()?);

    CryptoProvider::install_default(crypto::ring::default_provider())
        .map_err(|_| color_eyre::eyre::eyre!("Failed to install crypto provider"))?;

    let db = Arc::new(Database::connect(&config.database_url).await?);
    Migrator::up(db.as_ref(), None).await?;

    let sessions = SqlSessionStore::connect(&db).await?;
    tokio::task::spawn(sessions.clone().continuously_delete_expired(Duration::from_secs(
        config.session.cleanup_interval_seconds,
    )));

    let issuer = Arc::new(UpstreamIssuer::new(
        &config.issuer.upstream_url,
        &config.public_url,
    )?);

    let code_sender: Arc<dyn CodeSender> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(server = %smtp.server, port = smtp.port, "mailing verification codes");
            Arc::new(SmtpCodeSender::new(smtp, &config.issuer.theme.title)?)
        }
        None => {
            tracing::warn!("no smtp configured; verification codes are only logged");
            Arc::new(LogCodeSender)
        }
    };

    tracing::info!(
        public_url = %config.public_url,
        issuer = %config.issuer.upstream_url,
        client_id = %config.client_id,
        "configuration loaded"
    );

    let resources = AppResources::new(db, config, issuer, code_sender, sessions);
    start_webserver(resources).await
}
