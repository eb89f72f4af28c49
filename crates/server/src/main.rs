use discord_auth_relay::AppResources;
use discord_auth_relay::api::start_webserver;
use discord_auth_relay::config::load_config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_standard_tracing() {
    let default_directives = "discord_auth_relay=info,tower_http=info,reqwest=warn,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    initialize_standard_tracing();

    let config = load_config()?;
    tracing::info!(
        client_id = %config.discord_client_id,
        redirect_uri = %config.redirect_uri,
        timeout_secs = config.provider.timeout_secs,
        "auth relay configuration"
    );

    let resources = AppResources::from_config(config)?;

    start_webserver(resources).await?;
    Ok(())
}
