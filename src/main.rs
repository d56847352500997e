use anyhow::Context;
use chat_relay::build_state;
use chat_relay::config::ServerConfig;
use chat_relay::routes::configure_routes;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info,warp=info")),
        )
        .init();

    let state = build_state(&config).context("failed to initialise the relay")?;
    let routes = configure_routes(state);
    let addr = config.socket_addr();

    tracing::info!(
        %addr,
        models_file = %config.models_file.display(),
        ocr_languages = %config.ocr_languages,
        "starting chat relay"
    );
    warp::serve(routes).run(addr).await;

    Ok(())
}
