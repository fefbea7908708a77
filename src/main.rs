use axum::serve;
use catalog_api::api::handlers::AppState;
use catalog_api::api::routes::create_router;
use catalog_api::auth::JwksVerifier;
use catalog_api::config::AppConfig;
use catalog_api::store::MongoStore;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress driver debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("mongodb", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .init();

    println!("Catalog API: content-type CRUD gateway");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}",
        config.server.host, config.server.port
    );

    println!("Connecting to MongoDB...");
    let database_url = config.database_url()?;
    let store = MongoStore::connect(&database_url, &config.database_name()).await?;
    println!("Document store ready");

    let verifier = JwksVerifier::new(&config.auth_issuer()?, &config.auth_audience()?);
    // Warm the key cache; a cold cache is refreshed on first use, so an
    // unreachable issuer at boot is not fatal.
    if let Err(err) = verifier.refresh_keys().await {
        log::warn!("could not prefetch JWKS: {}", err);
    }

    let state = AppState {
        store: Arc::new(store),
        verifier: Arc::new(verifier),
        api_version: config.api_version(),
    };

    let app = create_router(&config.api_base_path()).with_state(state);

    run_server(app, &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!(
        "Catalog API server running on http://{}{}",
        bind_address,
        config.api_base_path()
    );

    serve(listener, app).await?;

    Ok(())
}
