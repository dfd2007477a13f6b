use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use teacher_portal_backend::{
    config::{get_config, init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    middleware::{auth::AuthConfig, cors::cors_for},
    repository::PgStore,
    routes,
    services::{file_store::LocalFileStore, notification_service::notification_channel},
    AppState,
};
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;
    init_tracing(config.log_format);

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let (sink, worker) = notification_channel(store.clone());
    tokio::spawn(worker.run());

    let files = LocalFileStore::new(&config.uploads_dir, config.public_uploads_url.clone());
    let state = AppState::new(
        store,
        Arc::new(files),
        Arc::new(sink),
        AuthConfig::new(config.jwt_secret.as_str()),
    );

    let mount = if config.public_uploads_url.starts_with('/') {
        config.public_uploads_url.as_str()
    } else {
        "/uploads"
    };
    info!("Serving uploads from {} at {}", config.uploads_dir, mount);
    let app = routes::router(state)
        .nest_service(mount, ServeDir::new(&config.uploads_dir))
        .layer(cors_for(&config.cors_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
