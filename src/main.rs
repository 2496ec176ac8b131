use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishguard_engine::{
    analyzer::UrlAnalyzer,
    config::Config,
    error::AppError,
    features::FeatureExtractor,
    model::InferenceModel,
    ssl_probe::LiveSslProber,
    sync::{download_prefix, HttpObjectStore},
    types::{AnalyzeRequest, AnalyzeResponse},
    whois::WhoisProber,
};

type AppState = Arc<UrlAnalyzer>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phishguard_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("loaded configuration: {:?}", config);

    // Pull artifacts from the remote store when one is configured. A failed
    // pull is survivable as long as local artifacts exist; a failed load is
    // not.
    if let Some(store_url) = &config.store_url {
        let store = HttpObjectStore::new(store_url);
        match download_prefix(&store, &config.store_model_prefix, &config.model_dir).await {
            Ok(count) => info!("pulled {count} artifact file(s) from {store_url}"),
            Err(err) => warn!("artifact pull failed, using local artifacts: {err}"),
        }
    }

    let model = InferenceModel::load(&config.model_dir)?;

    let extractor = FeatureExtractor::new(
        Arc::new(LiveSslProber::new(Duration::from_secs(
            config.ssl_timeout_secs,
        ))),
        Arc::new(WhoisProber::new(config.whois_referral_server.clone())),
    );
    let analyzer = Arc::new(UrlAnalyzer::new(extractor, model));

    let app = Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(analyzer);

    info!("starting phishguard engine on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn analyze_handler(
    State(analyzer): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    // The probes block on network I/O; keep them off the async runtime.
    let response = tokio::task::spawn_blocking(move || analyzer.analyze(&request.url))
        .await
        .map_err(|err| AppError::Internal(format!("analysis task failed: {err}")))??;
    Ok(Json(response))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("shutdown signal received, starting graceful shutdown");
}
