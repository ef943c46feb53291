use crate::cli::ServeArgs;
use crate::infra::{build_portal, load_seed, AppState, LoggingTransport, SeedData};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ration_card::api::ApiState;
use ration_card::config::AppConfig;
use ration_card::error::AppError;
use ration_card::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let seed = match &config.seed_path {
        Some(path) => {
            let seed = load_seed(path)?;
            info!(path = %path.display(), "identity seed loaded");
            seed
        }
        None => {
            warn!("RATION_SEED_PATH not set; no sessions will be accepted");
            SeedData::default()
        }
    };

    let portal = build_portal(
        &config.registry,
        config.distribution,
        Arc::new(seed.users),
        Arc::new(LoggingTransport),
    );
    let api = ApiState::new(Arc::new(portal), Arc::new(seed.sessions));

    let app = with_service_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        fraud_policy = ?config.registry.fraud_policy,
        "ration card portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
