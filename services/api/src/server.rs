use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_records_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use property_records::auth::Authenticator;
use property_records::config::{AppConfig, AuthConfig};
use property_records::error::AppError;
use property_records::records::{PropertyService, SqlitePropertyRepository};
use property_records::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;
    let auth_config = AuthConfig::load()?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(SqlitePropertyRepository::connect(&config.database).await?);
    let property_service = Arc::new(PropertyService::new(repository));
    let authenticator = Arc::new(Authenticator::new(&auth_config));

    let app = with_records_routes(property_service, authenticator)
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "property records service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
