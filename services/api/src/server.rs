use crate::cli::ServeArgs;
use crate::infra::{build_coordinator, load_store, AppState};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talent_booking::config::AppConfig;
use talent_booking::error::AppError;
use talent_booking::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = load_store(&config.booking)?;
    let coordinator = build_coordinator(store, &config.booking);

    let app = with_booking_routes(coordinator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        operators = config.booking.operator_emails.len(),
        applicant_self_booking = config.booking.allow_applicant_self_booking,
        "talent booking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
