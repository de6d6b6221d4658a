use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_booking::config::BookingConfig;
use talent_booking::error::AppError;
use talent_booking::workflows::booking::{
    BookingCoordinator, BookingSeed, InMemoryBookingStore, LogNotificationDispatcher,
};
use tracing::{info, warn};

pub(crate) type ServiceCoordinator =
    BookingCoordinator<InMemoryBookingStore, InMemoryBookingStore, LogNotificationDispatcher>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn store_from_seed_file(path: &Path) -> Result<InMemoryBookingStore, AppError> {
    let seed = BookingSeed::from_path(path)?;
    info!(
        path = %path.display(),
        postings = seed.postings.len(),
        submissions = seed.submissions.len(),
        availability = seed.availability.len(),
        "booking seed loaded"
    );
    Ok(InMemoryBookingStore::from_seed(seed)?)
}

/// Store for the running service: the configured seed file, or an empty store.
pub(crate) fn load_store(config: &BookingConfig) -> Result<InMemoryBookingStore, AppError> {
    match config.seed_path.as_deref() {
        Some(path) => store_from_seed_file(path),
        None => {
            warn!("BOOKING_SEED_FILE not set; starting with an empty booking store");
            Ok(InMemoryBookingStore::default())
        }
    }
}

pub(crate) fn build_coordinator(
    store: InMemoryBookingStore,
    config: &BookingConfig,
) -> Arc<ServiceCoordinator> {
    let store = Arc::new(store);
    Arc::new(BookingCoordinator::new(
        store.clone(),
        store,
        Arc::new(LogNotificationDispatcher),
        config,
    ))
}
