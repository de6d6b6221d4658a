use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::coordinator::{BookingCoordinator, BookingError, BookingRequest};
use super::domain::Identity;
use super::notify::NotificationDispatcher;
use super::store::{AvailabilityStore, SubmissionRepository};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Resolves the caller identity from request metadata.
///
/// `None` means the caller is anonymous. An identity needs a non-blank `id`; `email` may be
/// empty, in which case email-based ownership rules never match.
pub trait SessionAuthenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Reads an identity forwarded by the session gateway in `x-user-*` headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSessionAuthenticator;

impl SessionAuthenticator for HeaderSessionAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Identity> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Some(Identity {
            id: header(USER_ID_HEADER)?,
            email: header(USER_EMAIL_HEADER).unwrap_or_default(),
            name: header(USER_NAME_HEADER),
        })
    }
}

pub struct BookingRouterState<R, A, N> {
    pub(crate) coordinator: Arc<BookingCoordinator<R, A, N>>,
    pub(crate) authenticator: Arc<dyn SessionAuthenticator>,
}

impl<R, A, N> Clone for BookingRouterState<R, A, N> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Router builder exposing the booking endpoints with header-based identity.
pub fn booking_router<R, A, N>(coordinator: Arc<BookingCoordinator<R, A, N>>) -> Router
where
    R: SubmissionRepository + 'static,
    A: AvailabilityStore + 'static,
    N: NotificationDispatcher + 'static,
{
    booking_router_with_authenticator(coordinator, Arc::new(HeaderSessionAuthenticator))
}

pub fn booking_router_with_authenticator<R, A, N>(
    coordinator: Arc<BookingCoordinator<R, A, N>>,
    authenticator: Arc<dyn SessionAuthenticator>,
) -> Router
where
    R: SubmissionRepository + 'static,
    A: AvailabilityStore + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/bookings/time-slot",
            post(select_time_slot_handler::<R, A, N>),
        )
        .route(
            "/api/v1/submissions/:submission_id/time-slots",
            get(available_slots_handler::<R, A, N>),
        )
        .with_state(BookingRouterState {
            coordinator,
            authenticator,
        })
}

pub(crate) async fn select_time_slot_handler<R, A, N>(
    State(state): State<BookingRouterState<R, A, N>>,
    headers: HeaderMap,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Response
where
    R: SubmissionRepository + 'static,
    A: AvailabilityStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = BookingError::Validation(rejection.body_text());
            return error_response(&error);
        }
    };

    let caller = state.authenticator.authenticate(&headers);
    match state
        .coordinator
        .select_time_slot(request, caller.as_ref())
        .await
    {
        Ok(receipt) => {
            let payload = json!({
                "success": true,
                "selectedSlot": receipt.selected_slot,
                "recordId": receipt.record_id,
                "shape": receipt.shape,
                "submission": receipt.submission,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn available_slots_handler<R, A, N>(
    State(state): State<BookingRouterState<R, A, N>>,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
    A: AvailabilityStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let caller = state.authenticator.authenticate(&headers);
    match state
        .coordinator
        .available_slots(&submission_id, caller.as_ref())
        .await
    {
        Ok(slots) => {
            let payload = json!({
                "submissionId": submission_id,
                "slots": slots,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) fn status_for(error: &BookingError) -> StatusCode {
    match error {
        BookingError::Validation(_) | BookingError::Precondition { .. } => StatusCode::BAD_REQUEST,
        BookingError::Unauthenticated => StatusCode::UNAUTHORIZED,
        BookingError::Ownership(_) => StatusCode::FORBIDDEN,
        BookingError::SubmissionNotFound(_) | BookingError::SlotNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        BookingError::Conflict { .. } => StatusCode::CONFLICT,
        BookingError::Persistence(_) | BookingError::ReconciliationRequired { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(error: &BookingError) -> Response {
    let status = status_for(error);
    let mut payload = json!({
        "error": {
            "code": error.code(),
            "message": error.to_string(),
        }
    });
    if let BookingError::SlotNotFound(diagnostics) = error {
        payload["diagnostics"] = json!(diagnostics);
    }
    (status, Json(payload)).into_response()
}
