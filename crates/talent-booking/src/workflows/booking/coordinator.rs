use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::availability::AvailabilityShape;
use super::domain::{
    AvailabilityRecordId, BookingMetadata, BookingState, Identity, JobPosting, Slot, SlotId,
    SlotView, Submission, SubmissionId, SubmissionSummary,
};
use super::locator::{LocatedSlot, SlotLocator};
use super::notify::{BookingNotification, NotificationDispatcher};
use super::ownership::{OwnershipDenial, OwnershipGuard, OwnershipPolicy};
use super::store::{AvailabilityStore, CommitOutcome, StoreError, SubmissionRepository};
use crate::config::BookingConfig;

const NOTIFICATION_TEMPLATE: &str = "interview_time_slot_selected";

/// Inbound booking request as sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default, alias = "submission_id")]
    pub submission_id: String,
    #[serde(default, alias = "slot_id", alias = "timeSlotId")]
    pub slot_id: String,
    #[serde(default, alias = "client_notes", alias = "notes")]
    pub client_notes: Option<String>,
}

/// Successful booking outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub selected_slot: SlotView,
    pub record_id: AvailabilityRecordId,
    pub shape: AvailabilityShape,
    pub submission: SubmissionSummary,
}

/// Context returned when a requested slot id matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotNotFound {
    pub requested_slot_id: SlotId,
    pub submission_id: SubmissionId,
    pub availability_record_count: usize,
    pub has_bulk_record: bool,
    pub known_slot_ids: Vec<SlotId>,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("caller identity required")]
    Unauthenticated,
    #[error(transparent)]
    Ownership(#[from] OwnershipDenial),
    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),
    #[error(
        "time slot {} not found for submission {}",
        .0.requested_slot_id,
        .0.submission_id
    )]
    SlotNotFound(Box<SlotNotFound>),
    #[error("freelancer not selected yet (submission status is {status})")]
    Precondition { status: &'static str },
    #[error("time slot {slot_id} is already booked")]
    Conflict { slot_id: SlotId },
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    #[error(
        "slot booked on record {record_id} but submission {submission_id} was not updated: {source}"
    )]
    ReconciliationRequired {
        submission_id: SubmissionId,
        record_id: AvailabilityRecordId,
        #[source]
        source: StoreError,
    },
}

impl BookingError {
    /// Stable machine-readable code reported to callers.
    pub const fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation_error",
            BookingError::Unauthenticated => "unauthenticated",
            BookingError::Ownership(_) => "ownership_denied",
            BookingError::SubmissionNotFound(_) => "submission_not_found",
            BookingError::SlotNotFound(_) => "slot_not_found",
            BookingError::Precondition { .. } => "precondition_failed",
            BookingError::Conflict { .. } => "slot_conflict",
            BookingError::Persistence(_) => "persistence_error",
            BookingError::ReconciliationRequired { .. } => "reconciliation_required",
        }
    }
}

/// Orchestrates ownership, precondition, lookup, commit, and notification for a booking.
pub struct BookingCoordinator<R, A, N> {
    guard: Arc<OwnershipGuard>,
    submissions: Arc<R>,
    availability: Arc<A>,
    locator: SlotLocator<A>,
    notifier: Arc<N>,
    operator_emails: Vec<String>,
}

impl<R, A, N> BookingCoordinator<R, A, N>
where
    R: SubmissionRepository + 'static,
    A: AvailabilityStore + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        submissions: Arc<R>,
        availability: Arc<A>,
        notifier: Arc<N>,
        config: &BookingConfig,
    ) -> Self {
        let guard = OwnershipGuard::with_policy(OwnershipPolicy::new(
            config.allow_applicant_self_booking,
        ));

        Self {
            guard: Arc::new(guard),
            locator: SlotLocator::new(availability.clone()),
            submissions,
            availability,
            notifier,
            operator_emails: config.operator_emails.clone(),
        }
    }

    /// Claim one slot for a submission and advance it to `time_slot_selected`.
    ///
    /// Nothing is written until the slot has been located. The slot write is conditional, so
    /// a concurrent booking of the same slot surfaces as [`BookingError::Conflict`]. The
    /// submission transition is conditional too: a request that loses the race for a
    /// different slot of the same submission ends in [`BookingError::ReconciliationRequired`].
    pub async fn select_time_slot(
        &self,
        request: BookingRequest,
        caller: Option<&Identity>,
    ) -> Result<BookingReceipt, BookingError> {
        let submission_id = SubmissionId(required(&request.submission_id, "submissionId")?);
        let slot_id = SlotId(required(&request.slot_id, "slotId")?);
        let client_notes = request
            .client_notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        let (caller, submission, posting) =
            self.authorized_submission(&submission_id, caller).await?;

        match submission.booking_state() {
            BookingState::FreelancerSelected => {}
            BookingState::Unselected => {
                return Err(BookingError::Precondition {
                    status: submission.status.label(),
                })
            }
            BookingState::SlotBooked => {
                let inventory = self.locator.inventory(&submission.id).await?;
                if inventory.is_booked(&slot_id) {
                    return Err(BookingError::Conflict { slot_id });
                }
                return Err(BookingError::Precondition {
                    status: submission.status.label(),
                });
            }
        }

        let located = self.locate_open_slot(&submission.id, &slot_id).await?;

        let metadata = BookingMetadata {
            client_id: caller.id.clone(),
            selected_at: Utc::now(),
            client_notes,
        };
        let commit = located.prepare_commit(&metadata).ok_or_else(|| {
            StoreError::NotFound(format!("slot {slot_id} on record {}", located.record_id))
        })?;

        match self.availability.commit_slot_booking(commit).await {
            Ok(CommitOutcome::Committed) => {}
            Ok(CommitOutcome::AlreadyBooked) => {
                info!(
                    submission_id = %submission.id,
                    slot_id = %slot_id,
                    "slot claimed by a concurrent booking"
                );
                return Err(BookingError::Conflict { slot_id });
            }
            Err(err) => {
                error!(
                    submission_id = %submission.id,
                    slot_id = %slot_id,
                    error = %err,
                    "failed to persist slot booking"
                );
                return Err(BookingError::Persistence(err));
            }
        }

        let updated = match self
            .submissions
            .mark_time_slot_selected(&submission.id, &located.record_id)
            .await
        {
            Ok(updated) => updated,
            Err(source) => {
                error!(
                    reconciliation_needed = true,
                    submission_id = %submission.id,
                    record_id = %located.record_id,
                    slot_id = %slot_id,
                    error = %source,
                    "slot booked but submission status update failed"
                );
                return Err(BookingError::ReconciliationRequired {
                    submission_id: submission.id,
                    record_id: located.record_id,
                    source,
                });
            }
        };

        info!(
            submission_id = %updated.id,
            slot_id = %slot_id,
            record_id = %located.record_id,
            shape = ?located.shape,
            "interview time slot booked"
        );

        self.notify_operators(&caller, &updated, posting.as_ref(), &located.slot, &metadata)
            .await;

        Ok(BookingReceipt {
            selected_slot: located.slot.view(),
            record_id: located.record_id,
            shape: located.shape,
            submission: updated.summary(),
        })
    }

    /// Open slots across both availability shapes, in search order.
    pub async fn available_slots(
        &self,
        submission_id: &str,
        caller: Option<&Identity>,
    ) -> Result<Vec<SlotView>, BookingError> {
        let submission_id = SubmissionId(required(submission_id, "submissionId")?);
        let (_, submission, _) = self.authorized_submission(&submission_id, caller).await?;

        let sources = self.locator.sources(&submission.id).await?;
        Ok(sources
            .iter()
            .flat_map(|source| source.slots())
            .filter(|slot| !slot.is_booked)
            .map(Slot::view)
            .collect())
    }

    async fn authorized_submission(
        &self,
        submission_id: &SubmissionId,
        caller: Option<&Identity>,
    ) -> Result<(Identity, Submission, Option<JobPosting>), BookingError> {
        let caller = caller
            .filter(|identity| !identity.id.trim().is_empty())
            .cloned()
            .ok_or(BookingError::Unauthenticated)?;

        let submission = self
            .submissions
            .fetch_submission(submission_id)
            .await?
            .ok_or_else(|| BookingError::SubmissionNotFound(submission_id.clone()))?;

        let posting = match self.submissions.fetch_posting(&submission.posting_id).await {
            Ok(posting) => posting,
            Err(err) => {
                warn!(
                    submission_id = %submission.id,
                    posting_id = %submission.posting_id,
                    error = %err,
                    "job posting lookup failed; continuing without it"
                );
                None
            }
        };

        self.guard
            .authorize(&caller, &submission, posting.as_ref())
            .map_err(|denial| {
                info!(
                    submission_id = %submission.id,
                    caller_id = %caller.id,
                    reason = %denial,
                    "booking denied"
                );
                BookingError::Ownership(denial)
            })?;

        Ok((caller, submission, posting))
    }

    async fn locate_open_slot(
        &self,
        submission_id: &SubmissionId,
        slot_id: &SlotId,
    ) -> Result<LocatedSlot, BookingError> {
        if let Some(located) = self.locator.locate(submission_id, slot_id).await? {
            if located.slot.is_booked {
                return Err(BookingError::Conflict {
                    slot_id: slot_id.clone(),
                });
            }
            return Ok(located);
        }

        let inventory = self.locator.inventory(submission_id).await?;
        if inventory.is_booked(slot_id) {
            return Err(BookingError::Conflict {
                slot_id: slot_id.clone(),
            });
        }

        warn!(
            submission_id = %submission_id,
            slot_id = %slot_id,
            known_slot_ids = ?inventory.slot_ids,
            "requested time slot not found"
        );

        Err(BookingError::SlotNotFound(Box::new(SlotNotFound {
            requested_slot_id: slot_id.clone(),
            submission_id: submission_id.clone(),
            availability_record_count: inventory.record_count,
            has_bulk_record: inventory.has_bulk_record,
            known_slot_ids: inventory.slot_ids,
        })))
    }

    async fn notify_operators(
        &self,
        caller: &Identity,
        submission: &Submission,
        posting: Option<&JobPosting>,
        slot: &Slot,
        metadata: &BookingMetadata,
    ) {
        if self.operator_emails.is_empty() {
            debug!(
                submission_id = %submission.id,
                "no operator recipients configured; skipping booking notification"
            );
            return;
        }

        let view = slot.view();
        let notification = BookingNotification {
            template: NOTIFICATION_TEMPLATE.to_string(),
            recipients: self.operator_emails.clone(),
            submission_id: submission.id.clone(),
            slot_id: slot.id.clone(),
            posting_name: posting
                .map(|posting| posting.name.clone())
                .unwrap_or_else(|| submission.posting_id.to_string()),
            applicant_name: submission.applicant_name.clone(),
            applicant_email: submission.applicant_email.clone(),
            client_name: caller.display_name().to_string(),
            client_email: caller.email.clone(),
            date: view.date,
            start_time: view.start_time,
            end_time: view.end_time,
            timezone: view.timezone,
            client_notes: metadata.client_notes.clone(),
        };

        if let Err(err) = self.notifier.dispatch(notification).await {
            warn!(
                submission_id = %submission.id,
                error = %err,
                "booking notification failed; booking stands"
            );
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, BookingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
