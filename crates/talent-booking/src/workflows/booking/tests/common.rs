use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Barrier;

use crate::config::BookingConfig;
use crate::workflows::booking::availability::{
    BulkAvailabilityRow, BulkSlotCommit, IndividualAvailability, IndividualSlotCommit,
    SlotInventory, SlotListPayload,
};
use crate::workflows::booking::domain::{
    AvailabilityRecordId, Identity, JobPosting, PostingId, Slot, Submission, SubmissionId,
    SubmissionStatus,
};
use crate::workflows::booking::memory::InMemoryBookingStore;
use crate::workflows::booking::notify::{
    BookingNotification, NotificationDispatcher, NotificationError,
};
use crate::workflows::booking::store::{
    AvailabilityStore, CommitOutcome, StoreError, SubmissionRepository,
};
use crate::workflows::booking::BookingCoordinator;

pub(super) const POSTING: &str = "post-rust-contract";
pub(super) const OPERATOR: &str = "ops@talent.example";

pub(super) fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn slot(id: &str, day: u32) -> Slot {
    Slot::offered(id, date(day), time(9, 0), time(9, 45), "America/New_York")
}

pub(super) fn booked_slot(id: &str, day: u32) -> Slot {
    let mut slot = slot(id, day);
    slot.is_booked = true;
    slot
}

pub(super) fn client() -> Identity {
    Identity {
        id: "client-1".to_string(),
        email: "hiring@acme.example".to_string(),
        name: Some("Acme Hiring".to_string()),
    }
}

pub(super) fn stranger() -> Identity {
    Identity {
        id: "client-2".to_string(),
        email: "someone@else.example".to_string(),
        name: None,
    }
}

pub(super) fn posting() -> JobPosting {
    JobPosting {
        id: PostingId(POSTING.to_string()),
        name: "Senior Rust Engineer".to_string(),
        client_id: Some("client-1".to_string()),
        created_by: Some("recruiter@acme.example".to_string()),
    }
}

pub(super) fn submission(id: &str, is_selected: bool, status: SubmissionStatus) -> Submission {
    let created = Utc
        .with_ymd_and_hms(2025, 10, 20, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    Submission {
        id: SubmissionId(id.to_string()),
        posting_id: PostingId(POSTING.to_string()),
        applicant_name: format!("Applicant {id}"),
        applicant_email: format!("{id}@freelancers.example"),
        is_selected,
        status,
        selected_time_slot_id: None,
        created_at: created,
        updated_at: created,
    }
}

pub(super) fn selected(id: &str) -> Submission {
    submission(id, true, SubmissionStatus::Selected)
}

pub(super) fn bulk_row(id: &str, submission_id: &str, slots: &[Slot]) -> BulkAvailabilityRow {
    BulkAvailabilityRow {
        id: AvailabilityRecordId(id.to_string()),
        submission_id: SubmissionId(submission_id.to_string()),
        revision: 0,
        slots: SlotListPayload::from_slots(slots).expect("slots encode"),
        selected: None,
        remaining_dates: Vec::new(),
        updated_at: None,
    }
}

pub(super) fn individual_row(id: &str, submission_id: &str, slot: Slot) -> IndividualAvailability {
    IndividualAvailability {
        id: AvailabilityRecordId(id.to_string()),
        submission_id: SubmissionId(submission_id.to_string()),
        slot,
    }
}

pub(super) fn record_id(id: &str) -> AvailabilityRecordId {
    AvailabilityRecordId(id.to_string())
}

pub(super) fn submission_id(id: &str) -> SubmissionId {
    SubmissionId(id.to_string())
}

pub(super) fn booking_config() -> BookingConfig {
    BookingConfig {
        operator_emails: vec![OPERATOR.to_string()],
        allow_applicant_self_booking: false,
        seed_path: None,
    }
}

/// S1: bulk [a, b, c]; S2: status new; S3: bulk [m, n]; S4: individual rows d and e.
pub(super) async fn seeded_store() -> InMemoryBookingStore {
    let store = InMemoryBookingStore::default();
    store.insert_posting(posting()).await;

    store.insert_submission(selected("S1")).await;
    store
        .insert_bulk(bulk_row(
            "bulk-S1",
            "S1",
            &[slot("a", 3), slot("b", 4), slot("c", 5)],
        ))
        .await;

    store
        .insert_submission(submission("S2", false, SubmissionStatus::New))
        .await;
    store
        .insert_bulk(bulk_row("bulk-S2", "S2", &[slot("a", 3)]))
        .await;

    store.insert_submission(selected("S3")).await;
    store
        .insert_bulk(bulk_row("bulk-S3", "S3", &[slot("m", 6), slot("n", 7)]))
        .await;

    store
        .insert_submission(submission("S4", true, SubmissionStatus::New))
        .await;
    store
        .insert_individual(individual_row("row-S4-d", "S4", slot("d", 8)))
        .await;
    store
        .insert_individual(individual_row("row-S4-e", "S4", slot("e", 9)))
        .await;

    store
}

pub(super) type TestCoordinator =
    BookingCoordinator<InMemoryBookingStore, InMemoryBookingStore, RecordingNotifier>;

pub(super) fn coordinator_for(
    store: &InMemoryBookingStore,
    config: &BookingConfig,
) -> (TestCoordinator, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(store.clone());
    let coordinator = BookingCoordinator::new(store.clone(), store, notifier.clone(), config);
    (coordinator, notifier)
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<BookingNotification>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<BookingNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn dispatch(&self, notification: BookingNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl NotificationDispatcher for FailingNotifier {
    async fn dispatch(&self, _notification: BookingNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay refused".to_string()))
    }
}

/// Delegates to an in-memory store but fails the chosen write path.
#[derive(Clone)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryBookingStore,
    pub(super) fail_slot_commit: bool,
    pub(super) fail_submission_update: bool,
}

#[async_trait]
impl AvailabilityStore for FlakyStore {
    async fn find_bulk_availability(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<BulkAvailabilityRow>, StoreError> {
        self.inner.find_bulk_availability(submission_id).await
    }

    async fn find_individual_open_slots(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Vec<IndividualAvailability>, StoreError> {
        self.inner.find_individual_open_slots(submission_id).await
    }

    async fn commit_bulk_slot_booking(
        &self,
        commit: BulkSlotCommit,
    ) -> Result<CommitOutcome, StoreError> {
        if self.fail_slot_commit {
            return Err(StoreError::Unavailable("database offline".to_string()));
        }
        self.inner.commit_bulk_slot_booking(commit).await
    }

    async fn commit_individual_slot_booking(
        &self,
        commit: IndividualSlotCommit,
    ) -> Result<CommitOutcome, StoreError> {
        if self.fail_slot_commit {
            return Err(StoreError::Unavailable("database offline".to_string()));
        }
        self.inner.commit_individual_slot_booking(commit).await
    }

    async fn slot_inventory(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<SlotInventory, StoreError> {
        self.inner.slot_inventory(submission_id).await
    }
}

#[async_trait]
impl SubmissionRepository for FlakyStore {
    async fn fetch_submission(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        self.inner.fetch_submission(id).await
    }

    async fn fetch_posting(&self, id: &PostingId) -> Result<Option<JobPosting>, StoreError> {
        self.inner.fetch_posting(id).await
    }

    async fn mark_time_slot_selected(
        &self,
        id: &SubmissionId,
        record_id: &AvailabilityRecordId,
    ) -> Result<Submission, StoreError> {
        if self.fail_submission_update {
            return Err(StoreError::Unavailable("write timeout".to_string()));
        }
        self.inner.mark_time_slot_selected(id, record_id).await
    }
}

/// Holds every submission read at a barrier so concurrent requests observe the same state.
pub(super) struct GatedSubmissions {
    pub(super) inner: InMemoryBookingStore,
    pub(super) gate: Arc<Barrier>,
}

#[async_trait]
impl SubmissionRepository for GatedSubmissions {
    async fn fetch_submission(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        let submission = self.inner.fetch_submission(id).await;
        self.gate.wait().await;
        submission
    }

    async fn fetch_posting(&self, id: &PostingId) -> Result<Option<JobPosting>, StoreError> {
        self.inner.fetch_posting(id).await
    }

    async fn mark_time_slot_selected(
        &self,
        id: &SubmissionId,
        record_id: &AvailabilityRecordId,
    ) -> Result<Submission, StoreError> {
        self.inner.mark_time_slot_selected(id, record_id).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
