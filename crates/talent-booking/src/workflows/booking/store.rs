use async_trait::async_trait;

use super::availability::{
    BulkAvailabilityRow, BulkSlotCommit, IndividualAvailability, IndividualSlotCommit, SlotCommit,
    SlotInventory,
};
use super::domain::{AvailabilityRecordId, JobPosting, PostingId, Submission, SubmissionId};

/// Result of a conditional slot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The guard did not hold (slot already booked or record changed); nothing was written.
    AlreadyBooked,
}

/// Persistence over both availability shapes.
///
/// Every write touches a single record. Callers must not assume the bulk and
/// individual paths commit atomically with each other or with submission updates.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find_bulk_availability(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<BulkAvailabilityRow>, StoreError>;

    /// Unbooked, non-bulk rows for the submission in storage order.
    async fn find_individual_open_slots(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Vec<IndividualAvailability>, StoreError>;

    /// Replace the bulk slot list if `expected_revision` still matches and the target slot
    /// is unbooked. Also refreshes the selected-slot summary and remaining dates.
    async fn commit_bulk_slot_booking(
        &self,
        commit: BulkSlotCommit,
    ) -> Result<CommitOutcome, StoreError>;

    /// Mark one individual row booked if it is still open.
    async fn commit_individual_slot_booking(
        &self,
        commit: IndividualSlotCommit,
    ) -> Result<CommitOutcome, StoreError>;

    /// Every slot id known for the submission, booked ones included.
    async fn slot_inventory(&self, submission_id: &SubmissionId)
        -> Result<SlotInventory, StoreError>;

    async fn commit_slot_booking(&self, commit: SlotCommit) -> Result<CommitOutcome, StoreError> {
        match commit {
            SlotCommit::Bulk(commit) => self.commit_bulk_slot_booking(commit).await,
            SlotCommit::Individual(commit) => self.commit_individual_slot_booking(commit).await,
        }
    }
}

/// Submissions and their parent postings.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn fetch_submission(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError>;

    async fn fetch_posting(&self, id: &PostingId) -> Result<Option<JobPosting>, StoreError>;

    /// Move the submission to `time_slot_selected` and point it at the booked record.
    ///
    /// Applies only while the stored submission has no slot yet; otherwise returns
    /// [`StoreError::Conflict`] and leaves the submission untouched.
    async fn mark_time_slot_selected(
        &self,
        id: &SubmissionId,
        record_id: &AvailabilityRecordId,
    ) -> Result<Submission, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("record could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record changed concurrently: {0}")]
    Conflict(String),
}
