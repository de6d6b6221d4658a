use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::availability::{
    remaining_dates, BulkAvailabilityRow, BulkSlotCommit, IndividualAvailability,
    IndividualSlotCommit, SlotInventory, SlotListPayload,
};
use super::domain::{
    AvailabilityRecordId, JobPosting, PostingId, Submission, SubmissionId, SubmissionStatus,
};
use super::seed::{BookingSeed, SeedError};
use super::store::{AvailabilityStore, CommitOutcome, StoreError, SubmissionRepository};

#[derive(Debug, Default)]
struct BookingTables {
    postings: HashMap<PostingId, JobPosting>,
    submissions: HashMap<SubmissionId, Submission>,
    bulk: Vec<BulkAvailabilityRow>,
    individual: Vec<IndividualAvailability>,
}

/// Process-local store backing both repository traits.
///
/// Conditional commits are evaluated under the write lock, so concurrent bookings of one slot
/// resolve to exactly one `Committed`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<BookingTables>>,
}

impl InMemoryBookingStore {
    pub fn from_seed(seed: BookingSeed) -> Result<Self, SeedError> {
        let rows = seed.availability_rows()?;
        let tables = BookingTables {
            postings: seed
                .postings
                .into_iter()
                .map(|posting| (posting.id.clone(), posting))
                .collect(),
            submissions: seed
                .submissions
                .into_iter()
                .map(|submission| (submission.id.clone(), submission))
                .collect(),
            bulk: rows.bulk,
            individual: rows.individual,
        };

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    pub async fn insert_posting(&self, posting: JobPosting) {
        let mut tables = self.tables.write().await;
        tables.postings.insert(posting.id.clone(), posting);
    }

    pub async fn insert_submission(&self, submission: Submission) {
        let mut tables = self.tables.write().await;
        tables.submissions.insert(submission.id.clone(), submission);
    }

    pub async fn insert_bulk(&self, row: BulkAvailabilityRow) {
        self.tables.write().await.bulk.push(row);
    }

    pub async fn insert_individual(&self, row: IndividualAvailability) {
        self.tables.write().await.individual.push(row);
    }

    pub async fn bulk_row(&self, id: &AvailabilityRecordId) -> Option<BulkAvailabilityRow> {
        let tables = self.tables.read().await;
        tables.bulk.iter().find(|row| &row.id == id).cloned()
    }

    pub async fn individual_row(
        &self,
        id: &AvailabilityRecordId,
    ) -> Option<IndividualAvailability> {
        let tables = self.tables.read().await;
        tables.individual.iter().find(|row| &row.id == id).cloned()
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryBookingStore {
    async fn find_bulk_availability(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<BulkAvailabilityRow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bulk
            .iter()
            .find(|row| &row.submission_id == submission_id)
            .cloned())
    }

    async fn find_individual_open_slots(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Vec<IndividualAvailability>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .individual
            .iter()
            .filter(|row| &row.submission_id == submission_id && !row.slot.is_booked)
            .cloned()
            .collect())
    }

    async fn commit_bulk_slot_booking(
        &self,
        commit: BulkSlotCommit,
    ) -> Result<CommitOutcome, StoreError> {
        let payload = SlotListPayload::from_slots(&commit.slots)?;

        let mut tables = self.tables.write().await;
        let row = tables
            .bulk
            .iter_mut()
            .find(|row| row.id == commit.record_id)
            .ok_or_else(|| StoreError::NotFound(format!("availability {}", commit.record_id)))?;

        if row.revision != commit.expected_revision {
            return Ok(CommitOutcome::AlreadyBooked);
        }
        let target_open = row
            .slots
            .decode()
            .map(|slots| {
                slots
                    .iter()
                    .any(|slot| slot.id == commit.slot_id && !slot.is_booked)
            })
            .unwrap_or(false);
        if !target_open {
            return Ok(CommitOutcome::AlreadyBooked);
        }

        row.remaining_dates = remaining_dates(&commit.slots);
        row.slots = payload;
        row.selected = Some(commit.selected);
        row.revision += 1;
        row.updated_at = Some(Utc::now());
        Ok(CommitOutcome::Committed)
    }

    async fn commit_individual_slot_booking(
        &self,
        commit: IndividualSlotCommit,
    ) -> Result<CommitOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .individual
            .iter_mut()
            .find(|row| row.id == commit.record_id)
            .ok_or_else(|| StoreError::NotFound(format!("availability {}", commit.record_id)))?;

        if row.slot.is_booked {
            return Ok(CommitOutcome::AlreadyBooked);
        }
        row.slot = row.slot.booked_by(&commit.metadata);
        Ok(CommitOutcome::Committed)
    }

    async fn slot_inventory(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<SlotInventory, StoreError> {
        let tables = self.tables.read().await;
        let mut inventory = SlotInventory::default();

        for row in tables
            .bulk
            .iter()
            .filter(|row| &row.submission_id == submission_id)
        {
            inventory.record_count += 1;
            inventory.has_bulk_record = true;
            if let Ok(slots) = row.slots.decode() {
                slots.iter().for_each(|slot| inventory.record(slot));
            }
        }

        for row in tables
            .individual
            .iter()
            .filter(|row| &row.submission_id == submission_id)
        {
            inventory.record_count += 1;
            inventory.record(&row.slot);
        }

        Ok(inventory)
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryBookingStore {
    async fn fetch_submission(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.get(id).cloned())
    }

    async fn fetch_posting(&self, id: &PostingId) -> Result<Option<JobPosting>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.postings.get(id).cloned())
    }

    async fn mark_time_slot_selected(
        &self,
        id: &SubmissionId,
        record_id: &AvailabilityRecordId,
    ) -> Result<Submission, StoreError> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("submission {id}")))?;

        if submission.status == SubmissionStatus::TimeSlotSelected {
            return Err(StoreError::Conflict(format!(
                "submission {id} already points at {}",
                submission
                    .selected_time_slot_id
                    .as_ref()
                    .map_or("another record", |record| record.0.as_str())
            )));
        }
        submission.status = SubmissionStatus::TimeSlotSelected;
        submission.selected_time_slot_id = Some(record_id.clone());
        submission.updated_at = Utc::now();
        Ok(submission.clone())
    }
}
