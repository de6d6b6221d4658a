use std::sync::Arc;

use tracing::warn;

use super::availability::{
    AvailabilityShape, AvailabilitySource, BulkAvailability, SlotCommit, SlotInventory,
};
use super::domain::{AvailabilityRecordId, BookingMetadata, Slot, SlotId, SubmissionId};
use super::store::{AvailabilityStore, StoreError};

/// A slot found by [`SlotLocator`], plus what is needed to update it in place.
pub struct LocatedSlot {
    pub slot: Slot,
    pub record_id: AvailabilityRecordId,
    pub shape: AvailabilityShape,
    index: usize,
    source: Box<dyn AvailabilitySource>,
}

impl LocatedSlot {
    pub fn prepare_commit(&self, metadata: &BookingMetadata) -> Option<SlotCommit> {
        self.source.prepare_booking(self.index, metadata)
    }
}

impl std::fmt::Debug for LocatedSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatedSlot")
            .field("slot", &self.slot)
            .field("record_id", &self.record_id)
            .field("shape", &self.shape)
            .field("index", &self.index)
            .finish()
    }
}

/// Searches bulk then individual availability for a slot id. Read only.
pub struct SlotLocator<A> {
    store: Arc<A>,
}

impl<A> SlotLocator<A>
where
    A: AvailabilityStore + 'static,
{
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }

    /// Availability sources for a submission in search order: the bulk record first, then
    /// open individual rows.
    pub async fn sources(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Vec<Box<dyn AvailabilitySource>>, StoreError> {
        let mut sources: Vec<Box<dyn AvailabilitySource>> = Vec::new();

        if let Some(row) = self.store.find_bulk_availability(submission_id).await? {
            match BulkAvailability::decode(&row) {
                Ok(bulk) => sources.push(Box::new(bulk)),
                Err(err) => {
                    warn!(
                        submission_id = %submission_id,
                        record_id = %row.id,
                        error = %err,
                        "bulk slot list unreadable; treating it as empty"
                    );
                }
            }
        }

        for row in self.store.find_individual_open_slots(submission_id).await? {
            sources.push(Box::new(row));
        }

        Ok(sources)
    }

    /// First slot whose id matches, or `None`.
    pub async fn locate(
        &self,
        submission_id: &SubmissionId,
        slot_id: &SlotId,
    ) -> Result<Option<LocatedSlot>, StoreError> {
        let sources = self.sources(submission_id).await?;

        let mut located: Option<LocatedSlot> = None;
        let mut duplicates = 0usize;

        for source in sources {
            let hits: Vec<usize> = source
                .slots()
                .iter()
                .enumerate()
                .filter(|(_, slot)| &slot.id == slot_id)
                .map(|(index, _)| index)
                .collect();
            let Some(&index) = hits.first() else {
                continue;
            };

            if located.is_some() {
                duplicates += hits.len();
                continue;
            }
            duplicates += hits.len() - 1;

            let slot = source.slots()[index].clone();
            let record_id = source.record_id().clone();
            let shape = source.shape();
            located = Some(LocatedSlot {
                slot,
                record_id,
                shape,
                index,
                source,
            });
        }

        if let Some(found) = located.as_ref().filter(|_| duplicates > 0) {
            warn!(
                submission_id = %submission_id,
                slot_id = %slot_id,
                duplicates,
                chosen_record = %found.record_id,
                "slot id appears more than once; using the first match"
            );
        }

        Ok(located)
    }

    pub async fn inventory(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<SlotInventory, StoreError> {
        self.store.slot_inventory(submission_id).await
    }
}
