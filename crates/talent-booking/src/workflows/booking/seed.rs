use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::availability::{
    remaining_dates, BulkAvailabilityRow, IndividualAvailability, SlotListPayload,
};
use super::domain::{
    AvailabilityRecordId, JobPosting, SelectedSlotSummary, Slot, Submission, SubmissionId,
};

/// Availability row in the flat export format, where `isBulkEntry` picks the shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAvailabilityRecord {
    pub id: AvailabilityRecordId,
    #[serde(alias = "submission_id")]
    pub submission_id: SubmissionId,
    #[serde(default, alias = "is_bulk_entry")]
    pub is_bulk_entry: bool,
    #[serde(default)]
    pub slots: SlotListPayload,
    #[serde(default)]
    pub slot: Option<Slot>,
    #[serde(default)]
    pub selected: Option<SelectedSlotSummary>,
}

/// Snapshot of postings, submissions, and availability used to hydrate a store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSeed {
    #[serde(default)]
    pub postings: Vec<JobPosting>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub availability: Vec<SeedAvailabilityRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid seed data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("individual availability record {0} has no slot")]
    MissingSlot(AvailabilityRecordId),
    #[error("submission {0} has open slots in both bulk and individual records")]
    MixedAvailability(SubmissionId),
}

/// Rows split by physical shape, ready for a store.
#[derive(Debug, Clone, Default)]
pub(crate) struct SeedRows {
    pub(crate) bulk: Vec<BulkAvailabilityRow>,
    pub(crate) individual: Vec<IndividualAvailability>,
}

impl BookingSeed {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Split availability by shape and reject submissions with live slots in both shapes.
    pub(crate) fn availability_rows(&self) -> Result<SeedRows, SeedError> {
        let mut rows = SeedRows::default();

        for record in &self.availability {
            if record.is_bulk_entry {
                rows.bulk.push(BulkAvailabilityRow {
                    id: record.id.clone(),
                    submission_id: record.submission_id.clone(),
                    revision: 0,
                    slots: record.slots.clone(),
                    selected: record.selected.clone(),
                    remaining_dates: record
                        .slots
                        .decode()
                        .map(|slots| remaining_dates(&slots))
                        .unwrap_or_default(),
                    updated_at: None,
                });
            } else {
                let slot = record
                    .slot
                    .clone()
                    .ok_or_else(|| SeedError::MissingSlot(record.id.clone()))?;
                rows.individual.push(IndividualAvailability {
                    id: record.id.clone(),
                    submission_id: record.submission_id.clone(),
                    slot,
                });
            }
        }

        let open_bulk: BTreeSet<&SubmissionId> = rows
            .bulk
            .iter()
            .filter(|row| {
                row.slots
                    .decode()
                    .map(|slots| slots.iter().any(|slot| !slot.is_booked))
                    .unwrap_or(false)
            })
            .map(|row| &row.submission_id)
            .collect();

        if let Some(mixed) = rows
            .individual
            .iter()
            .filter(|row| !row.slot.is_booked)
            .find(|row| open_bulk.contains(&row.submission_id))
        {
            return Err(SeedError::MixedAvailability(mixed.submission_id.clone()));
        }

        Ok(rows)
    }
}
