use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AvailabilityRecordId, BookingMetadata, SelectedSlotSummary, Slot, SlotId, SubmissionId,
};

/// Physical shape an availability record is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityShape {
    Bulk,
    Individual,
}

/// Raw slot list as persisted on a bulk row: a native list or a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotListPayload {
    Native(Vec<serde_json::Value>),
    Encoded(String),
    Other(serde_json::Value),
}

impl Default for SlotListPayload {
    fn default() -> Self {
        SlotListPayload::Native(Vec::new())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SlotDecodeError {
    #[error("slot list string is not valid JSON: {0}")]
    Encoded(#[source] serde_json::Error),
    #[error("slot entry {index} is malformed: {source}")]
    Entry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("slot list encodes a {found} instead of an array")]
    NotAList { found: &'static str },
}

impl SlotListPayload {
    pub fn from_slots(slots: &[Slot]) -> Result<Self, serde_json::Error> {
        let entries = slots
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SlotListPayload::Native(entries))
    }

    /// Normalize the stored payload into typed slots, preserving list order.
    pub fn decode(&self) -> Result<Vec<Slot>, SlotDecodeError> {
        let entries = match self {
            SlotListPayload::Native(entries) => entries.clone(),
            SlotListPayload::Encoded(raw) => {
                if raw.trim().is_empty() {
                    return Ok(Vec::new());
                }
                match serde_json::from_str::<serde_json::Value>(raw)
                    .map_err(SlotDecodeError::Encoded)?
                {
                    serde_json::Value::Array(entries) => entries,
                    serde_json::Value::Null => Vec::new(),
                    other => {
                        return Err(SlotDecodeError::NotAList {
                            found: json_kind(&other),
                        })
                    }
                }
            }
            SlotListPayload::Other(serde_json::Value::Null) => Vec::new(),
            SlotListPayload::Other(other) => {
                return Err(SlotDecodeError::NotAList {
                    found: json_kind(other),
                })
            }
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value(entry)
                    .map_err(|source| SlotDecodeError::Entry { index, source })
            })
            .collect()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Bulk availability row exactly as the store holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAvailabilityRow {
    pub id: AvailabilityRecordId,
    #[serde(alias = "submission_id")]
    pub submission_id: SubmissionId,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub slots: SlotListPayload,
    #[serde(default)]
    pub selected: Option<SelectedSlotSummary>,
    #[serde(default, alias = "remaining_dates")]
    pub remaining_dates: Vec<NaiveDate>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Bulk record with its slot list decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAvailability {
    pub id: AvailabilityRecordId,
    pub submission_id: SubmissionId,
    pub revision: u64,
    pub slots: Vec<Slot>,
    pub selected: Option<SelectedSlotSummary>,
}

impl BulkAvailability {
    pub fn decode(row: &BulkAvailabilityRow) -> Result<Self, SlotDecodeError> {
        Ok(Self {
            id: row.id.clone(),
            submission_id: row.submission_id.clone(),
            revision: row.revision,
            slots: row.slots.decode()?,
            selected: row.selected.clone(),
        })
    }
}

/// One row per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualAvailability {
    pub id: AvailabilityRecordId,
    #[serde(alias = "submission_id")]
    pub submission_id: SubmissionId,
    pub slot: Slot,
}

/// Write produced for a located slot; the variant picks the store commit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotCommit {
    Bulk(BulkSlotCommit),
    Individual(IndividualSlotCommit),
}

/// Full rewrite of a bulk list, guarded by the revision it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSlotCommit {
    pub record_id: AvailabilityRecordId,
    pub expected_revision: u64,
    pub slot_id: SlotId,
    pub slots: Vec<Slot>,
    pub selected: SelectedSlotSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualSlotCommit {
    pub record_id: AvailabilityRecordId,
    pub metadata: BookingMetadata,
}

/// Common view over both physical availability shapes.
pub trait AvailabilitySource: Send + Sync {
    fn record_id(&self) -> &AvailabilityRecordId;
    fn shape(&self) -> AvailabilityShape;
    fn slots(&self) -> &[Slot];

    /// Build the write that books the slot at `index` and leaves every other slot as-is.
    fn prepare_booking(&self, index: usize, metadata: &BookingMetadata) -> Option<SlotCommit>;
}

impl AvailabilitySource for BulkAvailability {
    fn record_id(&self) -> &AvailabilityRecordId {
        &self.id
    }

    fn shape(&self) -> AvailabilityShape {
        AvailabilityShape::Bulk
    }

    fn slots(&self) -> &[Slot] {
        &self.slots
    }

    fn prepare_booking(&self, index: usize, metadata: &BookingMetadata) -> Option<SlotCommit> {
        let target = self.slots.get(index)?;
        let booked = target.booked_by(metadata);
        let selected = booked.summary();
        let slot_id = booked.id.clone();

        let mut slots = self.slots.clone();
        slots[index] = booked;

        Some(SlotCommit::Bulk(BulkSlotCommit {
            record_id: self.id.clone(),
            expected_revision: self.revision,
            slot_id,
            slots,
            selected,
        }))
    }
}

impl AvailabilitySource for IndividualAvailability {
    fn record_id(&self) -> &AvailabilityRecordId {
        &self.id
    }

    fn shape(&self) -> AvailabilityShape {
        AvailabilityShape::Individual
    }

    fn slots(&self) -> &[Slot] {
        std::slice::from_ref(&self.slot)
    }

    fn prepare_booking(&self, index: usize, metadata: &BookingMetadata) -> Option<SlotCommit> {
        if index != 0 {
            return None;
        }
        Some(SlotCommit::Individual(IndividualSlotCommit {
            record_id: self.id.clone(),
            metadata: metadata.clone(),
        }))
    }
}

/// Sorted, de-duplicated dates that still have at least one open slot.
pub fn remaining_dates(slots: &[Slot]) -> Vec<NaiveDate> {
    slots
        .iter()
        .filter(|slot| !slot.is_booked)
        .map(|slot| slot.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Operator-facing listing of every slot known for a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInventory {
    pub record_count: usize,
    pub has_bulk_record: bool,
    pub slot_ids: Vec<SlotId>,
    pub booked_slot_ids: Vec<SlotId>,
}

impl SlotInventory {
    pub fn record(&mut self, slot: &Slot) {
        self.slot_ids.push(slot.id.clone());
        if slot.is_booked {
            self.booked_slot_ids.push(slot.id.clone());
        }
    }

    pub fn is_booked(&self, slot_id: &SlotId) -> bool {
        self.booked_slot_ids.iter().any(|id| id == slot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use serde_json::json;

    fn slot(id: &str, day: u32) -> Slot {
        Slot::offered(
            id,
            NaiveDate::from_ymd_opt(2025, 11, day).expect("valid"),
            NaiveTime::from_hms_opt(10, 0, 0).expect("valid"),
            NaiveTime::from_hms_opt(10, 30, 0).expect("valid"),
            "UTC",
        )
    }

    fn metadata() -> BookingMetadata {
        BookingMetadata {
            client_id: "client-1".to_string(),
            selected_at: Utc::now(),
            client_notes: None,
        }
    }

    #[test]
    fn decode_reads_native_and_encoded_lists_identically() {
        let slots = vec![slot("a", 3), slot("b", 4)];
        let native = SlotListPayload::from_slots(&slots).expect("encodes");
        let encoded = SlotListPayload::Encoded(
            serde_json::to_string(&slots).expect("serializes"),
        );

        assert_eq!(native.decode().expect("native decodes"), slots);
        assert_eq!(encoded.decode().expect("encoded decodes"), slots);
    }

    #[test]
    fn decode_reports_malformed_payloads() {
        let garbage = SlotListPayload::Encoded("{not json".to_string());
        assert!(matches!(garbage.decode(), Err(SlotDecodeError::Encoded(_))));

        let object = SlotListPayload::Encoded(r#"{"id":"a"}"#.to_string());
        assert!(matches!(
            object.decode(),
            Err(SlotDecodeError::NotAList { found: "object" })
        ));

        let bad_entry = SlotListPayload::Native(vec![json!({"id": "a"})]);
        assert!(matches!(
            bad_entry.decode(),
            Err(SlotDecodeError::Entry { index: 0, .. })
        ));

        let blank = SlotListPayload::Encoded("   ".to_string());
        assert!(blank.decode().expect("blank decodes").is_empty());

        let number: SlotListPayload = serde_json::from_value(json!(7)).expect("any json parses");
        assert!(matches!(
            number.decode(),
            Err(SlotDecodeError::NotAList { found: "number" })
        ));
    }

    #[test]
    fn bulk_prepare_booking_rewrites_only_the_target_entry() {
        let bulk = BulkAvailability {
            id: AvailabilityRecordId("bulk-1".to_string()),
            submission_id: SubmissionId("sub-1".to_string()),
            revision: 4,
            slots: vec![slot("a", 3), slot("b", 4), slot("c", 5)],
            selected: None,
        };

        let commit = bulk.prepare_booking(1, &metadata()).expect("index in range");
        let SlotCommit::Bulk(commit) = commit else {
            panic!("bulk source must produce a bulk commit");
        };

        assert_eq!(commit.expected_revision, 4);
        assert_eq!(commit.slots.len(), 3);
        assert_eq!(commit.slots[0], bulk.slots[0]);
        assert_eq!(commit.slots[2], bulk.slots[2]);
        assert!(commit.slots[1].is_booked);
        assert_eq!(commit.slot_id, SlotId("b".to_string()));
        assert_eq!(commit.selected.date, bulk.slots[1].date);
        assert!(bulk.prepare_booking(3, &metadata()).is_none());
    }

    #[test]
    fn remaining_dates_skips_booked_slots_and_deduplicates() {
        let mut booked = slot("b", 4);
        booked.is_booked = true;
        let slots = vec![slot("c", 5), booked, slot("a", 3), slot("d", 5)];

        let dates = remaining_dates(&slots);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid"),
                NaiveDate::from_ymd_opt(2025, 11, 5).expect("valid"),
            ]
        );
    }
}
