use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for freelancer submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

/// Identifier wrapper for job postings (the parent form of a submission).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingId(pub String);

/// Slot identifier, unique within the availability record that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub String);

/// Identifier of the physical availability row a slot lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityRecordId(pub String);

macro_rules! impl_id_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl $ty {
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }
        )*
    };
}

impl_id_display!(SubmissionId, PostingId, SlotId, AvailabilityRecordId);

/// Caller identity resolved by the session layer before the booking flow runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| Some(self.email.as_str()).filter(|email| !email.trim().is_empty()))
            .unwrap_or(self.id.as_str())
    }
}

/// Job posting owning a set of submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: PostingId,
    pub name: String,
    #[serde(default, alias = "client_id")]
    pub client_id: Option<String>,
    #[serde(default, alias = "created_by")]
    pub created_by: Option<String>,
}

/// Lifecycle status persisted on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    New,
    Reviewed,
    Selected,
    TimeSlotSelected,
    Rejected,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Reviewed => "reviewed",
            SubmissionStatus::Selected => "selected",
            SubmissionStatus::TimeSlotSelected => "time_slot_selected",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

/// Booking-flow view of a submission, derived from `is_selected` and `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    Unselected,
    FreelancerSelected,
    SlotBooked,
}

/// A freelancer's application against a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    #[serde(alias = "posting_id", alias = "formId")]
    pub posting_id: PostingId,
    #[serde(alias = "applicant_name")]
    pub applicant_name: String,
    #[serde(alias = "applicant_email")]
    pub applicant_email: String,
    #[serde(default, alias = "is_selected")]
    pub is_selected: bool,
    pub status: SubmissionStatus,
    #[serde(default, alias = "selected_time_slot_id")]
    pub selected_time_slot_id: Option<AvailabilityRecordId>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn booking_state(&self) -> BookingState {
        if self.status == SubmissionStatus::TimeSlotSelected {
            BookingState::SlotBooked
        } else if self.is_selected || self.status == SubmissionStatus::Selected {
            BookingState::FreelancerSelected
        } else {
            BookingState::Unselected
        }
    }

    pub fn summary(&self) -> SubmissionSummary {
        SubmissionSummary {
            id: self.id.clone(),
            status: self.status.label(),
            selected_time_slot_id: self.selected_time_slot_id.clone(),
            applicant_name: self.applicant_name.clone(),
        }
    }
}

/// Sanitized submission view returned to booking callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: SubmissionId,
    pub status: &'static str,
    pub selected_time_slot_id: Option<AvailabilityRecordId>,
    pub applicant_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Offered,
    Booked,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// One concrete bookable interview window.
///
/// Field names follow the camelCase form written by the availability entry flow; the
/// snake_case spellings found on older rows are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub date: NaiveDate,
    #[serde(alias = "start_time", with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(alias = "end_time", with = "clock_time")]
    pub end_time: NaiveTime,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default, alias = "is_booked")]
    pub is_booked: bool,
    #[serde(default)]
    pub status: SlotStatus,
    #[serde(
        default,
        alias = "selected_by_client_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_by_client_id: Option<String>,
    #[serde(default, alias = "selected_at", skip_serializing_if = "Option::is_none")]
    pub selected_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "client_notes", skip_serializing_if = "Option::is_none")]
    pub client_notes: Option<String>,
}

impl Slot {
    pub fn offered(
        id: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: SlotId(id.into()),
            date,
            start_time,
            end_time,
            timezone: timezone.into(),
            is_booked: false,
            status: SlotStatus::Offered,
            selected_by_client_id: None,
            selected_at: None,
            client_notes: None,
        }
    }

    /// Copy of this slot marked as claimed by the given client.
    pub fn booked_by(&self, metadata: &BookingMetadata) -> Self {
        Self {
            is_booked: true,
            status: SlotStatus::Booked,
            selected_by_client_id: Some(metadata.client_id.clone()),
            selected_at: Some(metadata.selected_at),
            client_notes: metadata.client_notes.clone(),
            ..self.clone()
        }
    }

    pub fn summary(&self) -> SelectedSlotSummary {
        SelectedSlotSummary {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            timezone: self.timezone.clone(),
        }
    }

    pub fn view(&self) -> SlotView {
        SlotView {
            id: self.id.clone(),
            date: self.date,
            start_time: self.start_time.format("%H:%M").to_string(),
            end_time: self.end_time.format("%H:%M").to_string(),
            timezone: self.timezone.clone(),
        }
    }
}

/// Who claimed a slot, when, and with what notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingMetadata {
    pub client_id: String,
    pub selected_at: DateTime<Utc>,
    pub client_notes: Option<String>,
}

/// Denormalized copy of the last booked slot kept on bulk records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSlotSummary {
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub timezone: String,
}

/// Client-facing representation of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: SlotId,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
}

/// `HH:MM` wall-clock times, with optional seconds accepted on input.
pub(crate) mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn parse(raw: &str) -> Result<NaiveTime, String> {
        let trimmed = raw.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
    }

    pub(crate) fn serialize<S>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format("%H:%M").to_string())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
