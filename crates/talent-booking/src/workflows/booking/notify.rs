use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::domain::{SlotId, SubmissionId};

/// Operator e-mail describing a confirmed interview slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotification {
    pub template: String,
    pub recipients: Vec<String>,
    pub submission_id: SubmissionId,
    pub slot_id: SlotId,
    pub posting_name: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub client_name: String,
    pub client_email: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_notes: Option<String>,
}

impl BookingNotification {
    pub fn subject(&self) -> String {
        format!(
            "Interview booked: {} for {} on {} {}-{} ({})",
            self.applicant_name,
            self.posting_name,
            self.date,
            self.start_time,
            self.end_time,
            self.timezone
        )
    }
}

/// Outbound delivery hook (SMTP relay, transactional mail API, ...).
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: BookingNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("no notification recipients configured")]
    NoRecipients,
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Dispatcher that writes notifications to the tracing log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn dispatch(&self, notification: BookingNotification) -> Result<(), NotificationError> {
        if notification.recipients.is_empty() {
            return Err(NotificationError::NoRecipients);
        }

        info!(
            template = %notification.template,
            recipients = ?notification.recipients,
            submission_id = %notification.submission_id,
            subject = %notification.subject(),
            "booking notification dispatched"
        );
        Ok(())
    }
}
