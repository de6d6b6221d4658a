//! Interview time-slot booking.
//!
//! A client claims exactly one slot from a freelancer's declared availability. Availability is
//! stored either as one bulk record holding a slot list or as one record per slot; both shapes
//! are read through [`AvailabilitySource`] and written through conditional commits on
//! [`AvailabilityStore`].

pub mod availability;
pub mod coordinator;
pub mod domain;
pub mod locator;
pub mod memory;
pub mod notify;
pub mod ownership;
pub mod router;
pub mod seed;
pub mod store;

#[cfg(test)]
mod tests;

pub use availability::{
    AvailabilityShape, AvailabilitySource, BulkAvailability, BulkAvailabilityRow, BulkSlotCommit,
    IndividualAvailability, IndividualSlotCommit, SlotCommit, SlotDecodeError, SlotInventory,
    SlotListPayload,
};
pub use coordinator::{
    BookingCoordinator, BookingError, BookingReceipt, BookingRequest, SlotNotFound,
};
pub use domain::{
    AvailabilityRecordId, BookingMetadata, BookingState, Identity, JobPosting, PostingId,
    SelectedSlotSummary, Slot, SlotId, SlotStatus, SlotView, Submission, SubmissionId,
    SubmissionStatus, SubmissionSummary,
};
pub use locator::{LocatedSlot, SlotLocator};
pub use memory::InMemoryBookingStore;
pub use notify::{
    BookingNotification, LogNotificationDispatcher, NotificationDispatcher, NotificationError,
};
pub use ownership::{OwnershipDenial, OwnershipGrant, OwnershipGuard, OwnershipPolicy};
pub use router::{
    booking_router, booking_router_with_authenticator, HeaderSessionAuthenticator,
    SessionAuthenticator,
};
pub use seed::{BookingSeed, SeedError};
pub use store::{AvailabilityStore, CommitOutcome, StoreError, SubmissionRepository};
