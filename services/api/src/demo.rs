use crate::infra::{build_coordinator, store_from_seed_file};
use clap::Args;
use std::path::PathBuf;
use talent_booking::config::BookingConfig;
use talent_booking::error::AppError;
use talent_booking::workflows::booking::{
    AvailabilityStore, BookingError, BookingReceipt, BookingRequest, BookingSeed, Identity,
    InMemoryBookingStore, SlotView, SubmissionId,
};

const DEMO_SEED: &str = include_str!("../fixtures/demo_seed.json");

#[derive(Args, Debug)]
pub(crate) struct SlotsArgs {
    /// JSON seed holding postings, submissions, and availability rows
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Submission whose slots should be listed
    #[arg(long)]
    pub(crate) submission: String,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Seed file to book against (defaults to the bundled demo seed)
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Submission to book for
    #[arg(long, default_value = "S1")]
    pub(crate) submission: String,
    /// Slot id to claim
    #[arg(long, default_value = "b")]
    pub(crate) slot: String,
    /// Caller id, matched against the posting's client id
    #[arg(long, default_value = "client-1")]
    pub(crate) client_id: String,
    /// Caller email, matched against the posting's creator
    #[arg(long, default_value = "hiring@acme.example")]
    pub(crate) client_email: String,
    /// Optional notes stored on the booked slot
    #[arg(long)]
    pub(crate) notes: Option<String>,
}

pub(crate) async fn run_slot_inventory(args: SlotsArgs) -> Result<(), AppError> {
    let store = store_from_seed_file(&args.seed)?;
    let submission_id = SubmissionId(args.submission);
    let inventory = store.slot_inventory(&submission_id).await?;

    println!("{}", serde_json::to_string_pretty(&inventory)?);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = match args.seed.as_deref() {
        Some(path) => store_from_seed_file(path)?,
        None => InMemoryBookingStore::from_seed(BookingSeed::from_json(DEMO_SEED)?)?,
    };
    let config = BookingConfig {
        operator_emails: vec!["ops@talent.example".to_string()],
        ..BookingConfig::default()
    };
    let coordinator = build_coordinator(store, &config);
    let caller = Identity {
        id: args.client_id,
        email: args.client_email,
        name: None,
    };

    println!("Interview booking demo");
    match coordinator
        .available_slots(&args.submission, Some(&caller))
        .await
    {
        Ok(slots) => render_slots(&args.submission, &slots),
        Err(err) => {
            render_error(&err);
            return Ok(());
        }
    }

    let request = BookingRequest {
        submission_id: args.submission.clone(),
        slot_id: args.slot.clone(),
        client_notes: args.notes,
    };

    match coordinator
        .select_time_slot(request.clone(), Some(&caller))
        .await
    {
        Ok(receipt) => render_receipt(&receipt)?,
        Err(err) => {
            render_error(&err);
            return Ok(());
        }
    }

    println!("\nRepeating the same request");
    match coordinator.select_time_slot(request, Some(&caller)).await {
        Ok(receipt) => render_receipt(&receipt)?,
        Err(err) => render_error(&err),
    }

    Ok(())
}

fn render_slots(submission: &str, slots: &[SlotView]) {
    println!("\nOpen slots for submission {submission}");
    if slots.is_empty() {
        println!("  (none)");
    }
    for slot in slots {
        println!(
            "  - {} {} {}-{} {}",
            slot.id, slot.date, slot.start_time, slot.end_time, slot.timezone
        );
    }
}

fn render_receipt(receipt: &BookingReceipt) -> Result<(), AppError> {
    println!(
        "\nBooked slot {} on {} {}-{} ({}) from {:?} record {}",
        receipt.selected_slot.id,
        receipt.selected_slot.date,
        receipt.selected_slot.start_time,
        receipt.selected_slot.end_time,
        receipt.selected_slot.timezone,
        receipt.shape,
        receipt.record_id
    );
    println!("{}", serde_json::to_string_pretty(receipt)?);
    Ok(())
}

fn render_error(err: &BookingError) {
    println!("\nBooking rejected [{}]: {err}", err.code());
    if let BookingError::SlotNotFound(diagnostics) = err {
        let known: Vec<&str> = diagnostics
            .known_slot_ids
            .iter()
            .map(|id| id.as_str())
            .collect();
        println!("  known slot ids: {}", known.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_seed_hydrates_a_store() {
        let seed = BookingSeed::from_json(DEMO_SEED).expect("demo seed parses");
        assert_eq!(seed.submissions.len(), 2);
        InMemoryBookingStore::from_seed(seed).expect("demo seed hydrates");
    }

    #[tokio::test]
    async fn demo_runs_against_bundled_seed() {
        let args = DemoArgs {
            seed: None,
            submission: "S4".to_string(),
            slot: "d".to_string(),
            client_id: "client-1".to_string(),
            client_email: "hiring@acme.example".to_string(),
            notes: Some("Video call".to_string()),
        };
        run_demo(args).await.expect("demo completes");
    }
}
