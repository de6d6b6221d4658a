use super::common::*;

use crate::workflows::booking::domain::Identity;
use crate::workflows::booking::ownership::{
    OwnershipDenial, OwnershipGrant, OwnershipGuard, OwnershipPolicy,
};

fn caller(id: &str, email: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: email.to_string(),
        name: None,
    }
}

#[test]
fn posting_client_is_granted() {
    let guard = OwnershipGuard::default();
    let grant = guard
        .authorize(&client(), &selected("S1"), Some(&posting()))
        .expect("client owns the posting");
    assert_eq!(grant, OwnershipGrant::PostingClient);
}

#[test]
fn posting_creator_matches_by_id_or_email() {
    let guard = OwnershipGuard::default();
    let submission = selected("S1");

    let by_email = caller("recruiter-77", "Recruiter@Acme.example");
    assert_eq!(
        guard.authorize(&by_email, &submission, Some(&posting())),
        Ok(OwnershipGrant::PostingCreator)
    );

    let mut posting = posting();
    posting.created_by = Some("recruiter-77".to_string());
    let by_id = caller("recruiter-77", "other@acme.example");
    assert_eq!(
        guard.authorize(&by_id, &submission, Some(&posting)),
        Ok(OwnershipGrant::PostingCreator)
    );
}

#[test]
fn unrelated_caller_is_denied() {
    let guard = OwnershipGuard::default();
    assert_eq!(
        guard.authorize(&stranger(), &selected("S1"), Some(&posting())),
        Err(OwnershipDenial::NotPostingOwner)
    );
}

#[test]
fn missing_posting_denies_even_the_client() {
    let guard = OwnershipGuard::default();
    assert_eq!(
        guard.authorize(&client(), &selected("S1"), None),
        Err(OwnershipDenial::PostingUnavailable)
    );
}

#[test]
fn blank_creator_never_matches_blank_email() {
    let guard = OwnershipGuard::default();
    let mut posting = posting();
    posting.client_id = None;
    posting.created_by = Some("  ".to_string());

    assert_eq!(
        guard.authorize(&caller("someone", " "), &selected("S1"), Some(&posting)),
        Err(OwnershipDenial::NotPostingOwner)
    );
}

#[test]
fn applicant_bypass_requires_policy_and_matching_email() {
    let applicant = caller("freelancer-1", "s1@freelancers.example");
    let submission = selected("S1");

    let strict = OwnershipGuard::default();
    assert!(!strict.policy().allows_applicant_self_booking());
    assert_eq!(
        strict.authorize(&applicant, &submission, Some(&posting())),
        Err(OwnershipDenial::NotPostingOwner)
    );

    let relaxed = OwnershipGuard::with_policy(OwnershipPolicy::new(true));
    assert_eq!(
        relaxed.authorize(&applicant, &submission, Some(&posting())),
        Ok(OwnershipGrant::ApplicantSelfBooking)
    );
    assert_eq!(
        relaxed.authorize(&applicant, &submission, None),
        Ok(OwnershipGrant::ApplicantSelfBooking)
    );
    assert_eq!(
        relaxed.authorize(&stranger(), &submission, None),
        Err(OwnershipDenial::PostingUnavailable)
    );
}
