use tracing::warn;

use super::domain::{Identity, JobPosting, Submission};

/// Why a caller was allowed to act on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipGrant {
    PostingClient,
    PostingCreator,
    /// Test-mode carve-out: the caller is the applicant exercising their own flow.
    ApplicantSelfBooking,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipDenial {
    #[error("job posting for this submission could not be found")]
    PostingUnavailable,
    #[error("caller does not own the job posting")]
    NotPostingOwner,
}

/// Policy dial for the ownership check.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipPolicy {
    allow_applicant_self_booking: bool,
}

impl OwnershipPolicy {
    pub fn new(allow_applicant_self_booking: bool) -> Self {
        Self {
            allow_applicant_self_booking,
        }
    }

    pub fn allows_applicant_self_booking(&self) -> bool {
        self.allow_applicant_self_booking
    }
}

/// Decides whether a caller may book on behalf of a job posting.
#[derive(Debug, Clone, Default)]
pub struct OwnershipGuard {
    policy: OwnershipPolicy,
}

impl OwnershipGuard {
    pub fn with_policy(policy: OwnershipPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OwnershipPolicy {
        &self.policy
    }

    pub fn authorize(
        &self,
        caller: &Identity,
        submission: &Submission,
        posting: Option<&JobPosting>,
    ) -> Result<OwnershipGrant, OwnershipDenial> {
        if let Some(posting) = posting {
            if posting.client_id.as_deref() == Some(caller.id.as_str()) {
                return Ok(OwnershipGrant::PostingClient);
            }

            let created_by_caller = posting.created_by.as_deref().is_some_and(|creator| {
                creator == caller.id || same_email(creator, &caller.email)
            });
            if created_by_caller {
                return Ok(OwnershipGrant::PostingCreator);
            }
        }

        if self.policy.allow_applicant_self_booking
            && same_email(&submission.applicant_email, &caller.email)
        {
            warn!(
                submission_id = %submission.id,
                caller_id = %caller.id,
                "ownership bypassed: applicant booking their own submission"
            );
            return Ok(OwnershipGrant::ApplicantSelfBooking);
        }

        match posting {
            Some(_) => Err(OwnershipDenial::NotPostingOwner),
            None => Err(OwnershipDenial::PostingUnavailable),
        }
    }
}

fn same_email(left: &str, right: &str) -> bool {
    let left = left.trim();
    !left.is_empty() && left.eq_ignore_ascii_case(right.trim())
}
