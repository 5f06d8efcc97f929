use chrono::NaiveDate;

use super::domain::{ReviewCycle, ReviewType};

/// Submission attempted outside the review type's open window. The same
/// message is raised whether the window is still ahead or already behind;
/// callers rely on the exact wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeadlineError {
    #[error("Deadline for Self Review has passed. Sorry, you're late!")]
    SelfReviewClosed,
    #[error("Deadline for Manager Review has passed. Sorry, you're late!")]
    ManagerReviewClosed,
    #[error("Deadline for Check-in with Manager has passed. Sorry, you're late!")]
    CheckInClosed,
}

impl DeadlineError {
    const fn for_type(review_type: ReviewType) -> Self {
        match review_type {
            ReviewType::SelfReview => Self::SelfReviewClosed,
            ReviewType::ManagerReview => Self::ManagerReviewClosed,
            ReviewType::CheckInWithManager => Self::CheckInClosed,
        }
    }
}

/// Decide whether a submission of `review_type` is permitted right now.
/// Applies to drafts and published submissions alike.
pub fn check_submission(
    review_type: ReviewType,
    cycle: &ReviewCycle,
    today: NaiveDate,
) -> Result<(), DeadlineError> {
    let snapshot = cycle.with_activity(today);
    if snapshot.is_active(review_type) {
        Ok(())
    } else {
        Err(DeadlineError::for_type(review_type))
    }
}

/// Laxer rule used on the manager-review save path: the submission is
/// permitted until the window's end date passes, even before the window
/// formally opens.
pub fn check_deadline(
    review_type: ReviewType,
    cycle: &ReviewCycle,
    today: NaiveDate,
) -> Result<(), DeadlineError> {
    let snapshot = cycle.with_activity(today);
    if snapshot.date_passed(review_type) {
        Err(DeadlineError::for_type(review_type))
    } else {
        Ok(())
    }
}

/// Org-wide check used to freeze manager reassignment once submissions are
/// underway: true when `date` falls inside `[manager review start,
/// check-in end]` of any published cycle.
pub fn is_review_submission_started(cycles: &[ReviewCycle], date: NaiveDate) -> bool {
    cycles.iter().any(|cycle| {
        cycle.publish
            && cycle.dates.manager_review.start <= date
            && date <= cycle.dates.check_in.end
    })
}
