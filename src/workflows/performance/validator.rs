use super::domain::CycleDates;

/// Structural date-ordering failures for a candidate cycle. Messages are
/// surfaced verbatim to the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateRuleViolation {
    #[error("End date should be greater than start date")]
    CycleEndNotAfterStart,
    #[error("Self review End date should be greater than Self review start date")]
    SelfReviewEndNotAfterStart,
    #[error("Manager review End date should be greater than Manager review start date")]
    ManagerReviewEndNotAfterStart,
    #[error("Check-in End date should be greater than Check-in start date")]
    CheckInEndNotAfterStart,
    #[error("Self review and Manager review dates should be in between review cycle dates")]
    ReviewWindowsOutsideCycle,
    #[error("Check-in dates should be in between review cycle dates")]
    CheckInOutsideCycle,
}

/// Validate a candidate cycle's windows before any persistence attempt.
/// Rules run in a fixed order and the first failure wins.
pub fn validate_dates(dates: &CycleDates) -> Result<(), DateRuleViolation> {
    if dates.cycle.end <= dates.cycle.start {
        return Err(DateRuleViolation::CycleEndNotAfterStart);
    }

    if dates.self_review.end <= dates.self_review.start {
        return Err(DateRuleViolation::SelfReviewEndNotAfterStart);
    }

    if dates.manager_review.end <= dates.manager_review.start {
        return Err(DateRuleViolation::ManagerReviewEndNotAfterStart);
    }

    if dates.check_in.end <= dates.check_in.start {
        return Err(DateRuleViolation::CheckInEndNotAfterStart);
    }

    if !dates.cycle.encloses(&dates.self_review) || !dates.cycle.encloses(&dates.manager_review) {
        return Err(DateRuleViolation::ReviewWindowsOutsideCycle);
    }

    if !dates.cycle.encloses(&dates.check_in) {
        return Err(DateRuleViolation::CheckInOutsideCycle);
    }

    Ok(())
}
