use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{DateWindow, ReviewCycle, ReviewType};

/// A review cycle annotated with the activity and deadline flags derived
/// from a caller-supplied organisation-local date. The flags are never
/// stored; they are recomputed on every read so that "now" stays an
/// explicit input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSnapshot {
    pub cycle: ReviewCycle,
    pub evaluated_on: NaiveDate,
    pub is_cycle_active: bool,
    pub is_self_review_active: bool,
    pub is_manager_review_active: bool,
    pub is_check_in_active: bool,
    pub self_review_date_passed: bool,
    pub manager_review_date_passed: bool,
    pub check_in_date_passed: bool,
}

impl ReviewCycle {
    /// Pure transform: activity requires `publish` and the date inside the
    /// matching window; the passed flags ignore `publish` entirely.
    pub fn with_activity(&self, today: NaiveDate) -> CycleSnapshot {
        let dates = &self.dates;
        CycleSnapshot {
            cycle: self.clone(),
            evaluated_on: today,
            is_cycle_active: self.publish && dates.cycle.contains(today),
            is_self_review_active: self.publish && dates.self_review.contains(today),
            is_manager_review_active: self.publish && dates.manager_review.contains(today),
            is_check_in_active: self.publish && dates.check_in.contains(today),
            self_review_date_passed: dates.self_review.passed_by(today),
            manager_review_date_passed: dates.manager_review.passed_by(today),
            check_in_date_passed: dates.check_in.passed_by(today),
        }
    }
}

impl CycleSnapshot {
    pub fn is_active(&self, review_type: ReviewType) -> bool {
        match review_type {
            ReviewType::SelfReview => self.is_self_review_active,
            ReviewType::ManagerReview => self.is_manager_review_active,
            ReviewType::CheckInWithManager => self.is_check_in_active,
        }
    }

    pub fn date_passed(&self, review_type: ReviewType) -> bool {
        match review_type {
            ReviewType::SelfReview => self.self_review_date_passed,
            ReviewType::ManagerReview => self.manager_review_date_passed,
            ReviewType::CheckInWithManager => self.check_in_date_passed,
        }
    }

    /// Phase-by-phase rendering of the cycle for reports and the CLI.
    pub fn timeline(&self) -> Vec<TimelineRow> {
        let dates = &self.cycle.dates;
        let rows = [
            ("Review Cycle", dates.cycle, self.is_cycle_active),
            (
                ReviewType::SelfReview.label(),
                dates.self_review,
                self.is_self_review_active,
            ),
            (
                ReviewType::ManagerReview.label(),
                dates.manager_review,
                self.is_manager_review_active,
            ),
            (
                ReviewType::CheckInWithManager.label(),
                dates.check_in,
                self.is_check_in_active,
            ),
        ];

        rows.into_iter()
            .map(|(label, window, active)| TimelineRow {
                label,
                window,
                state: PhaseState::on(window, self.evaluated_on),
                active,
            })
            .collect()
    }
}

/// Where a window sits relative to the evaluation date, ignoring publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    Upcoming,
    Open,
    Closed,
}

impl PhaseState {
    fn on(window: DateWindow, date: NaiveDate) -> Self {
        if date < window.start {
            Self::Upcoming
        } else if window.passed_by(date) {
            Self::Closed
        } else {
            Self::Open
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// One phase row of a cycle timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub label: &'static str,
    pub window: DateWindow,
    pub state: PhaseState,
    /// Publish-gated activity, unlike `state` which tracks dates only.
    pub active: bool,
}
