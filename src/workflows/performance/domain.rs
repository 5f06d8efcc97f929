use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganisationId(pub String);

/// Identifier wrapper for a review cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub String);

/// Identifier wrapper for an employee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

/// Identifier wrapper for a Key Result Area (competency category).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KraId(pub String);

/// The three review flavours that run inside one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    SelfReview,
    ManagerReview,
    CheckInWithManager,
}

impl ReviewType {
    /// Numeric ids kept stable for interop with historical review rows.
    pub const fn type_id(self) -> u8 {
        match self {
            Self::SelfReview => 1,
            Self::ManagerReview => 2,
            Self::CheckInWithManager => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SelfReview => "Self Review",
            Self::ManagerReview => "Manager Review",
            Self::CheckInWithManager => "Check-in with Manager",
        }
    }
}

/// Inclusive calendar-date window in the organisation's local time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Both bounds inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn encloses(&self, other: &DateWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Strictly after the end date, independent of any publish state.
    pub fn passed_by(&self, date: NaiveDate) -> bool {
        date > self.end
    }
}

/// The full set of date windows that describe one review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDates {
    pub cycle: DateWindow,
    pub self_review: DateWindow,
    pub manager_review: DateWindow,
    pub check_in: DateWindow,
}

/// Candidate cycle handed to the persistence gateway on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCycle {
    pub organisation_id: OrganisationId,
    pub dates: CycleDates,
    pub publish: bool,
}

/// A stored review cycle. Activity flags are never persisted; they are
/// derived per request via [`ReviewCycle::with_activity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCycle {
    pub cycle_id: CycleId,
    pub organisation_id: OrganisationId,
    pub dates: CycleDates,
    pub publish: bool,
    pub last_modified: NaiveDate,
}

/// One rated competency inside a review. Several entries may share a
/// `kra_id` when the KRA is assessed through more than one KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub kra_id: KraId,
    /// 1..=5 integer rating.
    pub rating: u8,
    pub commentary: String,
}

/// A reviewer's submission for one employee in one cycle, unique per
/// (cycle, review type, reviewed employee, reviewer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDetails {
    pub cycle_id: CycleId,
    pub review_type: ReviewType,
    pub review_to: EmployeeId,
    pub review_from: EmployeeId,
    pub draft: bool,
    pub published: bool,
    pub submitted_at: Option<NaiveDate>,
    /// KRA-weighted composite, see `rating::weighted_score`.
    pub average_rating: f64,
    pub entries: Vec<ReviewEntry>,
}

/// Weight assigned to one KRA for a cycle, as an integer percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KraWeightage {
    pub kra_id: KraId,
    pub kra_name: String,
    pub weightage: u16,
}

/// The employee's currently active manager mapping. Either slot may be
/// vacant; mapping mutation is owned elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerAssignment {
    pub first_manager: Option<EmployeeId>,
    pub second_manager: Option<EmployeeId>,
}

impl ManagerAssignment {
    pub fn reviewers(&self) -> Vec<EmployeeId> {
        self.first_manager
            .iter()
            .chain(self.second_manager.iter())
            .cloned()
            .collect()
    }
}

/// Who performed a mutating operation, threaded into the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub employee_id: EmployeeId,
    pub ip_address: Option<String>,
}

impl ActorContext {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: EmployeeId(employee_id.into()),
            ip_address: None,
        }
    }
}
