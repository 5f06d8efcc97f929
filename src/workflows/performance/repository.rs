use serde::{Deserialize, Serialize};

use super::domain::{
    CycleId, EmployeeId, KraId, KraWeightage, ManagerAssignment, NewCycle, OrganisationId,
    ReviewCycle, ReviewDetails, ReviewType,
};

/// Closed set of constraint-violation reasons a store may report. The
/// orchestrator matches on these instead of raw error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The candidate range overlaps an existing cycle for the organisation.
    Overlap,
    /// Another cycle is already published for the organisation.
    ActiveCycle,
    /// Anything the gateway could not classify.
    Other,
}

/// Map a store's raw constraint text onto a [`ConflictKind`]. This is the
/// single place allowed to inspect persistence error strings; the marker
/// substrings are the index/constraint names used by the schema.
pub fn classify_constraint(raw: &str) -> ConflictKind {
    if raw.contains("no_overlap") || raw.contains("overlap_review_cycle") {
        ConflictKind::Overlap
    } else if raw.contains("organisation_id_publish_idx") {
        ConflictKind::ActiveCycle
    } else {
        ConflictKind::Other
    }
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("constraint violated: {0:?}")]
    Conflict(ConflictKind),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Lookup key for stored reviews: one reviewed employee, any of the given
/// reviewers, within one cycle and review type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSelector {
    pub cycle_id: CycleId,
    pub review_type: ReviewType,
    pub review_to: EmployeeId,
    pub review_from: Vec<EmployeeId>,
}

/// Durable storage boundary for cycles, reviews, weightages, and the
/// read-only manager mapping. Implementations surface uniqueness and
/// overlap violations as [`RepositoryError::Conflict`] so the service can
/// translate them without touching raw error text.
pub trait CycleRepository: Send + Sync {
    fn fetch_active_cycle(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<ReviewCycle>, RepositoryError>;

    fn fetch_cycles(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<ReviewCycle>, RepositoryError>;

    fn create_cycle(&self, cycle: NewCycle) -> Result<ReviewCycle, RepositoryError>;

    /// Full replace of the date fields and publish flag.
    fn update_cycle(
        &self,
        cycle_id: &CycleId,
        cycle: NewCycle,
    ) -> Result<ReviewCycle, RepositoryError>;

    /// Flip `publish` to false, nothing else.
    fn unpublish(&self, cycle_id: &CycleId) -> Result<(), RepositoryError>;

    fn fetch_review_details(
        &self,
        selector: &ReviewSelector,
    ) -> Result<Vec<ReviewDetails>, RepositoryError>;

    /// Create on first save, replace on subsequent saves of the same
    /// (cycle, type, reviewed, reviewer) tuple.
    fn upsert_review(&self, details: ReviewDetails) -> Result<ReviewDetails, RepositoryError>;

    fn kra_weightages(
        &self,
        cycle_id: &CycleId,
        kra_ids: &[KraId],
    ) -> Result<Vec<KraWeightage>, RepositoryError>;

    /// True once every required manager review for the employee in the
    /// cycle has been published.
    fn all_manager_reviews_complete(
        &self,
        employee_id: &EmployeeId,
        cycle_id: &CycleId,
    ) -> Result<bool, RepositoryError>;

    /// The employee's currently active manager mapping.
    fn current_managers(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<ManagerAssignment, RepositoryError>;

    fn organisation_employees(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<EmployeeId>, RepositoryError>;
}

/// KRA/KPI catalogue completeness checks delegated to the configuration
/// subsystem. Non-empty answers block cycle creation.
pub trait KpiCatalog: Send + Sync {
    fn kras_missing_kpis(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<KraId>, RepositoryError>;

    fn designations_missing_kra_kpis(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<String>, RepositoryError>;
}

/// Outbound notification intent. The service builds these and dispatches
/// them best-effort; delivery transports (email, Slack) live behind the
/// gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationIntent {
    PhaseStarted {
        organisation_id: OrganisationId,
        cycle_id: CycleId,
        phase: ReviewType,
    },
    SubmissionComplete {
        organisation_id: OrganisationId,
        cycle_id: CycleId,
        review_type: ReviewType,
        employee_id: EmployeeId,
        recipient: EmployeeId,
    },
    ManagerReviewsComplete {
        organisation_id: OrganisationId,
        cycle_id: CycleId,
        employee_id: EmployeeId,
        recipient: EmployeeId,
    },
    CycleDatesChanged {
        organisation_id: OrganisationId,
        cycle_id: CycleId,
        recipient: EmployeeId,
    },
}

/// Trait describing outbound notification hooks (email/Slack adapters).
pub trait NotificationGateway: Send + Sync {
    fn publish(&self, intent: NotificationIntent) -> Result<(), NotifyError>;
}

/// Notification dispatch error. Never rolls back the triggering write.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// One user-activity audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub actor_id: EmployeeId,
    pub module: &'static str,
    pub activity: &'static str,
    pub description: String,
    pub ip_address: Option<String>,
}

/// Best-effort audit sink.
pub trait ActivityLog: Send + Sync {
    fn record(&self, entry: ActivityRecord) -> Result<(), ActivityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("activity log unavailable: {0}")]
    Unavailable(String),
}
