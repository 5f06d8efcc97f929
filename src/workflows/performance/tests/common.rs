use std::sync::Arc;

use chrono::NaiveDate;

use crate::infra::{
    InMemoryActivityLog, InMemoryCycleRepository, InMemoryKpiCatalog, InMemoryNotificationGateway,
};
use crate::workflows::performance::domain::{
    ActorContext, CycleDates, CycleId, DateWindow, EmployeeId, KraId, KraWeightage,
    ManagerAssignment, NewCycle, OrganisationId, ReviewCycle, ReviewEntry,
};
use crate::workflows::performance::repository::{
    ActivityError, ActivityLog, ActivityRecord, ConflictKind, CycleRepository, NotificationGateway,
    NotificationIntent, NotifyError, RepositoryError, ReviewSelector,
};
use crate::workflows::performance::service::{PerformanceReviewService, ReviewSubmission};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Half-year cycle with the three review windows inside it.
pub(super) fn sample_dates() -> CycleDates {
    CycleDates {
        cycle: DateWindow::new(date(2026, 1, 1), date(2026, 6, 30)),
        self_review: DateWindow::new(date(2026, 5, 1), date(2026, 5, 15)),
        manager_review: DateWindow::new(date(2026, 5, 16), date(2026, 6, 10)),
        check_in: DateWindow::new(date(2026, 6, 11), date(2026, 6, 25)),
    }
}

pub(super) fn organisation() -> OrganisationId {
    OrganisationId("org-coral".to_string())
}

pub(super) fn sample_cycle(publish: bool) -> ReviewCycle {
    ReviewCycle {
        cycle_id: CycleId("cycle-0001".to_string()),
        organisation_id: organisation(),
        dates: sample_dates(),
        publish,
        last_modified: date(2026, 1, 1),
    }
}

pub(super) fn new_cycle(publish: bool) -> NewCycle {
    NewCycle {
        organisation_id: organisation(),
        dates: sample_dates(),
        publish,
    }
}

pub(super) fn weightages() -> Vec<KraWeightage> {
    vec![
        KraWeightage {
            kra_id: KraId("KRA1".to_string()),
            kra_name: "Results".to_string(),
            weightage: 40,
        },
        KraWeightage {
            kra_id: KraId("KRA2".to_string()),
            kra_name: "Professional Development".to_string(),
            weightage: 35,
        },
        KraWeightage {
            kra_id: KraId("KRA3".to_string()),
            kra_name: "Core Values".to_string(),
            weightage: 25,
        },
    ]
}

/// Two KPIs under KRA1 plus one rating each for KRA2 and KRA3.
pub(super) fn entries() -> Vec<ReviewEntry> {
    vec![
        ReviewEntry {
            kra_id: KraId("KRA1".to_string()),
            rating: 5,
            commentary: "Shipped the quarterly roadmap".to_string(),
        },
        ReviewEntry {
            kra_id: KraId("KRA1".to_string()),
            rating: 4,
            commentary: "Strong delivery cadence".to_string(),
        },
        ReviewEntry {
            kra_id: KraId("KRA2".to_string()),
            rating: 3,
            commentary: "Certification still pending".to_string(),
        },
        ReviewEntry {
            kra_id: KraId("KRA3".to_string()),
            rating: 5,
            commentary: "Lives the team values".to_string(),
        },
    ]
}

pub(super) fn employee() -> EmployeeId {
    EmployeeId("emp-101".to_string())
}

pub(super) fn first_manager() -> EmployeeId {
    EmployeeId("mgr-1".to_string())
}

pub(super) fn second_manager() -> EmployeeId {
    EmployeeId("mgr-2".to_string())
}

pub(super) fn self_submission(published: bool) -> ReviewSubmission {
    ReviewSubmission {
        organisation_id: organisation(),
        review_to: employee(),
        review_from: employee(),
        entries: entries(),
        draft: !published,
        published,
    }
}

pub(super) fn manager_submission(reviewer: EmployeeId, published: bool) -> ReviewSubmission {
    ReviewSubmission {
        organisation_id: organisation(),
        review_to: employee(),
        review_from: reviewer,
        entries: entries(),
        draft: !published,
        published,
    }
}

pub(super) fn actor() -> ActorContext {
    ActorContext::new("hr-admin")
}

pub(super) type Service = PerformanceReviewService<
    InMemoryCycleRepository,
    InMemoryKpiCatalog,
    InMemoryNotificationGateway,
    InMemoryActivityLog,
>;

pub(super) struct Harness {
    pub(super) service: Arc<Service>,
    pub(super) repository: Arc<InMemoryCycleRepository>,
    pub(super) catalog: Arc<InMemoryKpiCatalog>,
    pub(super) notifier: Arc<InMemoryNotificationGateway>,
    pub(super) activity: Arc<InMemoryActivityLog>,
}

pub(super) fn build_harness() -> Harness {
    let repository = Arc::new(InMemoryCycleRepository::default());
    repository.seed_weightages(weightages());
    repository.assign_managers(
        employee(),
        ManagerAssignment {
            first_manager: Some(first_manager()),
            second_manager: Some(second_manager()),
        },
    );

    let catalog = Arc::new(InMemoryKpiCatalog::default());
    let notifier = Arc::new(InMemoryNotificationGateway::default());
    let activity = Arc::new(InMemoryActivityLog::default());

    let service = Arc::new(PerformanceReviewService::new(
        repository.clone(),
        catalog.clone(),
        notifier.clone(),
        activity.clone(),
    ));

    Harness {
        service,
        repository,
        catalog,
        notifier,
        activity,
    }
}

/// Repository double whose writes fail with a constraint the gateway
/// cannot classify.
pub(super) struct UnclassifiedConflictRepository;

impl CycleRepository for UnclassifiedConflictRepository {
    fn fetch_active_cycle(
        &self,
        _organisation_id: &OrganisationId,
    ) -> Result<Option<ReviewCycle>, RepositoryError> {
        Ok(None)
    }

    fn fetch_cycles(
        &self,
        _organisation_id: &OrganisationId,
    ) -> Result<Vec<ReviewCycle>, RepositoryError> {
        Ok(Vec::new())
    }

    fn create_cycle(&self, _cycle: NewCycle) -> Result<ReviewCycle, RepositoryError> {
        Err(RepositoryError::Conflict(ConflictKind::Other))
    }

    fn update_cycle(
        &self,
        _cycle_id: &CycleId,
        _cycle: NewCycle,
    ) -> Result<ReviewCycle, RepositoryError> {
        Err(RepositoryError::Conflict(ConflictKind::Other))
    }

    fn unpublish(&self, _cycle_id: &CycleId) -> Result<(), RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn fetch_review_details(
        &self,
        _selector: &ReviewSelector,
    ) -> Result<Vec<crate::workflows::performance::ReviewDetails>, RepositoryError> {
        Ok(Vec::new())
    }

    fn upsert_review(
        &self,
        details: crate::workflows::performance::ReviewDetails,
    ) -> Result<crate::workflows::performance::ReviewDetails, RepositoryError> {
        Ok(details)
    }

    fn kra_weightages(
        &self,
        _cycle_id: &CycleId,
        _kra_ids: &[KraId],
    ) -> Result<Vec<KraWeightage>, RepositoryError> {
        Ok(Vec::new())
    }

    fn all_manager_reviews_complete(
        &self,
        _employee_id: &EmployeeId,
        _cycle_id: &CycleId,
    ) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn current_managers(
        &self,
        _employee_id: &EmployeeId,
    ) -> Result<ManagerAssignment, RepositoryError> {
        Ok(ManagerAssignment::default())
    }

    fn organisation_employees(
        &self,
        _organisation_id: &OrganisationId,
    ) -> Result<Vec<EmployeeId>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Notification gateway whose transport is down.
pub(super) struct FailingNotifier;

impl NotificationGateway for FailingNotifier {
    fn publish(&self, _intent: NotificationIntent) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp offline".to_string()))
    }
}

/// Activity sink whose store is down.
pub(super) struct FailingActivityLog;

impl ActivityLog for FailingActivityLog {
    fn record(&self, _entry: ActivityRecord) -> Result<(), ActivityError> {
        Err(ActivityError::Unavailable("audit store offline".to_string()))
    }
}
