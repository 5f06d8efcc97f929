use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use super::cycle::CycleSnapshot;
use super::domain::{
    ActorContext, CycleId, EmployeeId, KraId, NewCycle, OrganisationId, ReviewCycle, ReviewDetails,
    ReviewEntry, ReviewType,
};
use super::guard::{self, DeadlineError};
use super::rating::{self, RatingError, RatingSummary};
use super::repository::{
    ActivityLog, ActivityRecord, ConflictKind, CycleRepository, KpiCatalog, NotificationGateway,
    NotificationIntent, RepositoryError, ReviewSelector,
};
use super::validator::{self, DateRuleViolation};

/// Persistence constraint violations translated to user-facing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CycleConflict {
    #[error("Review cycle has already been created for the selected range")]
    OverlappingRange,
    #[error("Another Review Cycle is already active.")]
    ActiveCycleExists,
}

/// KRA/KPI catalogue gaps that block cycle creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogGap {
    #[error("Every KRA must have at least one active KPI before a review cycle can begin")]
    KraWithoutKpi { kra_ids: Vec<KraId> },
    #[error(
        "Every designation must have at least one KPI for each KRA before a review cycle can begin"
    )]
    DesignationWithoutKpi { designations: Vec<String> },
}

/// Error raised by the review workflow service. Every variant carries a
/// fixed user-facing message; unrecognized persistence failures pass
/// through as `Repository`.
#[derive(Debug, thiserror::Error)]
pub enum ReviewWorkflowError {
    #[error(transparent)]
    Dates(#[from] DateRuleViolation),
    #[error(transparent)]
    Catalog(#[from] CatalogGap),
    #[error(transparent)]
    Deadline(#[from] DeadlineError),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Conflict(#[from] CycleConflict),
    #[error("No active review cycle for the organisation")]
    NoActiveCycle,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A reviewer's inbound submission for one employee in the active cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
    pub organisation_id: OrganisationId,
    pub review_to: EmployeeId,
    pub review_from: EmployeeId,
    pub entries: Vec<ReviewEntry>,
    pub draft: bool,
    pub published: bool,
}

/// Result of a stored submission: the persisted review, its score, and the
/// notification intents raised by it (already dispatched best-effort).
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub review: ReviewDetails,
    pub summary: RatingSummary,
    pub outbox: Vec<NotificationIntent>,
}

/// Result of a cycle update, with the dates-changed outbox when requested.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleUpdateOutcome {
    pub cycle: ReviewCycle,
    pub outbox: Vec<NotificationIntent>,
}

/// Service sequencing validation, persistence, scoring, and notification
/// fan-out for the review cycle workflow. Mutual exclusion for published
/// and overlapping cycles stays with the store; this layer only translates
/// the resulting conflicts.
pub struct PerformanceReviewService<R, K, N, L> {
    repository: Arc<R>,
    catalog: Arc<K>,
    notifier: Arc<N>,
    activity: Arc<L>,
}

impl<R, K, N, L> PerformanceReviewService<R, K, N, L>
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<K>, notifier: Arc<N>, activity: Arc<L>) -> Self {
        Self {
            repository,
            catalog,
            notifier,
            activity,
        }
    }

    /// Create a review cycle: dates first, catalogue completeness second,
    /// persistence last.
    pub fn create_cycle(
        &self,
        request: NewCycle,
        actor: &ActorContext,
    ) -> Result<ReviewCycle, ReviewWorkflowError> {
        validator::validate_dates(&request.dates)?;

        let missing_kras = self.catalog.kras_missing_kpis(&request.organisation_id)?;
        if !missing_kras.is_empty() {
            return Err(CatalogGap::KraWithoutKpi {
                kra_ids: missing_kras,
            }
            .into());
        }

        let missing_designations = self
            .catalog
            .designations_missing_kra_kpis(&request.organisation_id)?;
        if !missing_designations.is_empty() {
            return Err(CatalogGap::DesignationWithoutKpi {
                designations: missing_designations,
            }
            .into());
        }

        let cycle = self
            .repository
            .create_cycle(request)
            .map_err(map_cycle_conflict)?;

        self.log_activity(
            actor,
            "CREATED",
            format!(
                "Created review cycle {} ({} to {})",
                cycle.cycle_id.0, cycle.dates.cycle.start, cycle.dates.cycle.end
            ),
        );

        Ok(cycle)
    }

    /// Replace a cycle's dates and publish flag. When `notify_employees`
    /// is set, every employee of the organisation receives a dates-changed
    /// notification.
    pub fn update_cycle(
        &self,
        cycle_id: &CycleId,
        request: NewCycle,
        notify_employees: bool,
        actor: &ActorContext,
    ) -> Result<CycleUpdateOutcome, ReviewWorkflowError> {
        validator::validate_dates(&request.dates)?;

        let organisation_id = request.organisation_id.clone();
        let cycle = self
            .repository
            .update_cycle(cycle_id, request)
            .map_err(map_cycle_conflict)?;

        let mut outbox = Vec::new();
        if notify_employees {
            for employee in self.repository.organisation_employees(&organisation_id)? {
                outbox.push(NotificationIntent::CycleDatesChanged {
                    organisation_id: organisation_id.clone(),
                    cycle_id: cycle.cycle_id.clone(),
                    recipient: employee,
                });
            }
        }
        self.dispatch(&outbox);

        self.log_activity(
            actor,
            "UPDATED",
            format!("Updated review cycle {}", cycle.cycle_id.0),
        );

        Ok(CycleUpdateOutcome { cycle, outbox })
    }

    /// Take a cycle out of circulation without touching its dates.
    pub fn unpublish_cycle(
        &self,
        cycle_id: &CycleId,
        actor: &ActorContext,
    ) -> Result<(), ReviewWorkflowError> {
        self.repository.unpublish(cycle_id)?;
        self.log_activity(
            actor,
            "UNPUBLISHED",
            format!("Unpublished review cycle {}", cycle_id.0),
        );
        Ok(())
    }

    /// The organisation's published cycle with flags evaluated for `today`.
    pub fn active_cycle(
        &self,
        organisation_id: &OrganisationId,
        today: NaiveDate,
    ) -> Result<CycleSnapshot, ReviewWorkflowError> {
        let cycle = self
            .repository
            .fetch_active_cycle(organisation_id)?
            .ok_or(ReviewWorkflowError::NoActiveCycle)?;
        Ok(cycle.with_activity(today))
    }

    /// Whether review submissions are underway anywhere in the
    /// organisation on `date`; used to freeze manager reassignment.
    pub fn review_submission_started(
        &self,
        organisation_id: &OrganisationId,
        date: NaiveDate,
    ) -> Result<bool, ReviewWorkflowError> {
        let cycles = self.repository.fetch_cycles(organisation_id)?;
        Ok(guard::is_review_submission_started(&cycles, date))
    }

    /// Emit phase-started notifications for every window opening `today`.
    /// Intended for a daily scheduler tick.
    pub fn announce_phase_starts(
        &self,
        organisation_id: &OrganisationId,
        today: NaiveDate,
    ) -> Result<Vec<NotificationIntent>, ReviewWorkflowError> {
        let Some(cycle) = self.repository.fetch_active_cycle(organisation_id)? else {
            return Ok(Vec::new());
        };

        let phases = [
            (ReviewType::SelfReview, cycle.dates.self_review),
            (ReviewType::ManagerReview, cycle.dates.manager_review),
            (ReviewType::CheckInWithManager, cycle.dates.check_in),
        ];

        let outbox: Vec<NotificationIntent> = phases
            .into_iter()
            .filter(|(_, window)| window.start == today)
            .map(|(phase, _)| NotificationIntent::PhaseStarted {
                organisation_id: cycle.organisation_id.clone(),
                cycle_id: cycle.cycle_id.clone(),
                phase,
            })
            .collect();

        self.dispatch(&outbox);
        Ok(outbox)
    }

    pub fn submit_self_review(
        &self,
        submission: ReviewSubmission,
        today: NaiveDate,
    ) -> Result<SubmissionOutcome, ReviewWorkflowError> {
        self.submit_review(ReviewType::SelfReview, submission, today)
    }

    pub fn submit_manager_review(
        &self,
        submission: ReviewSubmission,
        today: NaiveDate,
    ) -> Result<SubmissionOutcome, ReviewWorkflowError> {
        self.submit_review(ReviewType::ManagerReview, submission, today)
    }

    pub fn submit_check_in(
        &self,
        submission: ReviewSubmission,
        today: NaiveDate,
    ) -> Result<SubmissionOutcome, ReviewWorkflowError> {
        self.submit_review(ReviewType::CheckInWithManager, submission, today)
    }

    /// Stored reviews for one employee/cycle/type, read-only.
    pub fn reviews(
        &self,
        selector: &ReviewSelector,
    ) -> Result<Vec<ReviewDetails>, ReviewWorkflowError> {
        Ok(self.repository.fetch_review_details(selector)?)
    }

    fn submit_review(
        &self,
        review_type: ReviewType,
        submission: ReviewSubmission,
        today: NaiveDate,
    ) -> Result<SubmissionOutcome, ReviewWorkflowError> {
        let ReviewSubmission {
            organisation_id,
            review_to,
            review_from,
            entries,
            draft,
            published,
        } = submission;

        let cycle = self
            .repository
            .fetch_active_cycle(&organisation_id)?
            .ok_or(ReviewWorkflowError::NoActiveCycle)?;

        // Manager reviews may be saved any time before their deadline; the
        // other two types require their window to be open.
        match review_type {
            ReviewType::ManagerReview => guard::check_deadline(review_type, &cycle, today)?,
            _ => guard::check_submission(review_type, &cycle, today)?,
        }

        let mut kra_ids: Vec<KraId> = Vec::new();
        for entry in &entries {
            if !kra_ids.contains(&entry.kra_id) {
                kra_ids.push(entry.kra_id.clone());
            }
        }
        let weightages = self.repository.kra_weightages(&cycle.cycle_id, &kra_ids)?;
        let summary = rating::weighted_score(&entries, &weightages)?;

        let review = self.repository.upsert_review(ReviewDetails {
            cycle_id: cycle.cycle_id.clone(),
            review_type,
            review_to: review_to.clone(),
            review_from: review_from.clone(),
            draft,
            published,
            submitted_at: published.then_some(today),
            average_rating: summary.final_score,
            entries,
        })?;

        let mut outbox = Vec::new();
        if published {
            match review_type {
                ReviewType::SelfReview => {
                    // Tell the employee's managers a self review is ready.
                    for manager in self.repository.current_managers(&review_to)?.reviewers() {
                        outbox.push(NotificationIntent::SubmissionComplete {
                            organisation_id: organisation_id.clone(),
                            cycle_id: cycle.cycle_id.clone(),
                            review_type,
                            employee_id: review_to.clone(),
                            recipient: manager,
                        });
                    }
                }
                ReviewType::ManagerReview | ReviewType::CheckInWithManager => {
                    // The reviewed employee is always told; their managers
                    // only once every required manager review is in.
                    outbox.push(NotificationIntent::SubmissionComplete {
                        organisation_id: organisation_id.clone(),
                        cycle_id: cycle.cycle_id.clone(),
                        review_type,
                        employee_id: review_to.clone(),
                        recipient: review_to.clone(),
                    });

                    if self
                        .repository
                        .all_manager_reviews_complete(&review_to, &cycle.cycle_id)?
                    {
                        for manager in self.repository.current_managers(&review_to)?.reviewers() {
                            outbox.push(NotificationIntent::ManagerReviewsComplete {
                                organisation_id: organisation_id.clone(),
                                cycle_id: cycle.cycle_id.clone(),
                                employee_id: review_to.clone(),
                                recipient: manager,
                            });
                        }
                    }
                }
            }
        }
        self.dispatch(&outbox);

        self.log_activity(
            &ActorContext {
                employee_id: review_from,
                ip_address: None,
            },
            if published { "SUBMITTED" } else { "SAVED" },
            format!(
                "{} for {} in cycle {}",
                review_type.label(),
                review_to.0,
                cycle.cycle_id.0
            ),
        );

        Ok(SubmissionOutcome {
            review,
            summary,
            outbox,
        })
    }

    /// Fire-and-forget: a dead transport must never roll back the write
    /// that triggered the notification.
    fn dispatch(&self, outbox: &[NotificationIntent]) {
        for intent in outbox {
            if let Err(err) = self.notifier.publish(intent.clone()) {
                warn!(error = %err, "notification dispatch failed");
            }
        }
    }

    fn log_activity(&self, actor: &ActorContext, activity: &'static str, description: String) {
        let entry = ActivityRecord {
            actor_id: actor.employee_id.clone(),
            module: "performance-review",
            activity,
            description,
            ip_address: actor.ip_address.clone(),
        };
        if let Err(err) = self.activity.record(entry) {
            warn!(error = %err, "activity log write failed");
        }
    }
}

fn map_cycle_conflict(err: RepositoryError) -> ReviewWorkflowError {
    match err {
        RepositoryError::Conflict(ConflictKind::Overlap) => {
            CycleConflict::OverlappingRange.into()
        }
        RepositoryError::Conflict(ConflictKind::ActiveCycle) => {
            CycleConflict::ActiveCycleExists.into()
        }
        other => ReviewWorkflowError::Repository(other),
    }
}
