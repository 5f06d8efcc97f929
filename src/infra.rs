//! In-memory gateway implementations backing the `serve` runtime, the CLI,
//! and the integration tests. They mimic the store's exclusion constraints
//! and report violations through the same classification path a SQL
//! gateway would use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Local;

use crate::workflows::performance::{
    classify_constraint, ActivityError, ActivityLog, ActivityRecord, CycleId, CycleRepository,
    EmployeeId, KpiCatalog, KraId, KraWeightage, ManagerAssignment, NewCycle, NotificationGateway,
    NotificationIntent, NotifyError, OrganisationId, RepositoryError, ReviewCycle, ReviewDetails,
    ReviewSelector, ReviewType,
};

#[derive(Default)]
pub struct InMemoryCycleRepository {
    cycles: Mutex<Vec<ReviewCycle>>,
    reviews: Mutex<Vec<ReviewDetails>>,
    weightages: Mutex<Vec<KraWeightage>>,
    managers: Mutex<HashMap<EmployeeId, ManagerAssignment>>,
    employees: Mutex<HashMap<OrganisationId, Vec<EmployeeId>>>,
    sequence: AtomicU64,
}

impl InMemoryCycleRepository {
    /// Install the weightage profile served for every cycle.
    pub fn seed_weightages(&self, weightages: Vec<KraWeightage>) {
        *self.weightages.lock().expect("weightage mutex poisoned") = weightages;
    }

    pub fn assign_managers(&self, employee: EmployeeId, assignment: ManagerAssignment) {
        self.managers
            .lock()
            .expect("manager mutex poisoned")
            .insert(employee, assignment);
    }

    pub fn register_employee(&self, organisation: OrganisationId, employee: EmployeeId) {
        self.employees
            .lock()
            .expect("employee mutex poisoned")
            .entry(organisation)
            .or_default()
            .push(employee);
    }

    pub fn stored_cycles(&self) -> Vec<ReviewCycle> {
        self.cycles.lock().expect("cycle mutex poisoned").clone()
    }

    pub fn stored_reviews(&self) -> Vec<ReviewDetails> {
        self.reviews.lock().expect("review mutex poisoned").clone()
    }

    fn next_cycle_id(&self) -> CycleId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        CycleId(format!("cycle-{id:04}"))
    }
}

impl CycleRepository for InMemoryCycleRepository {
    fn fetch_active_cycle(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<ReviewCycle>, RepositoryError> {
        let cycles = self.cycles.lock().expect("cycle mutex poisoned");
        Ok(cycles
            .iter()
            .find(|cycle| &cycle.organisation_id == organisation_id && cycle.publish)
            .cloned())
    }

    fn fetch_cycles(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<ReviewCycle>, RepositoryError> {
        let cycles = self.cycles.lock().expect("cycle mutex poisoned");
        Ok(cycles
            .iter()
            .filter(|cycle| &cycle.organisation_id == organisation_id)
            .cloned()
            .collect())
    }

    fn create_cycle(&self, cycle: NewCycle) -> Result<ReviewCycle, RepositoryError> {
        let mut cycles = self.cycles.lock().expect("cycle mutex poisoned");

        for existing in cycles
            .iter()
            .filter(|existing| existing.organisation_id == cycle.organisation_id)
        {
            if ranges_overlap(existing, &cycle) {
                return Err(RepositoryError::Conflict(classify_constraint(
                    "violates exclusion constraint \"overlap_review_cycle_excl\"",
                )));
            }
            if cycle.publish && existing.publish {
                return Err(RepositoryError::Conflict(classify_constraint(
                    "duplicate key value violates unique index \"review_cycle_organisation_id_publish_idx\"",
                )));
            }
        }

        let stored = ReviewCycle {
            cycle_id: self.next_cycle_id(),
            organisation_id: cycle.organisation_id,
            dates: cycle.dates,
            publish: cycle.publish,
            last_modified: Local::now().date_naive(),
        };
        cycles.push(stored.clone());
        Ok(stored)
    }

    fn update_cycle(
        &self,
        cycle_id: &CycleId,
        cycle: NewCycle,
    ) -> Result<ReviewCycle, RepositoryError> {
        let mut cycles = self.cycles.lock().expect("cycle mutex poisoned");

        for existing in cycles
            .iter()
            .filter(|existing| {
                existing.organisation_id == cycle.organisation_id && &existing.cycle_id != cycle_id
            })
        {
            if ranges_overlap(existing, &cycle) {
                return Err(RepositoryError::Conflict(classify_constraint(
                    "violates exclusion constraint \"overlap_review_cycle_excl\"",
                )));
            }
            if cycle.publish && existing.publish {
                return Err(RepositoryError::Conflict(classify_constraint(
                    "duplicate key value violates unique index \"review_cycle_organisation_id_publish_idx\"",
                )));
            }
        }

        let stored = cycles
            .iter_mut()
            .find(|existing| &existing.cycle_id == cycle_id)
            .ok_or(RepositoryError::NotFound)?;

        stored.dates = cycle.dates;
        stored.publish = cycle.publish;
        stored.last_modified = Local::now().date_naive();
        Ok(stored.clone())
    }

    fn unpublish(&self, cycle_id: &CycleId) -> Result<(), RepositoryError> {
        let mut cycles = self.cycles.lock().expect("cycle mutex poisoned");
        let stored = cycles
            .iter_mut()
            .find(|existing| &existing.cycle_id == cycle_id)
            .ok_or(RepositoryError::NotFound)?;
        stored.publish = false;
        stored.last_modified = Local::now().date_naive();
        Ok(())
    }

    fn fetch_review_details(
        &self,
        selector: &ReviewSelector,
    ) -> Result<Vec<ReviewDetails>, RepositoryError> {
        let reviews = self.reviews.lock().expect("review mutex poisoned");
        Ok(reviews
            .iter()
            .filter(|review| {
                review.cycle_id == selector.cycle_id
                    && review.review_type == selector.review_type
                    && review.review_to == selector.review_to
                    && selector.review_from.contains(&review.review_from)
            })
            .cloned()
            .collect())
    }

    fn upsert_review(&self, details: ReviewDetails) -> Result<ReviewDetails, RepositoryError> {
        let mut reviews = self.reviews.lock().expect("review mutex poisoned");
        let existing = reviews.iter_mut().find(|review| {
            review.cycle_id == details.cycle_id
                && review.review_type == details.review_type
                && review.review_to == details.review_to
                && review.review_from == details.review_from
        });

        match existing {
            Some(review) => *review = details.clone(),
            None => reviews.push(details.clone()),
        }
        Ok(details)
    }

    fn kra_weightages(
        &self,
        _cycle_id: &CycleId,
        kra_ids: &[KraId],
    ) -> Result<Vec<KraWeightage>, RepositoryError> {
        let weightages = self.weightages.lock().expect("weightage mutex poisoned");
        Ok(weightages
            .iter()
            .filter(|weightage| kra_ids.contains(&weightage.kra_id))
            .cloned()
            .collect())
    }

    fn all_manager_reviews_complete(
        &self,
        employee_id: &EmployeeId,
        cycle_id: &CycleId,
    ) -> Result<bool, RepositoryError> {
        let reviewers = self.current_managers(employee_id)?.reviewers();
        if reviewers.is_empty() {
            return Ok(false);
        }

        let reviews = self.reviews.lock().expect("review mutex poisoned");
        Ok(reviewers.iter().all(|manager| {
            reviews.iter().any(|review| {
                review.cycle_id == *cycle_id
                    && review.review_type == ReviewType::ManagerReview
                    && review.review_to == *employee_id
                    && review.review_from == *manager
                    && review.published
            })
        }))
    }

    fn current_managers(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<ManagerAssignment, RepositoryError> {
        let managers = self.managers.lock().expect("manager mutex poisoned");
        Ok(managers.get(employee_id).cloned().unwrap_or_default())
    }

    fn organisation_employees(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<EmployeeId>, RepositoryError> {
        let employees = self.employees.lock().expect("employee mutex poisoned");
        Ok(employees.get(organisation_id).cloned().unwrap_or_default())
    }
}

fn ranges_overlap(existing: &ReviewCycle, candidate: &NewCycle) -> bool {
    existing.dates.cycle.start <= candidate.dates.cycle.end
        && candidate.dates.cycle.start <= existing.dates.cycle.end
}

/// Catalogue double: complete by default, gaps injectable for tests.
#[derive(Default)]
pub struct InMemoryKpiCatalog {
    missing_kras: Mutex<Vec<KraId>>,
    missing_designations: Mutex<Vec<String>>,
}

impl InMemoryKpiCatalog {
    pub fn set_missing_kras(&self, kras: Vec<KraId>) {
        *self.missing_kras.lock().expect("catalog mutex poisoned") = kras;
    }

    pub fn set_missing_designations(&self, designations: Vec<String>) {
        *self
            .missing_designations
            .lock()
            .expect("catalog mutex poisoned") = designations;
    }
}

impl KpiCatalog for InMemoryKpiCatalog {
    fn kras_missing_kpis(
        &self,
        _organisation_id: &OrganisationId,
    ) -> Result<Vec<KraId>, RepositoryError> {
        Ok(self.missing_kras.lock().expect("catalog mutex poisoned").clone())
    }

    fn designations_missing_kra_kpis(
        &self,
        _organisation_id: &OrganisationId,
    ) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .missing_designations
            .lock()
            .expect("catalog mutex poisoned")
            .clone())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationGateway {
    events: Mutex<Vec<NotificationIntent>>,
}

impl InMemoryNotificationGateway {
    pub fn events(&self) -> Vec<NotificationIntent> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationGateway for InMemoryNotificationGateway {
    fn publish(&self, intent: NotificationIntent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(intent);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryActivityLog {
    entries: Mutex<Vec<ActivityRecord>>,
}

impl InMemoryActivityLog {
    pub fn entries(&self) -> Vec<ActivityRecord> {
        self.entries.lock().expect("activity mutex poisoned").clone()
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn record(&self, entry: ActivityRecord) -> Result<(), ActivityError> {
        self.entries
            .lock()
            .expect("activity mutex poisoned")
            .push(entry);
        Ok(())
    }
}
