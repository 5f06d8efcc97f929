use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::cycle::{CycleSnapshot, TimelineRow};
use super::domain::{
    ActorContext, CycleDates, CycleId, DateWindow, EmployeeId, NewCycle, OrganisationId,
    ReviewDetails, ReviewEntry,
};
use super::rating::KraScore;
use super::repository::{
    ActivityLog, CycleRepository, KpiCatalog, NotificationGateway, RepositoryError,
};
use super::service::{
    PerformanceReviewService, ReviewSubmission, ReviewWorkflowError, SubmissionOutcome,
};

/// Router builder exposing the review cycle and submission endpoints.
pub fn performance_router<R, K, N, L>(
    service: Arc<PerformanceReviewService<R, K, N, L>>,
) -> Router
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/performance/cycles",
            post(create_cycle_handler::<R, K, N, L>),
        )
        .route(
            "/api/v1/performance/cycles/:cycle_id",
            put(update_cycle_handler::<R, K, N, L>),
        )
        .route(
            "/api/v1/performance/cycles/:cycle_id/unpublish",
            post(unpublish_handler::<R, K, N, L>),
        )
        .route(
            "/api/v1/performance/cycles/active",
            get(active_cycle_handler::<R, K, N, L>),
        )
        .route(
            "/api/v1/performance/reviews/self",
            post(submit_self_handler::<R, K, N, L>),
        )
        .route(
            "/api/v1/performance/reviews/manager",
            post(submit_manager_handler::<R, K, N, L>),
        )
        .route(
            "/api/v1/performance/reviews/check-in",
            post(submit_check_in_handler::<R, K, N, L>),
        )
        .with_state(service)
}

/// Payload shared by cycle create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleUpsertRequest {
    pub organisation_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub self_review_start: NaiveDate,
    pub self_review_end: NaiveDate,
    pub manager_review_start: NaiveDate,
    pub manager_review_end: NaiveDate,
    pub check_in_start: NaiveDate,
    pub check_in_end: NaiveDate,
    pub publish: bool,
    #[serde(default)]
    pub notify_employees: bool,
    #[serde(default)]
    pub actor_id: Option<String>,
}

impl CycleUpsertRequest {
    fn actor(&self) -> ActorContext {
        ActorContext::new(self.actor_id.clone().unwrap_or_else(|| "system".to_string()))
    }

    fn into_new_cycle(self) -> NewCycle {
        NewCycle {
            organisation_id: OrganisationId(self.organisation_id),
            dates: CycleDates {
                cycle: DateWindow::new(self.start_date, self.end_date),
                self_review: DateWindow::new(self.self_review_start, self.self_review_end),
                manager_review: DateWindow::new(self.manager_review_start, self.manager_review_end),
                check_in: DateWindow::new(self.check_in_start, self.check_in_end),
            },
            publish: self.publish,
        }
    }
}

/// Payload for the three submission endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSubmissionRequest {
    pub organisation_id: String,
    pub review_to: String,
    pub review_from: String,
    pub entries: Vec<ReviewEntry>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub published: bool,
    /// Organisation-local date; defaults to the server-local date at this
    /// boundary only.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

impl ReviewSubmissionRequest {
    fn into_parts(self) -> (ReviewSubmission, NaiveDate) {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        (
            ReviewSubmission {
                organisation_id: OrganisationId(self.organisation_id),
                review_to: EmployeeId(self.review_to),
                review_from: EmployeeId(self.review_from),
                entries: self.entries,
                draft: self.draft,
                published: self.published,
            },
            today,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ActiveCycleQuery {
    pub organisation_id: String,
    #[serde(default)]
    pub on: Option<NaiveDate>,
}

/// Stored submission echoed back with its score breakdown.
#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub review: ReviewDetails,
    pub final_score: f64,
    pub breakdown: Vec<KraScore>,
    pub notifications_raised: usize,
}

/// Active cycle with derived flags and phase timeline.
#[derive(Debug, Serialize)]
pub struct ActiveCycleView {
    #[serde(flatten)]
    pub snapshot: CycleSnapshot,
    pub timeline: Vec<TimelineRow>,
}

async fn create_cycle_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Json(request): Json<CycleUpsertRequest>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let actor = request.actor();
    match service.create_cycle(request.into_new_cycle(), &actor) {
        Ok(cycle) => (StatusCode::CREATED, Json(cycle)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_cycle_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Path(cycle_id): Path<String>,
    Json(request): Json<CycleUpsertRequest>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let actor = request.actor();
    let notify_employees = request.notify_employees;
    match service.update_cycle(
        &CycleId(cycle_id),
        request.into_new_cycle(),
        notify_employees,
        &actor,
    ) {
        Ok(outcome) => {
            let payload = json!({
                "cycle": outcome.cycle,
                "notifications_raised": outcome.outbox.len(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn unpublish_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Path(cycle_id): Path<String>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let actor = ActorContext::new("system");
    match service.unpublish_cycle(&CycleId(cycle_id), &actor) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "unpublished" }))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn active_cycle_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Query(query): Query<ActiveCycleQuery>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let on = query.on.unwrap_or_else(|| Local::now().date_naive());
    match service.active_cycle(&OrganisationId(query.organisation_id), on) {
        Ok(snapshot) => {
            let timeline = snapshot.timeline();
            (StatusCode::OK, Json(ActiveCycleView { snapshot, timeline })).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn submit_self_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Json(request): Json<ReviewSubmissionRequest>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let (submission, today) = request.into_parts();
    submission_response(service.submit_self_review(submission, today))
}

async fn submit_manager_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Json(request): Json<ReviewSubmissionRequest>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let (submission, today) = request.into_parts();
    submission_response(service.submit_manager_review(submission, today))
}

async fn submit_check_in_handler<R, K, N, L>(
    State(service): State<Arc<PerformanceReviewService<R, K, N, L>>>,
    Json(request): Json<ReviewSubmissionRequest>,
) -> Response
where
    R: CycleRepository + 'static,
    K: KpiCatalog + 'static,
    N: NotificationGateway + 'static,
    L: ActivityLog + 'static,
{
    let (submission, today) = request.into_parts();
    submission_response(service.submit_check_in(submission, today))
}

fn submission_response(result: Result<SubmissionOutcome, ReviewWorkflowError>) -> Response {
    match result {
        Ok(outcome) => {
            let view = SubmissionView {
                review: outcome.review,
                final_score: outcome.summary.final_score,
                breakdown: outcome.summary.breakdown,
                notifications_raised: outcome.outbox.len(),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: ReviewWorkflowError) -> Response {
    let status = match &err {
        ReviewWorkflowError::Dates(_)
        | ReviewWorkflowError::Catalog(_)
        | ReviewWorkflowError::Deadline(_)
        | ReviewWorkflowError::Rating(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewWorkflowError::Conflict(_) => StatusCode::CONFLICT,
        ReviewWorkflowError::NoActiveCycle => StatusCode::NOT_FOUND,
        ReviewWorkflowError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewWorkflowError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
