//! Integration scenarios for the review cycle workflow: cycle creation and
//! conflict handling, deadline-guarded submissions, and the manager
//! notification fan-out, exercised through the public service facade and
//! the HTTP router with in-memory gateways.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use perfcycle::infra::{
        InMemoryActivityLog, InMemoryCycleRepository, InMemoryKpiCatalog,
        InMemoryNotificationGateway,
    };
    use perfcycle::workflows::performance::{
        CycleDates, DateWindow, EmployeeId, KraId, KraWeightage, ManagerAssignment, NewCycle,
        OrganisationId, PerformanceReviewService, ReviewEntry, ReviewSubmission,
    };

    pub(super) type Service = PerformanceReviewService<
        InMemoryCycleRepository,
        InMemoryKpiCatalog,
        InMemoryNotificationGateway,
        InMemoryActivityLog,
    >;

    pub(super) struct World {
        pub(super) service: Arc<Service>,
        pub(super) repository: Arc<InMemoryCycleRepository>,
        pub(super) notifier: Arc<InMemoryNotificationGateway>,
        pub(super) activity: Arc<InMemoryActivityLog>,
    }

    pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(super) fn organisation() -> OrganisationId {
        OrganisationId("org-acme".to_string())
    }

    pub(super) fn employee() -> EmployeeId {
        EmployeeId("emp-7".to_string())
    }

    pub(super) fn manager() -> EmployeeId {
        EmployeeId("mgr-3".to_string())
    }

    pub(super) fn annual_cycle(publish: bool) -> NewCycle {
        NewCycle {
            organisation_id: organisation(),
            dates: CycleDates {
                cycle: DateWindow::new(date(2026, 1, 1), date(2026, 12, 31)),
                self_review: DateWindow::new(date(2026, 11, 1), date(2026, 11, 14)),
                manager_review: DateWindow::new(date(2026, 11, 15), date(2026, 12, 10)),
                check_in: DateWindow::new(date(2026, 12, 11), date(2026, 12, 22)),
            },
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

    pub(super) fn entries() -> Vec<ReviewEntry> {
        vec![
            ReviewEntry {
                kra_id: KraId("KRA1".to_string()),
                rating: 5,
                commentary: "Delivered the platform migration".to_string(),
            },
            ReviewEntry {
                kra_id: KraId("KRA1".to_string()),
                rating: 4,
                commentary: "Kept incident load low".to_string(),
            },
            ReviewEntry {
                kra_id: KraId("KRA2".to_string()),
                rating: 3,
                commentary: "Mentoring goal partially met".to_string(),
            },
            ReviewEntry {
                kra_id: KraId("KRA3".to_string()),
                rating: 5,
                commentary: "Raises the bar for the team".to_string(),
            },
        ]
    }

    pub(super) fn self_review(published: bool) -> ReviewSubmission {
        ReviewSubmission {
            organisation_id: organisation(),
            review_to: employee(),
            review_from: employee(),
            entries: entries(),
            draft: !published,
            published,
        }
    }

    pub(super) fn manager_review(published: bool) -> ReviewSubmission {
        ReviewSubmission {
            organisation_id: organisation(),
            review_to: employee(),
            review_from: manager(),
            entries: entries(),
            draft: !published,
            published,
        }
    }

    pub(super) fn build_world() -> World {
        let repository = Arc::new(InMemoryCycleRepository::default());
        repository.seed_weightages(weightages());
        repository.assign_managers(
            employee(),
            ManagerAssignment {
                first_manager: Some(manager()),
                second_manager: None,
            },
        );
        repository.register_employee(organisation(), employee());

        let notifier = Arc::new(InMemoryNotificationGateway::default());
        let activity = Arc::new(InMemoryActivityLog::default());
        let service = Arc::new(PerformanceReviewService::new(
            repository.clone(),
            Arc::new(InMemoryKpiCatalog::default()),
            notifier.clone(),
            activity.clone(),
        ));

        World {
            service,
            repository,
            notifier,
            activity,
        }
    }
}

mod cycle_lifecycle {
    use super::common::*;
    use perfcycle::workflows::performance::{ActorContext, NotificationIntent};

    #[test]
    fn create_submit_and_fan_out_end_to_end() {
        let world = build_world();
        let actor = ActorContext::new("hr-lead");

        let cycle = world
            .service
            .create_cycle(annual_cycle(true), &actor)
            .expect("cycle created");
        assert!(cycle.publish);

        // Employee submits in-window; their manager is told.
        let self_outcome = world
            .service
            .submit_self_review(self_review(true), date(2026, 11, 5))
            .expect("self review lands");
        assert!((self_outcome.review.average_rating - 4.10).abs() < 1e-9);
        assert_eq!(self_outcome.outbox.len(), 1);

        // The only required manager review completes: the employee hears
        // about the submission and the manager about the completion.
        let manager_outcome = world
            .service
            .submit_manager_review(manager_review(true), date(2026, 11, 20))
            .expect("manager review lands");

        let kinds: Vec<&NotificationIntent> = manager_outcome.outbox.iter().collect();
        assert_eq!(kinds.len(), 2);
        assert!(matches!(
            kinds[0],
            NotificationIntent::SubmissionComplete { recipient, .. } if recipient == &employee()
        ));
        assert!(matches!(
            kinds[1],
            NotificationIntent::ManagerReviewsComplete { recipient, .. } if recipient == &manager()
        ));

        assert_eq!(world.notifier.events().len(), 3);
        assert_eq!(world.repository.stored_reviews().len(), 2);
        assert!(world
            .activity
            .entries()
            .iter()
            .any(|entry| entry.activity == "SUBMITTED"));
    }

    #[test]
    fn only_one_cycle_may_be_published_at_a_time() {
        let world = build_world();
        let actor = ActorContext::new("hr-lead");

        world
            .service
            .create_cycle(annual_cycle(true), &actor)
            .expect("first cycle created");

        let mut next_year = annual_cycle(true);
        next_year.dates.cycle.start = date(2027, 1, 1);
        next_year.dates.cycle.end = date(2027, 12, 31);
        next_year.dates.self_review.start = date(2027, 11, 1);
        next_year.dates.self_review.end = date(2027, 11, 14);
        next_year.dates.manager_review.start = date(2027, 11, 15);
        next_year.dates.manager_review.end = date(2027, 12, 10);
        next_year.dates.check_in.start = date(2027, 12, 11);
        next_year.dates.check_in.end = date(2027, 12, 22);

        let err = world
            .service
            .create_cycle(next_year, &actor)
            .expect_err("second published cycle rejected");
        assert_eq!(err.to_string(), "Another Review Cycle is already active.");
    }

    #[test]
    fn deadline_guard_blocks_out_of_window_submissions() {
        let world = build_world();
        let actor = ActorContext::new("hr-lead");

        world
            .service
            .create_cycle(annual_cycle(true), &actor)
            .expect("cycle created");

        let err = world
            .service
            .submit_self_review(self_review(false), date(2026, 11, 20))
            .expect_err("late drafts are late too");
        assert_eq!(
            err.to_string(),
            "Deadline for Self Review has passed. Sorry, you're late!"
        );
    }
}

mod http_surface {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use perfcycle::workflows::performance::performance_router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn cycle_creation_and_lookup_round_trip() {
        let world = build_world();
        let router = performance_router(world.service.clone());

        let payload = json!({
            "organisation_id": "org-acme",
            "start_date": "2026-01-01",
            "end_date": "2026-12-31",
            "self_review_start": "2026-11-01",
            "self_review_end": "2026-11-14",
            "manager_review_start": "2026-11-15",
            "manager_review_end": "2026-12-10",
            "check_in_start": "2026-12-11",
            "check_in_end": "2026-12-22",
            "publish": true,
        });

        let created = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/performance/cycles")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(created.status(), StatusCode::CREATED);

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(
                        "/api/v1/performance/cycles/active?organisation_id=org-acme&on=2026-11-05",
                    )
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        let snapshot: Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(snapshot.get("is_self_review_active"), Some(&json!(true)));
        assert_eq!(snapshot.get("is_check_in_active"), Some(&json!(false)));
    }
}
