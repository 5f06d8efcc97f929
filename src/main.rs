use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use perfcycle::config::AppConfig;
use perfcycle::error::AppError;
use perfcycle::infra::{
    InMemoryActivityLog, InMemoryCycleRepository, InMemoryKpiCatalog, InMemoryNotificationGateway,
};
use perfcycle::telemetry;
use perfcycle::workflows::performance::{
    performance_router, validate_dates, CycleDates, CycleId, DateWindow, KraId, KraWeightage,
    OrganisationId, PerformanceReviewService, ReviewCycle, ReviewWorkflowError,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Performance Review Orchestrator",
    about = "Run the performance review cycle service or inspect a cycle from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect review cycle windows without a server
    Cycle {
        #[command(subcommand)]
        command: CycleCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum CycleCommand {
    /// Validate candidate cycle dates and print the phase timeline
    Preview(CyclePreviewArgs),
}

#[derive(Args, Debug)]
struct CyclePreviewArgs {
    /// Cycle start date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,
    /// Cycle end date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
    /// Self review window, start then end
    #[arg(long, value_parser = parse_date)]
    self_start: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    self_end: NaiveDate,
    /// Manager review window, start then end
    #[arg(long, value_parser = parse_date)]
    manager_start: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    manager_end: NaiveDate,
    /// Check-in window, start then end
    #[arg(long, value_parser = parse_date)]
    check_in_start: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    check_in_end: NaiveDate,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Treat the cycle as published when deriving activity
    #[arg(long)]
    publish: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Cycle {
            command: CycleCommand::Preview(args),
        } => run_cycle_preview(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let repository = Arc::new(InMemoryCycleRepository::default());
    repository.seed_weightages(standard_weightages());
    let service = Arc::new(PerformanceReviewService::new(
        repository,
        Arc::new(InMemoryKpiCatalog::default()),
        Arc::new(InMemoryNotificationGateway::default()),
        Arc::new(InMemoryActivityLog::default()),
    ));

    let app = performance_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "performance review orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Weightage profile used by the in-memory runtime until a real catalogue
/// store is wired in.
fn standard_weightages() -> Vec<KraWeightage> {
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

fn run_cycle_preview(args: CyclePreviewArgs) -> Result<(), AppError> {
    let CyclePreviewArgs {
        start,
        end,
        self_start,
        self_end,
        manager_start,
        manager_end,
        check_in_start,
        check_in_end,
        today,
        publish,
    } = args;

    let dates = CycleDates {
        cycle: DateWindow::new(start, end),
        self_review: DateWindow::new(self_start, self_end),
        manager_review: DateWindow::new(manager_start, manager_end),
        check_in: DateWindow::new(check_in_start, check_in_end),
    };

    validate_dates(&dates).map_err(ReviewWorkflowError::from)?;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let cycle = ReviewCycle {
        cycle_id: CycleId("preview".to_string()),
        organisation_id: OrganisationId("preview".to_string()),
        dates,
        publish,
        last_modified: today,
    };

    render_cycle_preview(&cycle, today);
    Ok(())
}

fn render_cycle_preview(cycle: &ReviewCycle, today: NaiveDate) {
    let snapshot = cycle.with_activity(today);

    println!("Review cycle preview (evaluated {today})");
    println!(
        "Published: {} | cycle active: {}",
        cycle.publish, snapshot.is_cycle_active
    );

    println!("\nPhases");
    for row in snapshot.timeline() {
        let activity = if row.active { " [active]" } else { "" };
        println!(
            "- {}: {} -> {} | {}{}",
            row.label,
            row.window.start,
            row.window.end,
            row.state.label(),
            activity
        );
    }

    println!("\nDeadlines passed");
    println!("- Self Review: {}", snapshot.self_review_date_passed);
    println!("- Manager Review: {}", snapshot.manager_review_date_passed);
    println!(
        "- Check-in with Manager: {}",
        snapshot.check_in_date_passed
    );
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
