// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod live;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use fila::{DEFAULT_POSITION_COUNT, Outcome, QueueState, TransitionResult};
use fila_api::{
    ApiError, CallResponse, CompleteResponse, CompletedQuery, CompletedReportResponse,
    IssueTicketRequest, IssueTicketResponse, PositionsResponse, QueueSnapshot, StatsResponse,
    StatusResponse, SyncCommandRequest, SyncCommandResponse, WaitingOverviewResponse, call_again,
    call_next, complete_service, completed_report, is_known_sync_action, issue_ticket, merge_patch,
    positions_overview, stats, waiting_overview,
};
use fila_sync::{
    DualChime, LogTone, PullReplica, PullReplicaConfig, ReplicationSink, SnapshotBroadcaster,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// fila server - priority ticket dispatch with replica synchronization
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Run as the authoritative replica that accepts mutations
    #[arg(long)]
    authoritative: bool,

    /// Base URL of the authoritative replica to pull snapshots from
    #[arg(
        long,
        required_unless_present = "authoritative",
        conflicts_with = "authoritative"
    )]
    upstream_url: Option<String>,

    /// Seconds between upstream polls on a passive replica
    #[arg(long, default_value_t = 2)]
    poll_interval_secs: u64,

    /// Number of attendant positions
    #[arg(long, default_value_t = DEFAULT_POSITION_COUNT)]
    positions: u8,
}

/// Application state shared across handlers.
///
/// The queue aggregate is wrapped in a Mutex to allow safe concurrent
/// access; every mutation republishes a full snapshot to the broadcaster.
#[derive(Clone)]
struct AppState {
    /// The canonical in-memory queue aggregate.
    queue: Arc<Mutex<QueueState>>,
    /// Fan-out of snapshots to live observers.
    broadcaster: Arc<SnapshotBroadcaster>,
    /// Whether this replica accepts mutations.
    authoritative: bool,
    /// Whether the last upstream poll succeeded (always true when
    /// authoritative).
    connected: Arc<AtomicBool>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidInput { .. } => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            ApiError::DomainRuleViolation { .. } => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: err.to_string(),
            },
            ApiError::NotAuthoritative => Self {
                status: StatusCode::CONFLICT,
                message: err.to_string(),
            },
        }
    }
}

/// Runs one command against the shared aggregate.
///
/// Rejects the command on a passive replica, stores the transitioned
/// state, and republishes the resulting snapshot to live observers.
async fn run_command<F>(app_state: &AppState, operation: F) -> Result<TransitionResult, HttpError>
where
    F: FnOnce(&QueueState) -> Result<TransitionResult, ApiError>,
{
    if !app_state.authoritative {
        return Err(ApiError::NotAuthoritative.into());
    }

    let mut queue = app_state.queue.lock().await;
    let result: TransitionResult = operation(&queue)?;
    *queue = result.new_state.clone();
    let snapshot: QueueSnapshot = QueueSnapshot::capture(&queue);
    // Publish before unlocking so observers receive snapshots in commit
    // order; the broadcast send is synchronous and non-blocking.
    app_state.broadcaster.publish(&snapshot);
    drop(queue);

    Ok(result)
}

/// Handler for POST /tickets endpoint.
///
/// Draws a ticket in the requested service class.
async fn handle_issue_ticket(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<IssueTicketRequest>,
) -> Result<Json<IssueTicketResponse>, HttpError> {
    info!(service_class = %req.service_class, "Handling issue_ticket request");

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let result: TransitionResult =
        run_command(&app_state, |queue| issue_ticket(queue, &req, now)).await?;

    let Outcome::TicketIssued(ticket) = &result.outcome else {
        return Err(HttpError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: String::from("issue_ticket produced no ticket"),
        });
    };

    info!(display_code = %ticket.display_code, "Issued ticket");
    Ok(Json(IssueTicketResponse {
        success: true,
        ticket: ticket.into(),
    }))
}

/// Handler for POST `/positions/{id}/call` endpoint.
///
/// Calls the highest-priority waiting ticket to a position.
async fn handle_call_next(
    AxumState(app_state): AxumState<AppState>,
    Path(position): Path<u8>,
) -> Result<Json<CallResponse>, HttpError> {
    info!(position = position, "Handling call_next request");

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let result: TransitionResult =
        run_command(&app_state, |queue| call_next(queue, position, now)).await?;

    Ok(Json(CallResponse::from_outcome(&result.outcome)))
}

/// Handler for POST `/positions/{id}/call-again` endpoint.
///
/// Re-announces the ticket most recently called to a position.
async fn handle_call_again(
    AxumState(app_state): AxumState<AppState>,
    Path(position): Path<u8>,
) -> Result<Json<CallResponse>, HttpError> {
    info!(position = position, "Handling call_again request");

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let result: TransitionResult =
        run_command(&app_state, |queue| call_again(queue, position, now)).await?;

    Ok(Json(CallResponse::from_outcome(&result.outcome)))
}

/// Handler for POST `/positions/{id}/complete` endpoint.
///
/// Completes the ticket currently assigned to a position.
async fn handle_complete_service(
    AxumState(app_state): AxumState<AppState>,
    Path(position): Path<u8>,
) -> Result<Json<CompleteResponse>, HttpError> {
    info!(position = position, "Handling complete_service request");

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let result: TransitionResult =
        run_command(&app_state, |queue| complete_service(queue, position, now)).await?;

    Ok(Json(CompleteResponse::from_outcome(&result.outcome)))
}

/// Handler for GET /queue/waiting endpoint.
async fn handle_waiting(
    AxumState(app_state): AxumState<AppState>,
) -> Json<WaitingOverviewResponse> {
    let queue = app_state.queue.lock().await;
    Json(waiting_overview(&queue))
}

/// Handler for GET /queue/completed endpoint.
async fn handle_completed(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<CompletedQuery>,
) -> Result<Json<CompletedReportResponse>, HttpError> {
    let queue = app_state.queue.lock().await;
    Ok(Json(completed_report(&queue, &query)?))
}

/// Handler for GET /stats endpoint.
async fn handle_stats(AxumState(app_state): AxumState<AppState>) -> Json<StatsResponse> {
    let today: time::Date = OffsetDateTime::now_utc().date();
    let queue = app_state.queue.lock().await;
    Json(stats(&queue, today))
}

/// Handler for GET /positions endpoint.
async fn handle_positions(AxumState(app_state): AxumState<AppState>) -> Json<PositionsResponse> {
    let queue = app_state.queue.lock().await;
    Json(positions_overview(&queue))
}

/// Handler for GET /status endpoint.
async fn handle_status(AxumState(app_state): AxumState<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        role: if app_state.authoritative {
            String::from("authoritative")
        } else {
            String::from("passive")
        },
        connected: app_state.connected.load(Ordering::SeqCst),
    })
}

/// Handler for GET /api/queue-sync endpoint.
///
/// Returns the full snapshot passive replicas poll for.
async fn handle_sync_pull(AxumState(app_state): AxumState<AppState>) -> Json<QueueSnapshot> {
    let queue = app_state.queue.lock().await;
    Json(QueueSnapshot::capture(&queue))
}

/// Handler for POST /api/queue-sync endpoint.
///
/// Merges a pushed partial snapshot into the aggregate. Unrecognized
/// actions are logged and ignored but still acknowledged with success,
/// so an out-of-date pusher never sees a hard failure.
async fn handle_sync_push(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<SyncCommandRequest>,
) -> Result<Json<SyncCommandResponse>, HttpError> {
    if !app_state.authoritative {
        return Err(ApiError::NotAuthoritative.into());
    }

    let mut queue = app_state.queue.lock().await;
    if is_known_sync_action(&req.action) {
        info!(action = %req.action, "Merging pushed sync command");
        *queue = merge_patch(&queue, req.data);
    } else {
        warn!(action = %req.action, "Ignoring unknown sync action");
    }
    let snapshot: QueueSnapshot = QueueSnapshot::capture(&queue);
    // Publish before unlocking so observers receive snapshots in commit
    // order.
    app_state.broadcaster.publish(&snapshot);
    drop(queue);

    Ok(Json(SyncCommandResponse {
        success: true,
        data: snapshot,
    }))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/tickets", post(handle_issue_ticket))
        .route("/positions", get(handle_positions))
        .route("/positions/{id}/call", post(handle_call_next))
        .route("/positions/{id}/call-again", post(handle_call_again))
        .route("/positions/{id}/complete", post(handle_complete_service))
        .route("/queue/waiting", get(handle_waiting))
        .route("/queue/completed", get(handle_completed))
        .route("/stats", get(handle_stats))
        .route("/status", get(handle_status))
        .route(
            "/api/queue-sync",
            get(handle_sync_pull).post(handle_sync_push),
        )
        .route("/live", get(live::live_snapshots_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing fila server");

    let queue: Arc<Mutex<QueueState>> = Arc::new(Mutex::new(QueueState::new(args.positions)));
    let broadcaster: Arc<SnapshotBroadcaster> = Arc::new(SnapshotBroadcaster::new());

    let connected: Arc<AtomicBool> = if args.authoritative {
        info!("Running as the authoritative replica");
        Arc::new(AtomicBool::new(true))
    } else if let Some(upstream_url) = args.upstream_url.clone() {
        info!(upstream = %upstream_url, "Running as a passive replica");
        let config: PullReplicaConfig = PullReplicaConfig {
            upstream_url,
            poll_interval: Duration::from_secs(args.poll_interval_secs),
        };
        let replica: PullReplica = PullReplica::new(
            config,
            Arc::clone(&queue),
            Arc::clone(&broadcaster) as Arc<dyn ReplicationSink>,
            Arc::new(DualChime::new(Arc::new(LogTone))),
        )?;
        let connected: Arc<AtomicBool> = replica.connected_flag();
        tokio::spawn(replica.run());
        connected
    } else {
        // clap requires one of --authoritative / --upstream-url
        Arc::new(AtomicBool::new(false))
    };

    let app_state: AppState = AppState {
        queue,
        broadcaster,
        authoritative: args.authoritative,
        connected,
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use tower::ServiceExt;

    /// Helper to create test app state with a fresh in-memory queue.
    fn create_test_app_state(authoritative: bool) -> AppState {
        AppState {
            queue: Arc::new(Mutex::new(QueueState::default())),
            broadcaster: Arc::new(SnapshotBroadcaster::new()),
            authoritative,
            connected: Arc::new(AtomicBool::new(authoritative)),
        }
    }

    async fn post_json(app: &Router, uri: &str, body: &str) -> axum::response::Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get_uri(app: &Router, uri: &str) -> axum::response::Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_issue_call_complete_flow() {
        let app: Router = build_router(create_test_app_state(true));

        let response = post_json(&app, "/tickets", r#"{"service_class":"standard"}"#).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let issued: IssueTicketResponse = body_json(response).await;
        assert!(issued.success);
        assert_eq!(issued.ticket.display_code, "N001");

        let response = post_json(&app, "/positions/1/call", "{}").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let called: CallResponse = body_json(response).await;
        assert_eq!(called.outcome, "called");
        assert_eq!(called.record.unwrap().display_code, "N001");

        let response = post_json(&app, "/positions/1/complete", "{}").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let completed: CompleteResponse = body_json(response).await;
        assert_eq!(completed.outcome, "completed");
        assert_eq!(completed.display_code.as_deref(), Some("N001"));
    }

    #[tokio::test]
    async fn test_issue_ticket_with_unknown_class_is_bad_request() {
        let app: Router = build_router(create_test_app_state(true));

        let response = post_json(&app, "/tickets", r#"{"service_class":"priority"}"#).await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);

        let error: ErrorResponse = body_json(response).await;
        assert!(error.error);
    }

    #[tokio::test]
    async fn test_call_next_on_empty_queue() {
        let app: Router = build_router(create_test_app_state(true));

        let response = post_json(&app, "/positions/2/call", "{}").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let called: CallResponse = body_json(response).await;
        assert_eq!(called.outcome, "queue_empty");
    }

    #[tokio::test]
    async fn test_call_next_on_unknown_position_is_unprocessable() {
        let app: Router = build_router(create_test_app_state(true));

        let response = post_json(&app, "/positions/9/call", "{}").await;
        assert_eq!(response.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_passive_replica_rejects_mutations() {
        let app: Router = build_router(create_test_app_state(false));

        let response = post_json(&app, "/tickets", r#"{"service_class":"standard"}"#).await;
        assert_eq!(response.status(), HttpStatusCode::CONFLICT);

        let response = post_json(&app, "/positions/1/call", "{}").await;
        assert_eq!(response.status(), HttpStatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_passive_replica_still_serves_queries() {
        let app: Router = build_router(create_test_app_state(false));

        let response = get_uri(&app, "/queue/waiting").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let overview: WaitingOverviewResponse = body_json(response).await;
        assert_eq!(overview.total, 0);
    }

    #[tokio::test]
    async fn test_status_reports_role_and_connectivity() {
        let app: Router = build_router(create_test_app_state(true));
        let status: StatusResponse = body_json(get_uri(&app, "/status").await).await;
        assert_eq!(status.role, "authoritative");
        assert!(status.connected);

        let app: Router = build_router(create_test_app_state(false));
        let status: StatusResponse = body_json(get_uri(&app, "/status").await).await;
        assert_eq!(status.role, "passive");
        assert!(!status.connected);
    }

    #[tokio::test]
    async fn test_sync_pull_returns_full_snapshot() {
        let app: Router = build_router(create_test_app_state(true));
        post_json(&app, "/tickets", r#"{"service_class":"expectant"}"#).await;

        let response = get_uri(&app, "/api/queue-sync").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let snapshot: QueueSnapshot = body_json(response).await;
        assert_eq!(snapshot.queue.len(), 1);
        assert_eq!(snapshot.queue[0].display_code, "G001");
        assert_eq!(snapshot.next_numbers.expectant, 2);
    }

    #[tokio::test]
    async fn test_sync_push_merges_partial_snapshot() {
        let app: Router = build_router(create_test_app_state(true));

        let body = r#"{
            "action": "GENERATE_TICKET",
            "data": {"nextNumbers": {"standard": 9, "expectant": 1, "senior": 1}}
        }"#;
        let response = post_json(&app, "/api/queue-sync", body).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let ack: SyncCommandResponse = body_json(response).await;
        assert!(ack.success);
        assert_eq!(ack.data.next_numbers.standard, 9);

        let snapshot: QueueSnapshot = body_json(get_uri(&app, "/api/queue-sync").await).await;
        assert_eq!(snapshot.next_numbers.standard, 9);
    }

    #[tokio::test]
    async fn test_sync_push_ignores_unknown_action() {
        let app: Router = build_router(create_test_app_state(true));

        let body = r#"{
            "action": "RESET_QUEUE",
            "data": {"nextNumbers": {"standard": 9, "expectant": 1, "senior": 1}}
        }"#;
        let response = post_json(&app, "/api/queue-sync", body).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let ack: SyncCommandResponse = body_json(response).await;
        assert!(ack.success, "unknown actions are acknowledged, not errors");
        assert_eq!(ack.data.next_numbers.standard, 1, "state is untouched");
    }

    #[tokio::test]
    async fn test_sync_push_rejected_on_passive_replica() {
        let app: Router = build_router(create_test_app_state(false));

        let body = r#"{"action": "CALL_NEXT", "data": {}}"#;
        let response = post_json(&app, "/api/queue-sync", body).await;
        assert_eq!(response.status(), HttpStatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_mutations_publish_snapshots_to_observers() {
        let app_state: AppState = create_test_app_state(true);
        let mut receiver = app_state.broadcaster.subscribe();
        let app: Router = build_router(app_state);

        post_json(&app, "/tickets", r#"{"service_class":"senior"}"#).await;

        let snapshot: QueueSnapshot = receiver.recv().await.unwrap();
        assert_eq!(snapshot.queue.len(), 1);
        assert_eq!(snapshot.queue[0].display_code, "I001");
    }

    #[tokio::test]
    async fn test_concurrent_mutations_publish_in_commit_order() {
        let app_state: AppState = create_test_app_state(true);
        let mut receiver = app_state.broadcaster.subscribe();
        let app: Router = build_router(app_state);

        let issue = |class: &'static str| {
            let app: Router = app.clone();
            async move {
                let body: String = format!(r#"{{"service_class":"{class}"}}"#);
                post_json(&app, "/tickets", &body).await
            }
        };
        tokio::join!(
            issue("standard"),
            issue("expectant"),
            issue("senior"),
            issue("standard")
        );

        // Each mutation grows the queue by one, so a subscriber must see
        // strictly growing snapshots; a regression reorders them.
        let mut seen: usize = 0;
        for _ in 0..4 {
            let snapshot: QueueSnapshot = receiver.recv().await.unwrap();
            assert!(
                snapshot.queue.len() > seen,
                "snapshot with {} tickets arrived after one with {}",
                snapshot.queue.len(),
                seen
            );
            seen = snapshot.queue.len();
        }
        assert_eq!(seen, 4);
    }

    #[tokio::test]
    async fn test_stats_and_positions_endpoints() {
        let app: Router = build_router(create_test_app_state(true));
        post_json(&app, "/tickets", r#"{"service_class":"standard"}"#).await;
        post_json(&app, "/tickets", r#"{"service_class":"senior"}"#).await;

        let stats_response: StatsResponse = body_json(get_uri(&app, "/stats").await).await;
        assert_eq!(stats_response.waiting_total, 2);
        assert_eq!(stats_response.waiting_senior, 1);
        assert_eq!(stats_response.completed_today, 0);

        let positions: PositionsResponse = body_json(get_uri(&app, "/positions").await).await;
        assert_eq!(positions.positions.len(), 3);
    }

    #[tokio::test]
    async fn test_completed_report_validates_dates() {
        let app: Router = build_router(create_test_app_state(true));

        let response = get_uri(&app, "/queue/completed?from=bogus").await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);

        let response = get_uri(&app, "/queue/completed?from=2026-03-01&to=2026-03-31").await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let report: CompletedReportResponse = body_json(response).await;
        assert_eq!(report.total, 0);
    }
}
