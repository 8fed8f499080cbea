use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::cli::ServeArgs;
use crate::core::record::RawRecord;
use crate::profiling::column::TableSample;
use crate::profiling::profiler::{ColumnProfiler, RelevanceMap};
use crate::screening::batch::BatchSummary;
use crate::screening::engine::{EvaluationMode, EvaluationResult, Evaluator};
use crate::utils::validation::{check_column_limit, validate_filename};
use crate::vocabulary::config::ScreeningConfig;

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_REQUEST_RECORDS: usize = 10_000;
pub const MAX_BODY_SIZE: usize = 20 * 1024 * 1024; // 20MB

/// Shared application state
pub struct AppState {
    pub config: ScreeningConfig,
    pub short_circuit: Evaluator,
    pub full_audit: Evaluator,
    pub profiler: ColumnProfiler,
}

impl AppState {
    /// Compile evaluators and the profiler for `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not compile.
    pub fn new(config: ScreeningConfig) -> anyhow::Result<Self> {
        let short_circuit = Evaluator::new(&config)?;
        let full_audit = short_circuit.clone().with_mode(EvaluationMode::FullAudit);
        let profiler = ColumnProfiler::from_vocabulary(short_circuit.vocabulary().clone());
        Ok(Self {
            config,
            short_circuit,
            full_audit,
            profiler,
        })
    }
}

/// Enhanced error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ScreenRequest {
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub full_audit: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenResponse {
    pub fingerprint: String,
    pub results: Vec<EvaluationResult>,
    pub summary: BatchSummary,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
    }
}

fn error_reply(status: StatusCode, error: ErrorResponse) -> Response {
    (status, Json(error)).into_response()
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// API routes without the security middleware
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/config", get(config_handler))
        .route("/api/screen", post(screen_handler))
        .route("/api/profile", post(profile_handler))
        .with_state(state)
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the configuration does not compile or the rate limiter
/// cannot be configured.
pub fn create_router(config: ScreeningConfig) -> anyhow::Result<Router> {
    let state = Arc::new(AppState::new(config)?);

    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10) // 10 requests per second per IP
        .burst_size(50) // Allow bursts of 50 requests
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?;

    let app = api_routes(state).layer(
        ServiceBuilder::new()
            // Security headers for browser protection
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("strict-transport-security"),
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            // IP-based rate limiting to prevent abuse
            .layer(GovernorLayer::new(Arc::new(governor_conf)))
            // Screening a large batch is CPU-bound; bound the wall time
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(60),
            ))
            // Limit concurrent requests to prevent DOS
            .layer(ConcurrencyLimitLayer::new(100))
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
    );

    Ok(app)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = ScreeningConfig::load(args.config.as_deref())?;
    info!(
        "Serving configuration '{}' v{} ({})",
        config.name,
        config.version,
        config.fingerprint()
    );
    let app = create_router(config)?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting sc-screen web server at http://{addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Describe the active configuration
async fn config_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = &state.config;
    Json(serde_json::json!({
        "name": config.name,
        "version": config.version,
        "fingerprint": state.short_circuit.vocabulary().fingerprint(),
        "weights": config.weights,
        "grading": config.grading,
        "max_optional_contribution": config.max_optional_contribution(),
        "max_request_records": MAX_REQUEST_RECORDS,
    }))
}

async fn screen_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScreenRequest>,
) -> Response {
    if request.records.len() > MAX_REQUEST_RECORDS {
        return error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            create_safe_error_response(
                "too_many_records",
                &format!("At most {MAX_REQUEST_RECORDS} records per request"),
                None,
            ),
        );
    }

    let task = tokio::task::spawn_blocking(move || {
        let evaluator = if request.full_audit {
            &state.full_audit
        } else {
            &state.short_circuit
        };
        let results = evaluator.evaluate_batch(&request.records);
        let summary = BatchSummary::from_results(&results);
        ScreenResponse {
            fingerprint: evaluator.vocabulary().fingerprint().to_string(),
            results,
            summary,
        }
    });

    match task.await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            create_safe_error_response(
                "screening_failed",
                "Screening failed",
                Some(&e.to_string()),
            ),
        ),
    }
}

async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Json(mut table): Json<TableSample>,
) -> Response {
    if let Some(msg) = check_column_limit(table.columns.len()) {
        return error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            create_safe_error_response("too_many_columns", &msg, None),
        );
    }

    if !table.table.trim().is_empty() {
        match validate_filename(&table.table) {
            Ok(name) => table.table = name,
            Err(e) => {
                return error_reply(
                    StatusCode::BAD_REQUEST,
                    create_safe_error_response("invalid_table_name", &e.to_string(), None),
                )
            }
        }
    }

    let task = tokio::task::spawn_blocking(move || -> RelevanceMap {
        state.profiler.profile_table(&table)
    });

    match task.await {
        Ok(map) => Json(map).into_response(),
        Err(e) => error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            create_safe_error_response("profiling_failed", "Profiling failed", Some(&e.to_string())),
        ),
    }
}
