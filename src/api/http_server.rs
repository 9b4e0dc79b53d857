//! HTTP server - course, section and problem endpoints
//!
//! Every endpoint is a thin wrapper over [`crate::services`]. Errors are
//! reported as `{ "msg": ..., "code": ... }`; server-side failures carry a
//! generic message and are logged instead.

use crate::models::{PaginationConfig, ProblemDataConfig};
use crate::parser::FragmentPolicy;
use crate::services::{self, ProblemQuery, ProblemRef, ServiceError};
use crate::store::ContentResolver;
use crate::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// Error codes
// =============================================================================

pub const COURSE_ID_INVALID: u32 = 40001;
pub const SECTION_ID_INVALID: u32 = 40002;
pub const PROBLEM_ID_INVALID: u32 = 40003;
pub const BLOCK_KEY_INVALID: u32 = 40004;
pub const PROBLEM_TYPE_UNSUPPORTED: u32 = 40005;
pub const INVALID_ARGUMENT: u32 = 40006;
pub const INVALID_PAGE: u32 = 40007;

// =============================================================================
// Application State
// =============================================================================

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn ContentResolver>,
    pub pagination: PaginationConfig,
    pub fragment_policy: FragmentPolicy,
}

impl AppState {
    pub fn new(resolver: Arc<dyn ContentResolver>, config: &ProblemDataConfig) -> Self {
        Self {
            resolver,
            pagination: config.pagination.clone(),
            fragment_policy: config.parser.fragment_policy,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// An error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    msg: String,
    code: Option<u32>,
}

impl ApiError {
    pub fn bad_request(msg: &str, code: u32) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            msg: msg.to_string(),
            code: Some(code),
        }
    }

    /// Map a service error; identifier failures are reported as `invalid`
    fn from_service(err: ServiceError, invalid: (&str, u32)) -> Self {
        match &err {
            ServiceError::Problem(e) if e.is_unsupported() => {
                Self::bad_request("The problem type is not supported.", PROBLEM_TYPE_UNSUPPORTED)
            }
            ServiceError::InvalidPage(_) => Self {
                status: StatusCode::NOT_FOUND,
                msg: "Invalid page.".to_string(),
                code: Some(INVALID_PAGE),
            },
            ServiceError::Search(_) => Self::bad_request("Invalid search text.", INVALID_ARGUMENT),
            ServiceError::InvalidArgument(msg) => Self::bad_request(msg, INVALID_ARGUMENT),
            ServiceError::Resolve(e) if e.is_invalid_id() => Self::bad_request(invalid.0, invalid.1),
            _ => {
                tracing::error!("Request failed: {}", err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    msg: "Server Error".to_string(),
                    code: None,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.code {
            Some(code) => serde_json::json!({ "msg": self.msg, "code": code }),
            None => serde_json::json!({ "msg": self.msg }),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

const COURSE_INVALID: (&str, u32) = ("Course id is invalid.", COURSE_ID_INVALID);
const SECTION_INVALID: (&str, u32) = ("Section id is invalid.", SECTION_ID_INVALID);
const PROBLEM_INVALID: (&str, u32) = ("Problem id is invalid.", PROBLEM_ID_INVALID);
const BLOCK_INVALID: (&str, u32) = ("Block id is invalid.", BLOCK_KEY_INVALID);

// =============================================================================
// Server Startup
// =============================================================================

/// Build the router with all endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/courses", get(api_courses))
        .route("/problems", get(api_problems))
        .route("/sections", get(api_sections))
        .route("/sections/count", post(api_section_counts))
        .route("/problem/types", get(api_problem_types))
        .route("/section/problems", post(api_section_problems))
        .route("/problems/detail", post(api_problem_details))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on the configured host and port
pub async fn start_server(config: &ProblemDataConfig, resolver: Arc<dyn ContentResolver>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(AppState::new(resolver, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    println!("✓ Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct CourseParams {
    title: Option<String>,
}

async fn api_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseParams>,
) -> Json<Vec<services::CourseSummary>> {
    let today = chrono::Local::now().date_naive();
    Json(services::list_courses(
        state.resolver.as_ref(),
        params.title.as_deref(),
        today,
    ))
}

#[derive(Debug, Deserialize)]
struct SectionParams {
    course_id: Option<String>,
}

async fn api_sections(
    State(state): State<AppState>,
    Query(params): Query<SectionParams>,
) -> ApiResult<Vec<services::SectionSummary>> {
    let course_id = params
        .course_id
        .ok_or_else(|| ApiError::bad_request(COURSE_INVALID.0, COURSE_INVALID.1))?;
    services::list_sections(state.resolver.as_ref(), &course_id)
        .map(Json)
        .map_err(|e| ApiError::from_service(e, COURSE_INVALID))
}

async fn api_section_counts(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Vec<services::SectionSummary>> {
    let section_ids = string_list(body.get("section_id"))
        .ok_or_else(|| ApiError::bad_request(SECTION_INVALID.0, SECTION_INVALID.1))?;
    services::section_counts(state.resolver.as_ref(), &section_ids)
        .map(Json)
        .map_err(|e| ApiError::from_service(e, SECTION_INVALID))
}

async fn api_problem_types() -> Json<Vec<&'static str>> {
    Json(services::problem_types())
}

#[derive(Debug, Deserialize)]
struct SectionProblemsBody {
    #[serde(default)]
    sections: Vec<String>,
    #[serde(default)]
    types: Vec<String>,
}

async fn api_section_problems(
    State(state): State<AppState>,
    Json(body): Json<SectionProblemsBody>,
) -> ApiResult<services::SectionProblems> {
    services::section_problems(state.resolver.as_ref(), &body.sections, &body.types)
        .map(Json)
        .map_err(|e| ApiError::from_service(e, PROBLEM_INVALID))
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    #[serde(default)]
    problems: Vec<ProblemRef>,
}

async fn api_problem_details(
    State(state): State<AppState>,
    Json(body): Json<DetailBody>,
) -> ApiResult<Vec<Option<crate::models::ProblemContent>>> {
    services::problem_details(state.resolver.as_ref(), &body.problems, state.fragment_policy)
        .map(Json)
        .map_err(|e| ApiError::from_service(e, ("Invalid Block Key", BLOCK_KEY_INVALID)))
}

#[derive(Debug, Deserialize)]
struct ProblemParams {
    block_id: Option<String>,
    problem_type: Option<String>,
    text: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn api_problems(
    State(state): State<AppState>,
    Query(params): Query<ProblemParams>,
) -> ApiResult<services::Page<Option<crate::models::ProblemContent>>> {
    let block_id = params
        .block_id
        .ok_or_else(|| ApiError::bad_request(BLOCK_INVALID.0, BLOCK_INVALID.1))?;
    let query = ProblemQuery {
        block_id,
        problem_type: params.problem_type,
        text: params.text,
        page: params.page,
        page_size: params.page_size,
    };
    services::list_problems(
        state.resolver.as_ref(),
        &query,
        &state.pagination,
        state.fragment_policy,
    )
    .map(Json)
    .map_err(|e| ApiError::from_service(e, BLOCK_INVALID))
}

/// A JSON array of strings, `None` for anything else
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
