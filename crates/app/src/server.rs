//! HTTP front end: chapter research plus plan CRUD and progress.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use planner_core::content::ContentTable;
use planner_core::model::{PlanId, PlanProgress, PlanSummary, StudyPlan};
use planner_core::quiz::{QuizQuestion, QuizScore};
use services::research::{ResearchRequest, ResearchResponse};
use services::{
    AppServices, AppServicesError, LocalResearch, PlanRequest, PlanServiceError, ProgressError,
    QuizService, ResearchSource,
};
use storage::repository::StorageError;

pub struct AppState {
    services: AppServices,
    research: LocalResearch,
}

impl AppState {
    /// The research endpoint always answers from a local table; a remote
    /// source falls back to the built-in one.
    pub fn new(services: AppServices, source: &ResearchSource) -> Result<Self, AppServicesError> {
        let table = match source.local_table()? {
            Some(table) => table,
            None => ContentTable::builtin()?,
        };
        Ok(Self {
            services,
            research: LocalResearch::new(Arc::new(table)),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/research-course", post(research_course))
        .route("/api/plans", get(list_plans).post(create_plan))
        .route("/api/plans/:id", get(get_plan).delete(delete_plan))
        .route("/api/plans/:id/phases/:index/toggle", post(toggle_phase))
        .route("/api/plans/:id/resources/visit", post(visit_resource))
        .route("/api/plans/:id/progress", get(plan_progress))
        .route("/api/plans/:id/quiz", get(plan_quiz))
        .route("/api/quiz/grade", post(grade_quiz))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "study planner listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(err: &dyn std::error::Error) -> Self {
        error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::new(StatusCode::NOT_FOUND, "plan not found"),
            other => Self::internal(&other),
        }
    }
}

impl From<PlanServiceError> for ApiError {
    fn from(err: PlanServiceError) -> Self {
        match err {
            PlanServiceError::Validation(err) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            PlanServiceError::Storage(err) => err.into(),
            other => Self::internal(&other),
        }
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::Plan(err) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            ProgressError::Storage(err) => err.into(),
            other => Self::internal(&other),
        }
    }
}

fn plan_id(raw: &str) -> Result<PlanId, ApiError> {
    PlanId::from_str(raw)
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid plan id: {raw}")))
}

//
// ─── HANDLERS ──────────────────────────────────────────────────────────────────
//

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn research_course(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("failed to research course: {}", rejection.body_text()),
        )
    })?;
    let chapter_details = state
        .research
        .resolve_all(&request.subject, &request.chapters)
        .await;
    Ok(Json(ResearchResponse { chapter_details }))
}

#[derive(Debug, Serialize)]
struct CreatedPlan {
    id: PlanId,
    plan: StudyPlan,
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedPlan>), ApiError> {
    let Json(request) = payload?;
    let (id, plan) = state.services.plans().create(&request).await?;
    Ok((StatusCode::CREATED, Json(CreatedPlan { id, plan })))
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlanSummary>>, ApiError> {
    Ok(Json(state.services.plans().list().await?))
}

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StudyPlan>, ApiError> {
    let id = plan_id(&id)?;
    Ok(Json(state.services.plans().load(id).await?))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = plan_id(&id)?;
    state.services.plans().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_phase(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, usize)>, PathRejection>,
) -> Result<Json<PlanProgress>, ApiError> {
    let Path((id, index)) = path?;
    let id = plan_id(&id)?;
    Ok(Json(state.services.progress().toggle_phase(id, index).await?))
}

#[derive(Debug, Deserialize)]
struct VisitRequest {
    url: String,
}

async fn visit_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<VisitRequest>, JsonRejection>,
) -> Result<Json<PlanProgress>, ApiError> {
    let id = plan_id(&id)?;
    let Json(visit) = payload?;
    Ok(Json(
        state
            .services
            .progress()
            .record_resource_visit(id, &visit.url)
            .await?,
    ))
}

async fn plan_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlanProgress>, ApiError> {
    let id = plan_id(&id)?;
    Ok(Json(state.services.progress().progress(id).await?))
}

async fn plan_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<QuizQuestion>>, ApiError> {
    let id = plan_id(&id)?;
    Ok(Json(state.services.quiz().quiz_for(id).await?))
}

#[derive(Debug, Deserialize)]
struct GradeRequest {
    questions: Vec<QuizQuestion>,
    #[serde(default)]
    answers: HashMap<usize, usize>,
}

async fn grade_quiz(
    payload: Result<Json<GradeRequest>, JsonRejection>,
) -> Result<Json<QuizScore>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(QuizService::grade(&request.questions, &request.answers)))
}
