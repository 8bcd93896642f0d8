//! # API REST
//!
//! REST API implementation for the triage kiosk.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! All domain behaviour lives in `triage-core`; handlers only translate between HTTP and the
//! core types. Intake sessions live in process memory, are dropped after
//! [`SESSION_IDLE_SECS`] without requests and are lost on restart.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use triage_core::{
    auth::{LoginForm, RecoveryForm, RecoveryStage},
    clock::clock_text,
    config::{flow_variant_from_env_value, high_risk_age_from_env_value, load_fixtures_source},
    constants::{CLOCK_REFRESH_SECS, SESSION_IDLE_SECS},
    dashboard::{AttendanceStatus, DashboardStats, LevelCount, RowView},
    evaluation::{
        evaluation_header, request_report, save_evaluation, EvaluationHeader, SavedEvaluation,
        VitalSignsForm,
    },
    fixtures::{LevelHistory, PatientDetail, PriorVisit},
    intake::{
        AgeAssessment, BasicDataForm, Complaint, DocumentType, EmergencyContact, IdentityData,
        IntakeRecord, MedicalHistory, MedicalHistoryForm, PregnancyAnswer, Role, Sex,
        SymptomsForm,
    },
    multiselect::{MultiSelectView, Selection},
    notice::{Notice, NoticeKind},
    questions::{Answer, AnswerRecord, QuestionGenerator, QuestionKind, QuestionOption},
    session::{BasicDataGate, Overlay, Picker, Theme},
    wizard::{EntryGate, ExitGate, FlowVariant, ProgressView, StepDescriptor, StepKind},
    CoreConfig, Dashboard, DashboardFilter, EsiLevel, FixtureBook, IntakeSession, Question,
    ReferenceCode, SessionAction, SessionView, TriageError, TriageResult,
};

type ApiError = (StatusCode, String);

/// A stored session and the time of its last request.
struct SessionSlot {
    session: IntakeSession,
    last_seen: Instant,
}

impl SessionSlot {
    fn new(session: IntakeSession) -> Self {
        Self {
            session,
            last_seen: Instant::now(),
        }
    }

    fn touch(&mut self) -> &mut IntakeSession {
        self.last_seen = Instant::now();
        &mut self.session
    }
}

/// Application state for the REST API server.
///
/// Configuration and fixtures are read once at startup. Sessions and saved evaluations are
/// held in memory behind mutexes; no lock is held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    fixtures: Arc<FixtureBook>,
    dashboard: Arc<Dashboard>,
    sessions: Arc<Mutex<HashMap<Uuid, SessionSlot>>>,
    evaluations: Arc<Mutex<HashMap<ReferenceCode, SavedEvaluation>>>,
    clock: Arc<RwLock<String>>,
}

impl AppState {
    /// Build the state, parsing the fixture document held by `cfg`.
    pub fn new(cfg: CoreConfig) -> TriageResult<Self> {
        let fixtures = FixtureBook::parse(cfg.fixtures_yaml())?;
        let dashboard = fixtures.dashboard();
        Ok(Self {
            cfg: Arc::new(cfg),
            fixtures: Arc::new(fixtures),
            dashboard: Arc::new(dashboard),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            evaluations: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(RwLock::new(clock_text(Local::now().naive_local()))),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Re-render the dashboard clock from the local time.
    pub fn refresh_clock(&self) {
        let text = clock_text(Local::now().naive_local());
        match self.clock.write() {
            Ok(mut guard) => *guard = text,
            Err(e) => tracing::error!("clock lock poisoned: {:?}", e),
        }
    }

    /// Drop sessions with no request for at least `max_idle`. Returns how many were dropped.
    pub fn evict_idle_sessions(&self, max_idle: Duration) -> usize {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("session store lock poisoned: {:?}", e);
                return 0;
            }
        };
        let before = sessions.len();
        sessions.retain(|_, slot| slot.last_seen.elapsed() < max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!("evicted {} idle sessions", evicted);
        }
        evicted
    }
}

/// Resolve the core configuration from `TRIAGE_*` environment variables.
///
/// # Environment Variables
/// - `TRIAGE_FLOW_VARIANT`: `role-screen` or `login-gate` (default `login-gate`)
/// - `TRIAGE_HIGH_RISK_AGE`: age from which the high-risk alert shows (default 65)
/// - `TRIAGE_FIXTURES_FILE`: optional YAML file replacing the built-in demo fixtures
pub fn core_config_from_env() -> TriageResult<CoreConfig> {
    let flow_variant = flow_variant_from_env_value(std::env::var("TRIAGE_FLOW_VARIANT").ok())?;
    let high_risk_age = high_risk_age_from_env_value(std::env::var("TRIAGE_HIGH_RISK_AGE").ok())?;
    let fixtures_yaml = load_fixtures_source(
        std::env::var("TRIAGE_FIXTURES_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from),
    )?;

    CoreConfig::new(flow_variant, high_risk_age, fixtures_yaml)
}

/// Every [`CLOCK_REFRESH_SECS`] seconds, refresh the clock text and drop sessions idle for
/// [`SESSION_IDLE_SECS`]. Runs until the runtime shuts down.
pub fn spawn_housekeeping(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(CLOCK_REFRESH_SECS));
        let max_idle = Duration::from_secs(SESSION_IDLE_SECS);
        loop {
            ticker.tick().await;
            state.refresh_clock();
            state.evict_idle_sessions(max_idle);
        }
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        generate,
        create_session,
        get_session,
        delete_session,
        session_action,
        dashboard,
        dashboard_stats,
        patient_history,
        get_evaluation,
        post_evaluation,
        report,
        clock,
    ),
    components(schemas(
        HealthRes,
        QuestionsReq,
        QuestionsRes,
        ActionRes,
        DashboardRes,
        EvaluationRes,
        ClockRes,
        Question,
        Answer,
        SessionAction,
        LoginForm,
        RecoveryForm,
        BasicDataForm,
        MedicalHistoryForm,
        SymptomsForm,
        SessionView,
        FlowVariant,
        StepKind,
        ProgressView,
        RecoveryStage,
        BasicDataGate,
        MultiSelectView,
        IntakeRecord,
        IdentityData,
        EmergencyContact,
        Role,
        Sex,
        DocumentType,
        PregnancyAnswer,
        AgeAssessment,
        MedicalHistory,
        Selection,
        Complaint,
        AnswerRecord,
        QuestionKind,
        QuestionOption,
        StepDescriptor,
        EntryGate,
        ExitGate,
        AttendanceStatus,
        Theme,
        Overlay,
        Picker,
        EsiLevel,
        ReferenceCode,
        RowView,
        DashboardStats,
        LevelCount,
        PatientDetail,
        LevelHistory,
        PriorVisit,
        EvaluationHeader,
        SavedEvaluation,
        VitalSignsForm,
        Notice,
        NoticeKind,
    ))
)]
struct ApiDoc;

/// Build the HTTP router, including Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/questions", post(generate))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/actions", post(session_action))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/patients/:reference/history", get(patient_history))
        .route(
            "/dashboard/patients/:reference/evaluation",
            get(get_evaluation).post(post_evaluation),
        )
        .route("/dashboard/report", post(report))
        .route("/clock", get(clock))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the server fails.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct QuestionsReq {
    pub symptoms: String,
}

#[derive(Serialize, ToSchema)]
pub struct QuestionsRes {
    pub matched_groups: Vec<String>,
    pub questions: Vec<Question>,
}

#[derive(Serialize, ToSchema)]
pub struct ActionRes {
    pub session: SessionView,
    pub notice: Option<Notice>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardRes {
    pub rows: Vec<RowView>,
}

#[derive(Serialize, ToSchema)]
pub struct EvaluationRes {
    pub header: EvaluationHeader,
    pub last_saved: Option<SavedEvaluation>,
}

#[derive(Serialize, ToSchema)]
pub struct ClockRes {
    pub text: String,
    pub refresh_secs: u64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// ESI level 1-5, or `all`.
    pub esi: Option<String>,
    /// `waiting`, `in-progress`, `completed`, or `all`.
    pub status: Option<String>,
    /// `none`, `esi`, `name` or `arrival`.
    pub sort: Option<String>,
}

// ============================================================================
// Error mapping
// ============================================================================

fn error_response(context: &str, err: TriageError) -> ApiError {
    let status = match &err {
        TriageError::UnknownSession(_) | TriageError::UnknownPatient(_) => StatusCode::NOT_FOUND,
        TriageError::WrongStep { .. }
        | TriageError::EntryDenied(_)
        | TriageError::ExitDenied(_)
        | TriageError::NotBehind { .. }
        | TriageError::OverlayNotOpen(_) => StatusCode::CONFLICT,
        TriageError::FixtureSchema { .. }
        | TriageError::FixtureInvalid(_)
        | TriageError::FixtureRead(_) => {
            tracing::error!("{context} error: {:?}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into());
        }
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::error!("{context} error: {:?}", err);
    (status, err.to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ApiError> {
    mutex.lock().map_err(|e| {
        tracing::error!("state lock poisoned: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
    })
}

fn parse_reference(raw: &str) -> Result<ReferenceCode, ApiError> {
    ReferenceCode::parse(raw).map_err(|e| error_response("Reference", e))
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Triage REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/questions",
    request_body = QuestionsReq,
    responses(
        (status = 200, description = "Follow-up questions for the symptom text", body = QuestionsRes)
    )
)]
/// Generate the follow-up questionnaire for a free-text symptom description.
#[axum::debug_handler]
async fn generate(
    State(_state): State<AppState>,
    Json(req): Json<QuestionsReq>,
) -> Json<QuestionsRes> {
    let generator = QuestionGenerator::standard();
    Json(QuestionsRes {
        matched_groups: generator
            .matched_groups(&req.symptoms)
            .into_iter()
            .map(String::from)
            .collect(),
        questions: generator.generate(&req.symptoms),
    })
}

#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionView),
        (status = 500, description = "Internal server error")
    )
)]
/// Start a new intake session on the welcome screen.
#[axum::debug_handler]
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = IntakeSession::from_config(&state.cfg);
    let view = session.view(Local::now().date_naive());
    lock(&state.sessions)?.insert(session.id(), SessionSlot::new(session));

    tracing::info!("created session {}", view.id);
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current session state", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let mut sessions = lock(&state.sessions)?;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| error_response("Get session", TriageError::UnknownSession(id)))?
        .touch();
    Ok(Json(session.view(Local::now().date_naive())))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session")
    )
)]
/// Discard a session, for example when the kiosk user walks away.
#[axum::debug_handler]
async fn delete_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    lock(&state.sessions)?
        .remove(&id)
        .ok_or_else(|| error_response("Delete session", TriageError::UnknownSession(id)))?;

    tracing::info!("discarded session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/actions",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SessionAction,
    responses(
        (status = 200, description = "Action applied", body = ActionRes),
        (status = 400, description = "Invalid or incomplete input"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Action not allowed on the current step")
    )
)]
/// Apply one user action (submit a step, go back, toggle the theme, ...) to a session.
#[axum::debug_handler]
async fn session_action(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(action): Json<SessionAction>,
) -> Result<Json<ActionRes>, ApiError> {
    let today = Local::now().date_naive();
    let mut sessions = lock(&state.sessions)?;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| error_response("Session action", TriageError::UnknownSession(id)))?
        .touch();

    let notice = session
        .apply(action, today, &mut rand::thread_rng())
        .map_err(|e| error_response("Session action", e))?;

    Ok(Json(ActionRes {
        session: session.view(today),
        notice,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Rows after filtering and sorting", body = DashboardRes),
        (status = 400, description = "Invalid filter value")
    )
)]
/// Filter and sort the triage table.
#[axum::debug_handler]
async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardRes>, ApiError> {
    let filter = DashboardFilter::from_query(
        query.esi.as_deref(),
        query.status.as_deref(),
        query.sort.as_deref(),
    )
    .map_err(|e| error_response("Dashboard filter", e))?;

    Ok(Json(DashboardRes {
        rows: state.dashboard.apply(&filter),
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/stats",
    responses(
        (status = 200, description = "Row counts per ESI level and status", body = DashboardStats)
    )
)]
#[axum::debug_handler]
async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.dashboard.stats())
}

#[utoipa::path(
    get,
    path = "/dashboard/patients/{reference}/history",
    params(("reference" = String, Path, description = "Reference code, e.g. PRE-12345")),
    responses(
        (status = 200, description = "Patient row with its history panel", body = PatientDetail),
        (status = 400, description = "Malformed reference code"),
        (status = 404, description = "Unknown patient")
    )
)]
#[axum::debug_handler]
async fn patient_history(
    State(state): State<AppState>,
    AxumPath(reference): AxumPath<String>,
) -> Result<Json<PatientDetail>, ApiError> {
    let reference = parse_reference(&reference)?;
    state
        .fixtures
        .patient_detail(reference)
        .map(Json)
        .map_err(|e| error_response("Patient history", e))
}

#[utoipa::path(
    get,
    path = "/dashboard/patients/{reference}/evaluation",
    params(("reference" = String, Path, description = "Reference code, e.g. PRE-12345")),
    responses(
        (status = 200, description = "Evaluation header and last saved vitals", body = EvaluationRes),
        (status = 404, description = "Unknown patient")
    )
)]
#[axum::debug_handler]
async fn get_evaluation(
    State(state): State<AppState>,
    AxumPath(reference): AxumPath<String>,
) -> Result<Json<EvaluationRes>, ApiError> {
    let reference = parse_reference(&reference)?;
    let header = evaluation_header(&state.fixtures, reference)
        .map_err(|e| error_response("Evaluation header", e))?;
    let last_saved = lock(&state.evaluations)?.get(&reference).cloned();

    Ok(Json(EvaluationRes { header, last_saved }))
}

#[utoipa::path(
    post,
    path = "/dashboard/patients/{reference}/evaluation",
    params(("reference" = String, Path, description = "Reference code, e.g. PRE-12345")),
    request_body = VitalSignsForm,
    responses(
        (status = 200, description = "Evaluation saved", body = SavedEvaluation),
        (status = 400, description = "Implausible vital signs"),
        (status = 404, description = "Unknown patient")
    )
)]
/// Save a vital-signs evaluation. Kept in memory only.
#[axum::debug_handler]
async fn post_evaluation(
    State(state): State<AppState>,
    AxumPath(reference): AxumPath<String>,
    Json(vitals): Json<VitalSignsForm>,
) -> Result<Json<SavedEvaluation>, ApiError> {
    let reference = parse_reference(&reference)?;
    let saved = save_evaluation(&state.fixtures, reference, vitals)
        .map_err(|e| error_response("Save evaluation", e))?;
    lock(&state.evaluations)?.insert(reference, saved.clone());

    Ok(Json(saved))
}

#[utoipa::path(
    post,
    path = "/dashboard/report",
    responses(
        (status = 200, description = "Report request acknowledged", body = Notice)
    )
)]
#[axum::debug_handler]
async fn report(State(_state): State<AppState>) -> Json<Notice> {
    Json(request_report())
}

#[utoipa::path(
    get,
    path = "/clock",
    responses(
        (status = 200, description = "Dashboard clock text", body = ClockRes),
        (status = 500, description = "Internal server error")
    )
)]
#[axum::debug_handler]
async fn clock(State(state): State<AppState>) -> Result<Json<ClockRes>, ApiError> {
    let text = state
        .clock
        .read()
        .map_err(|e| {
            tracing::error!("clock lock poisoned: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        })?
        .clone();

    Ok(Json(ClockRes {
        text,
        refresh_secs: CLOCK_REFRESH_SECS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(CoreConfig::default()).expect("demo fixtures parse"))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.expect("router is infallible");
        let status = res.status();
        let bytes = res.into_body().collect().await.expect("body").to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn questions_endpoint_unions_matching_groups() {
        let (status, body) = send(
            &app(),
            post_json("/questions", json!({"symptoms": "tengo dolor en el pecho y fiebre"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<&str> = body["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![
                "chest-pain-type",
                "chest-pain-associated",
                "fever-duration",
                "fever-temperature"
            ]
        );
    }

    #[tokio::test]
    async fn session_walks_through_intake() {
        let app = app();
        let (status, created) = send(&app, Request::post("/sessions").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        let actions = format!("/sessions/{id}/actions");

        let (status, _) = send(&app, post_json(&actions, json!({"action": "start"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(
            &app,
            post_json(&actions, json!({"action": "choose-role", "role": "patient"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["progress"]["step"], "basic-data");

        let (status, body) = send(
            &app,
            post_json(
                &actions,
                json!({"action": "submit-basic-data", "form": {"full_name": "Ana"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().contains("incomplete"));

        let (status, body) = send(
            &app,
            post_json(&actions, json!({"action": "submit-symptoms", "form": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");

        let (status, body) = send(&app, get(&format!("/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["index"], 2);
    }

    #[tokio::test]
    async fn blank_login_returns_spanish_message() {
        let app = app();
        let (_, created) = send(&app, Request::post("/sessions").body(Body::empty()).unwrap()).await;
        let actions = format!("/sessions/{}/actions", created["id"].as_str().unwrap());

        send(&app, post_json(&actions, json!({"action": "start"}))).await;
        send(&app, post_json(&actions, json!({"action": "choose-role", "role": "staff"}))).await;
        let (status, body) = send(
            &app,
            post_json(&actions, json!({"action": "login", "form": {"email": "", "password": ""}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Por favor, complete todos los campos.");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (status, _) = send(&app(), get(&format!("/sessions/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sessions_can_be_deleted_and_expire_when_idle() {
        let state = AppState::new(CoreConfig::default()).expect("demo fixtures parse");
        let app = router(state.clone());
        let new_session = || Request::post("/sessions").body(Body::empty()).unwrap();

        let (_, created) = send(&app, new_session()).await;
        let uri = format!("/sessions/{}", created["id"].as_str().unwrap());
        let delete = |uri: &str| Request::delete(uri).body(Body::empty()).unwrap();

        let (status, _) = send(&app, delete(&uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, delete(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, created) = send(&app, new_session()).await;
        let uri = format!("/sessions/{}", created["id"].as_str().unwrap());
        assert_eq!(state.evict_idle_sessions(Duration::from_secs(3600)), 0);
        let (status, _) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(state.evict_idle_sessions(Duration::ZERO), 1);
        let (status, _) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn go_back_to_a_later_step_is_a_conflict() {
        let app = app();
        let (_, created) = send(&app, Request::post("/sessions").body(Body::empty()).unwrap()).await;
        let actions = format!("/sessions/{}/actions", created["id"].as_str().unwrap());

        send(&app, post_json(&actions, json!({"action": "start"}))).await;
        send(&app, post_json(&actions, json!({"action": "choose-role", "role": "patient"}))).await;
        let (status, _) = send(
            &app,
            post_json(&actions, json!({"action": "go-back", "to": "dynamic-questions"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            post_json(&actions, json!({"action": "submit-answers", "answers": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn dashboard_completed_filter_hides_start_action() {
        let (status, body) = send(&app(), get("/dashboard?esi=all&status=completed&sort=esi")).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["rows"].as_array().unwrap();
        let visible: Vec<&Value> = rows.iter().filter(|r| r["visible"] == true).collect();
        assert!(!visible.is_empty());
        for row in &visible {
            assert_eq!(row["status_label"], "Atendido");
            assert_eq!(row["start_action_visible"], false);
        }
        // Hidden rows trail the visible ones.
        let first_hidden = rows.iter().position(|r| r["visible"] == false).unwrap();
        assert_eq!(first_hidden, visible.len());
    }

    #[tokio::test]
    async fn dashboard_rejects_unknown_sort_key() {
        let (status, _) = send(&app(), get("/dashboard?sort=weight")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_lookup_by_reference() {
        let (status, body) = send(&app(), get("/dashboard/patients/PRE-23456/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ana Martínez");
        assert_eq!(body["history"]["allergies"], "Látex");

        let (status, _) = send(&app(), get("/dashboard/patients/PRE-00000/history")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app(), get("/dashboard/patients/PRE-99999/history")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn evaluation_is_saved_in_memory() {
        let app = app();
        let uri = "/dashboard/patients/PRE-12345/evaluation";
        let (status, body) = send(
            &app,
            post_json(uri, json!({"heart_rate": 118, "systolic": 160, "diastolic": 100, "esi": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notice"]["message"], "Evaluación guardada correctamente.");

        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["header"]["patient_name"], "Carlos Rodríguez");
        assert_eq!(body["last_saved"]["vitals"]["heart_rate"], 118);
    }

    #[tokio::test]
    async fn report_and_clock() {
        let app = app();
        let (status, body) = send(&app, Request::post("/dashboard/report").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().starts_with("Generando reporte..."));

        let (status, body) = send(&app, get("/clock")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["text"].as_str().unwrap().contains(" de "));
        assert_eq!(body["refresh_secs"], 60);
    }
}
