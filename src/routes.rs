//! HTTP API: session lifecycle, event dispatch and the reference baseline.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OwnedMutexGuard;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ConversationConfig;
use crate::conversation::Collaborators;
use crate::error::SurveyError;
use crate::questions::SCALE_STATEMENTS;
use crate::session::{Session, SessionEvent, SessionStore, SurveyMode};
use crate::wizard::{Banding, Baseline};

const DEFAULT_CURVE_POINTS: usize = 50;
const MAX_CURVE_POINTS: usize = 500;

/// Shared state for the survey routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub mode: SurveyMode,
    pub conversation: ConversationConfig,
    /// Required for conversation mode.
    pub collaborators: Option<Collaborators>,
}

/// Build the survey REST routes.
pub fn survey_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/baseline", get(baseline))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/events", post(post_event))
        .layer(cors)
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({"error": message.into()})))
}

/// Map a survey error onto an HTTP status and JSON body.
fn survey_error(err: &SurveyError) -> ApiError {
    let status = match err {
        SurveyError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
        SurveyError::MissingAnswer { .. }
        | SurveyError::MissingAnswers { .. }
        | SurveyError::QuestionsRemaining { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SurveyError::InvalidIndex { .. }
        | SurveyError::InvalidValue { .. }
        | SurveyError::EmptyAnswer
        | SurveyError::NoQuestions => StatusCode::BAD_REQUEST,
        SurveyError::AtFirstQuestion
        | SurveyError::AlreadyCompleted
        | SurveyError::UnsupportedEvent { .. } => StatusCode::CONFLICT,
        SurveyError::Collaborator(_) => StatusCode::BAD_GATEWAY,
    };

    let mut body = json!({"error": err.to_string()});
    match err {
        SurveyError::MissingAnswers { indices } => body["missing"] = json!(indices),
        SurveyError::MissingAnswer { index } => body["missing"] = json!([index]),
        SurveyError::Collaborator(_) => {
            body["error"] = json!("The assistant could not be reached. Please try again.");
        }
        _ => {}
    }
    (status, Json(body))
}

/// Parse the id and lock the session it names.
async fn lock_session(
    state: &AppState,
    raw_id: &str,
) -> Result<OwnedMutexGuard<Session>, ApiError> {
    let id = Uuid::parse_str(raw_id)
        .map_err(|_| error_body(StatusCode::BAD_REQUEST, "Invalid session ID"))?;
    state
        .store
        .lock(id)
        .await
        .ok_or_else(|| survey_error(&SurveyError::SessionNotFound { id }))
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "humility-survey",
        "mode": state.mode,
        "sessions": state.store.len().await,
    }))
}

// ── Baseline ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BaselineQuery {
    points: Option<usize>,
}

/// GET /api/baseline
///
/// Reference distribution for the scale questionnaire, with the normal
/// curve sampled at `points` positions for charting.
async fn baseline(Query(query): Query<BaselineQuery>) -> impl IntoResponse {
    let count = SCALE_STATEMENTS.len();
    let baseline = Baseline::for_questions(count);
    let points = query
        .points
        .unwrap_or(DEFAULT_CURVE_POINTS)
        .min(MAX_CURVE_POINTS);
    let curve: Vec<[f64; 2]> = baseline
        .density_curve(points)
        .into_iter()
        .map(|(x, y)| [x, y])
        .collect();

    Json(json!({
        "baseline": baseline,
        "bands": Banding::for_questions(count),
        "curve": curve,
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn create_session(State(state): State<AppState>) -> Response {
    match Session::for_mode(state.mode, &state.conversation, state.collaborators.as_ref()) {
        Ok(session) => {
            let handle = state.store.create(session).await;
            let snapshot = handle.lock().await.snapshot();
            (StatusCode::CREATED, Json(json!(snapshot))).into_response()
        }
        Err(e) => {
            warn!(mode = %state.mode, error = %e, "Could not create session");
            survey_error(&e).into_response()
        }
    }
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match lock_session(&state, &id).await {
        Ok(session) => Json(json!(session.snapshot())).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/sessions/{id}/events
///
/// Applies one event and returns the render instruction together with the
/// updated session.
async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<SessionEvent>,
) -> Response {
    let mut session = match lock_session(&state, &id).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    let event_name = event.name();
    match session.dispatch(event).await {
        Ok(render) => Json(json!({
            "render": render,
            "session": session.snapshot(),
        }))
        .into_response(),
        Err(e) => {
            if e.is_collaborator_failure() {
                warn!(session_id = %session.id, event = event_name, error = %e, "Collaborator call failed");
            } else {
                info!(session_id = %session.id, event = event_name, error = %e, "Event rejected");
            }
            survey_error(&e).into_response()
        }
    }
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(uuid) = Uuid::parse_str(&id) else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };
    if state.store.remove(uuid).await {
        Json(json!({"status": "deleted"})).into_response()
    } else {
        survey_error(&SurveyError::SessionNotFound { id: uuid }).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::error::LlmError;

    fn scale_app() -> (Router, Arc<SessionStore>) {
        let store = SessionStore::new();
        let app = survey_routes(AppState {
            store: Arc::clone(&store),
            mode: SurveyMode::Scale,
            conversation: ConversationConfig::default(),
            collaborators: None,
        });
        (app, store)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn error_statuses() {
        let cases = [
            (SurveyError::SessionNotFound { id: Uuid::nil() }, StatusCode::NOT_FOUND),
            (SurveyError::MissingAnswers { indices: vec![0] }, StatusCode::UNPROCESSABLE_ENTITY),
            (SurveyError::InvalidValue { value: 9 }, StatusCode::BAD_REQUEST),
            (SurveyError::AlreadyCompleted, StatusCode::CONFLICT),
            (
                SurveyError::Collaborator(LlmError::AuthFailed {
                    provider: "openai".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(survey_error(&err).0, expected, "{err}");
        }
    }

    #[test]
    fn collaborator_errors_hide_provider_detail() {
        let (_, Json(body)) = survey_error(&SurveyError::Collaborator(LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: "secret detail".to_string(),
        }));
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("try again"));
        assert!(!message.contains("secret detail"));
    }

    #[tokio::test]
    async fn health_reports_mode() {
        let (app, _) = scale_app();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mode"], "scale");
    }

    #[tokio::test]
    async fn baseline_curve_points() {
        let (app, _) = scale_app();
        let request = Request::get("/api/baseline?points=5").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["baseline"]["items"], 6);
        assert_eq!(body["bands"]["top_at_or_above"], 25);
        assert_eq!(body["bands"]["bottom_at_or_below"], 20);
        let curve = body["curve"].as_array().unwrap();
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0][0], 6.0);
        assert_eq!(curve[4][0], 30.0);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (app, store) = scale_app();

        let (status, created) = send(&app, post_json("/api/sessions", json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["render"]["kind"], "wizard");
        assert_eq!(created["render"]["screen"], "question");
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(store.len().await, 1);

        let uri = format!("/api/sessions/{id}/events");
        let (status, body) = send(&app, post_json(&uri, json!({"type": "next"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["missing"], json!([0]));

        let (status, body) = send(
            &app,
            post_json(&uri, json!({"type": "select_answer", "index": 0, "value": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains('7'));

        let (status, body) = send(
            &app,
            post_json(&uri, json!({"type": "message", "content": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, Request::delete(format!("/api/sessions/{id}")).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Request::get(format!("/api/sessions/{id}")).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_session_id() {
        let (app, _) = scale_app();
        let request = Request::get("/api/sessions/not-a-uuid").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid session ID");
    }

    #[tokio::test]
    async fn conversation_mode_without_collaborators_conflicts() {
        let app = survey_routes(AppState {
            store: SessionStore::new(),
            mode: SurveyMode::Conversation,
            conversation: ConversationConfig::default(),
            collaborators: None,
        });
        let (status, _) = send(&app, post_json("/api/sessions", json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
