mod view;

use axum::extract::{Form, State};
use axum::http::{HeaderMap, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_SECS};
use crate::controller::Controller;
use crate::model::ModelClientFactory;
use crate::profile::{ProfileForm, UserProfile};
use crate::secrets::SecretStore;
use crate::session::SessionStore;

pub use view::Notice;

pub const SESSION_COOKIE: &str = "healthplan_session";

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionStore<Controller>>,
    factory: Arc<dyn ModelClientFactory>,
    secrets: Arc<dyn SecretStore>,
}

impl AppState {
    pub fn new(factory: Arc<dyn ModelClientFactory>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(
                idle_ttl(DEFAULT_SESSION_IDLE_SECS),
                DEFAULT_MAX_SESSIONS,
            )),
            factory,
            secrets,
        }
    }

    /// Replaces the session store with one using the given idle timeout and
    /// capacity.
    pub fn with_session_limits(mut self, idle_secs: u64, max_sessions: usize) -> Self {
        self.sessions = Arc::new(SessionStore::new(idle_ttl(idle_secs), max_sessions));
        self
    }

    fn new_controller(&self) -> Controller {
        Controller::new(self.factory.clone(), self.secrets.clone())
    }

    /// Looks up the caller's session, creating one if needed. Used by actions.
    fn session(&self, headers: &HeaderMap) -> (Uuid, Arc<Mutex<Controller>>) {
        self.sessions
            .get_or_create(session_id(headers), || self.new_controller())
    }
}

fn idle_ttl(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[derive(Debug, Deserialize)]
struct KeyForm {
    #[serde(default)]
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct QuestionForm {
    #[serde(default)]
    question: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/key", post(submit_key))
        .route("/generate", post(generate))
        .route("/ask", post(ask))
        .route("/reset", post(start_over))
        .route("/health", get(health))
        .with_state(state)
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn page(id: Uuid, html: String) -> Response {
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    ([(header::SET_COOKIE, cookie)], Html(html)).into_response()
}

/// Viewing the page never creates a stored session; visitors without one get
/// a blank page and a session on their first action.
async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.sessions.get(session_id(&headers)) {
        Some((id, session)) => {
            let controller = session.lock().await;
            page(id, view::render(&controller, &Notice::None))
        }
        None => Html(view::render(&state.new_controller(), &Notice::None)).into_response(),
    }
}

async fn submit_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<KeyForm>,
) -> Response {
    let (id, session) = state.session(&headers);
    let mut controller = session.lock().await;

    let notice = match controller.submit_key(&form.api_key) {
        Ok(()) => Notice::Success("✅ GLM API Key 已接受！".to_string()),
        Err(err) => Notice::Warning(format!("⚠️ {err}")),
    };
    page(id, view::render(&controller, &notice))
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ProfileForm>,
) -> Response {
    let (id, session) = state.session(&headers);
    let mut controller = session.lock().await;
    controller.remember_profile_form(form.clone());

    let result = match UserProfile::try_from(&form) {
        Ok(profile) => controller.generate(&profile).await,
        Err(err) => Err(err.into()),
    };
    let notice = match result {
        Ok(()) => Notice::None,
        Err(err) => {
            warn!(session = %id, error = %err, "generate action failed");
            Notice::Error(format!("❌ 出错啦: {err}"))
        }
    };
    page(id, view::render(&controller, &notice))
}

async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<QuestionForm>,
) -> Response {
    let (id, session) = state.session(&headers);
    let mut controller = session.lock().await;

    let notice = match controller.qa() {
        None => Notice::Warning("⚠️ 请先生成计划，再进行答疑".to_string()),
        Some(mut qa) => match qa.ask(&form.question).await {
            Ok(_) => Notice::None,
            Err(err) => {
                warn!(session = %id, error = %err, "ask action failed");
                Notice::Error(format!("❌ 获取回答时出错: {err}"))
            }
        },
    };
    page(id, view::render(&controller, &notice))
}

async fn start_over(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session) = state.session(&headers);
    let mut controller = session.lock().await;
    controller.start_over();
    info!(session = %id, "session restarted");
    page(id, view::render(&controller, &Notice::None))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, header};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::{AppState, SESSION_COOKIE, router, session_id};
    use crate::config::Config;
    use crate::model::HttpModelClientFactory;
    use crate::secrets::NoSecrets;

    fn state() -> AppState {
        AppState::new(
            Arc::new(HttpModelClientFactory::new(Config::default())),
            Arc::new(NoSecrets),
        )
    }

    #[tokio::test]
    async fn page_views_do_not_create_sessions() {
        let state = state();
        let app = router(state.clone());

        for i in 0..200 {
            let mut request = Request::builder().uri("/");
            if i % 2 == 1 {
                let stale = format!("{SESSION_COOKIE}={}", Uuid::new_v4());
                request = request.header(header::COOKIE, stale);
            }
            let response = app
                .clone()
                .oneshot(request.body(Body::empty()).expect("request should build"))
                .await
                .expect("router should respond");
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get(header::SET_COOKIE).is_none());
        }
        assert_eq!(state.sessions.len(), 0);
    }

    #[tokio::test]
    async fn first_action_creates_the_session() {
        let state = state();
        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/reset")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn session_id_is_read_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}"))
                .expect("valid header"),
        );
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn malformed_session_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("healthplan_session=not-a-uuid"),
        );
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }
}
