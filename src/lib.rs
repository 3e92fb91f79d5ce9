pub mod auth;
pub mod config;
pub mod error;
pub mod feedback;
pub mod identity;
pub mod matching;
pub mod model;
pub mod posts;
pub mod profiles;
pub mod session;
pub mod sessions;
pub mod store;
pub mod theme;

mod live;

use std::sync::Arc;

use axum::{Json, Router, extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer, cookie::SameSite};

pub use error::SwapError;

use identity::IdentityProvider;
use store::DocumentStore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/theme", theme::router())
        .nest("/profile", profiles::router())
        .nest("/match", matching::router())
        .nest("/sessions", sessions::router())
        .nest("/posts", posts::router())
        .nest("/feedback", feedback::router())
        .with_state(state)
}

/// The router with its cookie sessions, CORS and request tracing.
pub fn app(state: AppState, session_idle: time::Duration, cors: CorsLayer) -> Router {
    let session_layer = SessionManagerLayer::new(tower_sessions::MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(session_idle));

    router(state)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Key of a freshly appended document.
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: String,
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.downcast_ref::<SwapError>() {
            Some(err) => (err.status(), err.public_message()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, error::GENERIC_FAILURE.to_owned()),
        };
        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(SwapError);
apperr_impl!(serde_json::Error);
apperr_impl!(tower_sessions::session::Error);
