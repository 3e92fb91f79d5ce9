use std::{collections::BTreeMap, sync::Arc};

use axum::{Json, debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    AppResult, AppState, Created, SwapError,
    error::required,
    identity::Identity,
    model::{Session, SessionMode, SessionStatus},
    now_millis,
    session::SignedIn,
    store::{Collection, DocumentStore, encode},
};

/// A session as submitted. `host`/`host_name` are only set when booking
/// with someone found through matching; otherwise the actor hosts. A
/// prefilled host without a name is labelled with the actor's name.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSession {
    pub title: String,
    pub start_time: i64,
    pub duration_minutes: i64,
    pub zoom_link: Option<String>,
    pub host: Option<String>,
    pub host_name: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub async fn create_session(
    store: &dyn DocumentStore,
    actor: &Identity,
    new: NewSession,
) -> Result<String, SwapError> {
    let title = required(&new.title, "Session title")?.to_owned();
    let duration_minutes = u32::try_from(new.duration_minutes)
        .ok()
        .filter(|minutes| *minutes > 0)
        .ok_or_else(|| SwapError::validation("Duration must be a positive number of minutes"))?;

    let (host, host_name) = match filled(new.host) {
        Some(host) => {
            let host_name = filled(new.host_name).unwrap_or_else(|| actor.author_name());
            (host, host_name)
        }
        None => (actor.uid.clone(), actor.author_name()),
    };

    let session = Session {
        title,
        host,
        host_name,
        participants: BTreeMap::from([(actor.uid.clone(), true)]),
        start_time: new.start_time,
        duration_minutes,
        mode: SessionMode::Online,
        status: SessionStatus::Scheduled,
        zoom_link: filled(new.zoom_link).unwrap_or_default(),
        created_at: now_millis(),
    };

    let sessions = Collection::Sessions.path();
    let key = store.append(&sessions, encode(&sessions, &session)?).await?;
    tracing::info!(key = %key, host = %session.host, "session created");
    Ok(key)
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_session(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,

    Json(new): Json<NewSession>,
) -> AppResult<(StatusCode, Json<Created>)> {
    let id = create_session(store.as_ref(), &identity, new).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}
