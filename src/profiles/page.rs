use std::sync::Arc;

use axum::{Json, debug_handler, extract::{State, WebSocketUpgrade}, response::Response};

use crate::{
    AppResult, AppState, live,
    model::User,
    session::SignedIn,
    store::{Collection, DocumentStore, fetch},
};

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
) -> AppResult<Json<Option<User>>> {
    let user = fetch(store.as_ref(), &Collection::Users.doc(&identity.uid)?).await?;
    Ok(Json(user))
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile_live(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let profile = super::watch_profile(store, &identity.uid)?;
    Ok(live::stream_views(ws, profile))
}
