use std::sync::Arc;

use axum::{Json, debug_handler, extract::{Path, State}};
use serde::Serialize;

use crate::{
    AppResult, AppState, SwapError,
    identity::Identity,
    model::Post,
    session::SignedIn,
    store::{Collection, DocumentStore, Patch, fetch},
};

/// Likes or unlikes the post for `actor` and returns whether it is now liked.
///
/// Only `likes/{uid}` is written: set to `true`, or removed. A like is never
/// stored as `false`.
pub async fn toggle_like(store: &dyn DocumentStore, actor: &Identity, post_id: &str) -> Result<bool, SwapError> {
    let path = Collection::Posts.doc(post_id)?;
    let Some(post) = fetch::<Post>(store, &path).await? else {
        tracing::debug!(post = post_id, "like on a missing post");
        return Ok(false);
    };

    let likes = path.child("likes")?;
    let liked = !post.is_liked_by(&actor.uid);
    let patch = if liked {
        Patch::new().set(actor.uid.as_str(), true)
    } else {
        Patch::new().delete(actor.uid.as_str())
    };
    store.patch(&likes, patch).await?;
    tracing::info!(post = post_id, uid = %actor.uid, liked, "like toggled");
    Ok(liked)
}

#[derive(Debug, Serialize)]
pub(crate) struct LikeState {
    liked: bool,
}

#[debug_handler(state = AppState)]
pub(crate) async fn like(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    Path(id): Path<String>,
) -> AppResult<Json<LikeState>> {
    let liked = toggle_like(store.as_ref(), &identity, &id).await?;
    Ok(Json(LikeState { liked }))
}
