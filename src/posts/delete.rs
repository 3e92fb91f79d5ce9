use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, http::StatusCode};

use crate::{
    AppResult, AppState, SwapError,
    identity::Identity,
    model::Post,
    session::SignedIn,
    store::{Collection, DocumentStore, fetch},
};

/// Removes the post with its likes and comments. Only the author may.
pub async fn delete_post(store: &dyn DocumentStore, actor: &Identity, post_id: &str) -> Result<(), SwapError> {
    let path = Collection::Posts.doc(post_id)?;
    let Some(post) = fetch::<Post>(store, &path).await? else {
        tracing::debug!(post = post_id, "delete of a missing post");
        return Ok(());
    };
    if post.author_id != actor.uid {
        return Err(SwapError::forbidden("You can only delete your own posts."));
    }

    store.remove_subtree(&path).await?;
    tracing::info!(post = post_id, "post deleted");
    Ok(())
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_post(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    delete_post(store.as_ref(), &identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
