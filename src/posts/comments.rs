use std::sync::Arc;

use axum::{Json, debug_handler, extract::{Path, State}, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppResult, AppState, SwapError,
    error::required,
    identity::Identity,
    model::Comment,
    now_millis,
    session::SignedIn,
    store::{Collection, DocumentStore, fetch},
};

/// Appends a comment and returns its key, or `None` when the post is gone.
pub async fn add_comment(
    store: &dyn DocumentStore,
    actor: &Identity,
    post_id: &str,
    text: &str,
) -> Result<Option<String>, SwapError> {
    let text = required(text, "Comment")?;
    let post = Collection::Posts.doc(post_id)?;
    if store.get(&post).await?.is_none() {
        tracing::debug!(post = post_id, "comment on a missing post");
        return Ok(None);
    }

    let key = store
        .append(
            &post.child("comments")?,
            json!({
                "authorId": actor.uid,
                "authorName": actor.author_name(),
                "text": text,
                "timestamp": now_millis(),
            }),
        )
        .await?;
    tracing::info!(post = post_id, comment = %key, "comment added");
    Ok(Some(key))
}

/// Removes one comment. Only its author may.
pub async fn delete_comment(
    store: &dyn DocumentStore,
    actor: &Identity,
    post_id: &str,
    comment_id: &str,
) -> Result<(), SwapError> {
    let path = Collection::Posts.doc(post_id)?.child("comments")?.child(comment_id)?;
    let Some(comment) = fetch::<Comment>(store, &path).await? else {
        return Ok(());
    };
    if comment.author_id != actor.uid {
        return Err(SwapError::forbidden("You can only delete your own comments."));
    }

    store.remove_subtree(&path).await?;
    tracing::info!(post = post_id, comment = comment_id, "comment deleted");
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CommentForm {
    text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentAdded {
    id: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn comment(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    Path(post_id): Path<String>,

    Json(CommentForm { text }): Json<CommentForm>,
) -> AppResult<Json<CommentAdded>> {
    let id = add_comment(store.as_ref(), &identity, &post_id, &text).await?;
    Ok(Json(CommentAdded { id }))
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_comment(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    delete_comment(store.as_ref(), &identity, &post_id, &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
