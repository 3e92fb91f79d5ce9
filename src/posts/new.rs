use std::sync::Arc;

use axum::{Json, debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppResult, AppState, Created, SwapError,
    error::required,
    identity::Identity,
    now_millis,
    session::SignedIn,
    store::{Collection, DocumentStore},
};

pub async fn create_post(store: &dyn DocumentStore, author: &Identity, content: &str) -> Result<String, SwapError> {
    let content = required(content, "Post")?;
    let key = store
        .append(
            &Collection::Posts.path(),
            json!({
                "authorId": author.uid,
                "authorName": author.author_name(),
                "content": content,
                "timestamp": now_millis(),
                "likes": {},
                "comments": {},
            }),
        )
        .await?;
    tracing::info!(key = %key, author = %author.uid, "post created");
    Ok(key)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NewPostForm {
    content: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_post(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,

    Json(NewPostForm { content }): Json<NewPostForm>,
) -> AppResult<(StatusCode, Json<Created>)> {
    let id = create_post(store.as_ref(), &identity, &content).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}
