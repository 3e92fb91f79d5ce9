use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::get,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppResult, AppState, Created, SwapError, live,
    identity::Identity,
    model::Feedback,
    now_millis,
    session::SignedIn,
    store::{Collection, DocumentStore, Keyed, Snapshot, snapshot, subscribe},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/live", get(list_live))
}

pub async fn submit_feedback(
    store: &dyn DocumentStore,
    actor: &Identity,
    comment: &str,
    rating: i64,
) -> Result<String, SwapError> {
    if !(1..=5).contains(&rating) {
        return Err(SwapError::validation(format!(
            "Rating must be between 1 and 5, got {rating}"
        )));
    }
    let key = store
        .append(
            &Collection::Feedback.path(),
            json!({
                "user": actor.uid,
                "comment": comment.trim(),
                "rating": rating,
                "createdAt": now_millis(),
            }),
        )
        .await?;
    tracing::info!(key = %key, rating, "feedback submitted");
    Ok(key)
}

/// Feedback entries in store order, oldest first.
pub fn feedback_list(snapshot: &Snapshot) -> Vec<Keyed<Feedback>> {
    snapshot.entries()
}

pub fn watch_feedback(
    store: Arc<dyn DocumentStore>,
) -> impl Stream<Item = Result<Vec<Keyed<Feedback>>, SwapError>> + Send + 'static {
    subscribe(store, Collection::Feedback.path())
        .into_stream()
        .map(|snapshot| snapshot.map(|snapshot| feedback_list(&snapshot)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackForm {
    #[serde(default)]
    comment: String,
    rating: i64,
}

#[debug_handler(state = AppState)]
async fn submit(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,

    Json(FeedbackForm { comment, rating }): Json<FeedbackForm>,
) -> AppResult<(StatusCode, Json<Created>)> {
    let id = submit_feedback(store.as_ref(), &identity, &comment, rating).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

#[debug_handler(state = AppState)]
async fn list(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(_): SignedIn,
) -> AppResult<Json<Vec<Keyed<Feedback>>>> {
    let feedback = snapshot(store.as_ref(), Collection::Feedback.path()).await?;
    Ok(Json(feedback_list(&feedback)))
}

#[debug_handler(state = AppState)]
async fn list_live(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(_): SignedIn,
    ws: WebSocketUpgrade,
) -> Response {
    live::stream_views(ws, watch_feedback(store))
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use super::*;
    use crate::store::MemoryStore;

    fn ann() -> Identity {
        Identity {
            uid: "ann".into(),
            email: "ann@example.com".into(),
            display_name: None,
            id_token: None,
        }
    }

    #[tokio::test]
    async fn ratings_outside_one_to_five_are_rejected() {
        let store = MemoryStore::new();
        for rating in [0, 6, -1] {
            let err = submit_feedback(&store, &ann(), "meh", rating).await.unwrap_err();
            assert!(matches!(err, SwapError::Validation(_)));
        }
        assert_eq!(store.get(&Collection::Feedback.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_list_in_submission_order() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut entries = pin!(watch_feedback(store.clone()));
        assert!(entries.next().await.unwrap().unwrap().is_empty());

        submit_feedback(store.as_ref(), &ann(), " great swap ", 5).await.unwrap();
        assert_eq!(entries.next().await.unwrap().unwrap().len(), 1);
        submit_feedback(store.as_ref(), &ann(), "", 3).await.unwrap();

        let listed = entries.next().await.unwrap().unwrap();
        let ratings: Vec<u8> = listed.iter().map(|entry| entry.value.rating).collect();
        assert_eq!(ratings, [5, 3]);
        assert_eq!(listed[0].value.comment, "great swap");
        assert_eq!(listed[0].value.user, "ann");
        assert!(listed[1].value.created_at > 0);
    }
}
