mod edit;
mod page;

use std::sync::Arc;

use axum::{Router, routing::{get, post}};
use futures_util::{Stream, StreamExt};

use crate::{
    AppState, SwapError,
    model::User,
    store::{Collection, DocumentStore, subscribe},
};

pub use edit::{add_offered_skill, save_bio, save_name};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::profile))
        .route("/live", get(page::profile_live))
        .route("/bio", post(edit::bio))
        .route("/name", post(edit::name))
        .route("/skills", post(edit::skills))
}

/// The user document of `uid`, now and after every change. `None` while
/// there is no document.
pub fn watch_profile(
    store: Arc<dyn DocumentStore>,
    uid: &str,
) -> Result<impl Stream<Item = Result<Option<User>, SwapError>> + Send + 'static, SwapError> {
    let path = Collection::Users.doc(uid)?;
    Ok(subscribe(store, path)
        .into_stream()
        .map(|snapshot| snapshot.and_then(|snapshot| snapshot.value::<User>())))
}
