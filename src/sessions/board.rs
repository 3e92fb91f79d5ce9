use std::sync::Arc;

use axum::{Json, debug_handler, extract::{State, WebSocketUpgrade}, response::Response};
use futures_util::{Stream, StreamExt};
use serde::Serialize;

use crate::{
    AppResult, AppState, SwapError, live,
    model::Session,
    session::SignedIn,
    store::{Collection, DocumentStore, Keyed, Snapshot, snapshot, subscribe},
};

/// Sessions split by whether the viewer hosts them, both in store order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionBoard {
    pub mine: Vec<Keyed<Session>>,
    pub upcoming: Vec<Keyed<Session>>,
}

impl SessionBoard {
    pub fn from_snapshot(snapshot: &Snapshot, viewer: &str) -> Self {
        let (mine, upcoming) = snapshot
            .entries::<Session>()
            .into_iter()
            .partition(|session| session.value.is_hosted_by(viewer));
        Self { mine, upcoming }
    }
}

pub fn watch_board(
    store: Arc<dyn DocumentStore>,
    viewer: String,
) -> impl Stream<Item = Result<SessionBoard, SwapError>> + Send + 'static {
    subscribe(store, Collection::Sessions.path())
        .into_stream()
        .map(move |snapshot| snapshot.map(|snapshot| SessionBoard::from_snapshot(&snapshot, &viewer)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn board(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
) -> AppResult<Json<SessionBoard>> {
    let sessions = snapshot(store.as_ref(), Collection::Sessions.path()).await?;
    Ok(Json(SessionBoard::from_snapshot(&sessions, &identity.uid)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn board_live(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    ws: WebSocketUpgrade,
) -> Response {
    live::stream_views(ws, watch_board(store, identity.uid))
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use serde_json::json;

    use super::*;
    use crate::{
        identity::Identity,
        sessions::{NewSession, create_session},
        store::MemoryStore,
    };

    #[test]
    fn splits_hosted_from_the_rest_in_store_order() {
        let sessions = Snapshot::new(
            Collection::Sessions.path(),
            Some(json!({
                "s3": {"title": "C", "host": "ann"},
                "s1": {"title": "A", "host": "bob"},
                "s2": {"title": "B", "host": "ann"},
            })),
        );
        let board = SessionBoard::from_snapshot(&sessions, "ann");
        let keys = |list: &[Keyed<Session>]| list.iter().map(|s| s.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&board.mine), ["s2", "s3"]);
        assert_eq!(keys(&board.upcoming), ["s1"]);
    }

    #[test]
    fn no_sessions_is_an_empty_board() {
        let board = SessionBoard::from_snapshot(&Snapshot::new(Collection::Sessions.path(), None), "ann");
        assert_eq!(board, SessionBoard::default());
    }

    #[tokio::test]
    async fn board_updates_when_a_session_is_created() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut boards = pin!(watch_board(store.clone(), "ann".into()));
        assert_eq!(boards.next().await.unwrap().unwrap(), SessionBoard::default());

        let ann = Identity {
            uid: "ann".into(),
            email: "ann@example.com".into(),
            display_name: None,
            id_token: None,
        };
        let new = NewSession {
            title: "Rust".into(),
            duration_minutes: 30,
            ..NewSession::default()
        };
        let key = create_session(store.as_ref(), &ann, new).await.unwrap();

        let board = boards.next().await.unwrap().unwrap();
        assert_eq!(board.mine.len(), 1);
        assert_eq!(board.mine[0].key, key);
        assert_eq!(board.mine[0].value.host_name, "ann");
        assert!(board.upcoming.is_empty());
    }
}
