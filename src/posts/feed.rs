use std::sync::Arc;

use axum::{Json, debug_handler, extract::{State, WebSocketUpgrade}, response::Response};
use futures_util::{Stream, StreamExt};
use serde::Serialize;

use crate::{
    AppResult, AppState, SwapError, live,
    model::Post,
    session::SignedIn,
    store::{Collection, DocumentStore, Keyed, Snapshot, snapshot, subscribe},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCard {
    pub id: String,
    pub author_name: String,
    pub text: String,
    pub timestamp: i64,
    pub can_delete: bool,
}

/// A post as one viewer sees it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCard {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub timestamp: i64,
    pub like_count: usize,
    pub liked: bool,
    pub comments: Vec<CommentCard>,
    pub can_delete: bool,
}

impl PostCard {
    fn new(Keyed { key, value: post }: Keyed<Post>, viewer: &str) -> Self {
        let comments = post
            .comments_in_order()
            .into_iter()
            .map(|Keyed { key, value: comment }| CommentCard {
                id: key,
                can_delete: comment.author_id == viewer,
                author_name: comment.author_name,
                text: comment.text,
                timestamp: comment.timestamp,
            })
            .collect();

        Self {
            id: key,
            like_count: post.like_count(),
            liked: post.is_liked_by(viewer),
            can_delete: post.author_id == viewer,
            author_id: post.author_id,
            author_name: post.author_name,
            content: post.content,
            timestamp: post.timestamp,
            comments,
        }
    }
}

/// Newest first; posts with equal timestamps keep store order.
pub fn feed(snapshot: &Snapshot, viewer: &str) -> Vec<PostCard> {
    let mut cards: Vec<PostCard> = snapshot
        .entries::<Post>()
        .into_iter()
        .map(|post| PostCard::new(post, viewer))
        .collect();
    cards.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    cards
}

pub fn watch_feed(
    store: Arc<dyn DocumentStore>,
    viewer: String,
) -> impl Stream<Item = Result<Vec<PostCard>, SwapError>> + Send + 'static {
    subscribe(store, Collection::Posts.path())
        .into_stream()
        .map(move |snapshot| snapshot.map(|snapshot| feed(&snapshot, &viewer)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn posts(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
) -> AppResult<Json<Vec<PostCard>>> {
    let posts = snapshot(store.as_ref(), Collection::Posts.path()).await?;
    Ok(Json(feed(&posts, &identity.uid)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn posts_live(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,
    ws: WebSocketUpgrade,
) -> Response {
    live::stream_views(ws, watch_feed(store, identity.uid))
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use serde_json::json;

    use super::*;
    use crate::{
        identity::Identity,
        posts::{add_comment, create_post, toggle_like},
        store::MemoryStore,
    };

    fn posts(value: serde_json::Value) -> Snapshot {
        Snapshot::new(Collection::Posts.path(), Some(value))
    }

    #[test]
    fn newest_first_and_ties_keep_store_order() {
        let snapshot = posts(json!({
            "p1": {"content": "old", "timestamp": 100},
            "p2": {"content": "new", "timestamp": 300},
            "p3": {"content": "tie-a", "timestamp": 200},
            "p4": {"content": "tie-b", "timestamp": 200},
        }));
        let ids: Vec<String> = feed(&snapshot, "ann").into_iter().map(|card| card.id).collect();
        assert_eq!(ids, ["p2", "p3", "p4", "p1"]);
    }

    #[test]
    fn cards_are_personal_to_the_viewer() {
        let snapshot = posts(json!({
            "p1": {
                "authorId": "ann",
                "authorName": "Ann",
                "content": "hello",
                "timestamp": 1,
                "likes": {"bob": true, "cy": true},
                "comments": {
                    "c2": {"authorId": "ann", "authorName": "Ann", "text": "thanks", "timestamp": 3},
                    "c1": {"authorId": "bob", "authorName": "Bob", "text": "hi", "timestamp": 2},
                },
            },
        }));

        let for_ann = &feed(&snapshot, "ann")[0];
        assert!(for_ann.can_delete);
        assert!(!for_ann.liked);
        assert_eq!(for_ann.like_count, 2);
        assert_eq!(
            for_ann.comments.iter().map(|c| (c.id.as_str(), c.can_delete)).collect::<Vec<_>>(),
            [("c1", false), ("c2", true)]
        );

        let for_bob = &feed(&snapshot, "bob")[0];
        assert!(!for_bob.can_delete);
        assert!(for_bob.liked);
        assert!(for_bob.comments[0].can_delete);
    }

    #[test]
    fn undecodable_posts_are_left_out() {
        let snapshot = posts(json!({
            "p1": {"content": "fine", "timestamp": 1},
            "p2": "not a post",
        }));
        assert_eq!(feed(&snapshot, "ann").len(), 1);
    }

    #[tokio::test]
    async fn live_feed_follows_likes_and_comments() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ann = Identity {
            uid: "ann".into(),
            email: "ann@example.com".into(),
            display_name: Some("Ann".into()),
            id_token: None,
        };
        let mut cards = pin!(watch_feed(store.clone(), "ann".into()));
        assert!(cards.next().await.unwrap().unwrap().is_empty());

        let id = create_post(store.as_ref(), &ann, "hello").await.unwrap();
        let first = cards.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, id);
        assert_eq!(first[0].author_name, "Ann");

        toggle_like(store.as_ref(), &ann, &id).await.unwrap();
        let liked = cards.next().await.unwrap().unwrap();
        assert!(liked[0].liked);
        assert_eq!(liked[0].like_count, 1);

        add_comment(store.as_ref(), &ann, &id, "first!").await.unwrap();
        let commented = cards.next().await.unwrap().unwrap();
        assert_eq!(commented[0].comments.len(), 1);
        assert!(commented[0].comments[0].can_delete);
    }
}
