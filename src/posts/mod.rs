//! The community feed: posts with likes and comments.
//!
//! Every write names the exact path it touches, so two people liking or
//! commenting at once never overwrite each other.

mod comments;
mod delete;
mod feed;
mod likes;
mod new;

use axum::{Router, routing::{self, get, post}};

use crate::AppState;

pub use comments::{add_comment, delete_comment};
pub use delete::delete_post;
pub use feed::{CommentCard, PostCard, feed, watch_feed};
pub use likes::toggle_like;
pub use new::create_post;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::posts).post(new::new_post))
        .route("/live", get(feed::posts_live))
        .route("/{id}", routing::delete(delete::remove_post))
        .route("/{id}/like", post(likes::like))
        .route("/{id}/comments", post(comments::comment))
        .route("/{id}/comments/{cid}", routing::delete(comments::remove_comment))
}
