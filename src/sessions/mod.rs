mod board;
mod new;

use axum::{Router, routing::get};

use crate::AppState;

pub use board::{SessionBoard, watch_board};
pub use new::{NewSession, create_session};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(board::board).post(new::new_session))
        .route("/live", get(board::board_live))
}
