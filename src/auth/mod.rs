mod login;
mod logout;
mod register;

use axum::{Router, routing::{get, post}};
use serde::{Deserialize, Serialize};

use crate::{AppState, identity::Identity};

pub use login::sign_in;
pub use logout::sign_out;
pub use register::register;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register_account))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/me", get(login::me))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Credentials {
    pub(crate) email: String,
    pub(crate) password: String,
}

/// What a client gets to see of its identity; the provider token stays server-side.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

impl From<&Identity> for Me {
    fn from(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.author_name(),
        }
    }
}
