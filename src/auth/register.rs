use std::sync::Arc;

use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppResult, AppState, SwapError,
    error::required,
    identity::{Identity, IdentityProvider},
    now_millis,
    session::IdentityContext,
    store::{Collection, DocumentStore},
};

use super::Me;

/// Creates the account, names it when a name was given, then writes a
/// fresh `users/{uid}` document.
pub async fn register(
    store: &dyn DocumentStore,
    provider: &dyn IdentityProvider,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Identity, SwapError> {
    let email = required(email, "Email")?;
    if password.is_empty() {
        return Err(SwapError::validation("Password cannot be empty"));
    }
    let name = name.trim();

    let mut identity = provider.register_with_credentials(email, password).await?;
    if !name.is_empty() {
        identity = provider.update_display_name(&identity, name).await?;
    }

    store
        .replace_all(
            &Collection::Users.doc(&identity.uid)?,
            json!({
                "name": name,
                "email": email,
                "createdAt": now_millis(),
                "skillsOffered": {},
                "skillsWanted": {},
            }),
        )
        .await?;
    tracing::info!(uid = %identity.uid, "user registered");

    Ok(identity)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RegisterForm {
    name: String,
    email: String,
    password: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn register_account(
    State(store): State<Arc<dyn DocumentStore>>,
    State(provider): State<Arc<dyn IdentityProvider>>,
    context: IdentityContext,

    Json(RegisterForm { name, email, password }): Json<RegisterForm>,
) -> AppResult<Json<Me>> {
    let identity = register(store.as_ref(), provider.as_ref(), &name, &email, &password).await?;
    context.sign_in(&identity).await?;
    Ok(Json(Me::from(&identity)))
}
