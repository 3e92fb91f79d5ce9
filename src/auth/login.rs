use std::sync::Arc;

use axum::{Json, debug_handler, extract::State};

use crate::{
    AppResult, AppState, SwapError,
    error::required,
    identity::{Identity, IdentityProvider},
    session::{IdentityContext, SignedIn},
};

use super::{Credentials, Me};

pub async fn sign_in(provider: &dyn IdentityProvider, email: &str, password: &str) -> Result<Identity, SwapError> {
    let email = required(email, "Email")?;
    if password.is_empty() {
        return Err(SwapError::validation("Password cannot be empty"));
    }
    let identity = provider.sign_in(email, password).await?;
    tracing::info!(uid = %identity.uid, "signed in");
    Ok(identity)
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(provider): State<Arc<dyn IdentityProvider>>,
    context: IdentityContext,

    Json(Credentials { email, password }): Json<Credentials>,
) -> AppResult<Json<Me>> {
    let identity = sign_in(provider.as_ref(), &email, &password).await?;
    context.sign_in(&identity).await?;
    Ok(Json(Me::from(&identity)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn me(SignedIn(identity): SignedIn) -> Json<Me> {
    Json(Me::from(&identity))
}
