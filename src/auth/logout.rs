use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode};

use crate::{
    AppResult, AppState, SwapError,
    identity::{Identity, IdentityProvider},
    session::IdentityContext,
};

pub async fn sign_out(provider: &dyn IdentityProvider, identity: &Identity) -> Result<(), SwapError> {
    provider.sign_out(identity).await?;
    tracing::info!(uid = %identity.uid, "signed out");
    Ok(())
}

/// Always ends the cookie session, signed in or not.
#[debug_handler(state = AppState)]
pub(crate) async fn logout(
    State(provider): State<Arc<dyn IdentityProvider>>,
    context: IdentityContext,
) -> AppResult<StatusCode> {
    if let Some(identity) = context.current().await? {
        sign_out(provider.as_ref(), &identity).await?;
    }
    context.clear().await;
    Ok(StatusCode::NO_CONTENT)
}
