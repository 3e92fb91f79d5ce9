//! Per-visitor state kept in the cookie session.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::{AppError, AppResult, SwapError, identity::Identity};

pub const IDENTITY: &str = "identity";
pub const THEME: &str = "theme";

pub(crate) async fn cookie_session<S: Send + Sync>(parts: &mut Parts, state: &S) -> AppResult<Session> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, message)| AppError::from(message))
}

/// The signed-in identity, if any.
pub struct IdentityContext(Session);

impl IdentityContext {
    pub async fn current(&self) -> AppResult<Option<Identity>> {
        Ok(self.0.get(IDENTITY).await?)
    }

    /// Issues a fresh session id, then stores the identity.
    pub async fn sign_in(&self, identity: &Identity) -> AppResult<()> {
        self.0.cycle_id().await?;
        self.0.insert(IDENTITY, identity).await?;
        Ok(())
    }

    pub async fn replace(&self, identity: &Identity) -> AppResult<()> {
        self.0.insert(IDENTITY, identity).await?;
        Ok(())
    }

    /// Forgets everything the session holds, theme included.
    pub async fn clear(&self) {
        self.0.clear().await;
    }
}

impl<S> FromRequestParts<S> for IdentityContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(cookie_session(parts, state).await?))
    }
}

/// Extractor for handlers that need someone signed in; rejects with 401 otherwise.
pub struct SignedIn(pub Identity);

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = IdentityContext::from_request_parts(parts, state).await?;
        match context.current().await? {
            Some(identity) => Ok(Self(identity)),
            None => Err(SwapError::identity("Sign in to continue.").into()),
        }
    }
}
