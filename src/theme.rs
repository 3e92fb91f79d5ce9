use axum::{Json, Router, debug_handler, extract::FromRequestParts, http::request::Parts, routing::{get, post}};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{AppError, AppResult, AppState, session::{THEME, cookie_session}};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThemeView {
    pub theme: Theme,
}

pub struct ThemeContext(Session);

impl ThemeContext {
    pub async fn current(&self) -> AppResult<Theme> {
        Ok(self.0.get(THEME).await?.unwrap_or_default())
    }

    pub async fn toggle(&self) -> AppResult<Theme> {
        let theme = self.current().await?.toggled();
        self.0.insert(THEME, theme).await?;
        Ok(theme)
    }
}

impl<S> FromRequestParts<S> for ThemeContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(cookie_session(parts, state).await?))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(current_theme))
        .route("/toggle", post(toggle_theme))
}

#[debug_handler(state = AppState)]
async fn current_theme(theme: ThemeContext) -> AppResult<Json<ThemeView>> {
    Ok(Json(ThemeView { theme: theme.current().await? }))
}

#[debug_handler(state = AppState)]
async fn toggle_theme(theme: ThemeContext) -> AppResult<Json<ThemeView>> {
    let theme = theme.toggle().await?;
    tracing::debug!(?theme, "theme toggled");
    Ok(Json(ThemeView { theme }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_is_a_no_op() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
    }

    #[test]
    fn theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
    }
}
