use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::{AppResult, AppState, SwapError, model::SkillLevel, session::SignedIn, store::DocumentStore};

use super::{MatchResult, search};

#[derive(Debug, Deserialize)]
pub(crate) struct MatchQuery {
    #[serde(default)]
    skill: String,
    #[serde(default = "lowest_level")]
    level: i64,
}

fn lowest_level() -> i64 {
    SkillLevel::MIN
}

#[debug_handler(state = AppState)]
pub(crate) async fn find(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(_): SignedIn,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> AppResult<Json<Vec<MatchResult>>> {
    let Query(MatchQuery { skill, level }) = query.map_err(|e| SwapError::validation(e.body_text()))?;
    let level = SkillLevel::new(level)?;
    Ok(Json(search(store.as_ref(), &skill, level).await?))
}
