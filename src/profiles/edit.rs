use std::sync::Arc;

use axum::{Json, debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppResult, AppState, Created, SwapError,
    auth::Me,
    error::required,
    identity::{Identity, IdentityProvider},
    model::SkillLevel,
    session::{IdentityContext, SignedIn},
    store::{Collection, DocumentStore, Patch},
};

/// Sets the bio. An empty bio is allowed and counts as no bio when matching.
pub async fn save_bio(store: &dyn DocumentStore, uid: &str, bio: &str) -> Result<(), SwapError> {
    store
        .patch(&Collection::Users.doc(uid)?, Patch::new().set("bio", bio.trim()))
        .await?;
    tracing::info!(uid, "bio saved");
    Ok(())
}

/// Renames at the identity provider first, then on the user document.
pub async fn save_name(
    store: &dyn DocumentStore,
    provider: &dyn IdentityProvider,
    identity: &Identity,
    name: &str,
) -> Result<Identity, SwapError> {
    let name = required(name, "Name")?;
    let updated = provider.update_display_name(identity, name).await?;
    store
        .patch(&Collection::Users.doc(&identity.uid)?, Patch::new().set("name", name))
        .await?;
    tracing::info!(uid = %identity.uid, "name saved");
    Ok(updated)
}

/// Appends `{name, level}` under the user's offered skills and returns its key.
pub async fn add_offered_skill(
    store: &dyn DocumentStore,
    uid: &str,
    name: &str,
    level: i64,
) -> Result<String, SwapError> {
    let name = required(name, "Skill name")?;
    let level = SkillLevel::new(level)?;
    let skills = Collection::Users.doc(uid)?.child("skillsOffered")?;
    let key = store
        .append(&skills, json!({ "name": name, "level": level.get() }))
        .await?;
    tracing::info!(uid, skill = name, level = level.get(), "skill offered");
    Ok(key)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BioForm {
    bio: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NameForm {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SkillForm {
    #[serde(default)]
    name: String,
    #[serde(default = "lowest_level")]
    level: i64,
}

fn lowest_level() -> i64 {
    SkillLevel::MIN
}

#[debug_handler(state = AppState)]
pub(crate) async fn bio(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,

    Json(BioForm { bio }): Json<BioForm>,
) -> AppResult<StatusCode> {
    save_bio(store.as_ref(), &identity.uid, &bio).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler(state = AppState)]
pub(crate) async fn name(
    State(store): State<Arc<dyn DocumentStore>>,
    State(provider): State<Arc<dyn IdentityProvider>>,
    context: IdentityContext,
    SignedIn(identity): SignedIn,

    Json(NameForm { name }): Json<NameForm>,
) -> AppResult<Json<Me>> {
    let updated = save_name(store.as_ref(), provider.as_ref(), &identity, &name).await?;
    context.replace(&updated).await?;
    Ok(Json(Me::from(&updated)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn skills(
    State(store): State<Arc<dyn DocumentStore>>,
    SignedIn(identity): SignedIn,

    Json(SkillForm { name, level }): Json<SkillForm>,
) -> AppResult<(StatusCode, Json<Created>)> {
    let id = add_offered_skill(store.as_ref(), &identity.uid, &name, level).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}
