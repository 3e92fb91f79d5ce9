mod page;
mod score;

use std::collections::HashMap;

use axum::{Router, routing::get};
use serde::Serialize;

use crate::{
    AppState, SwapError,
    error::required,
    model::{SessionHost, Skill, SkillLevel, User},
    store::{Collection, DocumentStore, Keyed, Snapshot},
};

pub use score::compute_score;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(page::find))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub uid: String,
    pub name: String,
    pub bio: String,
    pub offered: Skill,
    pub score: u64,
    pub sessions_count: u64,
    pub skills_offered: Vec<Keyed<Skill>>,
}

/// Number of sessions each user hosts. Only `host` is read from each session.
pub fn host_counts(sessions: &[Keyed<SessionHost>]) -> HashMap<&str, u64> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for session in sessions {
        if !session.value.host.is_empty() {
            *counts.entry(session.value.host.as_str()).or_default() += 1;
        }
    }
    counts
}

/// Users offering `skill_query` (trimmed, case-insensitive, exact), best first.
///
/// Only the first matching offered skill of a user counts, in store order.
/// Equal scores keep the order of `users`.
pub fn find_matches(
    skill_query: &str,
    wanted_level: SkillLevel,
    users: &[Keyed<User>],
    sessions: &[Keyed<SessionHost>],
) -> Result<Vec<MatchResult>, SwapError> {
    let query = required(skill_query, "skill search")?.to_lowercase();
    let hosted = host_counts(sessions);

    let mut matches: Vec<MatchResult> = users
        .iter()
        .filter_map(|Keyed { key: uid, value: user }| {
            let offered_skills = user.offered_skills();
            let (_, offered) = offered_skills.iter().find(|(_, skill)| skill.matches(&query))?;

            let sessions_count = hosted.get(uid.as_str()).copied().unwrap_or(0);
            let score = compute_score(
                user.has_bio(),
                offered.level.get(),
                wanted_level.get(),
                sessions_count,
            );

            Some(MatchResult {
                uid: uid.clone(),
                name: user.display_name(),
                bio: user.bio.clone().unwrap_or_default(),
                offered: (*offered).clone(),
                score,
                sessions_count,
                skills_offered: offered_skills
                    .iter()
                    .map(|(key, skill)| Keyed {
                        key: (*key).to_owned(),
                        value: (*skill).clone(),
                    })
                    .collect(),
            })
        })
        .collect();

    // stable: ties keep user order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(matches)
}

/// Pulls `users` and `sessions` once each and ranks the candidates.
pub async fn search(
    store: &dyn DocumentStore,
    skill_query: &str,
    wanted_level: SkillLevel,
) -> Result<Vec<MatchResult>, SwapError> {
    required(skill_query, "skill search")?;

    let users_path = Collection::Users.path();
    let sessions_path = Collection::Sessions.path();
    let (users, sessions) = tokio::try_join!(store.get(&users_path), store.get(&sessions_path))?;
    let users = Snapshot::new(users_path, users).entries::<User>();
    let sessions = Snapshot::new(sessions_path, sessions).entries::<SessionHost>();

    let matches = find_matches(skill_query, wanted_level, &users, &sessions)?;
    tracing::debug!(query = skill_query, found = matches.len(), "match search");
    Ok(matches)
}
