use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{SwapError, store::key_order};

/// Proficiency from 1 (Beginner) to 5 (Expert).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "i64")]
pub struct SkillLevel(u8);

impl SkillLevel {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(level: i64) -> Result<Self, SwapError> {
        if !(Self::MIN..=Self::MAX).contains(&level) {
            return Err(SwapError::validation(format!(
                "skill level must be between {} and {}, got {level}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(level as u8))
    }

    pub fn get(self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        Self(1)
    }
}

// Stored levels are trusted loosely: a missing or zero level reads as 1,
// fractions round to the nearest level and anything outside the range is
// pulled back into it.
impl From<f64> for SkillLevel {
    fn from(level: f64) -> Self {
        if level.is_nan() {
            return Self::default();
        }
        Self(level.round().clamp(Self::MIN as f64, Self::MAX as f64) as u8)
    }
}

impl From<SkillLevel> for i64 {
    fn from(level: SkillLevel) -> Self {
        level.get()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
}

impl Skill {
    pub fn matches(&self, normalized_query: &str) -> bool {
        self.name.trim().to_lowercase() == normalized_query
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "readable_skills")]
    pub skills_offered: BTreeMap<String, Skill>,
    #[serde(default, deserialize_with = "readable_skills")]
    pub skills_wanted: BTreeMap<String, Skill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Skill map with unreadable entries left out, so one bad entry never
/// costs the whole user document.
fn readable_skills<'de, D>(deserializer: D) -> Result<BTreeMap<String, Skill>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|(key, raw)| match Skill::deserialize(raw) {
            Ok(skill) => Some((key, skill)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "skipping unreadable skill");
                None
            }
        })
        .collect())
}

impl User {
    /// Offered skills in store order.
    pub fn offered_skills(&self) -> Vec<(&str, &Skill)> {
        let mut skills: Vec<(&str, &Skill)> = self
            .skills_offered
            .iter()
            .map(|(key, skill)| (key.as_str(), skill))
            .collect();
        skills.sort_by(|a, b| key_order(a.0, b.0));
        skills
    }

    pub fn has_bio(&self) -> bool {
        self.bio.as_deref().is_some_and(|bio| !bio.is_empty())
    }

    pub fn display_name(&self) -> String {
        fn filled(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        filled(&self.name)
            .or(filled(&self.display_name))
            .or(filled(&self.email)
                .and_then(|email| email.split('@').next())
                .filter(|local| !local.is_empty()))
            .unwrap_or("Unknown")
            .to_owned()
    }
}
