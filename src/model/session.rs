use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Online,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Scheduled,
}

/// A scheduled teaching session. `host_name` is a snapshot taken at creation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub participants: BTreeMap<String, bool>,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub mode: SessionMode,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub zoom_link: String,
    #[serde(default)]
    pub created_at: i64,
}

impl Session {
    /// The join link, if any. Blank and absent links both mean "no link".
    pub fn join_link(&self) -> Option<&str> {
        let link = self.zoom_link.trim();
        (!link.is_empty()).then_some(link)
    }

    pub fn is_hosted_by(&self, uid: &str) -> bool {
        self.host == uid
    }
}

/// Just the host of a session document, whatever else the document holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SessionHost {
    #[serde(default)]
    pub host: String,
}
