use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{Keyed, key_order};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// A feed post. A like is present as `true` or absent, never `false`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub likes: BTreeMap<String, bool>,
    #[serde(default)]
    pub comments: BTreeMap<String, Comment>,
}

impl Post {
    pub fn is_liked_by(&self, uid: &str) -> bool {
        self.likes.get(uid).copied().unwrap_or(false)
    }

    pub fn like_count(&self) -> usize {
        self.likes.values().filter(|liked| **liked).count()
    }

    pub fn comments_in_order(&self) -> Vec<Keyed<Comment>> {
        let mut comments: Vec<Keyed<Comment>> = self
            .comments
            .iter()
            .map(|(key, comment)| Keyed {
                key: key.clone(),
                value: comment.clone(),
            })
            .collect();
        comments.sort_by(|a, b| key_order(&a.key, &b.key));
        comments
    }
}
