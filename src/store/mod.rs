//! Path-addressed realtime document store.
//!
//! Every backend exposes the same five operations plus a change feed. A
//! [`Subscription`] turns the change feed into a sequence of full
//! snapshots of one path: consumers replace their view state with each
//! snapshot and never apply diffs.

mod memory;
mod path;
mod pushid;
mod sqlite;
mod tree;

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::SwapError;

pub use memory::MemoryStore;
pub use path::{DocPath, key_order};
pub use pushid::{PUSH_ID_LEN, PushIds};
pub use sqlite::SqliteStore;

pub(crate) const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Users,
    Sessions,
    Posts,
    Feedback,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        use Collection::*;
        match self {
            Users => "users",
            Sessions => "sessions",
            Posts => "posts",
            Feedback => "feedback",
        }
    }

    pub fn path(&self) -> DocPath {
        DocPath::collection(self.as_str())
    }

    /// Path of one document in the collection; fails on keys that are not valid segments.
    pub fn doc(&self, key: &str) -> Result<DocPath, SwapError> {
        self.path().child(key)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Set(Value),
    Delete,
}

/// Partial update: relative sub-path -> new value or removal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch(BTreeMap<String, FieldValue>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), FieldValue::Set(value.into()));
        self
    }

    pub fn delete(mut self, field: impl Into<String>) -> Self {
        self.0.insert(field.into(), FieldValue::Delete);
        self
    }

    /// Absolute writes this patch performs under `base`, rejecting
    /// invalid or mutually overlapping field paths.
    pub fn resolve(&self, base: &DocPath) -> Result<Vec<(DocPath, FieldValue)>, SwapError> {
        let mut writes: Vec<(DocPath, FieldValue)> = Vec::with_capacity(self.0.len());
        for (field, value) in &self.0 {
            let relative = DocPath::parse(field)?;
            if relative.is_root() {
                return Err(SwapError::validation("patch fields cannot be empty"));
            }
            let absolute = base.join(&relative);
            if let Some((clash, _)) = writes.iter().find(|(p, _)| p.overlaps(&absolute)) {
                return Err(SwapError::validation(format!(
                    "patch paths {clash} and {absolute} overlap"
                )));
            }
            writes.push((absolute, value.clone()));
        }
        Ok(writes)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Keyed<T> {
    pub key: String,
    #[serde(flatten)]
    pub value: T,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current value at `path`, `None` when nothing is stored there.
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, SwapError>;

    /// Stores `value` under a freshly generated child key of `path`.
    async fn append(&self, path: &DocPath, value: Value) -> Result<String, SwapError>;

    /// Merges only the named fields; `FieldValue::Delete` removes a field.
    async fn patch(&self, path: &DocPath, patch: Patch) -> Result<(), SwapError>;

    /// Overwrites everything at `path`.
    async fn replace_all(&self, path: &DocPath, value: Value) -> Result<(), SwapError>;

    /// Deletes `path` and everything beneath it. Missing paths are fine.
    async fn remove_subtree(&self, path: &DocPath) -> Result<(), SwapError>;

    /// Paths written from now on.
    fn changes(&self) -> broadcast::Receiver<DocPath>;
}

/// One full value of a subscribed path.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub path: DocPath,
    pub value: Option<Value>,
}

impl Snapshot {
    pub fn new(path: DocPath, value: Option<Value>) -> Self {
        Self { path, value }
    }

    /// Children decoded as `T` in store order. Children that do not decode are skipped.
    pub fn entries<T: DeserializeOwned>(&self) -> Vec<Keyed<T>> {
        let Some(Value::Object(children)) = &self.value else {
            return Vec::new();
        };

        let mut entries: Vec<Keyed<T>> = children
            .iter()
            .filter_map(|(key, raw)| match T::deserialize(raw) {
                Ok(value) => Some(Keyed { key: key.clone(), value }),
                Err(e) => {
                    tracing::warn!(path = %self.path, key = %key, error = %e, "skipping undecodable entry");
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| key_order(&a.key, &b.key));
        entries
    }

    pub fn value<T: DeserializeOwned>(&self) -> Result<Option<T>, SwapError> {
        self.value
            .as_ref()
            .map(|raw| {
                T::deserialize(raw).map_err(|source| SwapError::Malformed {
                    path: self.path.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

/// Reads `path` and decodes it as `T`.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocPath,
) -> Result<Option<T>, SwapError> {
    Snapshot::new(path.clone(), store.get(path).await?).value()
}

/// One full read of `path`, the same shape a subscription delivers.
pub async fn snapshot(store: &dyn DocumentStore, path: DocPath) -> Result<Snapshot, SwapError> {
    let value = store.get(&path).await?;
    Ok(Snapshot::new(path, value))
}

/// Serializes a document that is about to be written under `path`.
pub fn encode<T: Serialize>(path: &DocPath, value: &T) -> Result<Value, SwapError> {
    serde_json::to_value(value).map_err(|source| SwapError::Malformed {
        path: path.to_string(),
        source,
    })
}

/// Starts listening on `path`. The first `next()` yields the current value.
pub fn subscribe(store: Arc<dyn DocumentStore>, path: DocPath) -> Subscription {
    let changes = store.changes();
    Subscription {
        store,
        path,
        changes,
        primed: false,
    }
}

/// Handle on a live path. Dropping it (or calling [`Subscription::unsubscribe`])
/// ends the subscription; a new one has to be taken out with [`subscribe`].
pub struct Subscription {
    store: Arc<dyn DocumentStore>,
    path: DocPath,
    changes: broadcast::Receiver<DocPath>,
    primed: bool,
}

impl Subscription {
    /// Next full snapshot, `None` once the store has shut down.
    pub async fn next(&mut self) -> Option<Result<Snapshot, SwapError>> {
        if self.primed {
            loop {
                match self.changes.recv().await {
                    Ok(changed) if changed.overlaps(&self.path) => break,
                    Ok(_) => continue,
                    // missed notices are fine, the re-read below is a full value
                    Err(RecvError::Lagged(_)) => break,
                    Err(RecvError::Closed) => return None,
                }
            }
        }
        self.primed = true;

        let snapshot = self
            .store
            .get(&self.path)
            .await
            .map(|value| Snapshot::new(self.path.clone(), value));
        tracing::debug!(path = %self.path, ok = snapshot.is_ok(), "snapshot delivered");
        Some(snapshot)
    }

    pub fn unsubscribe(self) {
        tracing::debug!(path = %self.path, "unsubscribed");
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Snapshot, SwapError>> + Send {
        futures_util::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|snapshot| (snapshot, subscription))
        })
    }
}
