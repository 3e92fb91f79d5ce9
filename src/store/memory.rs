use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{SwapError, now_millis};

use super::{CHANGE_FEED_CAPACITY, DocPath, DocumentStore, FieldValue, Patch, PushIds, tree};

/// Whole tree in process memory.
pub struct MemoryStore {
    tree: RwLock<Value>,
    keys: PushIds,
    tx: broadcast::Sender<DocPath>,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_tree(Value::Null)
    }

    pub fn with_tree(tree: Value) -> Self {
        Self {
            tree: RwLock::new(tree::normalize(tree).unwrap_or(Value::Null)),
            keys: PushIds::new(),
            tx: broadcast::channel(CHANGE_FEED_CAPACITY).0,
            offline: AtomicBool::new(false),
        }
    }

    /// While offline every operation fails with `BackendUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn reachable(&self) -> Result<(), SwapError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SwapError::unavailable("memory store is offline"));
        }
        Ok(())
    }

    fn write(&self, changed: &DocPath, writes: Vec<(DocPath, FieldValue)>) -> Result<(), SwapError> {
        self.reachable()?;
        {
            let mut root = self.tree.write();
            for (path, value) in writes {
                match value {
                    FieldValue::Set(value) => tree::set(&mut root, path.segments(), value),
                    FieldValue::Delete => tree::remove(&mut root, path.segments()),
                }
            }
        }
        let _ = self.tx.send(changed.clone());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, SwapError> {
        self.reachable()?;
        Ok(tree::get(&self.tree.read(), path.segments()).cloned())
    }

    async fn append(&self, path: &DocPath, value: Value) -> Result<String, SwapError> {
        let key = self.keys.next(now_millis());
        let target = path.clone().child(&key)?;
        self.write(&target, vec![(target.clone(), FieldValue::Set(value))])?;
        Ok(key)
    }

    async fn patch(&self, path: &DocPath, patch: Patch) -> Result<(), SwapError> {
        let writes = patch.resolve(path)?;
        self.write(path, writes)
    }

    async fn replace_all(&self, path: &DocPath, value: Value) -> Result<(), SwapError> {
        self.write(path, vec![(path.clone(), FieldValue::Set(value))])
    }

    async fn remove_subtree(&self, path: &DocPath) -> Result<(), SwapError> {
        self.write(path, vec![(path.clone(), FieldValue::Delete)])
    }

    fn changes(&self) -> broadcast::Receiver<DocPath> {
        self.tx.subscribe()
    }
}
