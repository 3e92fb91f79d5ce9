use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{
    SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::sync::{Mutex, broadcast};

use crate::{SwapError, now_millis};

use super::{CHANGE_FEED_CAPACITY, DocPath, DocumentStore, FieldValue, Patch, PushIds, tree};

/// Documents persisted one row per `collection/key`; anything deeper lives
/// inside the row's JSON body.
pub struct SqliteStore {
    pool: SqlitePool,
    keys: PushIds,
    tx: broadcast::Sender<DocPath>,
    writer: Mutex<()>,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, SwapError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // every connection to an in-memory database is a fresh database
        let max_connections = if url.contains(":memory:") { 1 } else { 16 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, SwapError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            keys: PushIds::new(),
            tx: broadcast::channel(CHANGE_FEED_CAPACITY).0,
            writer: Mutex::new(()),
        })
    }

    async fn write(&self, changed: &DocPath, writes: Vec<(DocPath, FieldValue)>) -> Result<(), SwapError> {
        let guard = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;
        for (path, value) in writes {
            apply(&mut *tx, &path, value).await?;
        }
        tx.commit().await?;
        drop(guard);

        let _ = self.tx.send(changed.clone());
        Ok(())
    }
}

async fn apply(conn: &mut SqliteConnection, path: &DocPath, value: FieldValue) -> Result<(), SwapError> {
    match path.segments() {
        [] => {
            sqlx::query("DELETE FROM documents").execute(&mut *conn).await?;
            if let FieldValue::Set(value) = value {
                for (collection, docs) in objects(path, value)? {
                    insert_collection(conn, &collection, docs).await?;
                }
            }
        }
        [collection] => {
            sqlx::query("DELETE FROM documents WHERE collection=?")
                .bind(collection)
                .execute(&mut *conn)
                .await?;
            if let FieldValue::Set(value) = value {
                insert_collection(conn, collection, value).await?;
            }
        }
        [collection, key, rest @ ..] => {
            let mut doc = load_document(conn, collection, key).await?.unwrap_or(Value::Null);
            match value {
                FieldValue::Set(value) => tree::set(&mut doc, rest, value),
                FieldValue::Delete => tree::remove(&mut doc, rest),
            }
            save_document(conn, collection, key, doc).await?;
        }
    }
    Ok(())
}

fn objects(path: &DocPath, value: Value) -> Result<Map<String, Value>, SwapError> {
    match tree::normalize(value) {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(SwapError::validation(format!(
            "only documents can be stored at {}",
            if path.is_root() { "the root".to_owned() } else { path.to_string() }
        ))),
    }
}

async fn insert_collection(conn: &mut SqliteConnection, collection: &str, value: Value) -> Result<(), SwapError> {
    let path = DocPath::root().child(collection)?;
    for (key, doc) in objects(&path, value)? {
        save_document(conn, collection, &key, doc).await?;
    }
    Ok(())
}

async fn load_document(conn: &mut SqliteConnection, collection: &str, key: &str) -> Result<Option<Value>, SwapError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT body FROM documents WHERE collection=? AND key=?")
        .bind(collection)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|(body,)| decode(collection, key, &body)).transpose()
}

async fn save_document(conn: &mut SqliteConnection, collection: &str, key: &str, doc: Value) -> Result<(), SwapError> {
    match tree::normalize(doc) {
        None => {
            sqlx::query("DELETE FROM documents WHERE collection=? AND key=?")
                .bind(collection)
                .bind(key)
                .execute(&mut *conn)
                .await?;
        }
        Some(doc) => {
            sqlx::query(
                "INSERT INTO documents (collection,key,body) VALUES (?,?,?)
                 ON CONFLICT(collection,key) DO UPDATE SET body=excluded.body",
            )
            .bind(collection)
            .bind(key)
            .bind(doc.to_string())
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

fn decode(collection: &str, key: &str, body: &str) -> Result<Value, SwapError> {
    serde_json::from_str(body).map_err(|source| SwapError::Malformed {
        path: format!("{collection}/{key}"),
        source,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, SwapError> {
        let mut conn = self.pool.acquire().await?;
        match path.segments() {
            [] => {
                let rows: Vec<(String, String, String)> =
                    sqlx::query_as("SELECT collection,key,body FROM documents")
                        .fetch_all(&mut *conn)
                        .await?;
                let mut root = Value::Null;
                for (collection, key, body) in rows {
                    let doc = decode(&collection, &key, &body)?;
                    tree::set(&mut root, &[collection, key], doc);
                }
                Ok(tree::get(&root, &[]).cloned())
            }
            [collection] => {
                let rows: Vec<(String, String)> =
                    sqlx::query_as("SELECT key,body FROM documents WHERE collection=?")
                        .bind(collection)
                        .fetch_all(&mut *conn)
                        .await?;
                let mut docs = Map::new();
                for (key, body) in rows {
                    let doc = decode(collection, &key, &body)?;
                    docs.insert(key, doc);
                }
                Ok((!docs.is_empty()).then_some(Value::Object(docs)))
            }
            [collection, key, rest @ ..] => {
                let doc = load_document(&mut conn, collection, key).await?;
                Ok(doc.and_then(|doc| tree::get(&doc, rest).cloned()))
            }
        }
    }

    async fn append(&self, path: &DocPath, value: Value) -> Result<String, SwapError> {
        let key = self.keys.next(now_millis());
        let target = path.clone().child(&key)?;
        self.write(&target, vec![(target.clone(), FieldValue::Set(value))]).await?;
        Ok(key)
    }

    async fn patch(&self, path: &DocPath, patch: Patch) -> Result<(), SwapError> {
        let writes = patch.resolve(path)?;
        self.write(path, writes).await
    }

    async fn replace_all(&self, path: &DocPath, value: Value) -> Result<(), SwapError> {
        self.write(path, vec![(path.clone(), FieldValue::Set(value))]).await
    }

    async fn remove_subtree(&self, path: &DocPath) -> Result<(), SwapError> {
        self.write(path, vec![(path.clone(), FieldValue::Delete)]).await
    }

    fn changes(&self) -> broadcast::Receiver<DocPath> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::store::{Collection, subscribe};

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn path(raw: &str) -> DocPath {
        DocPath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn nested_writes_round_through_the_document_row() {
        let store = store().await;
        store
            .replace_all(&path("users/u1"), json!({"name": "Ann", "email": "ann@x.io", "skillsOffered": {}}))
            .await
            .unwrap();
        let key = store
            .append(&path("users/u1/skillsOffered"), json!({"name": "Rust", "level": 4}))
            .await
            .unwrap();

        assert_eq!(
            store.get(&path(&format!("users/u1/skillsOffered/{key}/level"))).await.unwrap(),
            Some(json!(4))
        );
        assert_eq!(store.get(&path("users/u1/bio")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn like_toggle_leaves_no_false_behind() {
        let store = store().await;
        let posts = Collection::Posts.path();
        let id = store.append(&posts, json!({"content": "hello", "likes": {}})).await.unwrap();
        let likes = posts.clone().child(&id).unwrap().child("likes").unwrap();

        store.patch(&likes, Patch::new().set("u1", true)).await.unwrap();
        assert_eq!(store.get(&likes).await.unwrap(), Some(json!({"u1": true})));

        store.patch(&likes, Patch::new().delete("u1")).await.unwrap();
        assert_eq!(store.get(&likes).await.unwrap(), None);
        assert_eq!(
            store.get(&posts.child(&id).unwrap()).await.unwrap(),
            Some(json!({"content": "hello"}))
        );
    }

    #[tokio::test]
    async fn removing_the_last_field_removes_the_row() {
        let store = store().await;
        store.replace_all(&path("feedback/f1"), json!({"rating": 4})).await.unwrap();
        store.remove_subtree(&path("feedback/f1/rating")).await.unwrap();
        assert_eq!(store.get(&Collection::Feedback.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn collection_and_root_reads_assemble_rows() {
        let store = store().await;
        store.replace_all(&path("sessions/s1"), json!({"title": "A"})).await.unwrap();
        store.replace_all(&path("sessions/s2"), json!({"title": "B"})).await.unwrap();
        store.replace_all(&path("users/u1"), json!({"name": "Ann"})).await.unwrap();

        assert_eq!(
            store.get(&Collection::Sessions.path()).await.unwrap(),
            Some(json!({"s1": {"title": "A"}, "s2": {"title": "B"}}))
        );
        assert_eq!(
            store.get(&DocPath::root()).await.unwrap(),
            Some(json!({
                "sessions": {"s1": {"title": "A"}, "s2": {"title": "B"}},
                "users": {"u1": {"name": "Ann"}},
            }))
        );

        store.remove_subtree(&Collection::Sessions.path()).await.unwrap();
        assert_eq!(store.get(&Collection::Sessions.path()).await.unwrap(), None);
        assert!(store.get(&path("users/u1")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn scalar_collections_are_rejected() {
        let store = store().await;
        let err = store.replace_all(&path("posts"), json!(5)).await.unwrap_err();
        assert!(matches!(err, SwapError::Validation(_)));
    }

    #[tokio::test]
    async fn subscribers_see_committed_writes() {
        let store: Arc<dyn DocumentStore> = Arc::new(store().await);
        let mut sub = subscribe(store.clone(), path("posts"));
        assert_eq!(sub.next().await.unwrap().unwrap().value, None);

        let id = store.append(&path("posts"), json!({"content": "x"})).await.unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.entries::<Value>()[0].key, id);
    }
}
