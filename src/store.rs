use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

pub const MATCHES: &str = "matches";
pub const PARTICIPANTS: &str = "participants";

/// Slash-separated document path: `collection/doc[/sub-collection/doc]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn new(segments: &[&str]) -> StoreResult<DocPath> {
        if segments.is_empty() || segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath(segments.join("/")));
        }
        for segment in segments {
            if segment.is_empty()
                || *segment == "."
                || *segment == ".."
                || segment.contains(['/', '\\', '\0'])
            {
                return Err(StoreError::InvalidPath(segments.join("/")));
            }
        }
        Ok(DocPath(segments.join("/")))
    }

    pub fn match_doc(match_id: &str) -> StoreResult<DocPath> {
        DocPath::new(&[MATCHES, match_id])
    }

    pub fn participant(match_id: &str, participant_id: &str) -> StoreResult<DocPath> {
        DocPath::new(&[MATCHES, match_id, PARTICIPANTS, participant_id])
    }

    pub fn weapon_meta() -> DocPath {
        DocPath("global_stats/weapon_meta".to_string())
    }

    pub fn sample_cursor() -> DocPath {
        DocPath("samples/recent_matches".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document store with atomic per-document overwrite.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>>;

    async fn set(&self, path: &DocPath, document: Value) -> StoreResult<()>;

    async fn exists(&self, path: &DocPath) -> StoreResult<bool> {
        Ok(self.get(path).await?.is_some())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<DocPath, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths under `prefix/`, in sorted order.
    pub fn paths_under(&self, prefix: &str) -> Vec<DocPath> {
        let prefix = format!("{}/", prefix);
        self.lock()
            .keys()
            .filter(|path| path.as_str().starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<DocPath, Value>> {
        // A poisoned map still holds whole documents.
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        Ok(self.lock().get(path).cloned())
    }

    async fn set(&self, path: &DocPath, document: Value) -> StoreResult<()> {
        self.lock().insert(path.clone(), document);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per document: `matches/m1` lives at `<root>/matches/m1.json`
/// and its participants under `<root>/matches/m1/participants/`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> FileStore {
        FileStore { root: root.into() }
    }

    fn file_for(&self, path: &DocPath) -> PathBuf {
        let mut file = self.root.clone();
        let mut segments = path.segments().peekable();
        while let Some(segment) = segments.next() {
            match segments.peek() {
                Some(_) => file.push(segment),
                // Ids like `account.1` carry dots; append rather than set_extension.
                None => file.push(format!("{}.json", segment)),
            }
        }
        file
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        match tokio::fs::read(self.file_for(path)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, path: &DocPath, document: Value) -> StoreResult<()> {
        let file = self.file_for(path);
        let parent = file
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        tokio::fs::create_dir_all(parent).await?;

        // Readers see either the old document or the new one. Each write
        // stages its own temp file so concurrent writers never collide;
        // the last rename wins.
        let tmp = file.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let bytes = serde_json::to_vec_pretty(&document)?;
        let staged = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &file).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_reject_unsafe_segments() {
        assert!(DocPath::match_doc("").is_err());
        assert!(DocPath::match_doc("..").is_err());
        assert!(DocPath::match_doc("a/b").is_err());
        assert!(DocPath::new(&["matches"]).is_err());
        assert_eq!(
            DocPath::participant("m1", "account.1").unwrap().as_str(),
            "matches/m1/participants/account.1"
        );
    }

    #[tokio::test]
    async fn memory_store_overwrites_and_counts_writes() {
        let store = MemoryStore::new();
        let path = DocPath::match_doc("m1").unwrap();
        assert!(!store.exists(&path).await.unwrap());
        store.set(&path, json!({"v": 1})).await.unwrap();
        store.set(&path, json!({"v": 2})).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"v": 2})));
        assert_eq!(store.writes(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn file_store_nests_sub_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let parent = DocPath::match_doc("m1").unwrap();
        let child = DocPath::participant("m1", "p1").unwrap();

        store.set(&parent, json!({"mapName": "Erangel"})).await.unwrap();
        store.set(&child, json!({"kills": 3})).await.unwrap();
        store
            .set(&DocPath::participant("m1", "account.7").unwrap(), json!({}))
            .await
            .unwrap();

        assert!(dir.path().join("matches/m1.json").is_file());
        assert!(dir.path().join("matches/m1/participants/p1.json").is_file());
        assert!(dir.path().join("matches/m1/participants/account.7.json").is_file());
        assert_eq!(store.get(&child).await.unwrap(), Some(json!({"kills": 3})));
        assert_eq!(store.get(&DocPath::match_doc("m2").unwrap()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = DocPath::weapon_meta();
        store.set(&path, json!({"topWeapons": [1, 2]})).await.unwrap();
        store.set(&path, json!({"topWeapons": []})).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"topWeapons": []})));
        let leftovers = std::fs::read_dir(dir.path().join("global_stats"))
            .unwrap()
            .filter(|entry| {
                entry.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_to_one_document_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let large = json!({"matchIds": (0..400).map(|i| format!("m{}", i)).collect::<Vec<_>>()});
        let small = json!({"matchIds": ["a", "b", "c"]});
        let path = DocPath::sample_cursor();

        for _ in 0..50 {
            let mut handles = Vec::new();
            for document in [large.clone(), small.clone()] {
                // Separate handles on one root, like two overlapping runs.
                let store = FileStore::new(dir.path());
                let path = path.clone();
                handles.push(tokio::spawn(async move { store.set(&path, document).await }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
            let current = FileStore::new(dir.path()).get(&path).await.unwrap().unwrap();
            assert!(current == large || current == small);
        }

        let leftovers = std::fs::read_dir(dir.path().join("samples"))
            .unwrap()
            .filter(|entry| {
                entry.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }
}
