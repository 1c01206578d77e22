use tracing::debug;

use crate::error::StoreResult;
use crate::records::MatchRecord;
use crate::store::{DocPath, DocumentStore};

#[derive(Debug)]
pub enum Admission {
    /// No record yet; the match may be fetched.
    New,
    /// Already persisted by an earlier run.
    Known(Option<MatchRecord>),
}

/// Point lookup against `matches/{id}`, done before any network call for the
/// match. Not transactional: overlapping runs may both admit the same match,
/// and the second write simply overwrites the first.
pub struct DedupGate<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> DedupGate<'a, S> {
    pub fn new(store: &'a S) -> Self {
        DedupGate { store }
    }

    pub async fn check(&self, match_id: &str) -> StoreResult<Admission> {
        let path = DocPath::match_doc(match_id)?;
        match self.store.get(&path).await? {
            None => Ok(Admission::New),
            Some(document) => {
                debug!(match_id, "match already stored");
                // An unreadable stored record still counts as processed.
                Ok(Admission::Known(serde_json::from_value(document).ok()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_match_is_admitted() {
        let store = MemoryStore::new();
        let gate = DedupGate::new(&store);
        assert!(matches!(gate.check("m1").await.unwrap(), Admission::New));
    }

    #[tokio::test]
    async fn stored_match_is_known_even_when_unparseable() {
        let store = MemoryStore::new();
        store
            .set(&DocPath::match_doc("m1").unwrap(), json!({"legacy": true}))
            .await
            .unwrap();
        let gate = DedupGate::new(&store);
        assert!(matches!(gate.check("m1").await.unwrap(), Admission::Known(None)));
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected_before_lookup() {
        let store = MemoryStore::new();
        assert!(DedupGate::new(&store).check("../x").await.is_err());
    }
}
