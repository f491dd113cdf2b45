use crate::domain::ports::HistoryStore;
use crate::domain::transaction::{TransactionHistory, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory payment history, one partition per wallet.
///
/// Uses `Arc<RwLock<HashMap<String, TransactionHistory>>>` so clones share
/// the same data. Suitable for tests and the operator binary, where nothing
/// needs to outlive the process.
#[derive(Default, Clone)]
pub struct InMemoryHistoryStore {
    histories: Arc<RwLock<HashMap<String, TransactionHistory>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one owner's history, newest first.
    pub async fn history(&self, owner: &str) -> TransactionHistory {
        let histories = self.histories.read().await;
        histories.get(owner).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, owner: &str, record: TransactionRecord) -> Result<()> {
        let mut histories = self.histories.write().await;
        histories.entry(owner.to_string()).or_default().record(record);
        Ok(())
    }

    async fn list(&self, owner: &str) -> Result<Vec<TransactionRecord>> {
        let histories = self.histories.read().await;
        Ok(histories
            .get(owner)
            .map(|h| h.records().to_vec())
            .unwrap_or_default())
    }

    async fn merge(&self, owner: &str, batch: Vec<TransactionRecord>) -> Result<usize> {
        let mut histories = self.histories.write().await;
        Ok(histories.entry(owner.to_string()).or_default().merge(batch))
    }

    async fn mark_confirmed(&self, owner: &str, hash: &str, ledger: Option<u32>) -> Result<bool> {
        let mut histories = self.histories.write().await;
        Ok(histories
            .get_mut(owner)
            .is_some_and(|h| h.mark_confirmed(hash, ledger)))
    }

    async fn clear(&self, owner: &str) -> Result<()> {
        let mut histories = self.histories.write().await;
        histories.remove(owner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(hash: &str, minute: u32) -> TransactionRecord {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, minute, 0).unwrap();
        TransactionRecord::new(hash, "GOWNER", "GDEST", "5", at)
    }

    #[tokio::test]
    async fn test_histories_are_partitioned_by_owner() {
        let store = InMemoryHistoryStore::new();
        store.append("GOWNER", record("a", 1)).await.unwrap();
        store.append("GOTHER", record("b", 2)).await.unwrap();

        let owner = store.list("GOWNER").await.unwrap();
        assert_eq!(owner.len(), 1);
        assert_eq!(owner[0].hash, "a");
        assert!(store.list("GNOBODY").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_is_idempotent_on_hash() {
        let store = InMemoryHistoryStore::new();
        store.append("GOWNER", record("a", 1)).await.unwrap();
        store.append("GOWNER", record("a", 1)).await.unwrap();
        assert_eq!(store.list("GOWNER").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_mark_and_clear() {
        let store = InMemoryHistoryStore::new();
        store.append("GOWNER", record("a", 1)).await.unwrap();

        let inserted = store
            .merge("GOWNER", vec![record("a", 1), record("b", 5)])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(store.history("GOWNER").await.records()[0].hash, "b");

        assert!(store.mark_confirmed("GOWNER", "a", Some(9)).await.unwrap());
        assert!(!store.mark_confirmed("GOTHER", "a", None).await.unwrap());

        store.clear("GOWNER").await.unwrap();
        assert!(store.history("GOWNER").await.is_empty());
    }
}
