use crate::domain::intent::{RequestId, TransactionRecord};
use crate::domain::ports::AttemptStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory arena of transaction records, keyed by request id.
///
/// Suits single-process hosts; a host that must survive restarts mid-payment
/// can provide its own [`AttemptStore`] backed by durable storage.
#[derive(Default, Clone)]
pub struct InMemoryAttemptStore {
    records: Arc<RwLock<HashMap<RequestId, Vec<TransactionRecord>>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn record(&self, request_id: &RequestId, record: TransactionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        let entries = records.entry(request_id.clone()).or_default();
        match entries.iter_mut().find(|r| r.hash == record.hash) {
            Some(existing) => *existing = record,
            None => entries.push(record),
        }
        Ok(())
    }

    async fn records(&self, request_id: &RequestId) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(request_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::{TxHash, TxKind, TxStatus};

    fn record(hash: &str, status: TxStatus) -> TransactionRecord {
        TransactionRecord {
            hash: TxHash(hash.to_string()),
            kind: TxKind::Payment,
            status,
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let store = InMemoryAttemptStore::new();
        let id = RequestId("req-1".to_string());

        store.record(&id, record("0xaa", TxStatus::Pending)).await.unwrap();
        store.record(&id, record("0xbb", TxStatus::Pending)).await.unwrap();

        let records = store.records(&id).await.unwrap();
        assert_eq!(records.len(), 2);

        let empty = store.records(&RequestId("req-2".to_string())).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_record_upserts_by_hash() {
        let store = InMemoryAttemptStore::new();
        let id = RequestId("req-1".to_string());

        store.record(&id, record("0xaa", TxStatus::Pending)).await.unwrap();
        store.record(&id, record("0xaa", TxStatus::Confirmed)).await.unwrap();

        let records = store.records(&id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, TxStatus::Confirmed);
    }
}
