use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Network tag stored on every record; payments are testnet-only.
pub const RECORD_NETWORK: &str = "testnet";

fn record_network() -> String {
    RECORD_NETWORK.to_string()
}

/// A payment the user submitted, as kept in local history.
///
/// `hash` is the natural key; `id` is only unique within one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    #[serde(default = "record_network")]
    pub network: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u32>,
}

impl TransactionRecord {
    pub fn new(
        hash: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let hash = hash.into();
        let prefix: String = hash.chars().take(6).collect();
        Self {
            id: format!("{}-{}", created_at.timestamp_millis(), prefix),
            hash,
            from: from.into(),
            to: to.into(),
            amount: amount.into(),
            network: RECORD_NETWORK.to_string(),
            created_at,
            confirmed: None,
            ledger: None,
        }
    }

    pub fn with_confirmation(mut self, confirmed: bool, ledger: Option<u32>) -> Self {
        self.confirmed = Some(confirmed);
        self.ledger = ledger;
        self
    }
}

/// Ordered payment history of one wallet, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHistory {
    records: Vec<TransactionRecord>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let mut history = Self::new();
        history.merge(records);
        history
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TransactionRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.records.iter().any(|r| r.hash == hash)
    }

    /// Puts a freshly submitted record at the head. Returns false when the
    /// hash is already present.
    pub fn record(&mut self, record: TransactionRecord) -> bool {
        if self.contains(&record.hash) {
            return false;
        }
        self.records.insert(0, record);
        true
    }

    /// Inserts the records whose hash is not yet present and restores
    /// newest-first order. Returns how many were inserted.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = TransactionRecord>) -> usize {
        let mut seen: HashSet<String> = self.records.iter().map(|r| r.hash.clone()).collect();
        let before = self.records.len();
        for record in batch {
            if seen.insert(record.hash.clone()) {
                self.records.push(record);
            }
        }
        let inserted = self.records.len() - before;
        if inserted > 0 {
            // stable: records sharing a timestamp keep their relative order
            self.records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        inserted
    }

    /// Fills in the confirmation fields of a record. Returns false when the
    /// hash is unknown.
    pub fn mark_confirmed(&mut self, hash: &str, ledger: Option<u32>) -> bool {
        match self.records.iter_mut().find(|r| r.hash == hash) {
            Some(record) => {
                record.confirmed = Some(true);
                record.ledger = ledger;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
