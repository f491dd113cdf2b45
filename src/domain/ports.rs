use super::envelope::SignedEnvelope;
use super::ledger::{AccountSnapshot, SubmittedTransaction, TransactionStatus};
use super::session::Session;
use super::transaction::TransactionRecord;
use crate::error::{LedgerError, Result, WalletError};
use async_trait::async_trait;
use std::sync::Arc;

/// The browser wallet extension.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Asks the user to grant access and returns the exposed session.
    async fn connect(&self) -> Result<Session, WalletError>;
    /// Returns the already-granted session, if any, without prompting.
    async fn restore_session(&self) -> Result<Option<Session>, WalletError>;
    /// Asks the wallet to sign a base64 XDR envelope for `address`.
    async fn sign(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
        address: &str,
    ) -> Result<SignedEnvelope, WalletError>;
}

/// The ledger's HTTP API.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn load_account(&self, address: &str) -> Result<AccountSnapshot, LedgerError>;
    /// Current base fee per operation, in stroops.
    async fn fetch_base_fee(&self) -> Result<u32, LedgerError>;
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmittedTransaction, LedgerError>;
    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError>;
}

/// Payment history, partitioned by owning wallet address.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, owner: &str, record: TransactionRecord) -> Result<()>;
    async fn list(&self, owner: &str) -> Result<Vec<TransactionRecord>>;
    /// Inserts records whose hash is unknown for `owner`; returns how many.
    async fn merge(&self, owner: &str, batch: Vec<TransactionRecord>) -> Result<usize>;
    async fn mark_confirmed(&self, owner: &str, hash: &str, ledger: Option<u32>) -> Result<bool>;
    async fn clear(&self, owner: &str) -> Result<()>;
}

pub type SessionGatewayRef = Arc<dyn SessionGateway>;
pub type LedgerGatewayRef = Arc<dyn LedgerGateway>;
pub type HistoryStoreRef = Arc<dyn HistoryStore>;
