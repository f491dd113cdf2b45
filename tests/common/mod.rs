#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use splitrent::domain::envelope::SignedEnvelope;
use splitrent::domain::ledger::{
    AccountSnapshot, AssetBalance, NATIVE_ASSET_TYPE, SubmittedTransaction, TransactionStatus,
};
use splitrent::domain::network::TESTNET_PASSPHRASE;
use splitrent::domain::ports::{LedgerGateway, SessionGateway};
use splitrent::domain::session::Session;
use splitrent::error::{LedgerError, WalletError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stellar_strkey::ed25519::PublicKey;
use tokio::sync::Notify;

pub const HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";

pub fn address(seed: u8) -> String {
    PublicKey([seed; 32]).to_string()
}

pub fn testnet_session(address: &str) -> Session {
    Session::new(address, Some(TESTNET_PASSPHRASE.to_string()))
}

/// Ledger double with canned answers and call counters.
pub struct ScriptedLedger {
    balances: Mutex<HashMap<String, Decimal>>,
    account_delay: Mutex<HashMap<String, Duration>>,
    sequence: i64,
    base_fee: u32,
    submit_result: Mutex<Result<String, LedgerError>>,
    submit_ledger: Option<u32>,
    statuses: Mutex<VecDeque<Result<TransactionStatus, LedgerError>>>,
    account_error: Mutex<Option<LedgerError>>,
    pub load_calls: AtomicUsize,
    pub fee_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            account_delay: Mutex::new(HashMap::new()),
            sequence: 1_000,
            base_fee: 100,
            submit_result: Mutex::new(Ok(HASH.to_string())),
            submit_ledger: None,
            statuses: Mutex::new(VecDeque::new()),
            account_error: Mutex::new(None),
            load_calls: AtomicUsize::new(0),
            fee_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_account(self, address: &str, balance: Decimal) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), balance);
        self
    }

    pub fn with_account_delay(self, address: &str, delay: Duration) -> Self {
        self.account_delay
            .lock()
            .unwrap()
            .insert(address.to_string(), delay);
        self
    }

    pub fn with_submit_result(self, result: Result<String, LedgerError>) -> Self {
        *self.submit_result.lock().unwrap() = result;
        self
    }

    /// Makes `submit` acknowledge inclusion in `ledger` straight away.
    pub fn with_submit_ledger(mut self, ledger: u32) -> Self {
        self.submit_ledger = Some(ledger);
        self
    }

    /// Answers for successive `get_transaction` calls; `NotFound` once drained.
    pub fn with_statuses(self, statuses: Vec<Result<TransactionStatus, LedgerError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn set_balance(&self, address: &str, balance: Decimal) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), balance);
    }

    pub fn fail_accounts_with(&self, err: LedgerError) {
        *self.account_error.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.account_error.lock().unwrap() = None;
    }

    pub fn gateway_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
            + self.fee_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
            + self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerGateway for ScriptedLedger {
    async fn load_account(&self, address: &str) -> Result<AccountSnapshot, LedgerError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.account_delay.lock().unwrap().get(address).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.account_error.lock().unwrap().clone() {
            return Err(err);
        }
        let balance = self.balances.lock().unwrap().get(address).copied();
        match balance {
            Some(balance) => Ok(AccountSnapshot {
                account_id: address.to_string(),
                sequence: self.sequence,
                balances: vec![AssetBalance {
                    asset_type: NATIVE_ASSET_TYPE.to_string(),
                    balance,
                }],
            }),
            None => Err(LedgerError::AccountNotFound(address.to_string())),
        }
    }

    async fn fetch_base_fee(&self) -> Result<u32, LedgerError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.base_fee)
    }

    async fn submit(&self, _envelope: &SignedEnvelope) -> Result<SubmittedTransaction, LedgerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let hash = self.submit_result.lock().unwrap().clone()?;
        Ok(SubmittedTransaction {
            hash,
            ledger: self.submit_ledger,
        })
    }

    async fn get_transaction(&self, _hash: &str) -> Result<TransactionStatus, LedgerError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(TransactionStatus::NotFound))
    }
}

/// Wallet double. Signing can be declined, or held open until released.
pub struct ScriptedWallet {
    decline: Option<WalletError>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    pub signed: Mutex<Vec<String>>,
}

impl ScriptedWallet {
    pub fn approving() -> Self {
        Self {
            decline: None,
            gate: None,
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn declining(err: WalletError) -> Self {
        Self {
            decline: Some(err),
            ..Self::approving()
        }
    }

    /// `entered` fires once a signature is requested; signing completes
    /// only after `release` is notified.
    pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::approving()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionGateway for ScriptedWallet {
    async fn connect(&self) -> Result<Session, WalletError> {
        Err(WalletError::default())
    }

    async fn restore_session(&self) -> Result<Option<Session>, WalletError> {
        Ok(None)
    }

    async fn sign(
        &self,
        envelope_xdr: &str,
        _network_passphrase: &str,
        _address: &str,
    ) -> Result<SignedEnvelope, WalletError> {
        self.signed.lock().unwrap().push(envelope_xdr.to_string());
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        match &self.decline {
            Some(err) => Err(err.clone()),
            None => Ok(SignedEnvelope(envelope_xdr.to_string())),
        }
    }
}
