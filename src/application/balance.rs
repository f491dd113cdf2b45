use crate::domain::amount::Balance;
use crate::domain::network::is_test_network;
use crate::domain::ports::LedgerGatewayRef;
use crate::domain::session::Session;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub const BALANCE_ADVISORY: &str =
    "Unable to fetch testnet balance. Make sure your account exists and is funded on testnet.";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BalanceView {
    /// Not fetched: no session, or the session is not on the test realm.
    #[default]
    Unknown,
    Known(Balance),
}

impl BalanceView {
    pub fn known(&self) -> Option<Balance> {
        match self {
            BalanceView::Known(balance) => Some(*balance),
            BalanceView::Unknown => None,
        }
    }
}

/// What the UI renders for the connected account's balance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BalanceSnapshot {
    pub balance: BalanceView,
    pub last_updated: Option<DateTime<Utc>>,
    /// Set when the latest fetch failed; cleared by the next attempt.
    pub advisory: Option<String>,
    pub refreshing: bool,
}

struct Inner {
    ledger: LedgerGatewayRef,
    interval: Duration,
    generation: AtomicU64,
    state: RwLock<BalanceSnapshot>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn abort_timer(&self) {
        if let Ok(mut timer) = self.timer.lock()
            && let Some(handle) = timer.take()
        {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_timer();
    }
}

/// Keeps the connected account's native balance up to date.
///
/// Every refresh takes a new generation number. A response is applied only
/// if no other refresh, context change or stop happened while it was in
/// flight, so a slow answer for an old address can never overwrite a newer
/// one. Cloning yields another handle to the same synchronizer.
#[derive(Clone)]
pub struct BalanceSynchronizer {
    inner: Arc<Inner>,
}

impl BalanceSynchronizer {
    pub fn new(ledger: LedgerGatewayRef, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                ledger,
                interval,
                generation: AtomicU64::new(0),
                state: RwLock::new(BalanceSnapshot::default()),
                timer: Mutex::new(None),
            }),
        }
    }

    pub async fn snapshot(&self) -> BalanceSnapshot {
        self.inner.state.read().await.clone()
    }

    pub async fn balance(&self) -> Option<Balance> {
        self.inner.state.read().await.balance.known()
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    /// Fetches the balance for `(address, network)`.
    ///
    /// Returns true when the outcome (balance or advisory) was applied,
    /// false when it was discarded as stale or the network is not testnet.
    pub async fn refresh(&self, address: &str, network: Option<&str>) -> bool {
        let generation = self.next_generation();

        if !is_test_network(network) {
            let mut state = self.inner.state.write().await;
            state.balance = BalanceView::Unknown;
            state.refreshing = false;
            return false;
        }

        {
            let mut state = self.inner.state.write().await;
            state.refreshing = true;
            state.advisory = None;
        }

        let result = self.inner.ledger.load_account(address).await;

        let mut state = self.inner.state.write().await;
        if !self.is_current(generation) {
            debug!(address, generation, "discarding stale balance response");
            return false;
        }
        state.refreshing = false;
        match result {
            Ok(account) => {
                let balance = account.native_balance();
                debug!(address, %balance, "balance refreshed");
                state.balance = BalanceView::Known(balance);
                state.last_updated = Some(Utc::now());
            }
            Err(err) => {
                warn!(address, error = %err, "balance refresh failed");
                state.advisory = Some(BALANCE_ADVISORY.to_string());
            }
        }
        true
    }

    /// Starts periodic refreshes for `session`, replacing any previous one.
    ///
    /// Outside the test realm the balance is reset to unknown and no timer
    /// runs. The first refresh happens immediately.
    pub async fn start(&self, session: &Session) {
        self.stop().await;
        if !session.is_test_realm() {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let address = session.address.clone();
        let network = session.network.clone();
        let interval = self.inner.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let sync = BalanceSynchronizer { inner };
                sync.refresh(&address, network.as_deref()).await;
            }
        });

        if let Ok(mut timer) = self.inner.timer.lock() {
            *timer = Some(handle);
        }
    }

    /// Cancels the timer and any in-flight fetch, and forgets the balance.
    pub async fn stop(&self) {
        self.next_generation();
        self.inner.abort_timer();
        *self.inner.state.write().await = BalanceSnapshot::default();
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .map(|timer| timer.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::{AccountSnapshot, AssetBalance, NATIVE_ASSET_TYPE};
    use crate::domain::network::{MAINNET_PASSPHRASE, TESTNET_PASSPHRASE};
    use crate::domain::ports::LedgerGateway;
    use crate::domain::envelope::SignedEnvelope;
    use crate::domain::ledger::{SubmittedTransaction, TransactionStatus};
    use crate::error::LedgerError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    /// Answers `load_account` with a balance that depends on the address,
    /// after a per-address delay.
    struct SlowLedger {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LedgerGateway for SlowLedger {
        async fn load_account(&self, address: &str) -> Result<AccountSnapshot, LedgerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, balance) = if address == "SLOW" {
                (Duration::from_secs(5), dec!(1))
            } else {
                (Duration::from_millis(10), dec!(250))
            };
            tokio::time::sleep(delay).await;
            if self.fail {
                return Err(LedgerError::Transport("unreachable".to_string()));
            }
            Ok(AccountSnapshot {
                account_id: address.to_string(),
                sequence: 1,
                balances: vec![AssetBalance {
                    asset_type: NATIVE_ASSET_TYPE.to_string(),
                    balance,
                }],
            })
        }

        async fn fetch_base_fee(&self) -> Result<u32, LedgerError> {
            Ok(100)
        }

        async fn submit(&self, _: &SignedEnvelope) -> Result<SubmittedTransaction, LedgerError> {
            unreachable!("balance sync never submits")
        }

        async fn get_transaction(&self, _: &str) -> Result<TransactionStatus, LedgerError> {
            unreachable!("balance sync never polls transactions")
        }
    }

    fn ledger(fail: bool) -> Arc<SlowLedger> {
        Arc::new(SlowLedger {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_applies_balance_on_testnet() {
        let sync = BalanceSynchronizer::new(ledger(false), Duration::from_secs(30));
        assert!(sync.refresh("FAST", Some(TESTNET_PASSPHRASE)).await);

        let snap = sync.snapshot().await;
        assert_eq!(snap.balance, BalanceView::Known(Balance::new(dec!(250))));
        assert!(snap.last_updated.is_some());
        assert!(!snap.refreshing);
        assert_eq!(snap.advisory, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_test_network_is_unknown_and_not_fetched() {
        let ledger = ledger(false);
        let sync = BalanceSynchronizer::new(ledger.clone(), Duration::from_secs(30));
        assert!(!sync.refresh("FAST", Some(MAINNET_PASSPHRASE)).await);
        assert!(!sync.refresh("FAST", None).await);
        assert_eq!(sync.snapshot().await.balance, BalanceView::Unknown);
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let sync = BalanceSynchronizer::new(ledger(false), Duration::from_secs(30));

        let slow = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.refresh("SLOW", Some("testnet")).await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(sync.refresh("FAST", Some("testnet")).await);
        assert!(!slow.await.unwrap());

        assert_eq!(sync.balance().await, Some(Balance::new(dec!(250))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_advisory_and_keeps_running() {
        let ledger = ledger(true);
        let sync = BalanceSynchronizer::new(ledger.clone(), Duration::from_secs(30));
        let session = Session::new("FAST", Some(TESTNET_PASSPHRASE.to_string()));
        sync.start(&session).await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = sync.snapshot().await;
        assert_eq!(snap.advisory.as_deref(), Some(BALANCE_ADVISORY));
        assert_eq!(snap.balance, BalanceView::Unknown);
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 2);
        assert!(sync.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer_and_in_flight_fetch() {
        let ledger = ledger(false);
        let sync = BalanceSynchronizer::new(ledger.clone(), Duration::from_secs(30));
        let session = Session::new("SLOW", Some(TESTNET_PASSPHRASE.to_string()));
        sync.start(&session).await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        sync.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(!sync.is_running());
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sync.snapshot().await, BalanceSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_outside_test_realm_does_not_poll() {
        let ledger = ledger(false);
        let sync = BalanceSynchronizer::new(ledger.clone(), Duration::from_secs(30));
        sync.start(&Session::new("FAST", Some("mainnet".to_string())))
            .await;
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(!sync.is_running());
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sync.balance().await, None);
    }
}
