use crate::application::balance::BalanceSynchronizer;
use crate::domain::address::short_address;
use crate::domain::ports::SessionGatewayRef;
use crate::domain::session::Session;
use crate::error::{PaymentError, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const CONNECT_FAILED: &str = "Failed to connect wallet. Please try again.";

/// Owns the wallet session and keeps the balance synchronizer aligned with it.
///
/// The session is replaced on every connect or restore and dropped on
/// disconnect; the synchronizer only runs while a test-realm session is held.
pub struct SessionController {
    wallet: SessionGatewayRef,
    balance: BalanceSynchronizer,
    session: RwLock<Option<Session>>,
}

impl SessionController {
    pub fn new(wallet: SessionGatewayRef, balance: BalanceSynchronizer) -> Self {
        Self {
            wallet,
            balance,
            session: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub fn balance(&self) -> &BalanceSynchronizer {
        &self.balance
    }

    /// Prompts the wallet for access.
    ///
    /// A session on the wrong realm is still kept, so the UI can show which
    /// account is connected, but `WrongNetwork` is returned and no balance
    /// is fetched.
    pub async fn connect(&self) -> Result<Session> {
        let session = self
            .wallet
            .connect()
            .await
            .map_err(|err| PaymentError::WalletConnection(err.message_or(CONNECT_FAILED)))?;
        self.adopt(session.clone()).await;

        if !session.is_test_realm() {
            warn!(network = ?session.network, "wallet connected outside the test network");
            return Err(PaymentError::WrongNetwork);
        }
        info!(address = %short_address(&session.address), "wallet connected");
        Ok(session)
    }

    /// Picks up a session the wallet already granted, without prompting.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let restored = self
            .wallet
            .restore_session()
            .await
            .map_err(PaymentError::SessionRestore)?;
        if let Some(session) = &restored {
            info!(address = %short_address(&session.address), "wallet session restored");
            self.adopt(session.clone()).await;
        }
        Ok(restored)
    }

    pub async fn disconnect(&self) {
        self.balance.stop().await;
        if self.session.write().await.take().is_some() {
            info!("wallet disconnected");
        }
    }

    async fn adopt(&self, session: Session) {
        // start() resets the balance and skips polling outside the test realm
        self.balance.start(&session).await;
        *self.session.write().await = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::SignedEnvelope;
    use crate::domain::ledger::{AccountSnapshot, AssetBalance, SubmittedTransaction, TransactionStatus};
    use crate::domain::network::{MAINNET_PASSPHRASE, TESTNET_PASSPHRASE};
    use crate::domain::ports::{LedgerGateway, SessionGateway};
    use crate::error::{LedgerError, WalletError};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedWallet {
        session: std::result::Result<Option<Session>, WalletError>,
    }

    #[async_trait]
    impl SessionGateway for FixedWallet {
        async fn connect(&self) -> std::result::Result<Session, WalletError> {
            match &self.session {
                Ok(Some(session)) => Ok(session.clone()),
                Ok(None) => Err(WalletError::default()),
                Err(err) => Err(err.clone()),
            }
        }

        async fn restore_session(&self) -> std::result::Result<Option<Session>, WalletError> {
            self.session.clone()
        }

        async fn sign(&self, _: &str, _: &str, _: &str) -> std::result::Result<SignedEnvelope, WalletError> {
            Err(WalletError::default())
        }
    }

    struct FundedLedger;

    #[async_trait]
    impl LedgerGateway for FundedLedger {
        async fn load_account(&self, address: &str) -> std::result::Result<AccountSnapshot, LedgerError> {
            Ok(AccountSnapshot {
                account_id: address.to_string(),
                sequence: 1,
                balances: vec![AssetBalance {
                    asset_type: "native".to_string(),
                    balance: dec!(42),
                }],
            })
        }

        async fn fetch_base_fee(&self) -> std::result::Result<u32, LedgerError> {
            Ok(100)
        }

        async fn submit(&self, _: &SignedEnvelope) -> std::result::Result<SubmittedTransaction, LedgerError> {
            Err(LedgerError::Transport("offline".to_string()))
        }

        async fn get_transaction(&self, _: &str) -> std::result::Result<TransactionStatus, LedgerError> {
            Ok(TransactionStatus::NotFound)
        }
    }

    fn controller(session: std::result::Result<Option<Session>, WalletError>) -> SessionController {
        let balance = BalanceSynchronizer::new(Arc::new(FundedLedger), Duration::from_secs(30));
        SessionController::new(Arc::new(FixedWallet { session }), balance)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_on_testnet_starts_balance_sync() {
        let session = Session::new("GOWNER", Some(TESTNET_PASSPHRASE.to_string()));
        let ctl = controller(Ok(Some(session.clone())));

        assert_eq!(ctl.connect().await.unwrap(), session);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(ctl.balance().is_running());
        assert_eq!(ctl.balance().balance().await.map(|b| b.value()), Some(dec!(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_on_mainnet_keeps_session_without_balance() {
        let session = Session::new("GOWNER", Some(MAINNET_PASSPHRASE.to_string()));
        let ctl = controller(Ok(Some(session.clone())));

        assert!(matches!(ctl.connect().await, Err(PaymentError::WrongNetwork)));
        assert_eq!(ctl.current().await, Some(session));
        assert!(!ctl.balance().is_running());
        assert_eq!(ctl.balance().balance().await, None);
    }

    #[tokio::test]
    async fn test_connect_failure_uses_provider_message() {
        let ctl = controller(Err(WalletError::new(Some(-4), "User declined access")));
        let err = ctl.connect().await.unwrap_err();
        assert_eq!(err.to_string(), "User declined access");

        let ctl = controller(Ok(None));
        let err = ctl.connect().await.unwrap_err();
        assert_eq!(err.to_string(), CONNECT_FAILED);
    }

    #[tokio::test]
    async fn test_restore_failure_is_session_restore_error() {
        let ctl = controller(Err(WalletError::default()));
        let err = ctl.restore().await.unwrap_err();
        assert!(matches!(err, PaymentError::SessionRestore(_)));
        assert_eq!(err.to_string(), "Unable to restore wallet session.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_clears_session_and_stops_sync() {
        let session = Session::new("GOWNER", Some("testnet".to_string()));
        let ctl = controller(Ok(Some(session)));
        assert!(ctl.restore().await.unwrap().is_some());
        assert!(ctl.balance().is_running());

        ctl.disconnect().await;
        assert_eq!(ctl.current().await, None);
        assert!(!ctl.balance().is_running());
    }

    #[tokio::test]
    async fn test_restore_with_nothing_granted() {
        let ctl = controller(Ok(None));
        assert_eq!(ctl.restore().await.unwrap(), None);
        assert_eq!(ctl.current().await, None);
    }
}
