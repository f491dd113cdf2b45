use crate::application::balance::BalanceSynchronizer;
use crate::config::Config;
use crate::domain::address::{is_valid_address, short_address};
use crate::domain::amount::{Amount, Balance, STROOPS_PER_UNIT};
use crate::domain::envelope::{PaymentDraft, build_payment_envelope};
use crate::domain::ledger::TransactionStatus;
use crate::domain::ports::{HistoryStoreRef, LedgerGatewayRef, SessionGatewayRef};
use crate::domain::session::Session;
use crate::domain::transaction::TransactionRecord;
use crate::error::{LedgerError, PaymentError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const SIGNING_DECLINED: &str = "Wallet declined transaction signing.";

/// Observable progress of the current payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentState {
    #[default]
    Idle,
    Validating,
    AwaitingSignature,
    Submitting,
    AwaitingConfirmation {
        hash: String,
    },
    Confirmed {
        hash: String,
        ledger: u32,
    },
    /// Submitted, but no definitive result arrived before the polling
    /// window closed. The transaction may still settle.
    SubmittedUnconfirmed {
        hash: String,
    },
    Failed {
        reason: String,
    },
}

impl PaymentState {
    /// True while an attempt has not reached a terminal state.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PaymentState::Validating
                | PaymentState::AwaitingSignature
                | PaymentState::Submitting
                | PaymentState::AwaitingConfirmation { .. }
        )
    }
}

/// Successful end of a payment attempt. Both variants carry the hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Confirmed {
        hash: String,
        ledger: u32,
        record: TransactionRecord,
    },
    SubmittedUnconfirmed {
        hash: String,
        record: TransactionRecord,
        explorer_url: String,
    },
}

impl PaymentOutcome {
    pub fn hash(&self) -> &str {
        match self {
            PaymentOutcome::Confirmed { hash, .. } | PaymentOutcome::SubmittedUnconfirmed { hash, .. } => hash,
        }
    }

    pub fn record(&self) -> &TransactionRecord {
        match self {
            PaymentOutcome::Confirmed { record, .. }
            | PaymentOutcome::SubmittedUnconfirmed { record, .. } => record,
        }
    }
}

/// Whether a destination account already exists on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientStatus {
    Active,
    /// The account must receive the minimum reserve before it exists.
    NotActivated,
    /// The ledger could not be asked.
    Unknown,
}

enum Settlement {
    Confirmed(u32),
    Pending,
}

/// Drives one payment from validation to settlement.
///
/// Every attempt ends either in a [`PaymentOutcome`] or a [`PaymentError`];
/// the same result is mirrored into the [`PaymentState`] channel returned by
/// [`PaymentPipeline::subscribe`]. Callers must not start a second attempt
/// while one is in flight; [`crate::application::desk::PaymentDesk`] enforces
/// that.
pub struct PaymentPipeline {
    wallet: SessionGatewayRef,
    ledger: LedgerGatewayRef,
    history: HistoryStoreRef,
    balance: Option<BalanceSynchronizer>,
    config: Config,
    state: watch::Sender<PaymentState>,
}

impl PaymentPipeline {
    pub fn new(
        wallet: SessionGatewayRef,
        ledger: LedgerGatewayRef,
        history: HistoryStoreRef,
        config: Config,
    ) -> Self {
        let (state, _) = watch::channel(PaymentState::Idle);
        Self {
            wallet,
            ledger,
            history,
            balance: None,
            config,
            state,
        }
    }

    /// Refreshes `balance` after every confirmed payment.
    pub fn with_balance_sync(mut self, balance: BalanceSynchronizer) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PaymentState {
        self.state.borrow().clone()
    }

    /// Returns the pipeline to `Idle` once the user dismissed the result.
    pub fn reset(&self) {
        if !self.state.borrow().is_in_flight() {
            self.transition(PaymentState::Idle);
        }
    }

    fn transition(&self, next: PaymentState) {
        debug!(state = ?next, "payment state");
        self.state.send_replace(next);
    }

    /// Network fee headroom required on top of the amount, in asset units.
    pub fn estimated_fee(&self) -> Decimal {
        Decimal::from(self.config.estimated_base_fee_stroops) * Decimal::TWO
            / Decimal::from(STROOPS_PER_UNIT)
    }

    /// Checks a payment request without touching any gateway.
    ///
    /// Rules apply in order and the first failure wins, so a self-send is
    /// reported as such whatever the amount says.
    pub fn validate<'s>(
        &self,
        session: Option<&'s Session>,
        balance: Option<Balance>,
        destination: &str,
        amount: &str,
    ) -> Result<(&'s Session, Amount)> {
        let session = session.ok_or(PaymentError::WalletRequired)?;
        if !session.is_test_realm() {
            return Err(PaymentError::WrongNetwork);
        }
        if !is_valid_address(destination) {
            return Err(PaymentError::InvalidAddress);
        }
        if destination == session.address {
            return Err(PaymentError::SelfSend);
        }
        let amount = Amount::parse(amount).ok_or(PaymentError::InvalidAmount)?;
        let available = balance.ok_or(PaymentError::BalanceUnavailable)?.value();

        let required = amount.value() + self.estimated_fee();
        if required > available {
            return Err(PaymentError::InsufficientBalance {
                required,
                available,
            });
        }

        let reserve = self.config.min_account_reserve;
        let remaining = available - amount.value();
        if remaining < reserve && amount.value() < available {
            return Err(PaymentError::BelowMinimumReserve { reserve });
        }

        Ok((session, amount))
    }

    /// Runs one payment attempt to completion.
    pub async fn submit(
        &self,
        session: Option<&Session>,
        balance: Option<Balance>,
        destination: &str,
        amount: &str,
    ) -> Result<PaymentOutcome> {
        let result = self.run(session, balance, destination, amount).await;
        if let Err(err) = &result {
            warn!(error = %err, "payment failed");
            self.transition(PaymentState::Failed {
                reason: err.to_string(),
            });
        }
        result
    }

    async fn run(
        &self,
        session: Option<&Session>,
        balance: Option<Balance>,
        destination: &str,
        amount: &str,
    ) -> Result<PaymentOutcome> {
        self.transition(PaymentState::Validating);
        let (session, amount) = self.validate(session, balance, destination, amount)?;
        let source = session.address.as_str();
        info!(
            from = %short_address(source),
            to = %short_address(destination),
            %amount,
            "submitting payment"
        );

        let account = self.ledger.load_account(source).await?;
        let base_fee = self.ledger.fetch_base_fee().await?;
        let envelope = build_payment_envelope(&PaymentDraft {
            source,
            destination,
            amount: &amount,
            account_sequence: account.sequence,
            base_fee,
            valid_for: self.config.validity_window,
            now: Utc::now(),
        })?;
        debug!(sequence = envelope.sequence, fee = envelope.fee, "envelope built");

        self.transition(PaymentState::AwaitingSignature);
        let signed = self
            .wallet
            .sign(&envelope.xdr, &self.config.network_passphrase, source)
            .await
            .map_err(|err| PaymentError::SigningFailed(err.message_or(SIGNING_DECLINED)))?;

        self.transition(PaymentState::Submitting);
        let submitted = self.ledger.submit(&signed).await?;
        let hash = submitted.hash;
        info!(%hash, ledger = ?submitted.ledger, "payment submitted");

        self.transition(PaymentState::AwaitingConfirmation { hash: hash.clone() });
        // an acknowledgement that already names the ledger is final
        let settlement = match submitted.ledger {
            Some(ledger) => Settlement::Confirmed(ledger),
            None => self.await_settlement(&hash).await?,
        };

        let record = TransactionRecord::new(
            hash.clone(),
            source,
            destination,
            amount.as_str(),
            Utc::now(),
        );
        match settlement {
            Settlement::Confirmed(ledger) => {
                let record = record.with_confirmation(true, Some(ledger));
                self.record_history(source, &record).await;
                info!(%hash, ledger, "payment confirmed");
                self.transition(PaymentState::Confirmed {
                    hash: hash.clone(),
                    ledger,
                });
                if let Some(balance) = &self.balance {
                    balance.refresh(source, session.network.as_deref()).await;
                }
                Ok(PaymentOutcome::Confirmed {
                    hash,
                    ledger,
                    record,
                })
            }
            Settlement::Pending => {
                let record = record.with_confirmation(false, None);
                self.record_history(source, &record).await;
                let explorer_url = self.config.explorer_link(&hash);
                warn!(%hash, %explorer_url, "payment submitted but not yet confirmed");
                self.transition(PaymentState::SubmittedUnconfirmed { hash: hash.clone() });
                Ok(PaymentOutcome::SubmittedUnconfirmed {
                    hash,
                    record,
                    explorer_url,
                })
            }
        }
    }

    /// The payment is on the ledger by now, so a failing store must not
    /// turn it into a failed attempt.
    async fn record_history(&self, owner: &str, record: &TransactionRecord) {
        if let Err(err) = self.history.append(owner, record.clone()).await {
            warn!(hash = %record.hash, error = %err, "payment settled but history was not saved");
        }
    }

    /// Polls until the ledger has a definitive result or the window closes.
    /// Lookup errors count as "not yet".
    async fn await_settlement(&self, hash: &str) -> Result<Settlement> {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        loop {
            match self.ledger.get_transaction(hash).await {
                Ok(TransactionStatus::Succeeded { ledger }) => return Ok(Settlement::Confirmed(ledger)),
                Ok(TransactionStatus::Failed { ledger }) => {
                    warn!(hash, ledger, "transaction failed on-chain");
                    return Err(PaymentError::FailedOnChain {
                        hash: hash.to_string(),
                    });
                }
                Ok(TransactionStatus::NotFound) => {}
                Err(err) => debug!(hash, error = %err, "confirmation lookup failed"),
            }

            let next = Instant::now() + self.config.confirmation_poll_interval;
            if next > deadline {
                return Ok(Settlement::Pending);
            }
            tokio::time::sleep_until(next).await;
        }
    }

    /// Checks whether `address` already exists on the ledger.
    pub async fn check_recipient(&self, address: &str) -> RecipientStatus {
        if !is_valid_address(address) {
            return RecipientStatus::Unknown;
        }
        match self.ledger.load_account(address).await {
            Ok(_) => RecipientStatus::Active,
            Err(LedgerError::AccountNotFound(_)) => RecipientStatus::NotActivated,
            Err(err) => {
                debug!(address, error = %err, "recipient lookup failed");
                RecipientStatus::Unknown
            }
        }
    }
}
