use crate::domain::ledger::LedgerRejection;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T, E = PaymentError> = std::result::Result<T, E>;

/// Failure reported by the wallet extension.
///
/// The provider may or may not attach a code and a message; callers pick a
/// fallback text that fits the request that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("{}", message_or_fallback(.message, "Wallet request failed."))]
pub struct WalletError {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl WalletError {
    pub fn new(code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// Returns the provider message, or `fallback` when it is absent or blank.
    pub fn message_or(&self, fallback: &str) -> String {
        message_or_fallback(&self.message, fallback)
    }
}

fn message_or_fallback(message: &Option<String>, fallback: &str) -> String {
    match message.as_deref().map(str::trim) {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => fallback.to_string(),
    }
}

/// Errors raised at the ledger gateway boundary.
///
/// Provider payloads are classified into these variants as soon as they are
/// received, so nothing past the gateway inspects raw response fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account {0} was not found on the ledger.")]
    AccountNotFound(String),
    #[error("{}", .0.user_message())]
    Rejected(LedgerRejection),
    #[error("Ledger request failed: {0}")]
    Transport(String),
    #[error("Unexpected ledger response: {0}")]
    Decode(String),
}

/// Errors raised while reading or writing exported history files.
#[derive(Error, Debug)]
pub enum HistoryFileError {
    #[error("Invalid export file format. Please use a file exported from SplitRent v{expected}.")]
    VersionMismatch { expected: String, found: String },
    #[error("Export file belongs to a different wallet address.")]
    WalletMismatch,
    #[error("Invalid transactions data in export file.")]
    InvalidTransactions,
    #[error("Failed to parse export file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The single failure channel of the payment pipeline and its callers.
///
/// `Display` is the user-facing description; [`PaymentError::title`] is the
/// short heading shown next to it.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Connect your wallet before sending payment.")]
    WalletRequired,
    #[error("Switch your wallet network to testnet.")]
    WrongNetwork,
    #[error("Address must be a valid Stellar public key starting with G.")]
    InvalidAddress,
    #[error("Please use a different recipient address.")]
    SelfSend,
    #[error("Amount must be between 0.0000001 and 10,000 XLM.")]
    InvalidAmount,
    #[error("Unable to fetch balance.")]
    BalanceUnavailable,
    #[error("Insufficient balance. Need {required} XLM (including fees), have {available} XLM.")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },
    #[error("Payment would leave account below minimum reserve ({reserve} XLM).")]
    BelowMinimumReserve { reserve: Decimal },
    #[error("{0}")]
    WalletConnection(String),
    #[error("Unable to restore wallet session.")]
    SessionRestore(#[source] WalletError),
    #[error("{0}")]
    SigningFailed(String),
    #[error("{}", .0.user_message())]
    Rejected(LedgerRejection),
    #[error("Transaction {hash} was submitted but failed on-chain.")]
    FailedOnChain { hash: String },
    #[error("Transaction failed on network. {0}")]
    Ledger(LedgerError),
    #[error("Unable to build transaction: {0}")]
    Envelope(String),
    #[error("A payment is already in progress.")]
    PaymentInFlight,
    #[error("Please wait a moment before sending another payment.")]
    RateLimited,
    #[error(transparent)]
    HistoryFile(#[from] HistoryFileError),
    #[error("History storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Short heading for the failure, suitable for a toast title.
    pub fn title(&self) -> &'static str {
        match self {
            PaymentError::WalletRequired => "Wallet required",
            PaymentError::WrongNetwork => "Testnet required",
            PaymentError::InvalidAddress => "Invalid recipient address",
            PaymentError::SelfSend => "Cannot send to yourself",
            PaymentError::InvalidAmount => "Invalid amount",
            PaymentError::BalanceUnavailable
            | PaymentError::InsufficientBalance { .. }
            | PaymentError::BelowMinimumReserve { .. } => "Insufficient balance",
            PaymentError::WalletConnection(_) => "Wallet connection failed",
            PaymentError::SessionRestore(_) => "Wallet session unavailable",
            PaymentError::SigningFailed(_) => "Signing declined",
            PaymentError::Rejected(_)
            | PaymentError::FailedOnChain { .. }
            | PaymentError::Ledger(_)
            | PaymentError::Envelope(_) => "Transaction failed",
            PaymentError::PaymentInFlight | PaymentError::RateLimited => "Please wait",
            PaymentError::HistoryFile(_) | PaymentError::Storage(_) => "History unavailable",
        }
    }

    /// True for failures detected before any network call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidAddress
                | PaymentError::SelfSend
                | PaymentError::InvalidAmount
                | PaymentError::BalanceUnavailable
                | PaymentError::InsufficientBalance { .. }
                | PaymentError::BelowMinimumReserve { .. }
        )
    }
}

impl From<LedgerError> for PaymentError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(rejection) => PaymentError::Rejected(rejection),
            other => PaymentError::Ledger(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_error_falls_back_on_blank_message() {
        let err = WalletError::new(Some(-1), "   ");
        assert_eq!(err.message_or("Wallet declined."), "Wallet declined.");

        let err = WalletError::default();
        assert_eq!(err.to_string(), "Wallet request failed.");

        let err = WalletError::new(None, "User rejected the request");
        assert_eq!(err.message_or("fallback"), "User rejected the request");
    }

    #[test]
    fn test_rejections_are_lifted_out_of_ledger_errors() {
        let err: PaymentError = LedgerError::Rejected(LedgerRejection::BadSequence).into();
        assert!(matches!(err, PaymentError::Rejected(LedgerRejection::BadSequence)));

        let err: PaymentError = LedgerError::Transport("timeout".to_string()).into();
        assert!(matches!(err, PaymentError::Ledger(LedgerError::Transport(_))));
    }

    #[test]
    fn test_titles_group_input_failures() {
        assert_eq!(PaymentError::SelfSend.title(), "Cannot send to yourself");
        assert_eq!(PaymentError::BalanceUnavailable.title(), "Insufficient balance");
        assert!(PaymentError::InvalidAmount.is_input_error());
        assert!(!PaymentError::WalletRequired.is_input_error());
    }
}
