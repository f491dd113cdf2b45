use super::amount::Balance;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Asset type Horizon reports for the native asset.
pub const NATIVE_ASSET_TYPE: &str = "native";

/// On-ledger state of an account, as needed to build and fund a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub sequence: i64,
    pub balances: Vec<AssetBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset_type: String,
    pub balance: Decimal,
}

impl AccountSnapshot {
    /// The native-asset balance; zero when the account holds no native entry.
    pub fn native_balance(&self) -> Balance {
        self.balances
            .iter()
            .find(|b| b.asset_type == NATIVE_ASSET_TYPE)
            .map(|b| Balance::new(b.balance))
            .unwrap_or(Balance::ZERO)
    }
}

/// Acknowledgement returned by the ledger for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: String,
    pub ledger: Option<u32>,
}

/// What the ledger currently knows about a transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    NotFound,
    Succeeded { ledger: u32 },
    Failed { ledger: u32 },
}

/// Closed classification of submission result codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerRejection {
    /// Source account cannot cover the payment (or its fee).
    Underfunded,
    /// Destination account has not been created yet.
    NoDestination,
    /// Payment would leave the destination under its reserve.
    LowReserve,
    BadSequence,
    InsufficientFee,
    /// Time bounds elapsed before the transaction reached a ledger.
    Expired,
    Unrecognized {
        transaction: Option<String>,
        operations: Vec<String>,
    },
}

impl LedgerRejection {
    /// Classifies the `result_codes` block of a rejected submission.
    ///
    /// The first operation code takes precedence over the transaction code,
    /// since `tx_failed` only says that some operation failed.
    pub fn classify(transaction: Option<&str>, operations: &[String]) -> Self {
        let op = operations.first().map(String::as_str).unwrap_or_default();
        let tx = transaction.unwrap_or_default();

        if op.contains("op_underfunded") || tx.contains("tx_insufficient_balance") {
            return LedgerRejection::Underfunded;
        }
        if op.contains("op_no_destination") {
            return LedgerRejection::NoDestination;
        }
        if op.contains("op_low_reserve") {
            return LedgerRejection::LowReserve;
        }
        if tx.contains("tx_bad_seq") {
            return LedgerRejection::BadSequence;
        }
        if tx.contains("tx_insufficient_fee") {
            return LedgerRejection::InsufficientFee;
        }
        if tx.contains("tx_too_late") {
            return LedgerRejection::Expired;
        }
        LedgerRejection::Unrecognized {
            transaction: transaction.map(str::to_string),
            operations: operations.to_vec(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            LedgerRejection::Underfunded => "Insufficient XLM balance for this payment.",
            LedgerRejection::NoDestination => {
                "Recipient account does not exist on testnet. They need to receive at least 1 XLM to activate."
            }
            LedgerRejection::LowReserve => {
                "Payment amount too small. Recipient needs minimum 1 XLM to maintain account."
            }
            LedgerRejection::BadSequence => "Sequence mismatch. Please wait a moment and try again.",
            LedgerRejection::InsufficientFee => "Transaction fee too low. Please try again.",
            LedgerRejection::Expired => "Transaction expired. Please try again.",
            LedgerRejection::Unrecognized { .. } => "Transaction failed on network.",
        }
    }
}
