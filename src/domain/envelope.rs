//! Construction of unsigned payment envelopes.
//!
//! The envelope is serialised as base64 XDR, the form the wallet signs and
//! Horizon accepts. Signing itself never happens here.

use super::amount::Amount;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use stellar_strkey::ed25519::PublicKey;
use stellar_xdr::curr::{
    Asset, Limits, Memo, MuxedAccount, Operation, OperationBody, PaymentOp, Preconditions, ReadXdr,
    SequenceNumber, TimeBounds, TimePoint, Transaction, TransactionEnvelope, TransactionExt,
    TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

/// Everything needed to build a single-payment envelope.
#[derive(Debug, Clone)]
pub struct PaymentDraft<'a> {
    pub source: &'a str,
    pub destination: &'a str,
    pub amount: &'a Amount,
    /// Current on-ledger sequence of the source account.
    pub account_sequence: i64,
    /// Fee per operation, in stroops.
    pub base_fee: u32,
    pub valid_for: Duration,
    pub now: DateTime<Utc>,
}

/// An envelope awaiting the wallet's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEnvelope {
    pub xdr: String,
    pub source: String,
    pub destination: String,
    pub amount: Amount,
    pub fee: u32,
    pub sequence: i64,
    /// Unix time after which the ledger refuses the transaction.
    pub max_time: u64,
}

/// A wallet-signed envelope, opaque to everything but the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope(pub String);

impl SignedEnvelope {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn account_id(address: &str) -> Result<MuxedAccount> {
    let key = PublicKey::from_string(address)
        .map_err(|e| PaymentError::Envelope(format!("invalid account {address}: {e}")))?;
    Ok(MuxedAccount::Ed25519(Uint256(key.0)))
}

/// Builds an envelope holding exactly one native payment operation.
pub fn build_payment_envelope(draft: &PaymentDraft<'_>) -> Result<UnsignedEnvelope> {
    let sequence = draft
        .account_sequence
        .checked_add(1)
        .ok_or_else(|| PaymentError::Envelope("account sequence overflow".to_string()))?;
    let max_time = u64::try_from(draft.now.timestamp())
        .map_err(|_| PaymentError::Envelope("clock is before the unix epoch".to_string()))?
        + draft.valid_for.as_secs();

    let payment = Operation {
        source_account: None,
        body: OperationBody::Payment(PaymentOp {
            destination: account_id(draft.destination)?,
            asset: Asset::Native,
            amount: draft.amount.to_stroops(),
        }),
    };
    let operations: VecM<Operation, 100> = vec![payment]
        .try_into()
        .map_err(|e| PaymentError::Envelope(format!("{e}")))?;

    let tx = Transaction {
        source_account: account_id(draft.source)?,
        fee: draft.base_fee,
        seq_num: SequenceNumber(sequence),
        cond: Preconditions::Time(TimeBounds {
            min_time: TimePoint(0),
            max_time: TimePoint(max_time),
        }),
        memo: Memo::None,
        operations,
        ext: TransactionExt::V0,
    };
    let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    });
    let xdr = envelope
        .to_xdr_base64(Limits::none())
        .map_err(|e| PaymentError::Envelope(format!("XDR encoding error: {e}")))?;

    Ok(UnsignedEnvelope {
        xdr,
        source: draft.source.to_string(),
        destination: draft.destination.to_string(),
        amount: draft.amount.clone(),
        fee: draft.base_fee,
        sequence,
        max_time,
    })
}

/// A payment operation read back out of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSummary {
    pub destination: String,
    pub native: bool,
    pub stroops: i64,
}

/// Decoded view of an envelope, for inspection and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSummary {
    pub source: String,
    pub fee: u32,
    pub sequence: i64,
    pub max_time: Option<u64>,
    pub operation_count: usize,
    pub payments: Vec<PaymentSummary>,
    pub signature_count: usize,
}

fn muxed_to_address(account: &MuxedAccount) -> String {
    match account {
        MuxedAccount::Ed25519(Uint256(bytes)) => PublicKey(*bytes).to_string(),
        MuxedAccount::MuxedEd25519(muxed) => PublicKey(muxed.ed25519.0).to_string(),
    }
}

/// Decodes a base64 XDR envelope produced by [`build_payment_envelope`].
pub fn inspect_envelope(xdr: &str) -> Result<EnvelopeSummary> {
    let envelope = TransactionEnvelope::from_xdr_base64(xdr, Limits::none())
        .map_err(|e| PaymentError::Envelope(format!("invalid XDR: {e}")))?;
    let TransactionEnvelope::Tx(TransactionV1Envelope { tx, signatures }) = envelope else {
        return Err(PaymentError::Envelope(
            "unsupported envelope type".to_string(),
        ));
    };

    let max_time = match &tx.cond {
        Preconditions::Time(bounds) => Some(bounds.max_time.0),
        Preconditions::V2(conditions) => conditions.time_bounds.as_ref().map(|b| b.max_time.0),
        Preconditions::None => None,
    };
    let payments = tx
        .operations
        .iter()
        .filter_map(|op| match &op.body {
            OperationBody::Payment(payment) => Some(PaymentSummary {
                destination: muxed_to_address(&payment.destination),
                native: matches!(payment.asset, Asset::Native),
                stroops: payment.amount,
            }),
            _ => None,
        })
        .collect();

    Ok(EnvelopeSummary {
        source: muxed_to_address(&tx.source_account),
        fee: tx.fee,
        sequence: tx.seq_num.0,
        max_time,
        operation_count: tx.operations.len(),
        payments,
        signature_count: signatures.len(),
    })
}
