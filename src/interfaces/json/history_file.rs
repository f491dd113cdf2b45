use crate::domain::address::short_address;
use crate::domain::transaction::TransactionRecord;
use crate::error::HistoryFileError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};
use tracing::debug;

/// Format version written to, and required from, export files.
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub total_transactions: usize,
    pub date_range: DateRange,
    /// Sum of amounts sent by the wallet, with 7 decimals.
    pub total_sent: String,
    pub total_received: String,
}

/// A backup of one wallet's payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub wallet_address: String,
    pub transactions: Vec<TransactionRecord>,
    pub metadata: ExportMetadata,
}

/// Records recovered from an export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedHistory {
    pub exported_at: Option<DateTime<Utc>>,
    pub transactions: Vec<TransactionRecord>,
    /// Entries dropped because they did not have the record shape.
    pub skipped: usize,
}

fn total(records: &[TransactionRecord], pick: impl Fn(&TransactionRecord) -> bool) -> String {
    let mut sum: Decimal = records
        .iter()
        .filter(|r| pick(r))
        .filter_map(|r| r.amount.parse::<Decimal>().ok())
        .sum();
    sum.rescale(7);
    sum.to_string()
}

impl ExportMetadata {
    pub fn summarize(records: &[TransactionRecord], wallet: &str, now: DateTime<Utc>) -> Self {
        let earliest = records.iter().map(|r| r.created_at).min().unwrap_or(now);
        let latest = records.iter().map(|r| r.created_at).max().unwrap_or(now);
        Self {
            total_transactions: records.len(),
            date_range: DateRange { earliest, latest },
            total_sent: total(records, |r| r.from == wallet),
            total_received: total(records, |r| r.to == wallet),
        }
    }
}

impl HistoryExport {
    pub fn new(wallet: &str, records: Vec<TransactionRecord>, now: DateTime<Utc>) -> Self {
        let metadata = ExportMetadata::summarize(&records, wallet, now);
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: now,
            wallet_address: wallet.to_string(),
            transactions: records,
            metadata,
        }
    }

    /// Suggested download name, e.g. `splitrent-transactions-GABC...WXYZ-2026-03-01.json`.
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "splitrent-transactions-{}-{}.{}",
            short_address(&self.wallet_address),
            self.exported_at.format("%Y-%m-%d"),
            extension
        )
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), HistoryFileError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Reads an export file for `wallet`.
///
/// The whole file is rejected when its version or owner does not match.
/// Individual entries that are not valid records are skipped.
pub fn import_history<R: Read>(reader: R, wallet: &str) -> Result<ImportedHistory, HistoryFileError> {
    let data: Value = serde_json::from_reader(reader)?;

    let version = data.get("version").and_then(Value::as_str).unwrap_or_default();
    if version != EXPORT_VERSION {
        return Err(HistoryFileError::VersionMismatch {
            expected: EXPORT_VERSION.to_string(),
            found: version.to_string(),
        });
    }
    if data.get("walletAddress").and_then(Value::as_str) != Some(wallet) {
        return Err(HistoryFileError::WalletMismatch);
    }
    let entries = data
        .get("transactions")
        .and_then(Value::as_array)
        .ok_or(HistoryFileError::InvalidTransactions)?;

    let transactions: Vec<TransactionRecord> = entries
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect();
    let skipped = entries.len() - transactions.len();
    if skipped > 0 {
        debug!(skipped, "skipped malformed history entries");
    }

    let exported_at = data
        .get("exportedAt")
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    Ok(ImportedHistory {
        exported_at,
        transactions,
        skipped,
    })
}
