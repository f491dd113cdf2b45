use crate::domain::transaction::TransactionRecord;
use crate::error::HistoryFileError;
use std::io::Write;

const HEADERS: [&str; 7] = ["Date", "Type", "From", "To", "Amount (XLM)", "Hash", "Status"];

/// Writes payment history as a spreadsheet-friendly CSV.
///
/// Every cell is quoted. `Type` is relative to the exporting wallet.
pub struct HistoryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> HistoryWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_history(
        &mut self,
        records: &[TransactionRecord],
        wallet: &str,
    ) -> Result<(), HistoryFileError> {
        self.writer.write_record(HEADERS)?;
        for record in records {
            let direction = if record.from == wallet { "Sent" } else { "Received" };
            let status = match record.confirmed {
                Some(true) => "Confirmed",
                Some(false) => "Pending",
                None => "Unknown",
            };
            let date = record.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
            self.writer.write_record([
                date.as_str(),
                direction,
                record.from.as_str(),
                record.to.as_str(),
                record.amount.as_str(),
                record.hash.as_str(),
                status,
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
