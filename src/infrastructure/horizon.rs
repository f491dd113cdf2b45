//! [`LedgerGateway`] over the Horizon REST API.
//!
//! Horizon payloads are decoded into private wire structs and converted to
//! domain types here; rejected submissions are classified into
//! [`LedgerRejection`] before they leave this module.

use crate::config::Config;
use crate::domain::envelope::SignedEnvelope;
use crate::domain::ledger::{
    AccountSnapshot, AssetBalance, LedgerRejection, SubmittedTransaction, TransactionStatus,
};
use crate::domain::ports::LedgerGateway;
use crate::error::LedgerError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct FeeStatsResponse {
    last_ledger_base_fee: String,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    hash: String,
    #[serde(default)]
    ledger: Option<u32>,
    #[serde(default)]
    successful: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

/// Talks to one Horizon instance.
#[derive(Debug, Clone)]
pub struct HorizonGateway {
    client: Client,
    base_url: String,
}

impl HorizonGateway {
    pub fn new(config: &Config) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, &config.horizon_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response, LedgerError> {
        let url = self.url(path);
        debug!(%url, "horizon request");
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    response
        .json::<T>()
        .await
        .map_err(|e| LedgerError::Decode(e.to_string()))
}

fn unexpected(status: StatusCode) -> LedgerError {
    LedgerError::Transport(format!("unexpected status {status}"))
}

#[async_trait]
impl LedgerGateway for HorizonGateway {
    async fn load_account(&self, address: &str) -> Result<AccountSnapshot, LedgerError> {
        let response = self.get(&format!("accounts/{address}")).await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(LedgerError::AccountNotFound(address.to_string())),
            status if !status.is_success() => return Err(unexpected(status)),
            _ => {}
        }
        let account: AccountResponse = decode(response).await?;
        let sequence = account
            .sequence
            .parse::<i64>()
            .map_err(|e| LedgerError::Decode(format!("invalid sequence {}: {e}", account.sequence)))?;
        Ok(AccountSnapshot {
            account_id: account.account_id,
            sequence,
            balances: account.balances,
        })
    }

    async fn fetch_base_fee(&self) -> Result<u32, LedgerError> {
        let response = self.get("fee_stats").await?;
        if !response.status().is_success() {
            return Err(unexpected(response.status()));
        }
        let stats: FeeStatsResponse = decode(response).await?;
        stats
            .last_ledger_base_fee
            .parse()
            .map_err(|e| LedgerError::Decode(format!("invalid base fee: {e}")))
    }

    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmittedTransaction, LedgerError> {
        let response = self
            .client
            .post(self.url("transactions"))
            .form(&[("tx", envelope.as_str())])
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let accepted: TransactionResponse = decode(response).await?;
            return Ok(SubmittedTransaction {
                hash: accepted.hash,
                ledger: accepted.ledger,
            });
        }

        // a 400 carries result codes; anything else is a transport problem
        if status != StatusCode::BAD_REQUEST {
            return Err(unexpected(status));
        }
        let problem: ProblemResponse = response.json().await.unwrap_or_default();
        let codes = problem
            .extras
            .and_then(|extras| extras.result_codes)
            .unwrap_or_default();
        let rejection =
            LedgerRejection::classify(codes.transaction.as_deref(), &codes.operations);
        warn!(
            title = problem.title.as_deref().unwrap_or_default(),
            transaction = codes.transaction.as_deref().unwrap_or_default(),
            operations = ?codes.operations,
            ?rejection,
            "submission rejected"
        );
        Err(LedgerError::Rejected(rejection))
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionStatus, LedgerError> {
        let response = self.get(&format!("transactions/{hash}")).await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(TransactionStatus::NotFound),
            status if !status.is_success() => return Err(unexpected(status)),
            _ => {}
        }
        let tx: TransactionResponse = decode(response).await?;
        let ledger = tx.ledger.unwrap_or_default();
        Ok(match tx.successful {
            Some(true) => TransactionStatus::Succeeded { ledger },
            Some(false) => TransactionStatus::Failed { ledger },
            None => TransactionStatus::NotFound,
        })
    }
}
