use crate::domain::network::TESTNET_PASSPHRASE;
use rust_decimal::Decimal;
use std::time::Duration;

pub const DEFAULT_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://stellar.expert/explorer/testnet/tx";
pub const DEFAULT_FRIENDBOT_URL: &str = "https://laboratory.stellar.org/#account-creator?network=test";

/// Runtime settings. Defaults target the Stellar test network; each field
/// can be overridden through a `SPLITRENT_*` environment variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub horizon_url: String,
    pub network_passphrase: String,
    pub explorer_tx_url: String,
    pub friendbot_url: String,
    pub balance_refresh_interval: Duration,
    pub confirmation_poll_interval: Duration,
    pub confirmation_timeout: Duration,
    /// How long a built envelope stays valid on the ledger.
    pub validity_window: Duration,
    /// Per-operation fee assumed when checking a payment against the balance.
    pub estimated_base_fee_stroops: u32,
    /// Minimum native balance the source must keep after a payment.
    pub min_account_reserve: Decimal,
    /// Minimum spacing between two payment submissions.
    pub submit_cooldown: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            horizon_url: DEFAULT_HORIZON_URL.to_string(),
            network_passphrase: TESTNET_PASSPHRASE.to_string(),
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
            friendbot_url: DEFAULT_FRIENDBOT_URL.to_string(),
            balance_refresh_interval: Duration::from_secs(30),
            confirmation_poll_interval: Duration::from_secs(1),
            confirmation_timeout: Duration::from_secs(60),
            validity_window: Duration::from_secs(180),
            estimated_base_fee_stroops: 100,
            min_account_reserve: Decimal::ONE,
            submit_cooldown: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_millis)
}

impl Config {
    /// Defaults overlaid with whatever `SPLITRENT_*` variables are set.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_string("SPLITRENT_HORIZON_URL") {
            cfg.horizon_url = v;
        }
        if let Some(v) = env_string("SPLITRENT_NETWORK_PASSPHRASE") {
            cfg.network_passphrase = v;
        }
        if let Some(v) = env_string("SPLITRENT_EXPLORER_TX_URL") {
            cfg.explorer_tx_url = v;
        }
        if let Some(v) = env_string("SPLITRENT_FRIENDBOT_URL") {
            cfg.friendbot_url = v;
        }
        cfg.balance_refresh_interval = env_millis("SPLITRENT_BALANCE_REFRESH_MS")
            .unwrap_or(cfg.balance_refresh_interval);
        cfg.confirmation_poll_interval = env_millis("SPLITRENT_CONFIRMATION_POLL_MS")
            .unwrap_or(cfg.confirmation_poll_interval);
        cfg.confirmation_timeout = env_millis("SPLITRENT_CONFIRMATION_TIMEOUT_MS")
            .unwrap_or(cfg.confirmation_timeout);
        cfg.request_timeout =
            env_millis("SPLITRENT_REQUEST_TIMEOUT_MS").unwrap_or(cfg.request_timeout);
        cfg.estimated_base_fee_stroops = env_parse("SPLITRENT_ESTIMATED_BASE_FEE")
            .unwrap_or(cfg.estimated_base_fee_stroops);
        cfg
    }

    /// Explorer page for a transaction hash.
    pub fn explorer_link(&self, hash: &str) -> String {
        format!("{}/{}", self.explorer_tx_url.trim_end_matches('/'), hash)
    }
}
