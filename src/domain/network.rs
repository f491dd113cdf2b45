use serde::{Deserialize, Serialize};
use std::fmt;

/// Passphrase of the Stellar test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
/// Passphrase of the Stellar public network.
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

const TEST_MARKERS: [&str; 2] = ["testnet", "test"];
const PRODUCTION_MARKERS: [&str; 2] = ["mainnet", "public"];

/// The network context a wallet session is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    Test,
    Production,
    Unknown,
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Realm::Test => f.write_str("test"),
            Realm::Production => f.write_str("production"),
            Realm::Unknown => f.write_str("unknown"),
        }
    }
}

/// Classifies a free-form network identifier.
///
/// The two well-known passphrases match exactly. Anything else is matched
/// case-insensitively against realm markers; an identifier carrying markers
/// of both realms is `Unknown`.
pub fn classify_network(network: Option<&str>) -> Realm {
    let Some(network) = network.filter(|n| !n.is_empty()) else {
        return Realm::Unknown;
    };
    if network == TESTNET_PASSPHRASE {
        return Realm::Test;
    }
    if network == MAINNET_PASSPHRASE {
        return Realm::Production;
    }

    let normalized = network.to_lowercase();
    let test = TEST_MARKERS.iter().any(|m| normalized.contains(m));
    let production = PRODUCTION_MARKERS.iter().any(|m| normalized.contains(m));
    match (test, production) {
        (true, false) => Realm::Test,
        (false, true) => Realm::Production,
        _ => Realm::Unknown,
    }
}

pub fn is_test_network(network: Option<&str>) -> bool {
    classify_network(network) == Realm::Test
}

pub fn is_production_network(network: Option<&str>) -> bool {
    classify_network(network) == Realm::Production
}
