use super::network::{Realm, classify_network};
use serde::{Deserialize, Serialize};

/// The account and network exposed by the connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub address: String,
    pub network: Option<String>,
}

impl Session {
    pub fn new(address: impl Into<String>, network: Option<String>) -> Self {
        Self {
            address: address.into(),
            network,
        }
    }

    pub fn realm(&self) -> Realm {
        classify_network(self.network.as_deref())
    }

    pub fn is_test_realm(&self) -> bool {
        self.realm() == Realm::Test
    }
}
