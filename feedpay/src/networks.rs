//! Networks the feedpay service settles payments on.
//!
//! The client runs against exactly one network, chosen by an explicit
//! "is this a test network" flag rather than by asking the wallet.
//! Payment requirements advertise their network either by V1 name
//! (`"base-sepolia"`) or by CAIP-2 identifier (`"eip155:84532"`); both
//! spellings are recognized by [`Network::matches`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Base Mainnet chain ID.
pub const BASE_MAINNET: u64 = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: u64 = 84532;

/// The network a client is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// Base Mainnet.
    #[default]
    Base,
    /// Base Sepolia testnet.
    BaseSepolia,
}

impl Network {
    /// All known networks.
    pub const ALL: [Self; 2] = [Self::Base, Self::BaseSepolia];

    /// Picks the network from the testnet flag.
    #[must_use]
    pub const fn from_testnet(testnet: bool) -> Self {
        if testnet { Self::BaseSepolia } else { Self::Base }
    }

    /// Returns `true` for test networks.
    #[must_use]
    pub const fn is_testnet(self) -> bool {
        matches!(self, Self::BaseSepolia)
    }

    /// V1 human-readable network name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseSepolia => "base-sepolia",
        }
    }

    /// Numeric EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Base => BASE_MAINNET,
            Self::BaseSepolia => BASE_SEPOLIA,
        }
    }

    /// CAIP-2 identifier, e.g. `eip155:8453`.
    #[must_use]
    pub fn caip2(self) -> String {
        format!("eip155:{}", self.chain_id())
    }

    /// Looks up a network by numeric chain id.
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }

    /// Returns `true` if `network` (V1 name or CAIP-2 id) denotes this network.
    #[must_use]
    pub fn matches(self, network: &str) -> bool {
        network
            .parse::<Self>()
            .is_ok_and(|parsed| parsed == self)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(reference) = s.strip_prefix("eip155:") {
            return reference
                .parse::<u64>()
                .ok()
                .and_then(Self::from_chain_id)
                .ok_or_else(|| format!("unknown chain '{s}'"));
        }
        Self::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| format!("unknown network '{s}'"))
    }
}
