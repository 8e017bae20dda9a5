//! USDC deployments on the supported networks.

use alloy_primitives::{Address, address};
use feedpay::Network;

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// EIP-712 domain version of USDC on every supported network.
pub const USDC_EIP712_VERSION: &str = "2";

/// USDC deployment on `network`.
#[must_use]
pub const fn usdc_address(network: Network) -> Address {
    match network {
        Network::Base => USDC_BASE,
        Network::BaseSepolia => USDC_BASE_SEPOLIA,
    }
}

/// EIP-712 domain name of USDC on `network`.
///
/// Used when a payment requirement carries no `extra` domain data.
#[must_use]
pub const fn usdc_eip712_name(network: Network) -> &'static str {
    match network {
        Network::Base => "USD Coin",
        Network::BaseSepolia => "USDC",
    }
}
