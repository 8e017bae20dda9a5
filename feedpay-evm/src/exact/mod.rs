//! EVM "exact" payment scheme.
//!
//! Payments are ERC-3009 `transferWithAuthorization` messages signed as
//! EIP-712 typed data and carried in the `X-PAYMENT` header as base64 JSON.

pub mod client;

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::sol;
use feedpay::scheme::ExactScheme;
use feedpay::timestamp::UnixTimestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A token amount in base units, serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(pub U256);

impl FromStr for TokenAmount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str_radix(s.trim(), 10)
            .map(Self)
            .map_err(|e| format!("invalid token amount {s:?}: {e}"))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The signed authorization fields, as sent to the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    /// The payer.
    pub from: Address,
    /// The recipient.
    pub to: Address,
    /// Amount in the token's base units.
    pub value: TokenAmount,
    /// Not valid before this time (inclusive).
    pub valid_after: UnixTimestamp,
    /// Not valid at or after this time.
    pub valid_before: UnixTimestamp,
    /// Random 32-byte replay guard.
    pub nonce: B256,
}

/// Signature plus the authorization it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactEvmPayload {
    /// 0x-prefixed 65-byte signature.
    pub signature: String,
    /// The authorization that was signed.
    pub authorization: ExactEvmPayloadAuthorization,
}

/// JSON document that is base64-encoded into the `X-PAYMENT` header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version echoed from the 402 response.
    pub x402_version: u64,
    /// Always `"exact"`.
    pub scheme: ExactScheme,
    /// Network string copied from the selected requirement.
    pub network: String,
    /// The signed authorization.
    pub payload: ExactEvmPayload,
}

/// EIP-712 domain hints a requirement may carry in `extra`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequirementsExtra {
    /// Token name used in the EIP-712 domain.
    pub name: String,
    /// Token version used in the EIP-712 domain.
    pub version: String,
}

sol!(
    /// ERC-3009 `TransferWithAuthorization` typed data.
    ///
    /// Field values must equal the [`ExactEvmPayloadAuthorization`] sent
    /// alongside the signature; the server rebuilds this struct from them.
    #[derive(Serialize, Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_amount_is_a_decimal_string() {
        let amount: TokenAmount = "1000000".parse().unwrap();
        assert_eq!(serde_json::to_value(amount).unwrap(), "1000000");
        assert!("0x10".parse::<TokenAmount>().is_err());
        assert!("-5".parse::<TokenAmount>().is_err());
    }
}
