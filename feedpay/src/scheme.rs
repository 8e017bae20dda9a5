//! Payment scheme seam.
//!
//! Turning a selected [`PaymentRequirement`] into signed bytes belongs to a
//! payment-protocol implementation, not to the request pipeline. The pipeline
//! only knows the [`PaymentScheme`] trait; `feedpay-evm` provides the EVM
//! "exact" implementation.

use crate::error::PaymentError;
use crate::networks::Network;
use crate::proto::{PaymentAuthorization, PaymentRequirement};
use crate::wallet::Wallet;

/// A unit struct representing the string literal `"exact"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExactScheme;

impl ExactScheme {
    /// The string literal value: `"exact"`.
    pub const VALUE: &'static str = "exact";
}

impl std::fmt::Display for ExactScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::VALUE)
    }
}

impl AsRef<str> for ExactScheme {
    fn as_ref(&self) -> &str {
        Self::VALUE
    }
}

impl serde::Serialize for ExactScheme {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::VALUE)
    }
}

/// Builds payment authorizations for one scheme.
#[async_trait::async_trait]
pub trait PaymentScheme: Send + Sync {
    /// Scheme name matched against [`PaymentRequirement::scheme`].
    fn scheme(&self) -> &str;

    /// Signs `requirement` with `wallet`, producing the retry header value.
    ///
    /// The wallet may suspend while its owner approves the signature.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidRequirement`] if the requirement cannot be
    /// used, or [`PaymentError::Wallet`] if signing fails.
    async fn create_payment(
        &self,
        wallet: &dyn Wallet,
        requirement: &PaymentRequirement,
        network: Network,
        x402_version: u64,
    ) -> Result<PaymentAuthorization, PaymentError>;
}
