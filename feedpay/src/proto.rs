//! x402 wire types consumed and produced by the client.
//!
//! A paid endpoint answers `402 Payment Required` with a [`PaymentRequired`]
//! body listing one or more acceptable [`PaymentRequirement`]s. The client
//! picks exactly one, has it signed, and retries with a single
//! [`PaymentAuthorization`] header.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PaymentError;
use crate::networks::Network;

/// Header carrying the payment authorization on the paid retry (`X-PAYMENT`).
///
/// Lowercase, as HTTP/2 sends header names.
pub const X_PAYMENT_HEADER: &str = "x-payment";

/// Protocol version assumed when the 402 body does not state a usable one.
pub const DEFAULT_X402_VERSION: u64 = 1;

/// One server-advertised way to pay for a resource.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia") or CAIP-2 id.
    pub network: String,
    /// Maximum amount in the asset's base units, as a decimal string.
    pub max_amount_required: String,
    /// The resource URL being paid for.
    #[serde(default)]
    pub resource: String,
    /// Human-readable description of the resource.
    #[serde(default)]
    pub description: String,
    /// MIME type of the resource.
    #[serde(default)]
    pub mime_type: String,
    /// Optional JSON schema for the resource output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Recipient address.
    pub pay_to: String,
    /// Validity window of the authorization, in seconds.
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    /// Token contract address.
    pub asset: String,
    /// Scheme-specific extra data (EIP-712 token domain for "exact").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

const fn default_max_timeout_seconds() -> u64 {
    300
}

/// Parsed body of a `402 Payment Required` response.
///
/// `accepts` is kept as sent. Only the requirement chosen by [`Self::select`]
/// is decoded, so an element this client cannot read never shifts the choice
/// onto a later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequired {
    /// Protocol version, [`DEFAULT_X402_VERSION`] if absent or unparseable.
    pub x402_version: u64,
    /// Acceptable requirements in server order, undecoded.
    pub accepts: Vec<Value>,
    /// Optional server error message.
    pub error: Option<String>,
}

impl PaymentRequired {
    /// Parses a 402 response body.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::MalformedPaymentResponse`] if the body is not JSON
    /// or has no `accepts` array.
    pub fn from_slice(body: &[u8]) -> Result<Self, PaymentError> {
        let mut value: Value = serde_json::from_slice(body).map_err(|e| {
            PaymentError::MalformedPaymentResponse(format!("body is not JSON: {e}"))
        })?;
        let accepts = match value.get_mut("accepts") {
            Some(Value::Array(accepts)) => std::mem::take(accepts),
            Some(_) => {
                return Err(PaymentError::MalformedPaymentResponse(
                    "`accepts` is not an array".to_owned(),
                ));
            }
            None => {
                return Err(PaymentError::MalformedPaymentResponse(
                    "missing `accepts` field".to_owned(),
                ));
            }
        };
        Ok(Self {
            x402_version: parse_version(value.get("x402Version")),
            accepts,
            error: value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }

    /// Decodes the first requirement, in server order, whose `scheme` and
    /// `network` match.
    ///
    /// Elements are matched on those two fields alone. Anything else wrong
    /// with the first match fails the call; later elements are never tried.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::NoMatchingPaymentRequirement`] if nothing matches
    /// - [`PaymentError::InvalidRequirement`] if the first match does not decode
    pub fn select(
        &self,
        network: Network,
        scheme: &str,
    ) -> Result<PaymentRequirement, PaymentError> {
        let (index, candidate) = self
            .accepts
            .iter()
            .enumerate()
            .find(|(_, v)| {
                v.get("scheme").and_then(Value::as_str) == Some(scheme)
                    && v
                        .get("network")
                        .and_then(Value::as_str)
                        .is_some_and(|n| network.matches(n))
            })
            .ok_or_else(|| PaymentError::NoMatchingPaymentRequirement {
                network: network.name().to_owned(),
                scheme: scheme.to_owned(),
            })?;

        #[cfg(feature = "telemetry")]
        tracing::trace!(index, "matched payment requirement");

        PaymentRequirement::deserialize(candidate).map_err(|e| {
            PaymentError::InvalidRequirement(format!("accepts[{index}]: {e}"))
        })
    }
}

/// Reads `x402Version` as a positive integer or numeric string.
fn parse_version(value: Option<&Value>) -> u64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_X402_VERSION)
}

/// Signed payment artifact attached to the paid retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAuthorization {
    x402_version: u64,
    value: String,
}

impl PaymentAuthorization {
    /// Wraps an encoded header value built for protocol `x402_version`.
    #[must_use]
    pub const fn new(x402_version: u64, value: String) -> Self {
        Self {
            x402_version,
            value,
        }
    }

    /// Name of the header that carries this authorization.
    #[must_use]
    pub const fn header_name(&self) -> &'static str {
        X_PAYMENT_HEADER
    }

    /// The opaque header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Protocol version this authorization was built for.
    #[must_use]
    pub const fn x402_version(&self) -> u64 {
        self.x402_version
    }
}
