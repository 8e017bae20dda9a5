//! Error taxonomy for the feedpay client.
//!
//! Errors are grouped by the stage at which they occur:
//!
//! - [`ConfigError`] - conflicting or malformed construction options; never reaches the network
//! - [`ValidationError`] - malformed call arguments, caught before dispatch
//! - [`AuthError`] - wallet configuration and challenge-response failures
//! - [`WalletError`] - failures reported by a wallet while signing
//! - [`PaymentError`] - failures while negotiating an x402 payment

/// Conflicting or malformed client construction options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No API base URL was provided.
    #[error("no base URL configured")]
    MissingBaseUrl,

    /// The API base URL could not be parsed.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Both a private key and a wallet instance were supplied.
    #[error("a private key and a wallet were both configured; pick one")]
    ConflictingWalletOptions,

    /// The wallet is bound to a different chain than the configured network.
    #[error("wallet chain id {actual} does not match configured network chain id {expected}")]
    ChainMismatch {
        /// Chain id of the configured network.
        expected: u64,
        /// Chain id reported by the wallet.
        actual: u64,
    },

    /// A configuration value could not be interpreted.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Configuration key or environment variable.
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Malformed call arguments, rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Field name.
        field: &'static str,
    },

    /// A field exceeds its maximum length.
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual length.
        actual: usize,
    },

    /// A numeric argument is outside its allowed range.
    #[error("{field} must be between {min} and {max} (got {actual})")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
        /// Actual value.
        actual: u64,
    },

    /// A value is not a well-formed EVM address.
    #[error("{field} is not a valid address: {value}")]
    InvalidAddress {
        /// Field name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An identifier cannot stand as a single URL path segment.
    #[error("{field} is not a usable identifier: {value:?}")]
    InvalidId {
        /// Field name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Failures reported by a wallet while producing a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The wallet owner declined the signature request.
    #[error("signature request rejected by user")]
    UserRejected,

    /// The signer failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The external wallet could not be reached.
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
}

/// Wallet configuration and challenge-response failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// An authenticated call was attempted without a wallet.
    #[error("no wallet configured; authenticated requests need a wallet")]
    NoWalletConfigured,

    /// A private key could not be parsed.
    #[error("invalid private key format: {0}")]
    InvalidKeyFormat(String),

    /// The nonce endpoint answered with a non-success status.
    #[error("nonce challenge request failed with status {status}: {body}")]
    ChallengeRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The nonce endpoint answered with a body that carries no challenge message.
    #[error("malformed nonce challenge: {0}")]
    MalformedChallenge(String),

    /// An auth header value cannot be carried in an HTTP header.
    #[error("value for header {name} is not a valid HTTP header value")]
    InvalidHeaderValue {
        /// Header name.
        name: &'static str,
    },

    /// The wallet refused or failed to sign the challenge.
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Failures while turning a `402 Payment Required` response into a payment authorization.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The 402 body is not JSON or lacks an `accepts` array.
    #[error("malformed payment required response: {0}")]
    MalformedPaymentResponse(String),

    /// None of the advertised requirements matches the active network and scheme.
    #[error("no payment requirement for scheme '{scheme}' on network '{network}'")]
    NoMatchingPaymentRequirement {
        /// The active network name.
        network: String,
        /// The supported scheme.
        scheme: String,
    },

    /// The selected requirement carries values the scheme cannot use.
    #[error("invalid payment requirement: {0}")]
    InvalidRequirement(String),

    /// The wallet refused or failed to sign the payment.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The payment payload could not be serialized.
    #[error("failed to encode payment payload: {0}")]
    Encoding(#[from] serde_json::Error),
}
