//! Challenge-response authentication model.
//!
//! The server proves nothing about a wallet from a static secret. Instead it
//! hands out an [`AuthChallenge`] whose message embeds a one-time nonce; the
//! wallet signs that message and the client sends the result as
//! [`AuthHeaders`]. Challenges are single-use: a fresh one is requested for
//! every authenticated call and headers are never cached.

use alloy_primitives::{Address, Signature};
use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;
use crate::wallet::signature_hex;

/// Header carrying the checksummed wallet address.
pub const WALLET_ADDRESS_HEADER: &str = "x-wallet-address";

/// Header carrying the `0x`-prefixed challenge signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the signed challenge message verbatim.
pub const MESSAGE_HEADER: &str = "x-message";

/// Header carrying the header-construction time in Unix seconds.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header carrying the numeric chain id.
pub const CHAIN_ID_HEADER: &str = "x-chain-id";

/// Body of `POST /v1/auth/nonce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRequest {
    /// Address requesting a challenge.
    pub wallet_address: String,
}

/// Server-issued challenge. The client signs `message` without interpreting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    /// Challenge text embedding the server's nonce.
    pub message: String,
}

/// Per-request proof of wallet ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// The signing wallet.
    pub wallet_address: Address,
    /// Signature over [`Self::message`].
    pub signature: Signature,
    /// The challenge message, verbatim.
    pub message: String,
    /// When these headers were built.
    pub timestamp: UnixTimestamp,
    /// Chain id of the signing wallet.
    pub chain_id: u64,
}

impl AuthHeaders {
    /// Renders the headers as `(name, value)` pairs in a stable order.
    #[must_use]
    pub fn to_pairs(&self) -> [(&'static str, String); 5] {
        [
            (WALLET_ADDRESS_HEADER, self.wallet_address.to_checksum(None)),
            (SIGNATURE_HEADER, signature_hex(&self.signature)),
            (MESSAGE_HEADER, self.message.clone()),
            (TIMESTAMP_HEADER, self.timestamp.to_string()),
            (CHAIN_ID_HEADER, self.chain_id.to_string()),
        ]
    }
}
