//! Wallet capability.
//!
//! A [`Wallet`] proves control of an address: it signs the server's auth
//! challenge and the payment layer's EIP-712 digests. Two variants share the
//! same operation set:
//!
//! - a locally-held key (`feedpay_evm::LocalWallet`), which signs without
//!   interaction and deterministically for a given key and message;
//! - an externally-connected wallet ([`ExternalWallet`]), which forwards each
//!   request to a [`WalletConnector`] supplied by the host application and may
//!   wait indefinitely for the owner to approve.
//!
//! Neither variant carries shared mutable state. Clients hold wallets as
//! `Arc<dyn Wallet>` and may swap them between calls.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Signature};

use crate::error::WalletError;
use crate::networks::Network;

/// A signing capability bound to one address and one chain.
#[async_trait::async_trait]
pub trait Wallet: Send + Sync + fmt::Debug {
    /// The wallet address. Fixed for the wallet's lifetime.
    fn address(&self) -> Address;

    /// The numeric chain id the wallet was constructed for.
    fn chain_id(&self) -> u64;

    /// Signs `message` as an EIP-191 personal message.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::UserRejected`] if the owner declines, or another
    /// [`WalletError`] if the signer fails.
    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError>;

    /// Signs a raw 32-byte digest, e.g. an EIP-712 signing hash.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::UserRejected`] if the owner declines, or another
    /// [`WalletError`] if the signer fails.
    async fn sign_hash(&self, hash: &B256) -> Result<Signature, WalletError>;
}

/// Bridge to a wallet living outside the process (browser extension,
/// mobile wallet session, hardware signer daemon).
///
/// Implementations decide how requests reach the owner. Signature material is
/// opaque to the client and may differ between identical requests.
#[async_trait::async_trait]
pub trait WalletConnector: Send + Sync {
    /// Address of the connected account.
    fn address(&self) -> Address;

    /// Asks the owner to sign `message` as a personal message.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::UserRejected`] if the owner declines.
    async fn personal_sign(&self, message: &str) -> Result<Signature, WalletError>;

    /// Asks the owner to sign a raw digest.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::UserRejected`] if the owner declines.
    async fn sign_hash(&self, hash: &B256) -> Result<Signature, WalletError>;
}

/// A wallet whose keys live behind a [`WalletConnector`].
#[derive(Clone)]
pub struct ExternalWallet {
    connector: Arc<dyn WalletConnector>,
    address: Address,
    chain_id: u64,
}

impl ExternalWallet {
    /// Wraps a connector, capturing its current address.
    ///
    /// The chain id comes from `network`, not from the connector.
    #[must_use]
    pub fn new(connector: Arc<dyn WalletConnector>, network: Network) -> Self {
        let address = connector.address();
        Self {
            connector,
            address,
            chain_id: network.chain_id(),
        }
    }
}

impl fmt::Debug for ExternalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalWallet")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Wallet for ExternalWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        self.connector.personal_sign(message).await
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, WalletError> {
        self.connector.sign_hash(hash).await
    }
}

/// Formats a signature as `0x`-prefixed 65-byte hex (`r || s || v`).
#[must_use]
pub fn signature_hex(signature: &Signature) -> String {
    alloy_primitives::hex::encode_prefixed(signature.as_bytes())
}
