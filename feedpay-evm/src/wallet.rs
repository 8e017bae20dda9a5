//! Wallet backed by a locally-held private key.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, Signature};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use feedpay::error::{AuthError, WalletError};
use feedpay::{Network, Wallet};

/// A [`Wallet`] holding its secp256k1 key in process.
///
/// Signing never suspends on user interaction, and signatures are
/// deterministic (RFC 6979) for a given key and message.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl LocalWallet {
    /// Parses a hex private key, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKeyFormat`] if `private_key` is not 32 bytes
    /// of hex. The key itself never appears in the error.
    pub fn from_private_key(private_key: &str, network: Network) -> Result<Self, AuthError> {
        let signer = PrivateKeySigner::from_str(private_key.trim()).map_err(|_| {
            AuthError::InvalidKeyFormat(
                "expected 32 bytes of hex, optionally prefixed with 0x".to_owned(),
            )
        })?;
        Ok(Self::new(signer, network))
    }

    /// Wraps an existing signer for `network`.
    #[must_use]
    pub fn new(signer: PrivateKeySigner, network: Network) -> Self {
        let chain_id = network.chain_id();
        Self {
            signer: signer.with_chain_id(Some(chain_id)),
            chain_id,
        }
    }

    /// A wallet with a freshly generated key.
    #[must_use]
    pub fn random(network: Network) -> Self {
        Self::new(PrivateKeySigner::random(), network)
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Wallet for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        self.signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| WalletError::Signing(format!("{e:?}")))
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, WalletError> {
        Signer::sign_hash(&self.signer, hash)
            .await
            .map_err(|e| WalletError::Signing(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn test_address_derived_from_key() {
        let wallet = LocalWallet::from_private_key(KEY, Network::Base).unwrap();
        assert_eq!(wallet.address(), ADDRESS);
        assert_eq!(wallet.chain_id(), 8453);

        let unprefixed = LocalWallet::from_private_key(&KEY[2..], Network::BaseSepolia).unwrap();
        assert_eq!(unprefixed.address(), ADDRESS);
        assert_eq!(unprefixed.chain_id(), 84532);
    }

    #[test]
    fn test_invalid_key_is_rejected_without_echoing_it() {
        let err = LocalWallet::from_private_key("0xnot-a-key", Network::Base).unwrap_err();
        assert!(matches!(err, AuthError::InvalidKeyFormat(_)));
        assert!(!err.to_string().contains("not-a-key"));
        assert!(LocalWallet::from_private_key("0x1234", Network::Base).is_err());
    }

    #[tokio::test]
    async fn test_message_signature_is_deterministic_and_recoverable() {
        let wallet = LocalWallet::from_private_key(KEY, Network::Base).unwrap();
        let first = wallet.sign_message("Sign in: nonce 42").await.unwrap();
        let second = wallet.sign_message("Sign in: nonce 42").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.recover_address_from_msg("Sign in: nonce 42").unwrap(),
            ADDRESS
        );
    }

    #[tokio::test]
    async fn test_hash_signature_recovers_to_wallet() {
        let wallet = LocalWallet::random(Network::BaseSepolia);
        let hash = B256::repeat_byte(0x11);
        let signature = wallet.sign_hash(&hash).await.unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&hash).unwrap(),
            wallet.address()
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = LocalWallet::from_private_key(KEY, Network::Base).unwrap();
        let debug = format!("{wallet:?}");
        assert!(!debug.contains("ac0974bec39a17e3"));
    }
}
