//! Nonce challenge-response authentication.
//!
//! [`ChallengeAuthenticator`] turns a wallet into one set of [`AuthHeaders`]:
//! it asks the server for a challenge, has the wallet sign it, and stamps the
//! result with the current time. Nothing is cached; every call is a new round
//! trip with a new challenge.

use std::sync::Arc;

use feedpay::Wallet;
use feedpay::auth::{AuthChallenge, AuthHeaders, NonceRequest};
use feedpay::error::AuthError;
use feedpay::timestamp::UnixTimestamp;
use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};
use url::Url;

use crate::constants::NONCE_PATH;
use crate::error::Error;

/// Produces fresh auth headers for one wallet against one API origin.
#[derive(Clone)]
pub struct ChallengeAuthenticator {
    http: ClientWithMiddleware,
    nonce_url: Url,
    wallet: Arc<dyn Wallet>,
}

impl std::fmt::Debug for ChallengeAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeAuthenticator")
            .field("nonce_url", &self.nonce_url)
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

impl ChallengeAuthenticator {
    /// Binds `wallet` to the nonce endpoint under `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlParse`] if the nonce URL cannot be built from `origin`.
    pub fn new(
        http: ClientWithMiddleware,
        origin: &Url,
        wallet: Arc<dyn Wallet>,
    ) -> Result<Self, Error> {
        let nonce_url = origin.join(NONCE_PATH).map_err(|source| Error::UrlParse {
            context: "Failed to construct nonce URL",
            source,
        })?;
        Ok(Self {
            http,
            nonce_url,
            wallet,
        })
    }

    /// The nonce endpoint this authenticator posts to.
    #[must_use]
    pub const fn nonce_url(&self) -> &Url {
        &self.nonce_url
    }

    /// Runs one challenge-response round trip.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ChallengeRequestFailed`] if the nonce endpoint answers non-2xx
    /// - [`AuthError::MalformedChallenge`] if the answer carries no `message`
    /// - [`AuthError::Wallet`] if the wallet refuses or fails to sign
    /// - [`Error::Http`] on transport failure
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.auth.get_auth_headers", skip_all, err, fields(wallet = %self.wallet.address()))
    )]
    pub async fn get_auth_headers(&self) -> Result<AuthHeaders, Error> {
        let wallet_address = self.wallet.address();
        let request = NonceRequest {
            wallet_address: wallet_address.to_checksum(None),
        };
        let response = self
            .http
            .post(self.nonce_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_middleware("POST /v1/auth/nonce", e))?;

        let status = response.status();
        if !status.is_success() {
            // The body is detail only; the status is reported even if it cannot be read.
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ChallengeRequestFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        let body = response.bytes().await.map_err(|source| Error::Http {
            context: "Failed to read nonce response body",
            source,
        })?;
        let challenge: AuthChallenge = serde_json::from_slice(&body)
            .map_err(|e| AuthError::MalformedChallenge(e.to_string()))?;

        #[cfg(feature = "telemetry")]
        debug!("nonce challenge received, requesting signature");

        let signature = self
            .wallet
            .sign_message(&challenge.message)
            .await
            .map_err(AuthError::from)?;

        Ok(AuthHeaders {
            wallet_address,
            signature,
            message: challenge.message,
            timestamp: UnixTimestamp::now(),
            chain_id: self.wallet.chain_id(),
        })
    }
}

/// Renders auth headers into a [`HeaderMap`].
///
/// # Errors
///
/// Returns [`AuthError::InvalidHeaderValue`] if a value cannot travel in an
/// HTTP header, e.g. a challenge message containing a line break.
pub fn to_header_map(headers: &AuthHeaders) -> Result<HeaderMap, AuthError> {
    let mut map = HeaderMap::with_capacity(5);
    for (name, value) in headers.to_pairs() {
        let value = HeaderValue::from_str(&value)
            .map_err(|_| AuthError::InvalidHeaderValue { name })?;
        map.insert(HeaderName::from_static(name), value);
    }
    Ok(map)
}
