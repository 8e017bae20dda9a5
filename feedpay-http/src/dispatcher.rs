//! The authenticated request pipeline.
//!
//! A call moves through `Building -> Sent`, then ends in success, or goes
//! `PaymentRequired -> PaidRetrySent` and ends there. Building snapshots the
//! wallet and, for authenticated calls, runs one challenge round trip. The
//! paid retry lives in [`PaymentMiddleware`](crate::payment::PaymentMiddleware)
//! and is armed only for calls that allow payment and have a wallet.

use std::sync::Arc;

use alloy_primitives::Address;
use feedpay::Wallet;
use feedpay::error::AuthError;
use http::Method;
use reqwest::Response;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};
use url::Url;

use crate::auth::{ChallengeAuthenticator, to_header_map};
use crate::error::{ApiError, Error};
use crate::payment::PaymentContext;

/// One call to dispatch.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    requires_auth: bool,
    handle_payment: bool,
}

impl DispatchRequest {
    /// A bare request with `method`.
    #[must_use]
    pub const fn new(method: Method) -> Self {
        Self {
            method,
            query: Vec::new(),
            body: None,
            requires_auth: false,
            handle_payment: false,
        }
    }

    /// `GET`.
    #[must_use]
    pub const fn get() -> Self {
        Self::new(Method::GET)
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`] if `body` cannot be serialized.
    pub fn post<T: Serialize + ?Sized>(body: &T) -> Result<Self, Error> {
        Self::new(Method::POST).with_json(body)
    }

    /// `PATCH` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`] if `body` cannot be serialized.
    pub fn patch<T: Serialize + ?Sized>(body: &T) -> Result<Self, Error> {
        Self::new(Method::PATCH).with_json(body)
    }

    /// `DELETE`.
    #[must_use]
    pub const fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|source| Error::JsonDeserialization {
            context: "Failed to serialize request body",
            source,
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Requires wallet auth headers.
    #[must_use]
    pub const fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Allows the single paid retry on `402`.
    #[must_use]
    pub const fn paid(mut self) -> Self {
        self.handle_payment = true;
        self
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }
}

/// Sends API calls with auth headers and the optional paid retry.
///
/// Holds the only mutable shared state of a client: the wallet slot. Each
/// dispatch reads the slot once, so a swap affects only calls started after it.
pub struct RequestDispatcher {
    http: ClientWithMiddleware,
    base_url: Url,
    wallet: RwLock<Option<Arc<dyn Wallet>>>,
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RequestDispatcher {
    /// A dispatcher for `base_url`, which should end in `/`.
    #[must_use]
    pub fn new(
        http: ClientWithMiddleware,
        base_url: Url,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Self {
        Self {
            http,
            base_url,
            wallet: RwLock::new(wallet),
        }
    }

    /// The API origin.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Replaces the wallet for subsequent calls.
    pub async fn set_wallet(&self, wallet: Arc<dyn Wallet>) {
        *self.wallet.write().await = Some(wallet);
    }

    /// Removes the wallet; subsequent authenticated calls fail.
    pub async fn clear_wallet(&self) {
        *self.wallet.write().await = None;
    }

    /// The current wallet, if any.
    pub async fn wallet(&self) -> Option<Arc<dyn Wallet>> {
        self.wallet.read().await.clone()
    }

    /// Address of the current wallet, if any.
    pub async fn wallet_address(&self) -> Option<Address> {
        self.wallet.read().await.as_ref().map(|w| w.address())
    }

    /// The URL of `segments` beneath the base URL.
    ///
    /// Each segment is percent-encoded, so `/`, `?`, `#` and `%` inside an id
    /// stay part of that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlParse`] if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut endpoint = self.base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| Error::UrlParse {
                context: "Base URL cannot carry a path",
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(endpoint)
    }

    /// Dispatches `request` to the endpoint at `segments`.
    ///
    /// Returns any 2xx response as-is.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoWalletConfigured`] for an authenticated call without a
    ///   wallet, before any network call
    /// - challenge errors from [`ChallengeAuthenticator::get_auth_headers`]
    /// - payment errors raised while handling a `402`
    /// - [`ApiError::RequestFailed`] for a terminal non-2xx response
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.dispatch", skip_all, err, fields(method = %request.method, path = ?segments))
    )]
    pub async fn dispatch(
        &self,
        segments: &[&str],
        request: DispatchRequest,
    ) -> Result<Response, Error> {
        let wallet = self.wallet().await;
        if request.requires_auth && wallet.is_none() {
            return Err(AuthError::NoWalletConfigured.into());
        }
        let url = self.endpoint(segments)?;

        let mut builder = self.http.request(request.method.clone(), url.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if request.requires_auth
            && let Some(wallet) = &wallet
        {
            let authenticator =
                ChallengeAuthenticator::new(self.http.clone(), &self.base_url, Arc::clone(wallet))?;
            let headers = authenticator.get_auth_headers().await?;
            builder = builder.headers(to_header_map(&headers)?);
        }
        if request.handle_payment
            && let Some(wallet) = wallet
        {
            builder = builder.with_extension(PaymentContext::new(wallet));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_middleware("dispatch", e))?;
        let status = response.status();
        if status.is_success() {
            #[cfg(feature = "telemetry")]
            debug!(status = %status, "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.map_err(|source| Error::Http {
            context: "Failed to read error response body",
            source,
        })?;
        Err(ApiError::RequestFailed { status, body, url }.into())
    }

    /// Dispatches and decodes a JSON response body.
    ///
    /// # Errors
    ///
    /// As [`Self::dispatch`], plus [`Error::JsonDeserialization`] for an
    /// unexpected body.
    pub async fn dispatch_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        request: DispatchRequest,
    ) -> Result<T, Error> {
        let response = self.dispatch(segments, request).await?;
        let bytes = response.bytes().await.map_err(|source| Error::Http {
            context: "Failed to read response body",
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| Error::JsonDeserialization {
            context: "Failed to decode response body",
            source,
        })
    }

    /// Dispatches a call whose success response carries no content (e.g. `204`).
    ///
    /// # Errors
    ///
    /// As [`Self::dispatch`].
    pub async fn dispatch_empty(
        &self,
        segments: &[&str],
        request: DispatchRequest,
    ) -> Result<(), Error> {
        self.dispatch(segments, request).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{PaymentMiddleware, PaymentNegotiator};
    use feedpay::Network;
    use feedpay::auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER, WALLET_ADDRESS_HEADER};
    use feedpay::error::PaymentError;
    use feedpay_evm::{ExactEvmScheme, LocalWallet};
    use http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet() -> Arc<dyn Wallet> {
        Arc::new(LocalWallet::from_private_key(KEY, Network::BaseSepolia).unwrap())
    }

    fn dispatcher(server: &MockServer, wallet: Option<Arc<dyn Wallet>>) -> RequestDispatcher {
        let negotiator = PaymentNegotiator::new(Network::BaseSepolia, Arc::new(ExactEvmScheme));
        let http = reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
            .with(PaymentMiddleware::new(negotiator))
            .build();
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        RequestDispatcher::new(http, base, wallet)
    }

    fn payment_required(network: &str) -> serde_json::Value {
        json!({
            "x402Version": 1,
            "error": "X-PAYMENT header is required",
            "accepts": [{
                "scheme": "exact",
                "network": network,
                "maxAmountRequired": "10000",
                "resource": "/v1/feeds",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 60,
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "extra": { "name": "USDC", "version": "2" }
            }]
        })
    }

    async fn mount_nonce(server: &MockServer, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/nonce"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "sign:1234" })))
            .expect(expected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_no_wallet_means_no_network_call() {
        let server = MockServer::start().await;
        let err = dispatcher(&server, None)
            .dispatch(&["v1", "feeds"], DispatchRequest::get().authenticated())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NoWalletConfigured)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_challenge_precedes_the_call() {
        let server = MockServer::start().await;
        mount_nonce(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds/f1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "f1", "name": "one" })))
            .expect(1)
            .mount(&server)
            .await;

        let feed: feedpay::resources::Feed = dispatcher(&server, Some(wallet()))
            .dispatch_json(&["v1", "feeds", "f1"], DispatchRequest::get().authenticated())
            .await
            .unwrap();
        assert_eq!(feed.id, "f1");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), "/v1/auth/nonce");
        assert_eq!(requests[1].headers["x-message"], "sign:1234");
    }

    #[tokio::test]
    async fn test_paid_retry_reuses_auth_headers() {
        let server = MockServer::start().await;
        mount_nonce(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v1/feeds"))
            .and(header_exists("X-PAYMENT"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "f9", "name": "paid" })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/feeds"))
            .respond_with(ResponseTemplate::new(402).set_body_json(payment_required("base-sepolia")))
            .expect(1)
            .mount(&server)
            .await;

        let request = DispatchRequest::post(&json!({ "name": "paid" }))
            .unwrap()
            .authenticated()
            .paid();
        let response = dispatcher(&server, Some(wallet()))
            .dispatch(&["v1", "feeds"], request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let requests = server.received_requests().await.unwrap();
        let calls: Vec<_> = requests
            .iter()
            .filter(|r| r.url.path() == "/v1/feeds")
            .collect();
        assert_eq!(calls.len(), 2);
        for name in [WALLET_ADDRESS_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER] {
            assert_eq!(calls[0].headers[name], calls[1].headers[name]);
        }
        assert!(calls[0].headers.get("x-payment").is_none());
        assert!(calls[1].headers.get("x-payment").is_some());
        assert_eq!(calls[0].body, calls[1].body);
    }

    #[tokio::test]
    async fn test_second_402_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds/f1/entries/e1"))
            .respond_with(ResponseTemplate::new(402).set_body_json(payment_required("base-sepolia")))
            .expect(2)
            .mount(&server)
            .await;

        let err = dispatcher(&server, Some(wallet()))
            .dispatch(&["v1", "feeds", "f1", "entries", "e1"], DispatchRequest::get().paid())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::RequestFailed { status: StatusCode::PAYMENT_REQUIRED, .. })
        ));
    }

    #[tokio::test]
    async fn test_unmatched_network_makes_no_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds/f1/entries/e1"))
            .respond_with(ResponseTemplate::new(402).set_body_json(payment_required("base")))
            .expect(1)
            .mount(&server)
            .await;

        let err = dispatcher(&server, Some(wallet()))
            .dispatch(&["v1", "feeds", "f1", "entries", "e1"], DispatchRequest::get().paid())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Payment(PaymentError::NoMatchingPaymentRequirement { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_402_makes_no_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds/f1/entries/e1"))
            .respond_with(ResponseTemplate::new(402).set_body_string("pay up"))
            .expect(1)
            .mount(&server)
            .await;

        let err = dispatcher(&server, Some(wallet()))
            .dispatch(&["v1", "feeds", "f1", "entries", "e1"], DispatchRequest::get().paid())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Payment(PaymentError::MalformedPaymentResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_402_without_payment_handling_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds"))
            .respond_with(ResponseTemplate::new(402).set_body_json(payment_required("base-sepolia")))
            .expect(1)
            .mount(&server)
            .await;

        let err = dispatcher(&server, Some(wallet()))
            .dispatch(&["v1", "feeds"], DispatchRequest::get())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::RequestFailed { status: StatusCode::PAYMENT_REQUIRED, .. })
        ));
    }

    #[tokio::test]
    async fn test_failure_carries_status_body_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/feeds/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = dispatcher(&server, None)
            .dispatch_empty(&["v1", "feeds", "missing"], DispatchRequest::delete())
            .await
            .unwrap_err();
        let Error::Api(ApiError::RequestFailed { status, body, url }) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not found");
        assert_eq!(url.path(), "/v1/feeds/missing");
    }

    #[tokio::test]
    async fn test_endpoint_keeps_each_segment_whole() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server, None);

        let url = dispatcher
            .endpoint(&["v1", "feeds", "f1/entries/e1", "a?b#c", "50%"])
            .unwrap();
        assert_eq!(url.path(), "/v1/feeds/f1%2Fentries%2Fe1/a%3Fb%23c/50%25");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let prefixed = RequestDispatcher::new(
            reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build(),
            Url::parse("https://api.example/prefix/").unwrap(),
            None,
        );
        assert_eq!(
            prefixed.endpoint(&["v1", "feeds"]).unwrap().as_str(),
            "https://api.example/prefix/v1/feeds"
        );
    }

    #[tokio::test]
    async fn test_cleared_wallet_applies_to_later_calls() {
        let server = MockServer::start().await;
        let dispatcher = dispatcher(&server, Some(wallet()));
        assert!(dispatcher.wallet_address().await.is_some());

        dispatcher.clear_wallet().await;
        let err = dispatcher
            .dispatch(&["v1", "feeds"], DispatchRequest::post(&json!({})).unwrap().authenticated())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NoWalletConfigured)));

        dispatcher.set_wallet(wallet()).await;
        assert_eq!(
            dispatcher.wallet_address().await,
            Some("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap())
        );
    }
}
