//! The feeds and entries API.
//!
//! [`FeedClient`] wraps a [`RequestDispatcher`] with one method per endpoint.
//! Arguments are validated before anything is sent. Reads of public data go
//! out bare; writes carry wallet auth headers, and calls that may cost money
//! arm the single paid retry.
//!
//! ```no_run
//! # async fn demo() -> Result<(), feedpay_http::Error> {
//! use feedpay::resources::{CreateEntry, CreateFeed};
//! use feedpay_http::FeedClient;
//!
//! let client = FeedClient::builder()
//!     .base_url("https://api.feedpay.example")
//!     .testnet(true)
//!     .private_key("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
//!     .build()?;
//!
//! let feed = client.create_feed(&CreateFeed::new("release notes")).await?;
//! client
//!     .create_entry(&feed.id, &CreateEntry::text("v1.0 is out").with_title("v1.0"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use feedpay::error::ConfigError;
use feedpay::resources::{
    CreateEntry, CreateFeed, Entry, Feed, ListPage, PageRequest, ResourceBatch, UpdateFeed,
};
use feedpay::scheme::PaymentScheme;
use feedpay::validation::{
    validate_address, validate_create_entry, validate_create_feed, validate_id,
    validate_page_size, validate_update_feed,
};
use feedpay::{Network, Wallet};
use feedpay_evm::{ExactEvmScheme, LocalWallet};
use futures_util::future::BoxFuture;
#[cfg(feature = "telemetry")]
use tracing::{info, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::constants::{API_VERSION, ENTRIES, FEEDS, PAGE_SIZE_PARAM, PAGE_TOKEN_PARAM, WALLETS};
use crate::dispatcher::{DispatchRequest, RequestDispatcher};
use crate::error::Error;
use crate::paginate::CursorPaginator;
use crate::payment::{PaymentMiddleware, PaymentNegotiator};

/// Page fetcher handed to [`CursorPaginator`] by the list methods.
pub type PageFetch<T> = BoxFuture<'static, Result<ResourceBatch<T>, Error>>;

/// Client for the feeds and entries API.
///
/// Cheap to clone; clones share the wallet slot.
#[derive(Clone, Debug)]
pub struct FeedClient {
    dispatcher: Arc<RequestDispatcher>,
    network: Network,
    batch_delay: Duration,
}

impl FeedClient {
    /// Starts building a client.
    #[must_use]
    pub fn builder() -> FeedClientBuilder {
        FeedClientBuilder::default()
    }

    /// Builds a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// As [`FeedClientBuilder::build`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        FeedClientBuilder::from_config(config).build()
    }

    /// The payment network.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The API origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.dispatcher.base_url()
    }

    /// The underlying dispatcher, for endpoints without a dedicated method.
    #[must_use]
    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    // ---- wallet ----

    /// Uses `wallet` for calls started from now on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ChainMismatch`] if the wallet is bound to
    /// another chain than the client's network.
    pub async fn set_wallet(&self, wallet: Arc<dyn Wallet>) -> Result<(), Error> {
        check_chain(self.network, wallet.as_ref())?;
        self.dispatcher.set_wallet(wallet).await;
        Ok(())
    }

    /// Uses a local wallet with `private_key` for calls started from now on.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKeyFormat`](feedpay::AuthError::InvalidKeyFormat)
    /// for a malformed key.
    pub async fn set_private_key(&self, private_key: &str) -> Result<Address, Error> {
        let wallet = LocalWallet::from_private_key(private_key, self.network)?;
        let address = wallet.address();
        self.dispatcher.set_wallet(Arc::new(wallet)).await;
        Ok(address)
    }

    /// Drops the wallet. Later authenticated calls fail with
    /// [`AuthError::NoWalletConfigured`](feedpay::AuthError::NoWalletConfigured).
    pub async fn clear_wallet(&self) {
        self.dispatcher.clear_wallet().await;
    }

    /// Address of the current wallet, if any.
    pub async fn wallet_address(&self) -> Option<Address> {
        self.dispatcher.wallet_address().await
    }

    // ---- feeds ----

    /// Lists one page of feeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad page size, or any dispatch error.
    pub async fn list_feeds(&self, page: PageRequest) -> Result<ResourceBatch<Feed>, Error> {
        self.list(&[API_VERSION, FEEDS], page, DispatchRequest::get()).await
    }

    /// All feeds, page by page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad page size.
    pub fn paginate_feeds(
        &self,
        page_size: u32,
    ) -> Result<CursorPaginator<impl Fn(PageRequest) -> PageFetch<Feed>>, Error> {
        let client = self.clone();
        CursorPaginator::new(page_size, move |page| {
            let client = client.clone();
            let fetch: PageFetch<Feed> = Box::pin(async move { client.list_feeds(page).await });
            fetch
        })
    }

    /// Creates a feed owned by the current wallet, paying if asked to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for bad fields, or any dispatch error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.client.create_feed", skip_all, err)
    )]
    pub async fn create_feed(&self, feed: &CreateFeed) -> Result<Feed, Error> {
        validate_create_feed(feed)?;
        let request = DispatchRequest::post(feed)?.authenticated().paid();
        self.dispatcher
            .dispatch_json(&[API_VERSION, FEEDS], request)
            .await
    }

    /// Fetches a feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty id, or any dispatch error.
    pub async fn get_feed(&self, feed_id: &str) -> Result<Feed, Error> {
        validate_id("feed_id", feed_id)?;
        self.dispatcher
            .dispatch_json(&[API_VERSION, FEEDS, feed_id], DispatchRequest::get())
            .await
    }

    /// Updates a feed owned by the current wallet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for bad fields, or any dispatch error.
    pub async fn update_feed(&self, feed_id: &str, update: &UpdateFeed) -> Result<Feed, Error> {
        validate_id("feed_id", feed_id)?;
        validate_update_feed(update)?;
        let request = DispatchRequest::patch(update)?.authenticated();
        self.dispatcher
            .dispatch_json(&[API_VERSION, FEEDS, feed_id], request)
            .await
    }

    /// Deletes a feed owned by the current wallet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty id, or any dispatch error.
    pub async fn delete_feed(&self, feed_id: &str) -> Result<(), Error> {
        validate_id("feed_id", feed_id)?;
        self.dispatcher
            .dispatch_empty(
                &[API_VERSION, FEEDS, feed_id],
                DispatchRequest::delete().authenticated(),
            )
            .await
    }

    /// Lists one page of feeds owned by `wallet_address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad address or page size, or any
    /// dispatch error.
    pub async fn list_wallet_feeds(
        &self,
        wallet_address: &str,
        page: PageRequest,
    ) -> Result<ResourceBatch<Feed>, Error> {
        let address = validate_address("wallet_address", wallet_address)?;
        let address = address.to_checksum(None);
        self.list(
            &[API_VERSION, WALLETS, address.as_str(), FEEDS],
            page,
            DispatchRequest::get(),
        )
        .await
    }

    /// All feeds owned by `wallet_address`, page by page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad address or page size.
    pub fn paginate_wallet_feeds(
        &self,
        wallet_address: &str,
        page_size: u32,
    ) -> Result<CursorPaginator<impl Fn(PageRequest) -> PageFetch<Feed>>, Error> {
        validate_address("wallet_address", wallet_address)?;
        let client = self.clone();
        let wallet_address = wallet_address.to_owned();
        CursorPaginator::new(page_size, move |page| {
            let client = client.clone();
            let wallet_address = wallet_address.clone();
            let fetch: PageFetch<Feed> =
                Box::pin(async move { client.list_wallet_feeds(&wallet_address, page).await });
            fetch
        })
    }

    // ---- entries ----

    /// Lists one page of a feed's entries, paying if the feed is premium.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty id or bad page size, or any
    /// dispatch error.
    pub async fn list_entries(
        &self,
        feed_id: &str,
        page: PageRequest,
    ) -> Result<ResourceBatch<Entry>, Error> {
        validate_id("feed_id", feed_id)?;
        self.list(
            &[API_VERSION, FEEDS, feed_id, ENTRIES],
            page,
            DispatchRequest::get().paid(),
        )
        .await
    }

    /// All entries of a feed, page by page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty id or bad page size.
    pub fn paginate_entries(
        &self,
        feed_id: &str,
        page_size: u32,
    ) -> Result<CursorPaginator<impl Fn(PageRequest) -> PageFetch<Entry>>, Error> {
        validate_id("feed_id", feed_id)?;
        let client = self.clone();
        let feed_id = feed_id.to_owned();
        CursorPaginator::new(page_size, move |page| {
            let client = client.clone();
            let feed_id = feed_id.clone();
            let fetch: PageFetch<Entry> =
                Box::pin(async move { client.list_entries(&feed_id, page).await });
            fetch
        })
    }

    /// Adds an entry to a feed owned by the current wallet, paying if asked to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for bad fields, or any dispatch error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.client.create_entry", skip_all, err, fields(feed_id = feed_id))
    )]
    pub async fn create_entry(&self, feed_id: &str, entry: &CreateEntry) -> Result<Entry, Error> {
        validate_id("feed_id", feed_id)?;
        validate_create_entry(entry)?;
        self.post_entry(feed_id, entry).await
    }

    async fn post_entry(&self, feed_id: &str, entry: &CreateEntry) -> Result<Entry, Error> {
        let request = DispatchRequest::post(entry)?.authenticated().paid();
        self.dispatcher
            .dispatch_json(&[API_VERSION, FEEDS, feed_id, ENTRIES], request)
            .await
    }

    /// Adds entries one at a time, in order, pausing the configured batch
    /// delay between them.
    ///
    /// Every entry is validated before the first is sent. Stops at the first
    /// failure; entries created before it stay created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for any bad entry, or the first dispatch
    /// error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.client.create_entries", skip_all, err, fields(feed_id = feed_id, count = entries.len()))
    )]
    pub async fn create_entries(
        &self,
        feed_id: &str,
        entries: &[CreateEntry],
    ) -> Result<Vec<Entry>, Error> {
        validate_id("feed_id", feed_id)?;
        for entry in entries {
            validate_create_entry(entry)?;
        }
        let mut created = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            created.push(self.post_entry(feed_id, entry).await?);

            #[cfg(feature = "telemetry")]
            info!(index, "batch entry created");
        }
        Ok(created)
    }

    /// Fetches an entry with its content, paying if it is premium.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for empty ids, or any dispatch error.
    pub async fn get_entry(&self, feed_id: &str, entry_id: &str) -> Result<Entry, Error> {
        validate_id("feed_id", feed_id)?;
        validate_id("entry_id", entry_id)?;
        let request = DispatchRequest::get().authenticated().paid();
        self.dispatcher
            .dispatch_json(&[API_VERSION, FEEDS, feed_id, ENTRIES, entry_id], request)
            .await
    }

    /// Deletes an entry from a feed owned by the current wallet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for empty ids, or any dispatch error.
    pub async fn delete_entry(&self, feed_id: &str, entry_id: &str) -> Result<(), Error> {
        validate_id("feed_id", feed_id)?;
        validate_id("entry_id", entry_id)?;
        self.dispatcher
            .dispatch_empty(
                &[API_VERSION, FEEDS, feed_id, ENTRIES, entry_id],
                DispatchRequest::delete().authenticated(),
            )
            .await
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        page: PageRequest,
        request: DispatchRequest,
    ) -> Result<ResourceBatch<T>, Error> {
        validate_page_size(page.page_size)?;
        let mut request = request.query(PAGE_SIZE_PARAM, page.page_size.to_string());
        if let Some(cursor) = &page.cursor {
            request = request.query(PAGE_TOKEN_PARAM, cursor.as_str());
        }
        let page: ListPage<T> = self.dispatcher.dispatch_json(segments, request).await?;
        Ok(page.into())
    }
}

fn check_chain(network: Network, wallet: &dyn Wallet) -> Result<(), ConfigError> {
    if wallet.chain_id() != network.chain_id() {
        return Err(ConfigError::ChainMismatch {
            expected: network.chain_id(),
            actual: wallet.chain_id(),
        });
    }
    Ok(())
}

/// Builder for [`FeedClient`].
#[derive(Default)]
pub struct FeedClientBuilder {
    base_url: Option<String>,
    testnet: bool,
    private_key: Option<String>,
    wallet: Option<Arc<dyn Wallet>>,
    batch_delay: Duration,
    scheme: Option<Arc<dyn PaymentScheme>>,
    http: Option<reqwest::Client>,
}

impl std::fmt::Debug for FeedClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClientBuilder")
            .field("base_url", &self.base_url)
            .field("testnet", &self.testnet)
            .field("wallet", &self.wallet)
            .field("batch_delay", &self.batch_delay)
            .finish_non_exhaustive()
    }
}

impl FeedClientBuilder {
    /// Seeds a builder from loaded configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            testnet: config.testnet,
            private_key: config.private_key.clone(),
            batch_delay: config.batch_delay(),
            ..Self::default()
        }
    }

    /// Sets the API origin.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Selects Base Sepolia (`true`) or Base (`false`, the default).
    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Uses a local wallet with this hex private key.
    #[must_use]
    pub fn private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// Uses an existing wallet, e.g. an [`ExternalWallet`](feedpay::ExternalWallet).
    #[must_use]
    pub fn wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Pause between items of [`FeedClient::create_entries`].
    #[must_use]
    pub const fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Replaces the default EVM "exact" payment scheme.
    #[must_use]
    pub fn payment_scheme(mut self, scheme: Arc<dyn PaymentScheme>) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Uses a preconfigured reqwest client (proxies, TLS, timeouts).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Validates the options and builds the client. Makes no network call.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingBaseUrl`] / [`ConfigError::InvalidBaseUrl`]
    /// - [`ConfigError::ConflictingWalletOptions`] if both a key and a wallet are set
    /// - [`ConfigError::ChainMismatch`] if the wallet's chain is not the network's
    /// - [`AuthError::InvalidKeyFormat`](feedpay::AuthError::InvalidKeyFormat) for a malformed key
    pub fn build(self) -> Result<FeedClient, Error> {
        let raw_url = self.base_url.ok_or(ConfigError::MissingBaseUrl)?;
        let base_url = normalize_base_url(&raw_url)?;
        let network = Network::from_testnet(self.testnet);

        let wallet: Option<Arc<dyn Wallet>> = match (self.private_key, self.wallet) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingWalletOptions.into()),
            (Some(key), None) => {
                let wallet: Arc<dyn Wallet> =
                    Arc::new(LocalWallet::from_private_key(&key, network)?);
                Some(wallet)
            }
            (None, Some(wallet)) => {
                check_chain(network, wallet.as_ref())?;
                Some(wallet)
            }
            (None, None) => None,
        };

        let scheme = self
            .scheme
            .unwrap_or_else(|| Arc::new(ExactEvmScheme::new()));
        let http = reqwest_middleware::ClientBuilder::new(self.http.unwrap_or_default())
            .with(PaymentMiddleware::new(PaymentNegotiator::new(network, scheme)))
            .build();

        #[cfg(feature = "telemetry")]
        info!(base_url = %base_url, network = %network, wallet = wallet.is_some(), "feed client ready");

        Ok(FeedClient {
            dispatcher: Arc::new(RequestDispatcher::new(http, base_url, wallet)),
            network,
            batch_delay: self.batch_delay,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason,
    };
    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_owned()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedpay::error::{AuthError, ValidationError};
    use futures_util::TryStreamExt;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn client(server: &MockServer) -> FeedClient {
        FeedClient::builder()
            .base_url(server.uri())
            .testnet(true)
            .private_key(KEY)
            .build()
            .unwrap()
    }

    async fn mount_nonce(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/nonce"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "sign:1" })))
            .mount(server)
            .await;
    }

    fn feed_json(id: &str, name: &str) -> Value {
        json!({ "id": id, "name": name, "owner_address": ADDRESS, "is_premium": false })
    }

    #[test]
    fn test_builder_rejects_bad_options() {
        assert!(matches!(
            FeedClient::builder().build(),
            Err(Error::Config(ConfigError::MissingBaseUrl))
        ));
        assert!(matches!(
            FeedClient::builder().base_url("not a url").build(),
            Err(Error::Config(ConfigError::InvalidBaseUrl { .. }))
        ));
        assert!(matches!(
            FeedClient::builder().base_url("ftp://api.example").build(),
            Err(Error::Config(ConfigError::InvalidBaseUrl { .. }))
        ));

        let wallet: Arc<dyn Wallet> =
            Arc::new(LocalWallet::from_private_key(KEY, Network::Base).unwrap());
        assert!(matches!(
            FeedClient::builder()
                .base_url("https://api.example")
                .private_key(KEY)
                .wallet(Arc::clone(&wallet))
                .build(),
            Err(Error::Config(ConfigError::ConflictingWalletOptions))
        ));
        assert!(matches!(
            FeedClient::builder()
                .base_url("https://api.example")
                .testnet(true)
                .wallet(wallet)
                .build(),
            Err(Error::Config(ConfigError::ChainMismatch { expected: 84532, actual: 8453 }))
        ));
        assert!(matches!(
            FeedClient::builder()
                .base_url("https://api.example")
                .private_key("0x12")
                .build(),
            Err(Error::Auth(AuthError::InvalidKeyFormat(_)))
        ));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = FeedClient::builder()
            .base_url("https://api.example/prefix")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example/prefix/");
        assert_eq!(client.network(), Network::Base);
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            base_url: Some("https://api.example".to_owned()),
            testnet: true,
            private_key: Some(KEY.to_owned()),
            batch_delay_ms: 5,
        };
        let client = FeedClient::from_config(&config).unwrap();
        assert_eq!(client.network(), Network::BaseSepolia);
        assert_eq!(client.batch_delay, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_create_feed_pays_once() {
        let server = MockServer::start().await;
        mount_nonce(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/feeds"))
            .and(header_exists("X-PAYMENT"))
            .respond_with(ResponseTemplate::new(201).set_body_json(feed_json("f1", "news")))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/feeds"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "x402Version": 1,
                "accepts": [{
                    "scheme": "exact",
                    "network": "base-sepolia",
                    "maxAmountRequired": "1000",
                    "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                    "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let feed = client(&server)
            .create_feed(&CreateFeed::new("news").with_description("daily"))
            .await
            .unwrap();
        assert_eq!(feed.id, "f1");
        assert_eq!(feed.owner_address, ADDRESS);
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_the_server() {
        let server = MockServer::start().await;
        let client = client(&server);

        let err = client.create_feed(&CreateFeed::new("")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Empty { field: "name" })));
        let err = client.get_entry("f1", " ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Empty { field: "entry_id" })));
        let err = client
            .list_feeds(PageRequest::first(500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::OutOfRange { .. })));
        let err = client
            .list_wallet_feeds("0xnope", PageRequest::first(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidAddress { .. })));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paginate_feeds_follows_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds"))
            .and(query_param("page_token", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [feed_json("c", "three")],
                "pagination": { "next_page_token": null, "has_more": false }
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/feeds"))
            .and(query_param("page_size", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [feed_json("a", "one"), feed_json("b", "two")],
                "pagination": { "next_page_token": "next", "has_more": true }
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let paginator = client.paginate_feeds(2).unwrap();
        let feeds: Vec<Feed> = paginator.items().try_collect().await.unwrap();
        let ids: Vec<_> = feeds.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_wallet_feeds_path_uses_checksummed_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/wallets/{ADDRESS}/feeds")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [feed_json("a", "one")],
                "pagination": { "next_page_token": null, "has_more": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = client(&server)
            .list_wallet_feeds(&ADDRESS.to_lowercase(), PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(batch.items.len(), 1);
        assert!(batch.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_create_entries_runs_in_order() {
        let server = MockServer::start().await;
        mount_nonce(&server).await;
        for (i, title) in ["one", "two", "three"].iter().enumerate() {
            Mock::given(method("POST"))
                .and(path("/v1/feeds/f1/entries"))
                .and(body_partial_json(json!({ "title": title })))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                    "id": format!("e{i}"),
                    "feed_id": "f1",
                    "title": title,
                    "mime_type": "text/plain"
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let entries: Vec<_> = ["one", "two", "three"]
            .iter()
            .map(|t| CreateEntry::text("body").with_title(*t))
            .collect();
        let client = FeedClient::builder()
            .base_url(server.uri())
            .private_key(KEY)
            .batch_delay(Duration::from_millis(1))
            .build()
            .unwrap();
        let created = client.create_entries("f1", &entries).await.unwrap();
        let ids: Vec<_> = created.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e0", "e1", "e2"]);

        let titles: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/v1/feeds/f1/entries")
            .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["title"].to_string())
            .collect();
        assert_eq!(titles, ["\"one\"", "\"two\"", "\"three\""]);
    }

    #[tokio::test]
    async fn test_batch_is_validated_up_front() {
        let server = MockServer::start().await;
        let entries = [CreateEntry::text("ok"), CreateEntry::text("")];
        let err = client(&server).create_entries("f1", &entries).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Empty { field: "content" })));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_feed_accepts_no_content() {
        let server = MockServer::start().await;
        mount_nonce(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/v1/feeds/f1"))
            .and(header_exists("x-signature"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete_feed("f1").await.unwrap();
    }

    #[tokio::test]
    async fn test_ids_stay_inside_their_segment() {
        let server = MockServer::start().await;
        mount_nonce(&server).await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(3)
            .mount(&server)
            .await;

        let client = client(&server);
        client.delete_feed("f1/entries/e1").await.unwrap();
        client.delete_feed("../../admin").await.unwrap();
        client.delete_entry("f1", "e1?force=true#x").await.unwrap();
        let err = client.delete_feed("..").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidId { field: "feed_id", .. })));

        let deleted: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == "DELETE")
            .map(|r| {
                assert!(r.url.query().is_none());
                r.url.path().to_owned()
            })
            .collect();
        assert_eq!(
            deleted,
            [
                "/v1/feeds/f1%2Fentries%2Fe1",
                "/v1/feeds/..%2F..%2Fadmin",
                "/v1/feeds/f1/entries/e1%3Fforce=true%23x",
            ]
        );
    }

    #[tokio::test]
    async fn test_wallet_management() {
        let server = MockServer::start().await;
        let client = FeedClient::builder()
            .base_url(server.uri())
            .build()
            .unwrap();
        assert!(client.wallet_address().await.is_none());

        let address = client.set_private_key(KEY).await.unwrap();
        assert_eq!(address, ADDRESS.parse::<Address>().unwrap());
        assert_eq!(client.wallet_address().await, Some(address));

        let other_chain: Arc<dyn Wallet> =
            Arc::new(LocalWallet::from_private_key(KEY, Network::BaseSepolia).unwrap());
        assert!(matches!(
            client.set_wallet(other_chain).await,
            Err(Error::Config(ConfigError::ChainMismatch { .. }))
        ));

        client.clear_wallet().await;
        let err = client.delete_feed("f1").await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NoWalletConfigured)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
