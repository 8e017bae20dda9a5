#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP client for feedpay.
//!
//! Every call goes through one pipeline: validate the arguments, attach wallet
//! auth headers obtained from a fresh nonce challenge when the endpoint needs
//! them, send, and on `402 Payment Required` negotiate an x402 payment and
//! retry exactly once.
//!
//! # Modules
//!
//! - [`client`] - [`FeedClient`], one method per feeds/entries endpoint
//! - [`dispatcher`] - The request pipeline shared by all endpoints
//! - [`auth`] - Nonce challenge to auth headers
//! - [`payment`] - Payment negotiation and the paid-retry middleware
//! - [`paginate`] - Cursor-driven page and item streams
//! - [`config`] - TOML and environment configuration
//! - [`constants`] - Endpoint paths and query parameter names
//! - [`error`] - Client error type
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod paginate;
pub mod payment;

pub use auth::ChallengeAuthenticator;
pub use client::{FeedClient, FeedClientBuilder};
pub use config::ClientConfig;
pub use dispatcher::{DispatchRequest, RequestDispatcher};
pub use error::{ApiError, Error};
pub use paginate::CursorPaginator;
pub use payment::{PaymentContext, PaymentMiddleware, PaymentNegotiator};
