#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the feedpay client.
//!
//! feedpay is a content service of feeds and entries where writes are
//! authenticated by a wallet signature over a server-issued nonce, and premium
//! reads are paid per request with x402 micropayments. This crate holds the
//! transport-agnostic pieces; `feedpay-http` runs the request pipeline and
//! `feedpay-evm` supplies the local-key wallet and the EVM "exact" payment
//! scheme.
//!
//! # Modules
//!
//! - [`wallet`] - The [`Wallet`](wallet::Wallet) capability and the external-wallet variant
//! - [`auth`] - Nonce challenge and per-request auth headers
//! - [`proto`] - x402 payment-required, requirement, and authorization types
//! - [`scheme`] - The [`PaymentScheme`](scheme::PaymentScheme) seam
//! - [`networks`] - Supported networks (Base, Base Sepolia)
//! - [`resources`] - Feeds, entries, and list paging
//! - [`encoding`] - Base64 and entry content encoding
//! - [`validation`] - Argument checks run before dispatch
//! - [`error`] - Error taxonomy
//! - [`timestamp`] - Unix timestamps
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod auth;
pub mod encoding;
pub mod error;
pub mod networks;
pub mod proto;
pub mod resources;
pub mod scheme;
pub mod timestamp;
pub mod validation;
pub mod wallet;

pub use error::{AuthError, ConfigError, PaymentError, ValidationError, WalletError};
pub use networks::Network;
pub use wallet::{ExternalWallet, Wallet, WalletConnector};
