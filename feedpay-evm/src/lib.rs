#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM support for the feedpay client.
//!
//! - [`LocalWallet`] signs with a private key held in process, producing
//!   deterministic EIP-191 signatures for a given key and message.
//! - [`ExactEvmScheme`] signs ERC-3009 `transferWithAuthorization` payments
//!   (the x402 "exact" scheme) with any [`feedpay::Wallet`].
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod exact;
pub mod wallet;

mod networks;
pub use networks::*;

pub use exact::client::ExactEvmScheme;
pub use wallet::LocalWallet;
