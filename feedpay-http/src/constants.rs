//! Endpoint paths and query parameter names.

/// Nonce challenge endpoint, relative to the API origin.
pub const NONCE_PATH: &str = "v1/auth/nonce";

/// Version segment leading every resource path.
pub const API_VERSION: &str = "v1";

/// Feed collection segment.
pub const FEEDS: &str = "feeds";

/// Entry collection segment, nested under a feed.
pub const ENTRIES: &str = "entries";

/// Wallet collection segment; a wallet's feeds live under `{address}/feeds`.
pub const WALLETS: &str = "wallets";

/// Page size query parameter of list endpoints.
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Continuation token query parameter of list endpoints.
pub const PAGE_TOKEN_PARAM: &str = "page_token";
