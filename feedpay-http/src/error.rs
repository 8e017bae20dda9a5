//! Errors surfaced by the HTTP client.

use feedpay::error::{AuthError, ConfigError, PaymentError, ValidationError};
use http::StatusCode;
use url::Url;

/// A terminal non-success response from the API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status, after the optional paid retry.
    #[error("request to {url} failed with status {status}: {body}")]
    RequestFailed {
        /// Final HTTP status.
        status: StatusCode,
        /// Raw response body.
        body: String,
        /// The requested URL.
        url: Url,
    },
}

impl ApiError {
    /// HTTP status of the failed response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::RequestFailed { status, .. } => *status,
        }
    }
}

/// Any failure of a client operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid client configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid call arguments.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wallet configuration or challenge-response failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// x402 payment negotiation failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Terminal non-success API response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// URL construction failed.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// A success response body did not have the expected shape.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A request middleware failed for a reason other than payment.
    #[error("middleware error: {context}: {source}")]
    Middleware {
        /// Human-readable context.
        context: &'static str,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Maps a middleware-stack error, recovering payment failures raised
    /// during the paid retry.
    pub(crate) fn from_middleware(context: &'static str, err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(source) => Self::Http { context, source },
            reqwest_middleware::Error::Middleware(source) => {
                match source.downcast::<PaymentError>() {
                    Ok(payment) => Self::Payment(payment),
                    Err(other) => Self::Middleware {
                        context,
                        source: other.into(),
                    },
                }
            }
        }
    }
}
