//! Base64 helpers and entry content encoding.
//!
//! [`Base64Bytes`] wraps the payment header payload. [`EncodedContent`] is the
//! shape entry content travels in: base64 data plus a MIME type.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// MIME type used for UTF-8 text when the caller does not name one.
pub const TEXT_PLAIN: &str = "text/plain";

/// MIME type used for arbitrary bytes when the caller does not name one.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Base64-encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Encodes raw bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        let encoded = b64.encode(input.as_ref());
        Self(encoded.into_bytes())
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Base64Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Entry content ready for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedContent {
    /// Base64 of the raw content.
    pub content: String,
    /// MIME type of the raw content.
    pub mime_type: String,
}

impl EncodedContent {
    /// Encodes `raw`, using `mime_type` when given.
    ///
    /// Without an explicit type, valid UTF-8 is labelled [`TEXT_PLAIN`] and
    /// anything else [`OCTET_STREAM`].
    #[must_use]
    pub fn from_bytes(raw: &[u8], mime_type: Option<&str>) -> Self {
        let mime_type = mime_type.map_or_else(
            || {
                if std::str::from_utf8(raw).is_ok() {
                    TEXT_PLAIN
                } else {
                    OCTET_STREAM
                }
                .to_owned()
            },
            str::to_owned,
        );
        Self {
            content: Base64Bytes::encode(raw).to_string(),
            mime_type,
        }
    }

    /// Encodes UTF-8 text as [`TEXT_PLAIN`].
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes(), Some(TEXT_PLAIN))
    }
}
