//! Feeds, entries, and the paging envelope of list endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encoding::EncodedContent;

/// A content feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    /// Server-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Address of the wallet that created the feed.
    #[serde(default)]
    pub owner_address: String,
    /// Whether reading entries requires payment.
    #[serde(default)]
    pub is_premium: bool,
    /// Price per premium read, in the asset's base units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Number of entries, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<u64>,
    /// Creation time as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update time as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// An entry in a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Server-assigned identifier.
    pub id: String,
    /// Owning feed.
    pub feed_id: String,
    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Base64 content. Absent in listings of premium feeds until paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// MIME type of the decoded content.
    #[serde(default)]
    pub mime_type: String,
    /// Whether reading the content requires payment.
    #[serde(default)]
    pub is_premium: bool,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Creation time as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `POST /v1/feeds`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateFeed {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether entries are paid content.
    #[serde(default)]
    pub is_premium: bool,
    /// Price per premium read, in the asset's base units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl CreateFeed {
    /// A free feed with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the feed premium at `price` base units per read.
    #[must_use]
    pub fn premium(mut self, price: impl Into<String>) -> Self {
        self.is_premium = true;
        self.price = Some(price.into());
        self
    }
}

/// Body of `PATCH /v1/feeds/{feed_id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateFeed {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New premium flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    /// New price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

/// Body of `POST /v1/feeds/{feed_id}/entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntry {
    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Base64 content.
    pub content: String,
    /// MIME type of the decoded content.
    pub mime_type: String,
    /// Whether reading the content requires payment.
    #[serde(default)]
    pub is_premium: bool,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CreateEntry {
    /// An entry carrying already-encoded content.
    #[must_use]
    pub fn new(content: EncodedContent) -> Self {
        Self {
            title: None,
            content: content.content,
            mime_type: content.mime_type,
            is_premium: false,
            metadata: None,
        }
    }

    /// A plain-text entry.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::new(EncodedContent::text(text))
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Marks the entry as paid content.
    #[must_use]
    pub const fn premium(mut self) -> Self {
        self.is_premium = true;
        self
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Opaque continuation token issued by a list endpoint.
///
/// Never constructed or parsed by the client; only passed back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// The raw token, for the `page_token` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Paging envelope of list responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Token for the next page; `null` or absent on the last page.
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Server hint that more pages exist.
    #[serde(default)]
    pub has_more: bool,
}

/// Wire shape of list responses: `{ data, pagination }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Paging envelope.
    #[serde(default)]
    pub pagination: Pagination,
}

/// One page of a list operation, handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBatch<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Cursor for the next page; `None` when no page remains.
    pub next_cursor: Option<PageCursor>,
}

impl<T> From<ListPage<T>> for ResourceBatch<T> {
    fn from(page: ListPage<T>) -> Self {
        Self {
            items: page.data,
            next_cursor: page
                .pagination
                .next_page_token
                .filter(|token| !token.is_empty())
                .map(PageCursor),
        }
    }
}

/// Arguments of one list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Items per page.
    pub page_size: u32,
    /// Cursor from the previous page, `None` for the first.
    pub cursor: Option<PageCursor>,
}

impl PageRequest {
    /// Request for the first page.
    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        Self {
            page_size,
            cursor: None,
        }
    }
}
