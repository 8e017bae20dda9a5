//! Argument checks run before any request leaves the client.

use alloy_primitives::Address;

use crate::error::ValidationError;
use crate::resources::{CreateEntry, CreateFeed, UpdateFeed};

/// Maximum feed name length, in characters.
pub const MAX_FEED_NAME_LEN: usize = 100;

/// Maximum feed description length, in characters.
pub const MAX_FEED_DESCRIPTION_LEN: usize = 1000;

/// Maximum entry title length, in characters.
pub const MAX_ENTRY_TITLE_LEN: usize = 200;

/// Largest page size list endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 100;

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Checks a resource identifier used in a path segment.
///
/// Ids are percent-encoded when the URL is built, so any other character is
/// safe. `.` and `..` are not: URL resolution would treat them as dot segments.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] for blank ids and
/// [`ValidationError::InvalidId`] for `.` and `..`.
pub fn validate_id(field: &'static str, id: &str) -> Result<(), ValidationError> {
    non_empty(field, id)?;
    if matches!(id, "." | "..") {
        return Err(ValidationError::InvalidId {
            field,
            value: id.to_owned(),
        });
    }
    Ok(())
}

/// Checks an EVM address string.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAddress`] if `value` is not 20 hex bytes.
pub fn validate_address(field: &'static str, value: &str) -> Result<Address, ValidationError> {
    value
        .parse::<Address>()
        .map_err(|_| ValidationError::InvalidAddress {
            field,
            value: value.to_owned(),
        })
}

/// Checks a page size.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] outside `1..=MAX_PAGE_SIZE`.
pub fn validate_page_size(page_size: u32) -> Result<(), ValidationError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size",
            min: 1,
            max: u64::from(MAX_PAGE_SIZE),
            actual: u64::from(page_size),
        });
    }
    Ok(())
}

/// Checks a new feed.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_create_feed(feed: &CreateFeed) -> Result<(), ValidationError> {
    non_empty("name", &feed.name)?;
    max_len("name", &feed.name, MAX_FEED_NAME_LEN)?;
    if let Some(description) = &feed.description {
        max_len("description", description, MAX_FEED_DESCRIPTION_LEN)?;
    }
    if feed.is_premium {
        non_empty("price", feed.price.as_deref().unwrap_or_default())?;
    }
    Ok(())
}

/// Checks a feed update.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_update_feed(update: &UpdateFeed) -> Result<(), ValidationError> {
    if let Some(name) = &update.name {
        non_empty("name", name)?;
        max_len("name", name, MAX_FEED_NAME_LEN)?;
    }
    if let Some(description) = &update.description {
        max_len("description", description, MAX_FEED_DESCRIPTION_LEN)?;
    }
    Ok(())
}

/// Checks a new entry.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_create_entry(entry: &CreateEntry) -> Result<(), ValidationError> {
    non_empty("content", &entry.content)?;
    non_empty("mime_type", &entry.mime_type)?;
    if let Some(title) = &entry.title {
        max_len("title", title, MAX_ENTRY_TITLE_LEN)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_name_bounds() {
        assert_eq!(
            validate_create_feed(&CreateFeed::new("  ")),
            Err(ValidationError::Empty { field: "name" })
        );
        let long = "x".repeat(MAX_FEED_NAME_LEN + 1);
        assert!(matches!(
            validate_create_feed(&CreateFeed::new(long)),
            Err(ValidationError::TooLong { field: "name", .. })
        ));
        assert!(validate_create_feed(&CreateFeed::new("news")).is_ok());
    }

    #[test]
    fn test_premium_feed_needs_price() {
        let mut feed = CreateFeed::new("paid");
        feed.is_premium = true;
        assert_eq!(
            validate_create_feed(&feed),
            Err(ValidationError::Empty { field: "price" })
        );
        assert!(validate_create_feed(&CreateFeed::new("paid").premium("1000")).is_ok());
    }

    #[test]
    fn test_page_size_range() {
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_entry_requires_content() {
        let mut entry = CreateEntry::text("body");
        assert!(validate_create_entry(&entry).is_ok());
        entry.content.clear();
        assert_eq!(
            validate_create_entry(&entry),
            Err(ValidationError::Empty { field: "content" })
        );
    }

    #[test]
    fn test_dot_segments_are_not_ids() {
        assert!(validate_id("feed_id", "f1").is_ok());
        assert!(validate_id("feed_id", "f1/entries/e1").is_ok());
        assert!(validate_id("feed_id", "...").is_ok());
        assert_eq!(
            validate_id("feed_id", ".."),
            Err(ValidationError::InvalidId {
                field: "feed_id",
                value: "..".to_owned()
            })
        );
        assert!(matches!(
            validate_id("entry_id", "."),
            Err(ValidationError::InvalidId { field: "entry_id", .. })
        ));
    }

    #[test]
    fn test_address_parsing() {
        assert!(validate_address("owner", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_ok());
        assert!(validate_address("owner", "0x1234").is_err());
    }
}
