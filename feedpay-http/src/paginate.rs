//! Cursor-driven pagination over list endpoints.

use std::future::Future;

use feedpay::resources::{PageCursor, PageRequest, ResourceBatch};
use feedpay::validation::validate_page_size;
use futures_util::stream::{self, Stream, TryStreamExt};

use crate::error::Error;

/// Turns a list call into a lazy stream of pages.
///
/// `fetch` is called once per page with the page size and the cursor from the
/// previous page. The stream ends after the first page that carries no cursor,
/// or right after yielding an error. Each call to [`Self::pages`] starts over
/// from the first page; nothing is held open between pages, so dropping a
/// stream early needs no cleanup.
#[derive(Debug, Clone)]
pub struct CursorPaginator<F> {
    page_size: u32,
    fetch: F,
}

impl<F, Fut, T> CursorPaginator<F>
where
    F: Fn(PageRequest) -> Fut,
    Fut: Future<Output = Result<ResourceBatch<T>, Error>>,
{
    /// Paginates `fetch` with `page_size` items per page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `page_size` is out of range.
    pub fn new(page_size: u32, fetch: F) -> Result<Self, Error> {
        validate_page_size(page_size)?;
        Ok(Self { page_size, fetch })
    }

    /// Items requested per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// A fresh stream of pages, starting at the first.
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<T>, Error>> + '_ {
        // `Some(cursor)` while a page remains to fetch.
        let start: Option<Option<PageCursor>> = Some(None);
        stream::try_unfold(start, move |state| async move {
            let Some(cursor) = state else {
                return Ok(None);
            };
            let batch = (self.fetch)(PageRequest {
                page_size: self.page_size,
                cursor,
            })
            .await?;

            #[cfg(feature = "telemetry")]
            tracing::trace!(
                items = batch.items.len(),
                more = batch.next_cursor.is_some(),
                "fetched page"
            );

            Ok(Some((batch.items, batch.next_cursor.map(Some))))
        })
    }

    /// A fresh stream of single items across all pages.
    pub fn items(&self) -> impl Stream<Item = Result<T, Error>> + '_ {
        self.pages()
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<T, Error>)))
            .try_flatten()
    }
}
