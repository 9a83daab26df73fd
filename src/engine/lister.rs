//! Cursor lister
//!
//! Wraps a backend's paginated listing call into a restartable page
//! sequence. The stream starts with no cursor and threads each page's
//! continuation token back verbatim; it is restartable only from the
//! beginning, since cursors are not seekable.

use crate::error::Result;
use crate::storage::{ListOptions, ListPage, StorageBackend};

/// Restartable sequence of listing pages for one traversal.
pub struct PageStream<'a> {
    backend: &'a dyn StorageBackend,
    path: String,
    recursive: bool,
    page_size_limit: usize,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a> PageStream<'a> {
    /// Start a page sequence at `path`.
    pub fn new(
        backend: &'a dyn StorageBackend,
        path: impl Into<String>,
        recursive: bool,
        page_size_limit: usize,
    ) -> Self {
        Self {
            backend,
            path: path.into(),
            recursive,
            page_size_limit,
            cursor: None,
            exhausted: false,
        }
    }

    /// Request the next page, or `None` once the listing is exhausted.
    ///
    /// The final page (the one without a continuation token) is still
    /// returned so its items get processed; only the call after it yields
    /// `None`. A listing error fails the whole traversal, no retry here.
    pub async fn next_page(&mut self) -> Result<Option<ListPage>> {
        if self.exhausted {
            return Ok(None);
        }

        let options = ListOptions {
            recursive: self.recursive,
            page_size_limit: self.page_size_limit,
            cursor: self.cursor.clone(),
        };
        let page = self.backend.list(&self.path, &options).await?;

        match page.continuation() {
            Some(token) => self.cursor = Some(token.to_string()),
            None => self.exhausted = true,
        }

        Ok(Some(page))
    }

    /// The cursor that will be sent with the next request, if any.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::ScriptedBackend;

    #[tokio::test]
    async fn test_visits_every_page_in_cursor_order() {
        let backend = ScriptedBackend::with_page_sizes("t", "src", &[3, 3, 1]);
        let mut stream = PageStream::new(&backend, "", true, 5000);

        let mut pages = 0;
        let mut items = 0;
        while let Some(page) = stream.next_page().await.unwrap() {
            pages += 1;
            items += page.items.len();
        }
        assert_eq!(pages, 3);
        assert_eq!(items, 7);

        // Exhausted streams stay exhausted.
        assert!(stream.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_final_page_items_are_still_returned() {
        let backend = ScriptedBackend::with_page_sizes("t", "src", &[2]);
        let mut stream = PageStream::new(&backend, "", true, 5000);

        let only = stream.next_page().await.unwrap().unwrap();
        assert_eq!(only.items.len(), 2);
        assert_eq!(only.continuation(), None);
        assert!(stream.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_error_propagates() {
        let backend =
            ScriptedBackend::with_page_sizes("t", "src", &[2, 2]).failing_on_request(1);
        let mut stream = PageStream::new(&backend, "", true, 5000);

        assert!(stream.next_page().await.is_ok());
        assert!(stream.next_page().await.is_err());
    }

    #[test]
    fn test_single_empty_namespace() {
        let backend = ScriptedBackend::with_page_sizes("t", "src", &[0]);
        let mut stream = PageStream::new(&backend, "", true, 5000);
        let page = tokio_test::block_on(stream.next_page()).unwrap().unwrap();
        assert!(page.items.is_empty());
        assert!(tokio_test::block_on(stream.next_page()).unwrap().is_none());
    }
}
