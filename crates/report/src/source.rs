use std::future::Future;

use async_stream::try_stream;
use thiserror::Error;
use timesheet_core::{DateRange, RawEntry};
use tokio_stream::Stream;

/// One page of entries as returned by the remote reporting API.
#[derive(Debug, Clone, Default)]
pub struct EntryPage {
    pub entries: Vec<RawEntry>,
    /// Error payload embedded in the response, if any.
    pub error: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Time tracker reported an error: {0}")]
    Api(String),
    #[error("Time tracker request failed: {0}")]
    Transport(String),
}

/// Transport for a paged entry listing.
pub trait PageFetcher {
    /// Fetches page `page` (1-based) of the entries within `range`.
    fn fetch_page(
        &self,
        range: DateRange,
        page: u32,
    ) -> impl Future<Output = Result<EntryPage, SourceError>> + Send;
}

/// Walks a [`PageFetcher`] page by page, yielding entries as they arrive.
pub struct PagedEntrySource<F> {
    fetcher: F,
}

impl<F: PageFetcher> PagedEntrySource<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Streams every entry in `range`, starting again from page 1.
    ///
    /// Pages are requested one at a time. The stream ends at the first empty
    /// page and stops with an error on the first error payload.
    pub fn entries(
        &self,
        range: DateRange,
    ) -> impl Stream<Item = Result<RawEntry, SourceError>> + '_ {
        try_stream! {
            let mut page: u32 = 1;
            loop {
                tracing::debug!(page, "Requesting entries page");
                let result = self.fetcher.fetch_page(range, page).await?;
                if let Some(message) = result.error {
                    Err::<(), _>(SourceError::Api(message))?;
                }
                if result.entries.is_empty() {
                    break;
                }
                for entry in result.entries {
                    yield entry;
                }
                page += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entry, range, ScriptedFetcher};
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn yields_entries_across_pages_in_order() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![entry("A", "one"), entry("A", "two")]),
            Ok(vec![entry("B", "three")]),
            Ok(vec![]),
        ]);
        let source = PagedEntrySource::new(fetcher);
        let entries: Vec<_> = source.entries(range()).collect().await;
        let descriptions: Vec<_> = entries
            .into_iter()
            .map(|e| e.unwrap().description)
            .collect();
        assert_eq!(descriptions, ["one", "two", "three"]);
        assert_eq!(source.fetcher().calls(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn stops_at_first_empty_page() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![entry("A", "one")]),
            Ok(vec![]),
            Ok(vec![entry("A", "never")]),
        ]);
        let source = PagedEntrySource::new(fetcher);
        let count = source.entries(range()).collect::<Vec<_>>().await.len();
        assert_eq!(count, 1);
        assert_eq!(source.fetcher().calls(), [1, 2]);
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let source = PagedEntrySource::new(ScriptedFetcher::new(vec![]));
        assert!(source.entries(range()).collect::<Vec<_>>().await.is_empty());
    }

    #[tokio::test]
    async fn error_payload_terminates_stream() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![entry("A", "one")]),
            Err("rate limited".to_string()),
            Ok(vec![entry("A", "never")]),
        ]);
        let source = PagedEntrySource::new(fetcher);
        let results: Vec<_> = source.entries(range()).collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].clone().unwrap_err(),
            SourceError::Api("rate limited".to_string())
        );
        assert_eq!(source.fetcher().calls(), [1, 2]);
    }

    #[tokio::test]
    async fn each_call_restarts_from_first_page() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vec![entry("A", "one")]), Ok(vec![])]);
        let source = PagedEntrySource::new(fetcher);
        let _ = source.entries(range()).collect::<Vec<_>>().await;
        let _ = source.entries(range()).collect::<Vec<_>>().await;
        assert_eq!(source.fetcher().calls(), [1, 2, 1, 2]);
    }
}
