use std::marker::PhantomData;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::models::Page;
use crate::BambooClient;

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            size: 0,
            start_index: 0,
            max_result: 0,
            items: Vec::new(),
        }
    }
}

fn check_page_budget(limit: Option<usize>, fetched: usize) -> Result<()> {
    match limit {
        Some(limit) if fetched >= limit => Err(ApiError::PageLimitExceeded { limit }),
        _ => Ok(()),
    }
}

/// Walks an offset-paged collection. Pages are requested strictly one after
/// another, each at the `start-index + max-result` of the previous one.
///
/// An empty first page is a failure (`empty_error`), never an empty success.
/// Emptiness is only checked on the first page.
#[async_trait]
pub trait Paginator<T>: Sync {
    async fn fetch_page(&self, start_index: u64) -> Result<Page<T>>;

    fn empty_error(&self) -> ApiError {
        ApiError::EmptyResult
    }

    /// Upper bound on the number of requests. `None` walks until the server
    /// reports the end.
    fn max_pages(&self) -> Option<usize> {
        None
    }

    async fn fetch_all(&self) -> Result<Vec<T>>
    where
        T: Send,
    {
        let mut all_items = Vec::new();
        let mut start_index = 0;
        let mut fetched = 0;

        loop {
            check_page_budget(self.max_pages(), fetched)?;

            debug!(start_index, "Fetching page");
            let page = self.fetch_page(start_index).await?;
            fetched += 1;

            if fetched == 1 && page.items.is_empty() {
                return Err(self.empty_error());
            }

            let next_start = page.next_start();
            all_items.extend(page.items);

            match next_start {
                Some(next) => start_index = next,
                None => break,
            }
        }

        debug!(total_items = all_items.len(), pages = fetched, "Finished pagination");
        Ok(all_items)
    }

    /// Scans items in server order and stops at the first match, requesting
    /// the next page only when the current one has none. `Ok(None)` means the
    /// collection was exhausted without a match.
    async fn find_first<F>(&self, predicate: F) -> Result<Option<T>>
    where
        T: Send,
        F: Fn(&T) -> bool + Send + Sync,
    {
        let mut start_index = 0;
        let mut fetched = 0;

        loop {
            check_page_budget(self.max_pages(), fetched)?;

            debug!(start_index, "Searching page");
            let page = self.fetch_page(start_index).await?;
            fetched += 1;

            if fetched == 1 && page.items.is_empty() {
                return Err(self.empty_error());
            }

            let next_start = page.next_start();
            if let Some(found) = page.items.into_iter().find(|item| predicate(item)) {
                return Ok(Some(found));
            }

            match next_start {
                Some(next) => start_index = next,
                None => return Ok(None),
            }
        }
    }

    fn stream<'a>(&'a self) -> Pin<Box<dyn Stream<Item = Result<Vec<T>>> + Send + 'a>>
    where
        T: Send + 'a,
    {
        Box::pin(async_stream::stream! {
            let mut start_index = 0;
            let mut fetched = 0;

            loop {
                if let Err(err) = check_page_budget(self.max_pages(), fetched) {
                    yield Err(err);
                    break;
                }

                debug!(start_index, "Fetching page in stream");
                match self.fetch_page(start_index).await {
                    Ok(page) => {
                        fetched += 1;

                        if fetched == 1 && page.items.is_empty() {
                            yield Err(self.empty_error());
                            break;
                        }

                        let next_start = page.next_start();
                        yield Ok(page.items);

                        match next_start {
                            Some(next) => start_index = next,
                            None => break,
                        }
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}

/// Collects pages until the collection ends or `limit` items were gathered.
pub async fn collect_pages<T, P: Paginator<T>>(paginator: &P, limit: Option<usize>) -> Result<Vec<T>>
where
    T: Send,
{
    let mut stream = paginator.stream();
    let mut all_items = Vec::new();

    while let Some(result) = stream.next().await {
        let items = result?;
        all_items.extend(items);

        if let Some(limit) = limit {
            if all_items.len() >= limit {
                all_items.truncate(limit);
                break;
            }
        }
    }

    Ok(all_items)
}

/// HTTP-backed paginator over one of the server's paged envelopes
/// (`{"results": {...}}` or `{"plans": {...}}`).
pub struct EnvelopePager<'a, T> {
    client: &'a BambooClient,
    path: String,
    params: Option<String>,
    envelope: &'static str,
    empty_error: fn() -> ApiError,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T> EnvelopePager<'a, T> {
    pub(crate) fn new(
        client: &'a BambooClient,
        path: String,
        params: Option<&str>,
        envelope: &'static str,
        empty_error: fn() -> ApiError,
    ) -> Self {
        Self {
            client,
            path,
            params: params.map(str::to_string),
            envelope,
            empty_error,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<'a, T> Paginator<T> for EnvelopePager<'a, T>
where
    T: DeserializeOwned + Send,
{
    async fn fetch_page(&self, start_index: u64) -> Result<Page<T>> {
        let url = self
            .client
            .endpoint_url(&self.path, self.params.as_deref(), start_index)?;
        let mut body: Value = self.client.get_json(url).await?;

        match body.get_mut(self.envelope).map(Value::take) {
            None | Some(Value::Null) => Ok(Page::default()),
            Some(raw) => Ok(serde_json::from_value(raw)?),
        }
    }

    fn empty_error(&self) -> ApiError {
        (self.empty_error)()
    }

    fn max_pages(&self) -> Option<usize> {
        self.client.options().max_pages
    }
}
