//! Pagination over [`SocialApi`] page calls.
//!
//! ID lists use the platform's cursor protocol (start at `-1`, stop when the next cursor
//! is `0`). Item lists page backwards with `max_id` until the caller's limit is met.
use crate::api::{IdEndpoint, ItemEndpoint, SocialApi};
use crate::twitter::client::MAX_ITEM_PAGE;
use crate::twitter::error::PlatformError;
use futures::{Stream, TryStreamExt};
use serde_json::Value;

/// Cursor value that asks for the first page.
pub const FIRST_CURSOR: i64 = -1;

/// Stream every page of IDs for `username`, in platform order.
pub fn id_pages<'a>(
    api: &'a dyn SocialApi,
    endpoint: IdEndpoint,
    username: &'a str,
) -> impl Stream<Item = Result<Vec<u64>, PlatformError>> + Send + 'a {
    async_stream::try_stream! {
        let mut cursor = FIRST_CURSOR;
        loop {
            let page = api.id_page(endpoint, username, cursor).await?;
            let last = page.is_last();
            let next = page.next_cursor;
            yield page.ids;
            if last {
                break;
            }
            if next == cursor {
                tracing::warn!(%endpoint, username, cursor, "paginate.ids.cursor_stuck");
                break;
            }
            cursor = next;
        }
    }
}

/// Collect every ID page into one ordered list. No dedup is performed.
pub async fn paginate_ids(
    api: &dyn SocialApi,
    endpoint: IdEndpoint,
    username: &str,
) -> Result<Vec<u64>, PlatformError> {
    let mut pages = Box::pin(id_pages(api, endpoint, username));
    let mut ids = Vec::new();
    let mut page_count = 0usize;
    while let Some(page) = pages.try_next().await? {
        page_count += 1;
        ids.extend(page);
    }
    tracing::debug!(%endpoint, username, pages = page_count, total = ids.len(), "paginate.ids.done");
    Ok(ids)
}

/// Collect up to `limit` items, newest first. Stops early only when the platform runs out.
pub async fn paginate_items(
    api: &dyn SocialApi,
    endpoint: ItemEndpoint,
    username: &str,
    limit: usize,
) -> Result<Vec<Value>, PlatformError> {
    let mut items: Vec<Value> = Vec::with_capacity(limit.min(MAX_ITEM_PAGE as usize * 4));
    let mut max_id: Option<u64> = None;

    while items.len() < limit {
        let remaining = limit - items.len();
        let want = remaining.min(MAX_ITEM_PAGE as usize) as u32;
        let page = api.item_page(endpoint, username, max_id, want).await?;
        if page.is_empty() {
            break;
        }

        let oldest = page
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_u64))
            .min();
        items.extend(page.into_iter().take(remaining));

        match oldest {
            Some(id) if id > 0 => max_id = Some(id - 1),
            _ => break,
        }
    }

    tracing::debug!(%endpoint, username, limit, collected = items.len(), "paginate.items.done");
    Ok(items)
}
