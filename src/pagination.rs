// Pagination loops for the v2 list endpoints.
//
// The list endpoints take `{"pagination": {"offset", "limit"}}` and answer
// with `{"data": [...], "meta": {"pagination": {"total": n}}}`. Pages are
// requested one after another until `total` items have been collected or
// the server runs out of data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::Result;
use crate::model::{ClientListing, ReportListing};

pub const PAGE_SIZE: usize = 100;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub pagination: PageWindow,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Self {
        PageRequest {
            pagination: PageWindow { offset, limit },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct Page {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Deserialize, Debug, Default)]
struct PageMeta {
    #[serde(default)]
    pagination: Option<PageInfo>,
}

#[derive(Deserialize, Debug, Default)]
struct PageInfo {
    #[serde(default)]
    total: Option<usize>,
}

/// Collect every item of a paginated listing. `fetch_page` performs one
/// request and returns the raw response body.
///
/// Stops when the collected count reaches the reported total, when a page
/// comes back empty, or (if no total is reported) when a page is short.
pub fn fetch_all_pages<F>(mut fetch_page: F) -> Result<Vec<Value>>
where
    F: FnMut(&PageRequest) -> Result<Value>,
{
    let mut items: Vec<Value> = Vec::new();
    loop {
        let request = PageRequest::new(items.len(), PAGE_SIZE);
        let page: Page = serde_json::from_value(fetch_page(&request)?)?;
        let received = page.data.len();
        let total = page.meta.pagination.and_then(|p| p.total);
        items.extend(page.data);
        debug!(received, collected = items.len(), ?total, "fetched page");

        if received == 0 {
            break;
        }
        let done = match total {
            Some(total) => items.len() >= total,
            None => received < PAGE_SIZE,
        };
        if done {
            break;
        }
    }
    Ok(items)
}

/// Items that do not fit `T` are logged and left out.
fn into_typed<T: DeserializeOwned>(kind: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(error = %e, index, "skipping unreadable {} in listing", kind);
                None
            }
        })
        .collect()
}

pub fn get_all_clients(api: &ApiClient) -> Result<Vec<ClientListing>> {
    let raw = fetch_all_pages(|page| Ok(api.list_clients_page(page)?.json))?;
    Ok(into_typed("client", raw))
}

pub fn get_all_reports(api: &ApiClient) -> Result<Vec<ReportListing>> {
    let raw = fetch_all_pages(|page| Ok(api.list_reports_page(page)?.json))?;
    Ok(into_typed("report", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(range: std::ops::Range<usize>) -> Vec<Value> {
        range.map(|i| json!({ "id": i })).collect()
    }

    #[test]
    fn follows_total_across_pages() {
        let mut offsets = Vec::new();
        let all = fetch_all_pages(|req| {
            offsets.push(req.pagination.offset);
            let start = req.pagination.offset;
            let end = (start + req.pagination.limit).min(250);
            Ok(json!({ "data": items(start..end), "meta": { "pagination": { "total": 250 } } }))
        })
        .unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(offsets, vec![0, 100, 200]);
        assert_eq!(all[249], json!({ "id": 249 }));
    }

    #[test]
    fn trusts_total_when_server_caps_page_size() {
        // Server hands out 50 per page regardless of the requested limit.
        let mut calls = 0;
        let all = fetch_all_pages(|req| {
            calls += 1;
            let start = req.pagination.offset;
            let end = (start + 50).min(120);
            Ok(json!({ "data": items(start..end), "meta": { "pagination": { "total": 120 } } }))
        })
        .unwrap();
        assert_eq!(all.len(), 120);
        assert_eq!(calls, 3);
    }

    #[test]
    fn short_page_ends_listing_without_total() {
        let mut calls = 0;
        let all = fetch_all_pages(|_| {
            calls += 1;
            Ok(json!({ "data": items(0..3) }))
        })
        .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(calls, 1);
    }

    #[test]
    fn empty_page_stops_even_if_total_claims_more() {
        let mut calls = 0;
        let all = fetch_all_pages(|req| {
            calls += 1;
            let data = if req.pagination.offset == 0 { items(0..100) } else { vec![] };
            Ok(json!({ "data": data, "meta": { "pagination": { "total": 500 } } }))
        })
        .unwrap();
        assert_eq!(all.len(), 100);
        assert_eq!(calls, 2);
    }

    #[test]
    fn unreadable_items_are_skipped() {
        let raw = vec![
            json!({ "client_id": 1, "name": "Acme", "tags": ["a"] }),
            json!({ "name": "no id" }),
            json!("garbage"),
            json!({ "client_id": 2, "name": "Globex", "tags": null }),
        ];
        let clients: Vec<ClientListing> = into_typed("client", raw);
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[1].name, "Globex");
    }

    #[test]
    fn page_errors_propagate() {
        let result = fetch_all_pages(|_| Err(crate::error::MigrateError::NotAuthenticated));
        assert!(matches!(result, Err(crate::error::MigrateError::NotAuthenticated)));
    }
}
