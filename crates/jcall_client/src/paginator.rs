//! Page-by-page iteration flattened into one item stream.

use crate::RequestExecutor;
use async_stream::stream;
use futures_util::Stream;
use jcall_core::{ApiResponse, PageCursor, RequestDescriptor};
use jcall_error::ApiError;
use serde_json::Value;
use tracing::{debug, trace};

/// Stream every item of a paginated endpoint.
///
/// Pages are fetched one at a time, in order, only when the consumer asks for
/// more items. The page number is injected under the cursor's page field
/// (query string for reads, body for write-style endpoints). Iteration ends at
/// the first page whose items field is missing or empty, once the cursor's
/// `max_items` have been yielded, or after the first error, which is yielded
/// as the final element.
///
/// Dropping the stream stops further page requests.
pub fn paginate(
    executor: &RequestExecutor,
    template: RequestDescriptor,
    cursor: PageCursor,
) -> impl Stream<Item = Result<Value, ApiError>> + '_ {
    stream! {
        let mut cursor = cursor;
        let location = template.page_location();

        while !cursor.is_exhausted() {
            let mut request = template.clone();
            request.set_param(location, cursor.page_field().clone(), *cursor.page());
            debug!(path = %request.path(), page = *cursor.page(), "Fetching page");

            let body = match executor.send(&request).await.and_then(ApiResponse::into_json) {
                Ok(body) => body,
                Err(e) => {
                    yield Err(e);
                    break;
                }
            };

            let items = match take_items(body, cursor.items_field()) {
                Some(items) => items,
                None => {
                    debug!(page = *cursor.page(), yielded = *cursor.yielded(), "No more items");
                    break;
                }
            };
            trace!(count = items.len(), "Page received");

            for item in items {
                if cursor.is_exhausted() {
                    break;
                }
                cursor.record_yield();
                yield Ok(item);
            }
            cursor.advance();
        }
    }
}

fn take_items(body: Value, items_field: &str) -> Option<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove(items_field) {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => None,
        },
        _ => None,
    }
}
