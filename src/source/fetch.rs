use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::state::data::PhotoLink;

/// Anything that can produce one page of photo links
pub trait PhotoSource: Clone + Send + Sync + 'static {
    /// Fetch the 1-based `page` of `page_size` links, in remote order
    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<PhotoLink>, SourceError>> + Send;
}

/// Identifies one fetch so late completions can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// A page fetch the controller is waiting on
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub id: RequestId,
    /// API page to request
    pub page: u32,
    pub page_size: usize,
    /// Cancelled when the controller stops waiting
    pub cancel: CancellationToken,
}

/// Run `request` against `source`, giving up on cancellation or timeout
pub async fn run_fetch<S: PhotoSource>(
    source: S,
    request: FetchRequest,
    timeout: Duration,
) -> Result<Vec<PhotoLink>, SourceError> {
    let fetch = source.fetch_page(request.page, request.page_size);

    tokio::select! {
        _ = request.cancel.cancelled() => Err(SourceError::Cancelled),
        outcome = tokio::time::timeout(timeout, fetch) => match outcome {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout)),
        },
    }
}
