/// Remote photo data
///
/// This module handles:
/// - The `PhotoSource` seam and its Flickr implementation (flickr.rs)
/// - Fetch requests with cancellation and timeout (fetch.rs)
/// - Downloading and scaling tile images (thumbnail.rs)

pub mod fetch;
pub mod flickr;
pub mod thumbnail;

pub use fetch::{run_fetch, FetchRequest, RequestId};
pub use flickr::FlickrSource;
