use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;
use std::future::Future;

use super::fetch::PhotoSource;
use crate::error::SourceError;
use crate::state::data::PhotoLink;

/// API method listing the most recent public photos
const METHOD: &str = "flickr.photos.getRecent";
/// Size variants to include with every photo item
const EXTRAS: &str = "url_o,url_m";

/// Photo source backed by the Flickr REST API
#[derive(Debug, Clone)]
pub struct FlickrSource {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl FlickrSource {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// The HTTP client, shared with the tile downloads
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Full request URL for one page
    pub fn page_url(&self, page: u32, page_size: usize) -> Result<Url, SourceError> {
        let page = page.to_string();
        let per_page = page_size.to_string();
        let params = [
            ("method", METHOD),
            ("api_key", self.api_key.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
            ("extras", EXTRAS),
            ("format", "json"),
            ("nojsoncallback", "1"),
        ];

        Url::parse_with_params(&self.api_url, &params)
            .map_err(|e| SourceError::Transport(format!("invalid API url {}: {}", self.api_url, e)))
    }

    async fn fetch(&self, page: u32, page_size: usize) -> Result<Vec<PhotoLink>, SourceError> {
        let url = self.page_url(page, page_size)?;
        debug!("Requesting photo page {} ({} per page)", page, page_size);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Transport(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        parse_photo_page(&body)
    }
}

impl PhotoSource for FlickrSource {
    fn fetch_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<PhotoLink>, SourceError>> + Send {
        self.fetch(page, page_size)
    }
}

/// Top level of a `getRecent` response
#[derive(Deserialize)]
struct Envelope {
    stat: String,
    code: Option<i64>,
    message: Option<String>,
    photos: Option<PhotoList>,
}

#[derive(Deserialize)]
struct PhotoList {
    photo: Vec<PhotoItem>,
}

#[derive(Deserialize)]
struct PhotoItem {
    url_m: Option<String>,
    url_o: Option<String>,
}

impl PhotoItem {
    /// Medium size first, original as fallback
    fn into_link(self) -> PhotoLink {
        let non_empty = |url: &String| !url.is_empty();
        match self.url_m.filter(non_empty).or(self.url_o.filter(non_empty)) {
            Some(url) => PhotoLink::new(url),
            None => PhotoLink::missing(),
        }
    }
}

/// Turn a response body into links, one per photo item, in order
pub fn parse_photo_page(body: &str) -> Result<Vec<PhotoLink>, SourceError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    if envelope.stat != "ok" {
        return Err(SourceError::Api {
            code: envelope.code.unwrap_or_default(),
            message: envelope
                .message
                .unwrap_or_else(|| format!("stat was \"{}\"", envelope.stat)),
        });
    }

    let photos = envelope
        .photos
        .ok_or_else(|| SourceError::Parse("response has no photos".to_string()))?;

    let links: Vec<PhotoLink> = photos.photo.into_iter().map(PhotoItem::into_link).collect();

    let missing = links.iter().filter(|link| link.is_missing()).count();
    if missing > 0 {
        warn!("{} of {} photos came without a usable URL", missing, links.len());
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_carries_all_parameters() {
        let source = FlickrSource::new("https://api.flickr.com/services/rest/", "k3y").unwrap();
        let url = source.page_url(3, 50).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        let expect = |key: &str, value: &str| {
            assert!(
                query.iter().any(|(k, v)| k == key && v == value),
                "missing {}={} in {}",
                key,
                value,
                url
            );
        };
        expect("method", "flickr.photos.getRecent");
        expect("api_key", "k3y");
        expect("page", "3");
        expect("per_page", "50");
        expect("extras", "url_o,url_m");
        expect("format", "json");
        expect("nojsoncallback", "1");
        assert_eq!(url.path(), "/services/rest/");
    }

    #[test]
    fn test_bad_base_url() {
        let source = FlickrSource::new("not a url", "key").unwrap();
        assert!(matches!(source.page_url(1, 50), Err(SourceError::Transport(_))));
    }

    #[test]
    fn test_parse_prefers_medium_size() {
        let body = r#"{
            "stat": "ok",
            "photos": { "page": 1, "photo": [
                { "id": "1", "url_m": "https://live.test/1_m.jpg", "url_o": "https://live.test/1_o.jpg" },
                { "id": "2", "url_o": "https://live.test/2_o.jpg" },
                { "id": "3" },
                { "id": "4", "url_m": "", "url_o": "https://live.test/4_o.jpg" }
            ] }
        }"#;

        let links = parse_photo_page(body).unwrap();
        assert_eq!(
            links,
            vec![
                PhotoLink::new("https://live.test/1_m.jpg"),
                PhotoLink::new("https://live.test/2_o.jpg"),
                PhotoLink::missing(),
                PhotoLink::new("https://live.test/4_o.jpg"),
            ]
        );
    }

    #[test]
    fn test_parse_api_failure() {
        let body = r#"{ "stat": "fail", "code": 100, "message": "Invalid API Key (Key has invalid format)" }"#;
        assert_eq!(
            parse_photo_page(body),
            Err(SourceError::Api {
                code: 100,
                message: "Invalid API Key (Key has invalid format)".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_failure_without_details() {
        let result = parse_photo_page(r#"{ "stat": "weird" }"#);
        assert!(matches!(result, Err(SourceError::Api { code: 0, .. })));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(parse_photo_page("<html>502</html>"), Err(SourceError::Parse(_))));
        assert!(matches!(parse_photo_page(r#"{ "photos": {} }"#), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_parse_ok_without_photos() {
        assert!(matches!(parse_photo_page(r#"{ "stat": "ok" }"#), Err(SourceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let source = FlickrSource::new("http://127.0.0.1:1/rest", "key").unwrap();
        let result = source.fetch_page(1, 50).await;
        assert!(matches!(result, Err(SourceError::Transport(_))));
    }
}
