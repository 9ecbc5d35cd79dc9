//! Stock media search and download.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use reel_models::{AssetKind, AssetSize, Orientation};

use crate::error::{check_status, ProviderError, ProviderResult};

/// One search request for a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuery {
    pub tags: Vec<String>,
    pub count: usize,
    pub orientation: Orientation,
    pub size: AssetSize,
}

impl StockQuery {
    pub fn new(tags: Vec<String>, count: usize) -> Self {
        Self {
            tags,
            count,
            orientation: Orientation::default(),
            size: AssetSize::default(),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_size(mut self, size: AssetSize) -> Self {
        self.size = size;
        self
    }

    /// Search text. Spaces end up as `+` once form-encoded.
    pub fn text(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A search hit, not yet downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct StockItem {
    pub url: String,
    pub kind: AssetKind,
    /// Reported clip length; `None` for images
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[async_trait]
pub trait StockMediaSource: Send + Sync {
    async fn search_images(&self, query: &StockQuery) -> ProviderResult<Vec<StockItem>>;

    async fn search_videos(&self, query: &StockQuery) -> ProviderResult<Vec<StockItem>>;

    /// Download `url` to `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> ProviderResult<u64>;
}

#[derive(Debug, Clone)]
pub struct PexelsConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.pexels.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl PexelsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("PEXELS_API_KEY").unwrap_or_default(),
            base_url: std::env::var("PEXELS_BASE_URL").unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(
                std::env::var("PEXELS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PhotoSearch {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    width: Option<u32>,
    height: Option<u32>,
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    original: String,
}

#[derive(Debug, Deserialize)]
struct VideoSearch {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<f64>,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
}

/// Pexels photo and video search.
pub struct PexelsClient {
    http: Client,
    config: PexelsConfig,
}

impl PexelsClient {
    pub fn new(config: PexelsConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("PEXELS_API_KEY"));
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(PexelsConfig::from_env())
    }

    async fn search<T>(&self, endpoint: &str, query: &StockQuery) -> ProviderResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let per_page = query.count.to_string();

        debug!(endpoint, query = %query.text(), count = query.count, "Searching stock media");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.config.api_key)
            .query(&[
                ("query", query.text().as_str()),
                ("per_page", per_page.as_str()),
                ("orientation", query.orientation.as_str()),
                ("size", query.size.as_str()),
            ])
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

#[async_trait]
impl StockMediaSource for PexelsClient {
    async fn search_images(&self, query: &StockQuery) -> ProviderResult<Vec<StockItem>> {
        if query.count == 0 {
            return Ok(Vec::new());
        }

        let result: PhotoSearch = self.search("/v1/search", query).await?;
        Ok(result
            .photos
            .into_iter()
            .take(query.count)
            .map(|photo| StockItem {
                url: photo.src.original,
                kind: AssetKind::Image,
                duration: None,
                width: photo.width,
                height: photo.height,
            })
            .collect())
    }

    async fn search_videos(&self, query: &StockQuery) -> ProviderResult<Vec<StockItem>> {
        if query.count == 0 {
            return Ok(Vec::new());
        }

        let result: VideoSearch = self.search("/videos/search", query).await?;
        Ok(result
            .videos
            .into_iter()
            .filter_map(|video| {
                let Some(file) = video.video_files.into_iter().next() else {
                    warn!("Skipping stock video without files");
                    return None;
                };
                Some(StockItem {
                    url: file.link,
                    kind: AssetKind::Video,
                    duration: video.duration,
                    width: video.width,
                    height: video.height,
                })
            })
            .take(query.count)
            .collect())
    }

    async fn download(&self, url: &str, dest: &Path) -> ProviderResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = check_status(self.http.get(url).send().await?).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, dest = %dest.display(), bytes = written, "Downloaded stock asset");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PexelsClient {
        PexelsClient::new(PexelsConfig {
            api_key: "pexels-key".to_string(),
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    fn query(count: usize) -> StockQuery {
        StockQuery::new(vec!["black coat".to_string(), " man ".to_string()], count)
            .with_orientation(Orientation::Portrait)
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            PexelsClient::new(PexelsConfig::default()),
            Err(ProviderError::MissingApiKey("PEXELS_API_KEY"))
        ));
    }

    #[test]
    fn test_query_text() {
        assert_eq!(query(1).text(), "black coat man");
    }

    #[tokio::test]
    async fn test_search_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("authorization", "pexels-key"))
            .and(query_param("query", "black coat man"))
            .and(query_param("per_page", "2"))
            .and(query_param("orientation", "portrait"))
            .and(query_param("size", "medium"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": [
                    {"width": 1080, "height": 1920, "src": {"original": "https://img/1.jpg"}},
                    {"width": 800, "height": 1200, "src": {"original": "https://img/2.jpg"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = client(&server).search_images(&query(2)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://img/1.jpg");
        assert_eq!(items[0].kind, AssetKind::Image);
        assert_eq!(items[0].duration, None);
    }

    #[tokio::test]
    async fn test_search_videos_skips_entries_without_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videos": [
                    {"width": 1920, "height": 1080, "duration": 12, "video_files": []},
                    {"width": 1920, "height": 1080, "duration": 7,
                     "video_files": [{"link": "https://vid/2.mp4"}, {"link": "https://vid/2-sd.mp4"}]}
                ]
            })))
            .mount(&server)
            .await;

        let items = client(&server).search_videos(&query(3)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://vid/2.mp4");
        assert_eq!(items[0].duration, Some(7.0));
    }

    #[tokio::test]
    async fn test_zero_count_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let items = client(&server).search_videos(&query(0)).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_download_streams_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("p0/img/0.jpg");
        let written = client(&server)
            .download(&format!("{}/files/a.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 4096);
        assert_eq!(tokio::fs::read(&dest).await.unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server).search_images(&query(1)).await.unwrap_err();
        assert!(matches!(err, ProviderError::ServerError(502, _)));
        assert!(err.is_retryable());
    }
}
