use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::classifier::extract_video_id;
use crate::config::YouTubeConfig;
use crate::gateway::{FetchError, FetchResult, VideoInfo, YouTubeGateway};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; TelegramBot/1.0)";

/// Subset of the oEmbed response we use.
#[derive(Debug, Default, Deserialize)]
pub struct OEmbed {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// YouTube metadata via the public oEmbed endpoint.
pub struct YouTubeClient {
    client: reqwest::Client,
    config: YouTubeConfig,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build YouTube HTTP client")?;
        Ok(Self { client, config })
    }

    async fn oembed(&self, url: &str) -> FetchResult<OEmbed> {
        debug!("Requesting oEmbed for {}", url);

        let oembed = self
            .client
            .get(&self.config.oembed_endpoint)
            .query(&[("url", url), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json::<OEmbed>()
            .await?;

        Ok(oembed)
    }
}

#[async_trait]
impl YouTubeGateway for YouTubeClient {
    async fn fetch_video_info(&self, url: &str) -> FetchResult<VideoInfo> {
        let video_id = extract_video_id(url)
            .ok_or_else(|| FetchError::NotFound(format!("no video id in {url}")))?;

        let oembed = match self.oembed(url).await {
            Ok(oembed) => Some(oembed),
            Err(e) => {
                warn!("oEmbed lookup failed for {}, using fallback: {}", video_id, e);
                None
            }
        };

        Ok(video_info_from_oembed(&video_id, oembed))
    }
}

pub fn fallback_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

/// Turn an oEmbed answer into a record. A missing answer, or one without a
/// title, yields the synthesised fallback for `video_id`.
pub fn video_info_from_oembed(video_id: &str, oembed: Option<OEmbed>) -> VideoInfo {
    let oembed = oembed.filter(|o| o.title.as_deref().is_some_and(|t| !t.is_empty()));
    let (title, uploader, thumbnail) = match oembed {
        Some(o) => (o.title, o.author_name, o.thumbnail_url),
        None => (None, None, None),
    };

    VideoInfo {
        video_id: video_id.to_string(),
        title: title.unwrap_or_else(|| "YouTube Video".to_string()),
        uploader: uploader.unwrap_or_else(|| "Unknown Channel".to_string()),
        duration: None,
        view_count: None,
        upload_date: "Unknown".to_string(),
        description: None,
        thumbnail: Some(thumbnail.unwrap_or_else(|| fallback_thumbnail(video_id))),
    }
}
