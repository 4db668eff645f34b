use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::classifier::username_from_content_url;
use crate::config::InstagramConfig;
use crate::gateway::{
    json_bool, json_text, json_u64, FetchError, FetchResult, InstagramGateway, MediaResult,
    ProfileInfo,
};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// HTTP client for the Instagram info/download service.
pub struct InstagramClient {
    client: reqwest::Client,
    config: InstagramConfig,
}

impl InstagramClient {
    pub fn new(config: InstagramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build Instagram HTTP client")?;
        Ok(Self { client, config })
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> FetchResult<Value> {
        debug!("Requesting {} with {:?}", endpoint, query);

        let body = self
            .client
            .get(endpoint)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }

    async fn download(&self, target_url: &str) -> FetchResult<Value> {
        self.get_json(&self.config.download_endpoint, &[("url", target_url)])
            .await
    }
}

#[async_trait]
impl InstagramGateway for InstagramClient {
    async fn fetch_profile(&self, username: &str) -> FetchResult<ProfileInfo> {
        let data = self
            .get_json(&self.config.profile_endpoint, &[("username", username)])
            .await
            .inspect_err(|e| warn!("Failed to fetch Instagram profile for {}: {}", username, e))?;
        parse_profile(&data, username)
    }

    async fn fetch_stories(&self, username: &str) -> FetchResult<MediaResult> {
        let stories_url = format!("https://www.instagram.com/stories/{username}/");
        let data = self
            .download(&stories_url)
            .await
            .inspect_err(|e| warn!("Failed to fetch Instagram stories for {}: {}", username, e))?;
        parse_media(&data, "unknown", || username.to_string())
    }

    async fn fetch_content(&self, url: &str) -> FetchResult<MediaResult> {
        let data = self
            .download(url)
            .await
            .inspect_err(|e| warn!("Failed to fetch Instagram content for {}: {}", url, e))?;
        parse_media(&data, "post", || username_from_content_url(url))
    }
}

/// Build a profile from the info service response. A body without a
/// `username` key is treated as an unknown account.
pub fn parse_profile(data: &Value, requested: &str) -> FetchResult<ProfileInfo> {
    let Some(username) = data.get("username").filter(|v| !v.is_null()) else {
        return Err(FetchError::NotFound(format!(
            "profile response for {requested} has no username"
        )));
    };

    Ok(ProfileInfo {
        username: json_text(Some(username)).unwrap_or_else(|| requested.to_string()),
        full_name: json_text(data.get("full_name")).unwrap_or_else(|| "N/A".to_string()),
        follower_count: json_u64(data.get("follower_count")),
        following_count: json_u64(data.get("following_count")),
        id: json_text(data.get("id")).unwrap_or_else(|| "N/A".to_string()),
        is_private: json_bool(data.get("is_private")),
        is_verified: json_bool(data.get("is_verified")),
        media_count: json_u64(data.get("media_count")),
        external_url: json_text(data.get("external_url")),
        bio: json_text(data.get("bio")).unwrap_or_else(|| "No bio available".to_string()),
        country: json_text(data.get("country")).unwrap_or_else(|| "Unknown".to_string()),
        profile_pic_url: json_text(data.get("profile_pic_url")).unwrap_or_default(),
    })
}

/// Build a media result from the download service response. Links that are
/// not absolute URLs are dropped; nothing left means not found.
pub fn parse_media(
    data: &Value,
    default_kind: &str,
    fallback_username: impl FnOnce() -> String,
) -> FetchResult<MediaResult> {
    let raw_links = data
        .get("download_links")
        .and_then(Value::as_array)
        .filter(|links| !links.is_empty())
        .ok_or_else(|| FetchError::NotFound("response has no download links".to_string()))?;

    let links: Vec<String> = raw_links
        .iter()
        .filter_map(Value::as_str)
        .filter(|link| is_valid_link(link))
        .map(str::to_string)
        .collect();

    if links.is_empty() {
        return Err(FetchError::NotFound(
            "response has no valid download links".to_string(),
        ));
    }

    Ok(MediaResult {
        kind: json_text(data.get("type")).unwrap_or_else(|| default_kind.to_string()),
        links,
        username: json_text(data.get("username")).unwrap_or_else(fallback_username),
        title: json_text(data.get("title")),
        description: json_text(data.get("description")),
    })
}

fn is_valid_link(link: &str) -> bool {
    Url::parse(link).is_ok_and(|u| u.has_host())
}
