pub mod instagram;
pub mod youtube;

use async_trait::async_trait;
use serde_json::Value;

/// Why a provider lookup produced nothing usable. The router reports every
/// variant to the user the same way, as "not found".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Instagram account summary. Every field is filled, with provider omissions
/// replaced by defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInfo {
    pub username: String,
    pub full_name: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub id: String,
    pub is_private: bool,
    pub is_verified: bool,
    pub media_count: u64,
    pub external_url: Option<String>,
    pub bio: String,
    pub country: String,
    pub profile_pic_url: String,
}

/// Downloadable media behind a story, post, or reel. `links` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaResult {
    pub kind: String,
    pub links: Vec<String>,
    pub username: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl MediaResult {
    pub fn count(&self) -> usize {
        self.links.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub uploader: String,
    /// Seconds; `None` when the provider does not report it.
    pub duration: Option<u64>,
    pub view_count: Option<u64>,
    pub upload_date: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

#[async_trait]
pub trait InstagramGateway: Send + Sync {
    async fn fetch_profile(&self, username: &str) -> FetchResult<ProfileInfo>;
    async fn fetch_stories(&self, username: &str) -> FetchResult<MediaResult>;
    async fn fetch_content(&self, url: &str) -> FetchResult<MediaResult>;
}

#[async_trait]
pub trait YouTubeGateway: Send + Sync {
    /// Fails only when `url` carries no video id; provider trouble degrades
    /// to a synthesised record instead.
    async fn fetch_video_info(&self, url: &str) -> FetchResult<VideoInfo>;
}

// Lenient readers for provider JSON, which mixes numbers and numeric strings.

pub(crate) fn json_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn json_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        _ => false,
    }
}

/// String or number rendered as text; `None` for null, missing, or empty.
pub(crate) fn json_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
