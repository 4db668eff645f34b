use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Environment variable that overrides `telegram.bot_token`.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Lower bound for the gap between individually paced media sends.
pub const MIN_PACING_MS: u64 = 500;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub instagram: InstagramConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_welcome_photo")]
    pub welcome_photo: String,
    #[serde(default = "default_owner_url")]
    pub owner_url: String,
    #[serde(default = "default_channel_url")]
    pub channel_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InstagramConfig {
    #[serde(default = "default_profile_endpoint")]
    pub profile_endpoint: String,
    #[serde(default = "default_download_endpoint")]
    pub download_endpoint: String,
    #[serde(default = "default_instagram_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeConfig {
    #[serde(default = "default_oembed_endpoint")]
    pub oembed_endpoint: String,
    #[serde(default = "default_youtube_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeliveryConfig {
    /// Gap awaited before each individually sent media item past the first group.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

fn default_welcome_photo() -> String {
    "https://t.me/pyluck/539".to_string()
}

fn default_owner_url() -> String {
    "https://t.me/Glllaxy".to_string()
}

fn default_channel_url() -> String {
    "https://t.me/+oTUyrmFwQsE4YTdl".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_profile_endpoint() -> String {
    "http://145.223.80.56:5091/instagram_info".to_string()
}

fn default_download_endpoint() -> String {
    "http://145.223.80.56:5085/download_instagram".to_string()
}

fn default_instagram_timeout() -> u64 {
    30
}

fn default_oembed_endpoint() -> String {
    "https://www.youtube.com/oembed".to_string()
}

fn default_youtube_timeout() -> u64 {
    15
}

fn default_pacing_ms() -> u64 {
    MIN_PACING_MS
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            welcome_photo: default_welcome_photo(),
            owner_url: default_owner_url(),
            channel_url: default_channel_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            webhook_path: default_webhook_path(),
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            profile_endpoint: default_profile_endpoint(),
            download_endpoint: default_download_endpoint(),
            timeout_secs: default_instagram_timeout(),
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            oembed_endpoint: default_oembed_endpoint(),
            timeout_secs: default_youtube_timeout(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl InstagramConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl YouTubeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DeliveryConfig {
    /// Pacing interval, clamped so a misconfigured value cannot go below the platform limit.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_ms.max(MIN_PACING_MS))
    }
}

impl Config {
    /// Load the TOML file at `path` (defaults when it does not exist), then
    /// apply the `TELEGRAM_BOT_TOKEN` override.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Config::default()
        };

        config.apply_token_override(std::env::var(TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    /// A non-empty token from the environment wins over the file.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.map(|t| t.trim().to_string()) {
            if !token.is_empty() {
                self.telegram.bot_token = token;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!(
                "Telegram bot token is missing: set [telegram] bot_token or {}",
                TOKEN_ENV
            );
        }
        if !self.server.webhook_path.starts_with('/') {
            anyhow::bail!(
                "server.webhook_path must start with '/': {}",
                self.server.webhook_path
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.webhook_path, "/webhook");
        assert_eq!(config.instagram.timeout(), Duration::from_secs(30));
        assert_eq!(config.youtube.timeout(), Duration::from_secs(15));
        assert_eq!(config.delivery.pacing_interval(), Duration::from_millis(500));
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = Config::parse(
            r#"
[telegram]
bot_token = "123:abc"
webhook_url = "https://example.com/webhook"

[server]
bind_address = "127.0.0.1:9000"

[youtube]
timeout_secs = 5
"#,
        )
        .unwrap();
        // webhook_url belongs to set_webhook and is skipped here
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.owner_url, "https://t.me/Glllaxy");
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.webhook_path, "/webhook");
        assert_eq!(config.youtube.timeout_secs, 5);
    }

    #[test]
    fn test_env_token_overrides_file() {
        let mut config = Config::parse("[telegram]\nbot_token = \"file\"").unwrap();
        config.apply_token_override(Some("env-token".to_string()));
        assert_eq!(config.telegram.bot_token, "env-token");
    }

    #[test]
    fn test_blank_env_token_is_ignored() {
        let mut config = Config::parse("[telegram]\nbot_token = \"file\"").unwrap();
        config.apply_token_override(Some("   ".to_string()));
        assert_eq!(config.telegram.bot_token, "file");
        config.apply_token_override(None);
        assert_eq!(config.telegram.bot_token, "file");
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_path_must_be_absolute() {
        let mut config = Config::default();
        config.telegram.bot_token = "t".to_string();
        config.server.webhook_path = "webhook".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pacing_never_below_minimum() {
        let config = Config::parse("[delivery]\npacing_ms = 10").unwrap();
        assert_eq!(config.delivery.pacing_interval(), Duration::from_millis(500));
    }
}
