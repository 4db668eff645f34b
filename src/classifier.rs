//! Recognition and normalisation of free-text input: commands, Instagram
//! usernames, and Instagram/YouTube URLs.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Instagram caps usernames at 30 characters.
pub const MAX_USERNAME_LEN: usize = 30;

const YOUTUBE_MARKERS: [&str; 2] = ["youtube.com", "youtu.be"];
const INSTAGRAM_MARKERS: [&str; 2] = ["instagram.com", "instagr.am"];

static USERNAME_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?[A-Za-z0-9._]+$").expect("valid username regex"));

static STRICT_USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._]{1,30}$").expect("valid username regex"));

static VIDEO_ID_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([A-Za-z0-9_-]{11})",
        r"youtube\.com/shorts/([A-Za-z0-9_-]{11})",
        r"m\.youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
    ]
    .map(|p| Regex::new(p).expect("valid video id regex"))
});

static STORY_USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"instagram\.com/stories/([^/?]+)").expect("valid story regex"));

static CONTENT_USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"instagram\.com/(?:p/|reel/|tv/)?(?:.*/)?(@?[A-Za-z0-9._]+)")
        .expect("valid content regex")
});

/// What a free-text message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    StartCommand,
    YouTubeUrl(String),
    InstagramUrl(String),
    Username(String),
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Instagram,
}

impl Platform {
    pub fn hosts(self) -> &'static [&'static str] {
        match self {
            Platform::YouTube => &[
                "youtube.com",
                "www.youtube.com",
                "m.youtube.com",
                "youtu.be",
                "music.youtube.com",
            ],
            Platform::Instagram => &[
                "instagram.com",
                "www.instagram.com",
                "instagr.am",
                "www.instagr.am",
            ],
        }
    }
}

/// Classify a message text. Empty text yields `None` and is ignored.
///
/// URL markers are substring checks and run before the username pattern, so
/// `youtube.com` alone is a URL, not a username.
pub fn classify_message_text(text: &str) -> Option<Intent> {
    if text.is_empty() {
        return None;
    }
    if text == "/start" {
        return Some(Intent::StartCommand);
    }
    if YOUTUBE_MARKERS.iter().any(|m| text.contains(m)) {
        return Some(Intent::YouTubeUrl(text.to_string()));
    }
    if INSTAGRAM_MARKERS.iter().any(|m| text.contains(m)) {
        return Some(Intent::InstagramUrl(text.to_string()));
    }
    if USERNAME_TEXT_RE.is_match(text) {
        let handle = text.strip_prefix('@').unwrap_or(text);
        return Some(Intent::Username(handle.to_string()));
    }
    Some(Intent::Unrecognized(text.to_string()))
}

pub fn is_valid_username(s: &str) -> bool {
    let s = s.strip_prefix('@').unwrap_or(s);
    STRICT_USERNAME_RE.is_match(s)
}

/// Best-effort cleanup before a username is handed to a gateway. Never fails;
/// the result may be empty.
pub fn sanitize_username(s: &str) -> String {
    let s = s.strip_prefix('@').unwrap_or(s).trim();
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .take(MAX_USERNAME_LEN)
        .collect()
}

pub fn is_valid_platform_url(url: &str, platform: Platform) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    if !platform.hosts().contains(&host.as_str()) {
        return false;
    }
    match platform {
        Platform::YouTube => extract_video_id(url).is_some(),
        Platform::Instagram => true,
    }
}

pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RES
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Username segment of a `/stories/<user>/...` URL. Well-formed URLs on a
/// known Instagram host are read by path segment; anything else falls back
/// to matching `instagram.com/stories/<user>` in the raw text.
pub fn extract_story_username(url: &str) -> Option<String> {
    if is_valid_platform_url(url, Platform::Instagram) {
        let parsed = Url::parse(url).ok()?;
        let mut segments = parsed.path_segments()?;
        return match (segments.next(), segments.next()) {
            (Some("stories"), Some(user)) if !user.is_empty() => Some(user.to_string()),
            _ => None,
        };
    }
    STORY_USERNAME_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Recover the account a post/reel URL belongs to when the provider did not
/// report one.
pub fn username_from_content_url(url: &str) -> String {
    CONTENT_USERNAME_RE
        .captures(url)
        .map(|caps| caps[1].trim_start_matches('@').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_command() {
        assert_eq!(classify_message_text("/start"), Some(Intent::StartCommand));
    }

    #[test]
    fn test_empty_text_is_ignored() {
        assert_eq!(classify_message_text(""), None);
    }

    #[test]
    fn test_username_strips_at() {
        assert_eq!(
            classify_message_text("@cristiano"),
            Some(Intent::Username("cristiano".to_string()))
        );
        assert_eq!(
            classify_message_text("leo.messi_10"),
            Some(Intent::Username("leo.messi_10".to_string()))
        );
    }

    #[test]
    fn test_youtube_markers_win_over_username_shape() {
        assert_eq!(
            classify_message_text("youtube.com"),
            Some(Intent::YouTubeUrl("youtube.com".to_string()))
        );
        assert_eq!(
            classify_message_text("https://youtu.be/dQw4w9WgXcQ"),
            Some(Intent::YouTubeUrl("https://youtu.be/dQw4w9WgXcQ".to_string()))
        );
    }

    #[test]
    fn test_youtube_checked_before_instagram() {
        let text = "https://instagram.com/?next=youtube.com";
        assert_eq!(
            classify_message_text(text),
            Some(Intent::YouTubeUrl(text.to_string()))
        );
    }

    #[test]
    fn test_instagram_markers() {
        let text = "https://www.instagram.com/p/ABC123/";
        assert_eq!(
            classify_message_text(text),
            Some(Intent::InstagramUrl(text.to_string()))
        );
        assert_eq!(
            classify_message_text("instagr.am"),
            Some(Intent::InstagramUrl("instagr.am".to_string()))
        );
    }

    #[test]
    fn test_unrecognized_text() {
        assert_eq!(
            classify_message_text("hello there"),
            Some(Intent::Unrecognized("hello there".to_string()))
        );
        assert_eq!(
            classify_message_text("/help"),
            Some(Intent::Unrecognized("/help".to_string()))
        );
    }

    #[test]
    fn test_every_valid_handle_classifies_as_username() {
        for handle in ["a", "x.y", "_under_", "abcdefghijklmnopqrstuvwxyz1234", "9.9"] {
            for text in [handle.to_string(), format!("@{handle}")] {
                assert_eq!(
                    classify_message_text(&text),
                    Some(Intent::Username(handle.to_string())),
                    "{text}"
                );
            }
        }
    }

    #[test]
    fn test_is_valid_username() {
        assert!(is_valid_username("cristiano"));
        assert!(is_valid_username("@cristiano"));
        assert!(!is_valid_username("@"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"a".repeat(31)));
        assert!(is_valid_username(&"a".repeat(30)));
    }

    #[test]
    fn test_sanitize_username() {
        assert_eq!(sanitize_username("@ cristiano "), "cristiano");
        assert_eq!(sanitize_username("bad!name#1"), "badname1");
        assert_eq!(sanitize_username("@@x"), "x");
        assert_eq!(sanitize_username("!!!"), "");
        assert_eq!(sanitize_username(&"b".repeat(50)).len(), MAX_USERNAME_LEN);
    }

    #[test]
    fn test_sanitize_username_is_idempotent() {
        for input in ["@ab c", "  @x.y_z  ", "ééé@abc", "@@@", &"q1".repeat(40), ""] {
            let once = sanitize_username(input);
            assert_eq!(sanitize_username(&once), once);
            assert!(once.len() <= MAX_USERNAME_LEN);
            assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_'));
        }
    }

    #[test]
    fn test_extract_video_id_shapes() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=3"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtube.com/v/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ"), id);
    }

    #[test]
    fn test_extract_video_id_not_found() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/channel/UC123"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }

    #[test]
    fn test_youtube_url_validation() {
        assert!(is_valid_platform_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            Platform::YouTube
        ));
        assert!(is_valid_platform_url(
            "https://MUSIC.youtube.com/watch?v=dQw4w9WgXcQ",
            Platform::YouTube
        ));
        // right host, no id
        assert!(!is_valid_platform_url(
            "https://www.youtube.com/feed/trending",
            Platform::YouTube
        ));
        // id present, foreign host
        assert!(!is_valid_platform_url(
            "https://evil.example/youtube.com/watch?v=dQw4w9WgXcQ",
            Platform::YouTube
        ));
        assert!(!is_valid_platform_url("youtube.com/watch?v=dQw4w9WgXcQ", Platform::YouTube));
    }

    #[test]
    fn test_instagram_url_validation() {
        assert!(is_valid_platform_url(
            "https://www.instagram.com/p/ABC/",
            Platform::Instagram
        ));
        assert!(is_valid_platform_url("http://instagr.am/p/ABC", Platform::Instagram));
        assert!(!is_valid_platform_url(
            "https://scontent.cdninstagram.com/x.jpg",
            Platform::Instagram
        ));
        assert!(!is_valid_platform_url("instagram", Platform::Instagram));
    }

    #[test]
    fn test_extract_story_username() {
        assert_eq!(
            extract_story_username("https://www.instagram.com/stories/natgeo/3141592/"),
            Some("natgeo".to_string())
        );
        assert_eq!(
            extract_story_username("https://instagram.com/stories/natgeo?igsh=1"),
            Some("natgeo".to_string())
        );
        assert_eq!(extract_story_username("https://instagram.com/p/ABC/"), None);
        assert_eq!(
            extract_story_username("https://instagr.am/stories/natgeo/1/"),
            Some("natgeo".to_string())
        );
        assert_eq!(extract_story_username("https://instagr.am/stories/"), None);
        assert_eq!(
            extract_story_username("see instagram.com/stories/natgeo"),
            Some("natgeo".to_string())
        );
    }

    #[test]
    fn test_username_from_content_url() {
        assert_eq!(
            username_from_content_url("https://www.instagram.com/p/ABC123/"),
            "ABC123"
        );
        assert_eq!(
            username_from_content_url("https://www.instagram.com/reel/XYZ/?igsh=abc"),
            "XYZ"
        );
        assert_eq!(
            username_from_content_url("https://instagram.com/@natgeo"),
            "natgeo"
        );
        assert_eq!(username_from_content_url("https://instagr.am/p/x"), "unknown");
    }
}
