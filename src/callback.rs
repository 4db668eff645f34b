//! Inline-button payloads.
//!
//! Telegram limits `callback_data` to 64 bytes, so actions keep the compact
//! underscore-joined wire format: `info_<user>`, `stories_<user>`,
//! `youtube_<video|audio|info>_<id>` and `copy_id_<id>`.

/// Maximum size of a callback payload accepted by Telegram.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

const INFO_PREFIX: &str = "info_";
const STORIES_PREFIX: &str = "stories_";
const YOUTUBE_PREFIX: &str = "youtube_";
const COPY_ID_PREFIX: &str = "copy_id_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YouTubeActionKind {
    Video,
    Audio,
    Info,
}

impl YouTubeActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            YouTubeActionKind::Video => "video",
            YouTubeActionKind::Audio => "audio",
            YouTubeActionKind::Info => "info",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(YouTubeActionKind::Video),
            "audio" => Some(YouTubeActionKind::Audio),
            "info" => Some(YouTubeActionKind::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    ShowProfileInfo(String),
    DownloadStories(String),
    YouTube {
        kind: YouTubeActionKind,
        video_id: String,
    },
    CopyVideoId(String),
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::ShowProfileInfo(username) => format!("{INFO_PREFIX}{username}"),
            CallbackAction::DownloadStories(username) => format!("{STORIES_PREFIX}{username}"),
            CallbackAction::YouTube { kind, video_id } => {
                format!("{YOUTUBE_PREFIX}{}_{video_id}", kind.as_str())
            }
            CallbackAction::CopyVideoId(video_id) => format!("{COPY_ID_PREFIX}{video_id}"),
        }
    }

    /// Parse a button payload. Unknown prefixes, unknown YouTube subactions
    /// and empty payloads yield `None`.
    pub fn decode(data: &str) -> Option<Self> {
        if let Some(username) = data.strip_prefix(INFO_PREFIX) {
            return non_empty(username).map(CallbackAction::ShowProfileInfo);
        }
        if let Some(username) = data.strip_prefix(STORIES_PREFIX) {
            return non_empty(username).map(CallbackAction::DownloadStories);
        }
        if data.starts_with(YOUTUBE_PREFIX) {
            // The id may itself contain underscores; only split twice.
            let mut parts = data.splitn(3, '_');
            let _prefix = parts.next()?;
            let kind = YouTubeActionKind::parse(parts.next()?)?;
            let video_id = non_empty(parts.next()?)?;
            return Some(CallbackAction::YouTube { kind, video_id });
        }
        if let Some(video_id) = data.strip_prefix(COPY_ID_PREFIX) {
            return non_empty(video_id).map(CallbackAction::CopyVideoId);
        }
        None
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
