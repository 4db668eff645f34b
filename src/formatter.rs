//! Pure builders turning fetch results into outgoing messages.

use url::Url;

use crate::callback::{CallbackAction, YouTubeActionKind};
use crate::config::TelegramConfig;
use crate::gateway::{MediaResult, ProfileInfo, VideoInfo};
use crate::messenger::{Button, Keyboard, MediaItem, MediaKind, Outbound};

/// Telegram accepts at most this many items in one media group.
pub const MEDIA_GROUP_LIMIT: usize = 10;

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "webm"];
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

const DESCRIPTION_PREVIEW_CHARS: usize = 200;
const BIO_PREVIEW_CHARS: usize = 400;

pub const USAGE_HINT: &str = "*❌ Please send:*\n\
    • Instagram username (e.g., cristiano)\n\
    • Instagram URL (post/reel/story)\n\
    • YouTube URL (video/shorts)";

pub const FETCHING_PROFILE: &str = "*Fetching profile info... 🔍*";
pub const PROFILE_NOT_FOUND: &str = "*❌ Account not found or private.*";
pub const DOWNLOADING_STORIES: &str = "*Downloading stories... 📥*";
pub const STORIES_NOT_FOUND: &str = "*❌ No stories found or account is private.*";
pub const PROCESSING_INSTAGRAM: &str = "*Processing Instagram URL... 🔍*";
pub const INSTAGRAM_FAILED: &str =
    "*❌ Failed to download content. The post might be private or deleted.*";
pub const INVALID_YOUTUBE_URL: &str =
    "*❌ Invalid YouTube URL. Please send a valid YouTube video link.*";
pub const PROCESSING_YOUTUBE: &str = "*🔍 Processing YouTube video...*";
pub const YOUTUBE_FAILED: &str =
    "*❌ Failed to get video information. The video might be private, deleted, or restricted.*";
pub const DOWNLOADING_VIDEO: &str = "*📥 Downloading video... This may take a moment.*";
pub const EXTRACTING_AUDIO: &str = "*🎵 Extracting audio... This may take a moment.*";
pub const YOUTUBE_UNPROCESSABLE: &str = "*❌ Unable to process this YouTube video.*";
pub const DETAILED_INFO_FAILED: &str = "*❌ Failed to get detailed information.*";

/// Messages for one media result: `immediate` are sent back to back,
/// `paced` one at a time with the pacing interval awaited before each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaBatch {
    pub immediate: Vec<Outbound>,
    pub paced: Vec<Outbound>,
}

/// Escape legacy-Markdown control characters in user-supplied text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `1234567` -> `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `H:MM:SS` from one hour up, `M:SS` below.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Compact view count: `1.5K`, `2.5M`, `1B`; below a thousand the raw number.
pub fn format_view_count(count: u64) -> String {
    let (divisor, suffix) = match count {
        c if c >= 1_000_000_000 => (1_000_000_000.0, "B"),
        c if c >= 1_000_000 => (1_000_000.0, "M"),
        c if c >= 1_000 => (1_000.0, "K"),
        c => return c.to_string(),
    };
    let rounded = (count as f64 / divisor * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{suffix}", rounded as u64)
    } else {
        format!("{rounded:.1}{suffix}")
    }
}

fn render_duration(duration: Option<u64>) -> String {
    duration.map_or_else(|| "Unknown".to_string(), format_duration)
}

fn render_views(views: Option<u64>) -> String {
    views.map_or_else(|| "Unknown".to_string(), format_view_count)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Lowercased extension of the URL's last path segment.
fn url_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Guess whether a media link is a video or a photo.
pub fn media_kind_from_url(url: &str) -> MediaKind {
    if let Some(ext) = url_extension(url) {
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return MediaKind::Video;
        }
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return MediaKind::Photo;
        }
    }
    if url.contains(".mp4") || url.contains("video") {
        return MediaKind::Video;
    }
    MediaKind::Photo
}

/// Link text for an inline mention. Legacy Markdown has no escapes inside
/// an entity, so control characters are removed instead.
fn mention_text(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '_' | '*' | '`' | '[' | ']'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "User".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn welcome(name: &str, user_id: u64, telegram: &TelegramConfig) -> Outbound {
    let name = mention_text(name);
    let caption = format!(
        "*👋 Welcome,* [{name}](tg://user?id={user_id})\n\n\
         *🔗 Instagram Downloader Bot*\n\n\
         *🚀 Features:*\n\
         • Instagram profile info fetching\n\
         • Instagram stories download\n\
         • Instagram posts & reels download\n\
         • YouTube video info\n\
         • YouTube audio & video requests\n\
         • Support for all major URLs\n\n\
         *📌 How to use:*\n\
         • Send Instagram username (e.g., cristiano)\n\
         • Send Instagram URL (posts/reels/stories)\n\
         • Send YouTube URL (videos/shorts)\n\
         • Use buttons for quick actions"
    );
    let keyboard = Keyboard::new(vec![vec![
        Button::url("👑 Bot Owner", telegram.owner_url.as_str()),
        Button::url("🌐 Our Channel", telegram.channel_url.as_str()),
    ]]);
    Outbound::photo(telegram.welcome_photo.as_str(), Some(caption))
        .markdown()
        .with_keyboard(keyboard)
}

pub fn usage_hint() -> Outbound {
    Outbound::text(USAGE_HINT).markdown()
}

/// Profile-info / stories chooser for a bare username.
pub fn username_chooser(username: &str, reply_to: i32) -> Outbound {
    let keyboard = Keyboard::new(vec![vec![
        Button::callback(
            "📄 Profile Info",
            &CallbackAction::ShowProfileInfo(username.to_string()),
        ),
        Button::callback(
            "📸 Download Stories",
            &CallbackAction::DownloadStories(username.to_string()),
        ),
    ]]);
    Outbound::text("*Select an option below 🔽*")
        .markdown()
        .with_keyboard(keyboard)
        .reply_to(reply_to)
}

pub fn profile(info: &ProfileInfo) -> Outbound {
    let website = info.external_url.as_deref().unwrap_or("None");
    let caption = format!(
        "*👤 Name:* {}\n\
         *🔗 Username:* @{}\n\
         *👥 Followers:* {}\n\
         *➡️ Following:* {}\n\
         *🆔 User ID:* {}\n\
         *🔒 Private:* {}\n\
         *✔️ Verified:* {}\n\
         *🖼️ Posts:* {}\n\
         *🌐 Website:* {}\n\
         *📌 Bio:*\n{}\n\
         *📍 Country:* {}",
        escape_markdown(&info.full_name),
        escape_markdown(&info.username),
        format_thousands(info.follower_count),
        format_thousands(info.following_count),
        escape_markdown(&info.id),
        yes_no(info.is_private),
        yes_no(info.is_verified),
        format_thousands(info.media_count),
        escape_markdown(website),
        escape_markdown(&truncate_chars(&info.bio, BIO_PREVIEW_CHARS)),
        escape_markdown(&info.country),
    );
    let keyboard = Keyboard::new(vec![vec![Button::url(
        "🔗 Open Profile",
        format!("https://instagram.com/{}", info.username),
    )]]);
    Outbound::photo(info.profile_pic_url.as_str(), Some(caption))
        .markdown()
        .with_keyboard(keyboard)
}

pub fn media_caption(result: &MediaResult) -> String {
    format!(
        "📱 Downloaded from @{}\n📊 Media count: {}\n🔗 Powered by Instagram Bot",
        result.username,
        result.count()
    )
}

/// Lay out a media result: one item goes out alone, up to ten as a group,
/// and anything past ten follows a notice as individually paced messages.
pub fn media_batch(result: &MediaResult) -> MediaBatch {
    let caption = media_caption(result);
    let kinds: Vec<(MediaKind, &str)> = result
        .links
        .iter()
        .map(|link| (media_kind_from_url(link), link.as_str()))
        .collect();

    match kinds.as_slice() {
        [] => MediaBatch::default(),
        [(kind, url)] => MediaBatch {
            immediate: vec![Outbound::media(*kind, *url, Some(caption))],
            paced: Vec::new(),
        },
        _ => {
            let split = kinds.len().min(MEDIA_GROUP_LIMIT);
            let (head, rest) = kinds.split_at(split);
            let group = head
                .iter()
                .enumerate()
                .map(|(i, (kind, url))| MediaItem {
                    kind: *kind,
                    url: url.to_string(),
                    caption: (i == 0).then(|| caption.clone()),
                })
                .collect();

            let mut immediate = vec![Outbound::media_group(group)];
            if !rest.is_empty() {
                immediate.push(
                    Outbound::text(format!(
                        "*📎 Sending remaining {} files individually...*",
                        rest.len()
                    ))
                    .markdown(),
                );
            }
            MediaBatch {
                immediate,
                paced: rest
                    .iter()
                    .map(|(kind, url)| Outbound::media(*kind, *url, None))
                    .collect(),
            }
        }
    }
}

fn youtube_button(text: &str, kind: YouTubeActionKind, video_id: &str) -> Button {
    Button::callback(
        text,
        &CallbackAction::YouTube {
            kind,
            video_id: video_id.to_string(),
        },
    )
}

/// Summary card for a YouTube link with the follow-up action keyboard.
pub fn video_info(info: &VideoInfo, original_url: &str) -> Outbound {
    let caption = format!(
        "*🎥 YouTube Video Info*\n\n\
         *📺 Title:* {}\n\
         *👤 Channel:* {}\n\
         *⏱️ Duration:* {}\n\
         *👁️ Views:* {}\n\
         *📅 Upload Date:* {}\n",
        escape_markdown(&info.title),
        escape_markdown(&info.uploader),
        render_duration(info.duration),
        render_views(info.view_count),
        escape_markdown(&info.upload_date),
    );
    let id = info.video_id.as_str();
    let keyboard = Keyboard::new(vec![
        vec![
            youtube_button("🎬 Download Video", YouTubeActionKind::Video, id),
            youtube_button("🎵 Audio Only", YouTubeActionKind::Audio, id),
        ],
        vec![
            youtube_button("📋 Full Info", YouTubeActionKind::Info, id),
            Button::url("🔗 Open in YouTube", original_url),
        ],
    ]);
    with_thumbnail(info, caption).with_keyboard(keyboard)
}

/// Reply to the download buttons. Files are not delivered; the card points
/// at the original video and external tools instead.
pub fn download_request(info: &VideoInfo, kind: YouTubeActionKind) -> Outbound {
    let id = info.video_id.as_str();
    let (heading, tip) = match kind {
        YouTubeActionKind::Audio => (
            "*🎵 Audio Download Request*",
            "• Use online converters like y2mate.com",
        ),
        YouTubeActionKind::Video | YouTubeActionKind::Info => (
            "*🎬 Video Download Request*",
            "• Use online downloaders like ytmp3.cc",
        ),
    };
    let text = format!(
        "{heading}\n\n\
         *📺 Title:* {}\n\
         *👤 Channel:* {}\n\n\
         *ℹ️ Note:* Direct YouTube downloads are not available. \
         You can use these alternatives:\n\n\
         {tip}\n\
         • Try @SaveAsBot on Telegram\n\
         • Use browser extensions for downloading\n\n\
         *🔗 Original Video:* [Watch on YouTube](https://youtube.com/watch?v={id})",
        escape_markdown(&info.title),
        escape_markdown(&info.uploader),
    );
    let keyboard = Keyboard::new(vec![
        vec![
            Button::url("🔗 Open in YouTube", format!("https://youtube.com/watch?v={id}")),
            Button::callback("📋 Copy Video ID", &CallbackAction::CopyVideoId(id.to_string())),
        ],
        vec![
            Button::url("🤖 Try @SaveAsBot", "https://t.me/SaveAsBot"),
            Button::url("🌐 Online Downloader", "https://ytmp3.cc"),
        ],
    ]);
    with_thumbnail(info, text).with_keyboard(keyboard)
}

pub fn detailed_info_text(info: &VideoInfo) -> String {
    let mut text = format!(
        "*🎥 Detailed Video Information*\n\n\
         *📺 Title:* {}\n\
         *👤 Channel:* {}\n\
         *⏱️ Duration:* {}\n\
         *👁️ Views:* {}\n\
         *📅 Upload Date:* {}\n\
         *🆔 Video ID:* {}\n",
        escape_markdown(&info.title),
        escape_markdown(&info.uploader),
        render_duration(info.duration),
        render_views(info.view_count),
        escape_markdown(&info.upload_date),
        escape_markdown(&info.video_id),
    );
    if let Some(description) = info.description.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(&format!(
            "*📝 Description:* {}\n",
            escape_markdown(&truncate_chars(description, DESCRIPTION_PREVIEW_CHARS))
        ));
    }
    text
}

fn with_thumbnail(info: &VideoInfo, caption: String) -> Outbound {
    let message = match info.thumbnail.as_deref().filter(|t| !t.is_empty()) {
        Some(thumbnail) => Outbound::photo(thumbnail, Some(caption)),
        None => Outbound::text(caption),
    };
    message.markdown()
}
