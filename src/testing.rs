//! Recording doubles for the messenger, pacer and gateways.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::gateway::{
    FetchError, FetchResult, InstagramGateway, MediaResult, ProfileInfo, VideoInfo,
    YouTubeGateway,
};
use crate::messenger::{MediaItem, Messenger, SendOptions};
use crate::pacing::Pacer;
use crate::router::Router;

/// Everything the router did, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Text {
        chat_id: i64,
        text: String,
        options: SendOptions,
    },
    Photo {
        chat_id: i64,
        url: String,
        caption: Option<String>,
    },
    Video {
        chat_id: i64,
        url: String,
        caption: Option<String>,
    },
    MediaGroup {
        chat_id: i64,
        items: Vec<MediaItem>,
    },
    Edit {
        chat_id: i64,
        message_id: i32,
        text: String,
    },
    Delete {
        chat_id: i64,
        message_id: i32,
    },
    Answer {
        callback_id: String,
        alert: Option<String>,
    },
    Pause(Duration),
}

#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn edits(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Answer { alert, .. } => Some(alert),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingMessenger {
    recorder: Recorder,
    next_id: AtomicI32,
    fail_sends: bool,
    fail_edits: bool,
}

impl RecordingMessenger {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            next_id: AtomicI32::new(1000),
            fail_sends: false,
            fail_edits: false,
        }
    }

    /// Every send/edit errors after being recorded, like a dead transport.
    pub fn failing(recorder: Recorder) -> Self {
        Self {
            fail_sends: true,
            fail_edits: true,
            ..Self::new(recorder)
        }
    }

    /// Edits error, as Telegram does for messages without text.
    pub fn failing_edits(recorder: Recorder) -> Self {
        Self {
            fail_edits: true,
            ..Self::new(recorder)
        }
    }

    fn sent(&self) -> Result<i32> {
        if self.fail_sends {
            anyhow::bail!("transport down");
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<i32> {
        self.recorder.push(Event::Text {
            chat_id,
            text: text.to_string(),
            options: options.clone(),
        });
        self.sent()
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
        _options: &SendOptions,
    ) -> Result<i32> {
        self.recorder.push(Event::Photo {
            chat_id,
            url: photo_url.to_string(),
            caption: caption.map(str::to_string),
        });
        self.sent()
    }

    async fn send_video(
        &self,
        chat_id: i64,
        video_url: &str,
        caption: Option<&str>,
        _options: &SendOptions,
    ) -> Result<i32> {
        self.recorder.push(Event::Video {
            chat_id,
            url: video_url.to_string(),
            caption: caption.map(str::to_string),
        });
        self.sent()
    }

    async fn send_media_group(&self, chat_id: i64, items: &[MediaItem]) -> Result<()> {
        self.recorder.push(Event::MediaGroup {
            chat_id,
            items: items.to_vec(),
        });
        self.sent().map(|_| ())
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        _options: &SendOptions,
    ) -> Result<()> {
        self.recorder.push(Event::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        if self.fail_edits {
            anyhow::bail!("message can't be edited");
        }
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.recorder.push(Event::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
        self.recorder.push(Event::Answer {
            callback_id: callback_id.to_string(),
            alert: alert.map(str::to_string),
        });
        Ok(())
    }
}

pub struct RecordingPacer {
    recorder: Recorder,
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.recorder.push(Event::Pause(duration));
    }
}

/// Instagram stub answering from canned records; `None` means not found.
#[derive(Default)]
pub struct StubInstagram {
    pub profile: Option<ProfileInfo>,
    pub stories: Option<MediaResult>,
    pub content: Option<MediaResult>,
    pub requests: Mutex<Vec<String>>,
}

impl StubInstagram {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }
}

fn canned<T: Clone>(value: &Option<T>, what: &str) -> FetchResult<T> {
    value
        .clone()
        .ok_or_else(|| FetchError::NotFound(what.to_string()))
}

#[async_trait]
impl InstagramGateway for StubInstagram {
    async fn fetch_profile(&self, username: &str) -> FetchResult<ProfileInfo> {
        self.record(format!("profile:{username}"));
        canned(&self.profile, username)
    }

    async fn fetch_stories(&self, username: &str) -> FetchResult<MediaResult> {
        self.record(format!("stories:{username}"));
        canned(&self.stories, username)
    }

    async fn fetch_content(&self, url: &str) -> FetchResult<MediaResult> {
        self.record(format!("content:{url}"));
        canned(&self.content, url)
    }
}

#[derive(Default)]
pub struct StubYouTube {
    pub info: Option<VideoInfo>,
    pub requests: Mutex<Vec<String>>,
}

impl StubYouTube {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl YouTubeGateway for StubYouTube {
    async fn fetch_video_info(&self, url: &str) -> FetchResult<VideoInfo> {
        self.requests.lock().unwrap().push(url.to_string());
        canned(&self.info, url)
    }
}

pub fn media_result(links: &[&str]) -> MediaResult {
    MediaResult {
        kind: "post".to_string(),
        links: links.iter().map(|l| l.to_string()).collect(),
        username: "natgeo".to_string(),
        title: None,
        description: None,
    }
}

pub fn profile_info(username: &str) -> ProfileInfo {
    ProfileInfo {
        username: username.to_string(),
        full_name: "National Geographic".to_string(),
        follower_count: 1_000,
        following_count: 10,
        id: "787132".to_string(),
        is_private: false,
        is_verified: true,
        media_count: 5,
        external_url: None,
        bio: "bio".to_string(),
        country: "US".to_string(),
        profile_pic_url: "https://cdn.example/pic.jpg".to_string(),
    }
}

pub fn video_info(video_id: &str) -> VideoInfo {
    VideoInfo {
        video_id: video_id.to_string(),
        title: "Never Gonna Give You Up".to_string(),
        uploader: "Rick Astley".to_string(),
        duration: None,
        view_count: None,
        upload_date: "Unknown".to_string(),
        description: Some("A classic".to_string()),
        thumbnail: Some(format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")),
    }
}

/// Router wired to recording doubles.
pub struct Harness {
    pub router: Router,
    pub recorder: Recorder,
    pub instagram: Arc<StubInstagram>,
    pub youtube: Arc<StubYouTube>,
}

impl Harness {
    pub fn new(instagram: StubInstagram, youtube: StubYouTube) -> Self {
        Self::with_messenger(instagram, youtube, RecordingMessenger::new)
    }

    pub fn with_messenger(
        instagram: StubInstagram,
        youtube: StubYouTube,
        messenger: impl FnOnce(Recorder) -> RecordingMessenger,
    ) -> Self {
        let recorder = Recorder::default();
        let instagram = Arc::new(instagram);
        let youtube = Arc::new(youtube);
        let router = Router::new(
            Arc::new(messenger(recorder.clone())),
            instagram.clone(),
            youtube.clone(),
            Arc::new(RecordingPacer {
                recorder: recorder.clone(),
            }),
            &Config::default(),
        );
        Self {
            router,
            recorder,
            instagram,
            youtube,
        }
    }
}
