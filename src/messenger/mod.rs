pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::callback::CallbackAction;

/// Inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Url { text: String, url: String },
    Callback { text: String, data: String },
}

impl Button {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Url {
            text: text.into(),
            url: url.into(),
        }
    }

    pub fn callback(text: impl Into<String>, action: &CallbackAction) -> Self {
        Button::Callback {
            text: text.into(),
            data: action.encode(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    #[cfg(test)]
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// One entry of a media group. Only the first entry of a group carries a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
    pub caption: Option<String>,
}

/// Presentation options shared by every kind of outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Parse text/caption as (legacy) Markdown.
    pub markdown: bool,
    pub keyboard: Option<Keyboard>,
    pub reply_to: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Photo { url: String, caption: Option<String> },
    Video { url: String, caption: Option<String> },
    MediaGroup(Vec<MediaItem>),
}

/// A message ready to be delivered to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub content: Content,
    pub options: SendOptions,
}

impl Outbound {
    fn from_content(content: Content) -> Self {
        Self {
            content,
            options: SendOptions::default(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_content(Content::Text(text.into()))
    }

    pub fn photo(url: impl Into<String>, caption: Option<String>) -> Self {
        Self::from_content(Content::Photo {
            url: url.into(),
            caption,
        })
    }

    pub fn video(url: impl Into<String>, caption: Option<String>) -> Self {
        Self::from_content(Content::Video {
            url: url.into(),
            caption,
        })
    }

    pub fn media(kind: MediaKind, url: impl Into<String>, caption: Option<String>) -> Self {
        match kind {
            MediaKind::Photo => Self::photo(url, caption),
            MediaKind::Video => Self::video(url, caption),
        }
    }

    pub fn media_group(items: Vec<MediaItem>) -> Self {
        Self::from_content(Content::MediaGroup(items))
    }

    pub fn markdown(mut self) -> Self {
        self.options.markdown = true;
        self
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.options.keyboard = Some(keyboard);
        self
    }

    pub fn reply_to(mut self, message_id: i32) -> Self {
        self.options.reply_to = Some(message_id);
        self
    }

    /// Text or caption, whichever the content carries.
    #[cfg(test)]
    pub fn body(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text.as_str()),
            Content::Photo { caption, .. } | Content::Video { caption, .. } => caption.as_deref(),
            Content::MediaGroup(items) => items.first().and_then(|i| i.caption.as_deref()),
        }
    }
}

/// Outbound chat transport. Methods that create a message return its id.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<i32>;

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
        options: &SendOptions,
    ) -> Result<i32>;

    async fn send_video(
        &self,
        chat_id: i64,
        video_url: &str,
        caption: Option<&str>,
        options: &SendOptions,
    ) -> Result<i32>;

    async fn send_media_group(&self, chat_id: i64, items: &[MediaItem]) -> Result<()>;

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        options: &SendOptions,
    ) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;

    /// Acknowledge a callback query, optionally with an alert bubble.
    async fn answer_callback(&self, callback_id: &str, alert: Option<&str>) -> Result<()>;
}
