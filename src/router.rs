//! Per-update orchestration: classify the input, call the matching gateway,
//! and deliver the formatted result.
//!
//! Every fetch follows the same shape: show a loading placeholder, fetch,
//! then either delete the placeholder and send the result or turn the
//! placeholder into the failure text. Transport errors on the outbound side
//! are logged and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::callback::{CallbackAction, YouTubeActionKind};
use crate::classifier::{
    classify_message_text, extract_story_username, is_valid_platform_url, is_valid_username,
    sanitize_username, Intent, Platform,
};
use crate::config::{Config, TelegramConfig};
use crate::formatter::{self, MediaBatch};
use crate::gateway::{FetchResult, InstagramGateway, MediaResult, YouTubeGateway};
use crate::messenger::{Content, Messenger, Outbound, SendOptions};
use crate::pacing::Pacer;
use crate::update::{CallbackQuery, InboundUpdate, Message};

/// How handling of one update ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The requested content (or menu) was sent.
    Sent,
    /// Nothing to do.
    Ignored,
    /// The request could not be served; the user was told so.
    Failed,
}

/// Callback acknowledgement that can only happen once.
pub struct PendingAck<'a> {
    callback_id: &'a str,
    answered: bool,
}

impl<'a> PendingAck<'a> {
    pub fn new(callback_id: &'a str) -> Self {
        Self {
            callback_id,
            answered: false,
        }
    }

    /// Answer the query; later calls are no-ops.
    pub async fn answer(&mut self, messenger: &dyn Messenger, alert: Option<&str>) {
        if self.answered {
            return;
        }
        self.answered = true;
        if let Err(e) = messenger.answer_callback(self.callback_id, alert).await {
            error!("Failed to answer callback {}: {:#}", self.callback_id, e);
        }
    }
}

pub struct Router {
    messenger: Arc<dyn Messenger>,
    instagram: Arc<dyn InstagramGateway>,
    youtube: Arc<dyn YouTubeGateway>,
    pacer: Arc<dyn Pacer>,
    telegram: TelegramConfig,
    pacing_interval: Duration,
}

impl Router {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        instagram: Arc<dyn InstagramGateway>,
        youtube: Arc<dyn YouTubeGateway>,
        pacer: Arc<dyn Pacer>,
        config: &Config,
    ) -> Self {
        Self {
            messenger,
            instagram,
            youtube,
            pacer,
            telegram: config.telegram.clone(),
            pacing_interval: config.delivery.pacing_interval(),
        }
    }

    pub async fn handle_update(&self, update: InboundUpdate) -> Outcome {
        match update {
            InboundUpdate::Message(message) => self.handle_message(&message).await,
            InboundUpdate::CallbackQuery(query) => self.handle_callback(&query).await,
        }
    }

    // ── Messages ───────────────────────────────────────────────────────────

    pub async fn handle_message(&self, message: &Message) -> Outcome {
        let text = message.text.as_deref().unwrap_or_default();
        let Some(intent) = classify_message_text(text) else {
            debug!("Ignoring message {} without text", message.message_id);
            return Outcome::Ignored;
        };

        info!(
            "Message from {} (@{}, {}) in chat {}: {:?}",
            message.sender_name,
            message.sender_handle.as_deref().unwrap_or("-"),
            message.sender_id,
            message.chat_id,
            intent
        );

        let chat_id = message.chat_id;
        match intent {
            Intent::StartCommand => {
                let welcome =
                    formatter::welcome(&message.sender_name, message.sender_id, &self.telegram);
                self.deliver(chat_id, &welcome).await;
                Outcome::Sent
            }
            Intent::YouTubeUrl(url) => self.handle_youtube_url(message, &url).await,
            Intent::InstagramUrl(url) => self.handle_instagram_url(message, &url).await,
            Intent::Username(handle) => {
                let username = sanitize_username(&handle);
                self.deliver(
                    chat_id,
                    &formatter::username_chooser(&username, message.message_id),
                )
                .await;
                Outcome::Sent
            }
            Intent::Unrecognized(_) => {
                self.deliver(chat_id, &formatter::usage_hint()).await;
                Outcome::Sent
            }
        }
    }

    async fn handle_youtube_url(&self, message: &Message, url: &str) -> Outcome {
        let chat_id = message.chat_id;
        if !is_valid_platform_url(url, Platform::YouTube) {
            let reply = Outbound::text(formatter::INVALID_YOUTUBE_URL)
                .markdown()
                .reply_to(message.message_id);
            self.deliver(chat_id, &reply).await;
            return Outcome::Failed;
        }

        let placeholder = self
            .send_placeholder(chat_id, formatter::PROCESSING_YOUTUBE, message.message_id)
            .await;

        match self.youtube.fetch_video_info(url).await {
            Ok(info) => {
                self.clear_placeholder(chat_id, placeholder).await;
                self.deliver(chat_id, &formatter::video_info(&info, url))
                    .await;
                Outcome::Sent
            }
            Err(e) => {
                warn!("YouTube lookup failed for {}: {}", url, e);
                self.show_failure(chat_id, placeholder, formatter::YOUTUBE_FAILED)
                    .await;
                Outcome::Failed
            }
        }
    }

    async fn handle_instagram_url(&self, message: &Message, url: &str) -> Outcome {
        let chat_id = message.chat_id;
        let placeholder = self
            .send_placeholder(chat_id, formatter::PROCESSING_INSTAGRAM, message.message_id)
            .await;

        let story_owner = if url.contains("/stories/") {
            extract_story_username(url)
                .map(|u| sanitize_username(&u))
                .filter(|u| !u.is_empty())
        } else {
            None
        };

        let result = match story_owner {
            Some(username) => self.instagram.fetch_stories(&username).await,
            None => self.instagram.fetch_content(url).await,
        };

        self.finish_media(chat_id, placeholder, result, formatter::INSTAGRAM_FAILED)
            .await
    }

    // ── Callback queries ───────────────────────────────────────────────────

    pub async fn handle_callback(&self, query: &CallbackQuery) -> Outcome {
        let action = CallbackAction::decode(&query.data);
        info!(
            "Callback {} from {}: {:?} ({:?})",
            query.id, query.sender_id, query.data, action
        );

        let alert = match &action {
            Some(CallbackAction::CopyVideoId(video_id)) => Some(format!("Video ID: {video_id}")),
            _ => None,
        };
        let mut ack = PendingAck::new(&query.id);
        ack.answer(self.messenger.as_ref(), alert.as_deref()).await;

        let action = match action {
            None => {
                debug!("Dropping unrecognised callback payload {:?}", query.data);
                return Outcome::Ignored;
            }
            Some(CallbackAction::CopyVideoId(_)) => return Outcome::Sent,
            Some(action) => action,
        };

        let (Some(chat_id), Some(message_id)) = (query.chat_id, query.message_id) else {
            warn!("Callback {} has no accessible message, nothing to update", query.id);
            return Outcome::Ignored;
        };

        match action {
            CallbackAction::ShowProfileInfo(username) => {
                let username = sanitize_username(&username);
                if !is_valid_username(&username) {
                    return self
                        .reject_username(chat_id, message_id, formatter::PROFILE_NOT_FOUND)
                        .await;
                }
                self.show_profile(chat_id, message_id, &username).await
            }
            CallbackAction::DownloadStories(username) => {
                let username = sanitize_username(&username);
                if !is_valid_username(&username) {
                    return self
                        .reject_username(chat_id, message_id, formatter::STORIES_NOT_FOUND)
                        .await;
                }
                self.download_stories(chat_id, message_id, &username).await
            }
            CallbackAction::YouTube {
                kind: YouTubeActionKind::Info,
                video_id,
            } => self.show_detailed_info(chat_id, message_id, &video_id).await,
            CallbackAction::YouTube { kind, video_id } => {
                self.youtube_download(chat_id, message_id, kind, &video_id)
                    .await
            }
            CallbackAction::CopyVideoId(_) => Outcome::Sent,
        }
    }

    /// A chooser payload that cleans up to no usable username never reaches
    /// the gateway.
    async fn reject_username(&self, chat_id: i64, message_id: i32, text: &str) -> Outcome {
        warn!("Callback carries no usable username, not fetching");
        self.edit_placeholder(chat_id, message_id, text).await;
        Outcome::Failed
    }

    async fn show_profile(&self, chat_id: i64, message_id: i32, username: &str) -> Outcome {
        let placeholder = self
            .edit_placeholder(chat_id, message_id, formatter::FETCHING_PROFILE)
            .await;

        match self.instagram.fetch_profile(username).await {
            Ok(profile) => {
                self.clear_source(chat_id, message_id, placeholder).await;
                self.deliver(chat_id, &formatter::profile(&profile)).await;
                Outcome::Sent
            }
            Err(e) => {
                warn!("Profile lookup failed for {}: {}", username, e);
                self.show_failure(chat_id, placeholder, formatter::PROFILE_NOT_FOUND)
                    .await;
                Outcome::Failed
            }
        }
    }

    async fn download_stories(&self, chat_id: i64, message_id: i32, username: &str) -> Outcome {
        let placeholder = self
            .edit_placeholder(chat_id, message_id, formatter::DOWNLOADING_STORIES)
            .await;
        match self.instagram.fetch_stories(username).await {
            Ok(media) => {
                self.clear_source(chat_id, message_id, placeholder).await;
                self.deliver_media(chat_id, &media).await;
                Outcome::Sent
            }
            Err(e) => {
                warn!("Stories lookup failed for {}: {}", username, e);
                self.show_failure(chat_id, placeholder, formatter::STORIES_NOT_FOUND)
                    .await;
                Outcome::Failed
            }
        }
    }

    async fn youtube_download(
        &self,
        chat_id: i64,
        message_id: i32,
        kind: YouTubeActionKind,
        video_id: &str,
    ) -> Outcome {
        let loading = match kind {
            YouTubeActionKind::Audio => formatter::EXTRACTING_AUDIO,
            YouTubeActionKind::Video | YouTubeActionKind::Info => formatter::DOWNLOADING_VIDEO,
        };
        let placeholder = self.edit_placeholder(chat_id, message_id, loading).await;

        match self.youtube.fetch_video_info(&watch_url(video_id)).await {
            Ok(info) => {
                self.clear_source(chat_id, message_id, placeholder).await;
                self.deliver(chat_id, &formatter::download_request(&info, kind))
                    .await;
                Outcome::Sent
            }
            Err(e) => {
                warn!("YouTube lookup failed for {}: {}", video_id, e);
                self.show_failure(chat_id, placeholder, formatter::YOUTUBE_UNPROCESSABLE)
                    .await;
                Outcome::Failed
            }
        }
    }

    async fn show_detailed_info(&self, chat_id: i64, message_id: i32, video_id: &str) -> Outcome {
        match self.youtube.fetch_video_info(&watch_url(video_id)).await {
            Ok(info) => {
                self.edit_placeholder(chat_id, message_id, &formatter::detailed_info_text(&info))
                    .await;
                Outcome::Sent
            }
            Err(e) => {
                warn!("YouTube lookup failed for {}: {}", video_id, e);
                self.edit_placeholder(chat_id, message_id, formatter::DETAILED_INFO_FAILED)
                    .await;
                Outcome::Failed
            }
        }
    }

    // ── Delivery helpers ───────────────────────────────────────────────────

    /// Resolve a media fetch: clear the placeholder and send the batch, or
    /// replace the placeholder with `failure_text`.
    async fn finish_media(
        &self,
        chat_id: i64,
        placeholder: Option<i32>,
        result: FetchResult<MediaResult>,
        failure_text: &str,
    ) -> Outcome {
        match result {
            Ok(media) => {
                self.clear_placeholder(chat_id, placeholder).await;
                self.deliver_media(chat_id, &media).await;
                Outcome::Sent
            }
            Err(e) => {
                warn!("Instagram fetch failed: {}", e);
                self.show_failure(chat_id, placeholder, failure_text).await;
                Outcome::Failed
            }
        }
    }

    async fn deliver_media(&self, chat_id: i64, media: &MediaResult) {
        info!(
            "Delivering {} media item(s) from @{} to chat {}",
            media.count(),
            media.username,
            chat_id
        );
        self.deliver_batch(chat_id, formatter::media_batch(media))
            .await;
    }

    async fn deliver_batch(&self, chat_id: i64, batch: MediaBatch) {
        for message in &batch.immediate {
            self.deliver(chat_id, message).await;
        }
        for message in &batch.paced {
            self.pacer.pause(self.pacing_interval).await;
            self.deliver(chat_id, message).await;
        }
    }

    /// Send one message. Returns the new message id when the transport
    /// reports one.
    async fn deliver(&self, chat_id: i64, message: &Outbound) -> Option<i32> {
        let options = &message.options;
        let result = match &message.content {
            Content::Text(text) => self.messenger.send_text(chat_id, text, options).await,
            Content::Photo { url, caption } => {
                self.messenger
                    .send_photo(chat_id, url, caption.as_deref(), options)
                    .await
            }
            Content::Video { url, caption } => {
                self.messenger
                    .send_video(chat_id, url, caption.as_deref(), options)
                    .await
            }
            Content::MediaGroup(items) => {
                if let Err(e) = self.messenger.send_media_group(chat_id, items).await {
                    error!("Failed to send media group to chat {}: {:#}", chat_id, e);
                }
                return None;
            }
        };

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                error!("Failed to send message to chat {}: {:#}", chat_id, e);
                None
            }
        }
    }

    async fn send_placeholder(&self, chat_id: i64, text: &str, reply_to: i32) -> Option<i32> {
        let placeholder = Outbound::text(text).markdown().reply_to(reply_to);
        self.deliver(chat_id, &placeholder).await
    }

    /// Turn the message a button was pressed on into a placeholder. When it
    /// cannot be edited (e.g. a photo card) a fresh text message is sent.
    async fn edit_placeholder(&self, chat_id: i64, message_id: i32, text: &str) -> Option<i32> {
        match self
            .messenger
            .edit_text(chat_id, message_id, text, &markdown())
            .await
        {
            Ok(()) => Some(message_id),
            Err(e) => {
                debug!("Cannot edit message {} ({:#}), sending a new one", message_id, e);
                self.deliver(chat_id, &Outbound::text(text).markdown()).await
            }
        }
    }

    async fn clear_placeholder(&self, chat_id: i64, placeholder: Option<i32>) {
        if let Some(message_id) = placeholder {
            if let Err(e) = self.messenger.delete_message(chat_id, message_id).await {
                error!("Failed to delete message {}: {:#}", message_id, e);
            }
        }
    }

    /// Remove the placeholder and, if it was a separate message, the
    /// message the button was pressed on.
    async fn clear_source(&self, chat_id: i64, source_id: i32, placeholder: Option<i32>) {
        self.clear_placeholder(chat_id, placeholder).await;
        if placeholder != Some(source_id) {
            self.clear_placeholder(chat_id, Some(source_id)).await;
        }
    }

    /// Replace the placeholder with `text`, or send it fresh when there is none.
    async fn show_failure(&self, chat_id: i64, placeholder: Option<i32>, text: &str) {
        match placeholder {
            Some(message_id) => {
                self.edit_placeholder(chat_id, message_id, text).await;
            }
            None => {
                self.deliver(chat_id, &Outbound::text(text).markdown()).await;
            }
        }
    }
}

fn markdown() -> SendOptions {
    SendOptions {
        markdown: true,
        ..SendOptions::default()
    }
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
