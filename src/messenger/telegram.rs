use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
    InputMediaPhoto, InputMediaVideo, MessageId, ParseMode, ReplyParameters,
};
use tracing::{debug, warn};
use url::Url;

use crate::callback::MAX_CALLBACK_DATA_LEN;
use crate::messenger::{Button, Keyboard, MediaItem, MediaKind, Messenger, SendOptions};

/// Messenger backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }
}

// Captions and texts are written for the legacy Markdown dialect.
#[allow(deprecated)]
fn markdown_mode() -> ParseMode {
    ParseMode::Markdown
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).with_context(|| format!("Invalid media URL: {raw}"))
}

/// Convert a keyboard, dropping buttons Telegram would reject: invalid URLs
/// and callback payloads over the size limit.
pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| row.iter().filter_map(inline_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn inline_button(button: &Button) -> Option<InlineKeyboardButton> {
    match button {
        Button::Url { text, url } => match Url::parse(url) {
            Ok(url) => Some(InlineKeyboardButton::url(text.clone(), url)),
            Err(e) => {
                warn!("Dropping button '{}' with invalid URL {}: {}", text, url, e);
                None
            }
        },
        Button::Callback { text, data } if data.len() > MAX_CALLBACK_DATA_LEN => {
            warn!(
                "Dropping button '{}': callback data is {} bytes",
                text,
                data.len()
            );
            None
        }
        Button::Callback { text, data } => {
            Some(InlineKeyboardButton::callback(text.clone(), data.clone()))
        }
    }
}

fn input_media(item: &MediaItem) -> Result<InputMedia> {
    let file = InputFile::url(parse_url(&item.url)?);
    let media = match item.kind {
        MediaKind::Photo => {
            let mut photo = InputMediaPhoto::new(file);
            if let Some(caption) = &item.caption {
                photo = photo.caption(caption.clone());
            }
            InputMedia::Photo(photo)
        }
        MediaKind::Video => {
            let mut video = InputMediaVideo::new(file);
            if let Some(caption) = &item.caption {
                video = video.caption(caption.clone());
            }
            InputMedia::Video(video)
        }
    };
    Ok(media)
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<i32> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if options.markdown {
            request = request.parse_mode(markdown_mode());
        }
        if let Some(keyboard) = &options.keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }
        if let Some(reply_to) = options.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }

        let message = request.await.context("sendMessage failed")?;
        debug!("Sent text message {} to chat {}", message.id.0, chat_id);
        Ok(message.id.0)
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
        options: &SendOptions,
    ) -> Result<i32> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::url(parse_url(photo_url)?));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        if options.markdown {
            request = request.parse_mode(markdown_mode());
        }
        if let Some(keyboard) = &options.keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }
        if let Some(reply_to) = options.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }

        let message = request.await.context("sendPhoto failed")?;
        Ok(message.id.0)
    }

    async fn send_video(
        &self,
        chat_id: i64,
        video_url: &str,
        caption: Option<&str>,
        options: &SendOptions,
    ) -> Result<i32> {
        let mut request = self
            .bot
            .send_video(ChatId(chat_id), InputFile::url(parse_url(video_url)?));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        if options.markdown {
            request = request.parse_mode(markdown_mode());
        }
        if let Some(keyboard) = &options.keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }
        if let Some(reply_to) = options.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }

        let message = request.await.context("sendVideo failed")?;
        Ok(message.id.0)
    }

    async fn send_media_group(&self, chat_id: i64, items: &[MediaItem]) -> Result<()> {
        let media = items
            .iter()
            .map(input_media)
            .collect::<Result<Vec<_>>>()?;

        let sent = self
            .bot
            .send_media_group(ChatId(chat_id), media)
            .await
            .context("sendMediaGroup failed")?;
        debug!("Sent media group of {} to chat {}", sent.len(), chat_id);
        Ok(())
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        options: &SendOptions,
    ) -> Result<()> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text);
        if options.markdown {
            request = request.parse_mode(markdown_mode());
        }
        if let Some(keyboard) = &options.keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }

        request.await.context("editMessageText failed")?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .context("deleteMessage failed")?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = alert {
            request = request.text(text).show_alert(true);
        }

        request.await.context("answerCallbackQuery failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_buttons_are_dropped() {
        let keyboard = Keyboard::new(vec![
            vec![Button::url("broken", "not a url")],
            vec![
                Button::url("ok", "https://t.me/SaveAsBot"),
                Button::Callback {
                    text: "cb".to_string(),
                    data: "info_natgeo".to_string(),
                },
            ],
        ]);
        let markup = inline_keyboard(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
    }

    #[test]
    fn test_oversized_callback_buttons_are_dropped() {
        let fits = "x".repeat(MAX_CALLBACK_DATA_LEN);
        let keyboard = Keyboard::new(vec![vec![
            Button::Callback {
                text: "fits".to_string(),
                data: fits,
            },
            Button::Callback {
                text: "too long".to_string(),
                data: format!("info_{}", "u".repeat(MAX_CALLBACK_DATA_LEN)),
            },
        ]]);
        let markup = inline_keyboard(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "fits");
    }

    #[test]
    fn test_media_item_conversion_keeps_caption() {
        let item = MediaItem {
            kind: MediaKind::Video,
            url: "https://cdn.example/a.mp4".to_string(),
            caption: Some("hello".to_string()),
        };
        match input_media(&item).unwrap() {
            InputMedia::Video(video) => assert_eq!(video.caption.as_deref(), Some("hello")),
            other => panic!("expected video, got {other:?}"),
        }
    }

    #[test]
    fn test_media_item_with_bad_url_fails() {
        let item = MediaItem {
            kind: MediaKind::Photo,
            url: "::".to_string(),
            caption: None,
        };
        assert!(input_media(&item).is_err());
    }
}
