//! Telegram adapter (teloxide).
//!
//! This crate implements the `kabar-core` MessagingPort over Telegram Bot API
//! and runs the long-polling dispatcher.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode as TgParseMode};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use kabar_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, ParseMode, Reply},
    },
    Result,
};

/// Telegram's message limit, in UTF-16 code units.
const MAX_MESSAGE_UNITS: usize = 4096;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(retry_after = ?d, "telegram flood control, retrying");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

/// One outgoing message of a possibly split reply.
#[derive(Debug, PartialEq, Eq)]
struct Chunk {
    text: String,
    mode: ParseMode,
}

fn units(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split on line boundaries so every chunk fits in one Telegram message.
///
/// Rendered HTML never opens a tag on one line and closes it on another, so
/// line splits keep chunks well-formed. A single line over `limit` is cut at
/// whitespace outside any tag or entity; when HTML offers no such cut the
/// line is sent as plain text instead.
fn split_message(text: &str, limit: usize, mode: ParseMode) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_units = 0usize;

    let flush = |current: &mut String, chunks: &mut Vec<Chunk>| {
        let text = std::mem::take(current);
        if !text.trim().is_empty() {
            chunks.push(Chunk { text, mode });
        }
    };

    for line in text.split('\n') {
        let line_units = units(line);
        if line_units > limit {
            flush(&mut current, &mut chunks);
            current_units = 0;
            chunks.extend(cut_line(line, limit, mode));
            continue;
        }

        let extra = if current.is_empty() { line_units } else { line_units + 1 };
        if current_units + extra > limit {
            flush(&mut current, &mut chunks);
            current_units = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_units += 1;
        }
        current.push_str(line);
        current_units += line_units;
    }
    flush(&mut current, &mut chunks);
    chunks
}

fn cut_line(line: &str, limit: usize, mode: ParseMode) -> Vec<Chunk> {
    if mode == ParseMode::Html {
        if let Some(pieces) = html_pieces(line, limit) {
            return pieces
                .into_iter()
                .map(|text| Chunk { text, mode })
                .collect();
        }
        return cut_line(&html_to_plain(line), limit, ParseMode::Plain);
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut used = 0usize;
    for c in line.chars() {
        if used + c.len_utf16() > limit {
            pieces.push(std::mem::take(&mut piece));
            used = 0;
        }
        piece.push(c);
        used += c.len_utf16();
    }
    pieces.push(piece);
    pieces
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .map(|text| Chunk {
            text,
            mode: ParseMode::Plain,
        })
        .collect()
}

fn html_pieces(line: &str, limit: usize) -> Option<Vec<String>> {
    let mut pieces = Vec::new();
    let mut rest = line.trim();
    while units(rest) > limit {
        let cut = last_safe_space(rest, limit)?;
        pieces.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    Some(pieces)
}

/// Byte offset of the last whitespace within the first `limit` units that
/// sits outside every tag, entity and open element.
fn last_safe_space(html: &str, limit: usize) -> Option<usize> {
    let (mut in_tag, mut in_entity) = (false, false);
    let mut depth = 0i32;
    let mut tag_start = 0usize;
    let mut used = 0usize;
    let mut best = None;

    for (i, c) in html.char_indices() {
        used += c.len_utf16();
        if used > limit {
            break;
        }
        match c {
            '<' if !in_tag => {
                in_tag = true;
                tag_start = i;
            }
            '>' if in_tag => {
                in_tag = false;
                let tag = &html[tag_start..=i];
                if tag.starts_with("</") {
                    depth -= 1;
                } else if !tag.ends_with("/>") {
                    depth += 1;
                }
            }
            '&' if !in_tag => in_entity = true,
            ';' if in_entity => in_entity = false,
            c if c.is_whitespace() && i > 0 && !in_tag && !in_entity && depth == 0 => {
                best = Some(i);
            }
            _ => {}
        }
    }
    best
}

/// Tags removed, the entities produced by HTML escaping decoded.
fn html_to_plain(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageRef> {
        let mut last = None;
        for chunk in split_message(&reply.text, MAX_MESSAGE_UNITS, reply.parse_mode) {
            let msg = self
                .with_retry(|| {
                    let req = self.bot.send_message(Self::tg_chat(chat_id), chunk.text.clone());
                    match chunk.mode {
                        ParseMode::Html => req.parse_mode(TgParseMode::Html),
                        ParseMode::Plain => req,
                    }
                })
                .await?;
            last = Some(msg.id.0);
        }

        let message_id =
            last.ok_or_else(|| Error::External("refusing to send an empty reply".to_string()))?;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(message_id),
        })
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }
}
