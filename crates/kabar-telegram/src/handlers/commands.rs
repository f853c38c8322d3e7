use kabar_core::{
    domain::{ChatId, UserId},
    messaging::types::{Command, IncomingUpdate, TextMessage},
};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Text starting with `/` is a command; anything else is chat.
pub(super) fn to_update(
    chat_id: ChatId,
    user_id: UserId,
    username: Option<String>,
    text: &str,
) -> Option<IncomingUpdate> {
    if text.trim_start().starts_with('/') {
        let (name, args) = parse_command(text);
        if name.is_empty() {
            return None;
        }
        return Some(IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            username,
            name,
            args,
        }));
    }

    Some(IncomingUpdate::Text(TextMessage {
        chat_id,
        user_id,
        username,
        text: text.to_string(),
    }))
}
