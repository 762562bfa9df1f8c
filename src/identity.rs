use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::models::{Message, MessageKey, ReportId};

/// ASCII unit separator; exports do not carry it in message text.
const KEY_DELIMITER: char = '\u{1f}';
const REPORT_ID_LEN: usize = 16;

/// Content-derived message identity.
///
/// Two messages with identical chat, timestamp, sender, content and media
/// produce the same key and therefore share one annotation set.
pub fn message_key(message: &Message) -> MessageKey {
    let media = message.media.as_deref().unwrap_or("");
    let mut raw = String::with_capacity(
        message.chat.len() + message.timestamp.len() + message.sender.len() + message.content.len() + media.len() + 4,
    );
    for (idx, part) in [
        message.chat.as_str(),
        message.timestamp.as_str(),
        message.sender.as_str(),
        message.content.as_str(),
        media,
    ]
    .iter()
    .enumerate()
    {
        if idx > 0 {
            raw.push(KEY_DELIMITER);
        }
        raw.push_str(part);
    }
    MessageKey::new(raw)
}

/// Fingerprint of a loaded export: message count, first and last message
/// keys, and the sorted set of chat names, hashed with SHA-256.
pub fn report_identity(messages: &[Message]) -> ReportId {
    let first = messages.first().map(message_key);
    let last = messages.last().map(message_key);
    let chats: BTreeSet<&str> = messages.iter().map(|m| m.chat.as_str()).collect();

    let mut hasher = Sha256::new();
    hasher.update(messages.len().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(first.as_ref().map(MessageKey::as_str).unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(last.as_ref().map(MessageKey::as_str).unwrap_or("").as_bytes());
    for chat in chats {
        hasher.update([0u8]);
        hasher.update(chat.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    ReportId::new(&digest[..REPORT_ID_LEN])
}
