use std::collections::HashSet;

use crate::identity::{message_key, report_identity};
use crate::media::{resolve_kind, MediaKind};
use crate::models::{Message, MessageKey, ReportId};
use crate::timestamp::TimestampParser;

/// A loaded message with everything derived from it at load time.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub key: MessageKey,
    pub message: Message,
    pub media_kind: Option<MediaKind>,
    pub instant: Option<i64>,
}

/// The fixed batch of messages for one session. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: Vec<MessageEntry>,
    report_id: ReportId,
    duplicate_keys: usize,
}

impl MessageLog {
    pub fn new(messages: Vec<Message>, parser: &TimestampParser) -> Self {
        let report_id = report_identity(&messages);
        let mut seen = HashSet::with_capacity(messages.len());
        let mut duplicate_keys = 0;
        let entries: Vec<MessageEntry> = messages
            .into_iter()
            .map(|message| {
                let key = message_key(&message);
                if !seen.insert(key.clone()) {
                    duplicate_keys += 1;
                }
                MessageEntry {
                    media_kind: resolve_kind(message.media.as_deref(), message.media_mime.as_deref()),
                    instant: parser.parse(&message.timestamp),
                    key,
                    message,
                }
            })
            .collect();
        if duplicate_keys > 0 {
            tracing::debug!(duplicate_keys, "identical messages share annotation keys");
        }
        tracing::debug!(messages = entries.len(), report_id = %report_id, "message log loaded");
        Self {
            entries,
            report_id,
            duplicate_keys,
        }
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn report_id(&self) -> &ReportId {
        &self.report_id
    }

    /// Number of messages whose key collides with an earlier message.
    pub fn duplicate_keys(&self) -> usize {
        self.duplicate_keys
    }

    pub fn get(&self, key: &MessageKey) -> Option<&MessageEntry> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    /// Distinct chat names in first-appearance order.
    pub fn chats(&self) -> Vec<String> {
        distinct(self.entries.iter().map(|e| e.message.chat.as_str()))
    }

    /// Distinct senders in first-appearance order, optionally within one chat.
    pub fn senders(&self, chat: Option<&str>) -> Vec<String> {
        distinct(
            self.entries
                .iter()
                .filter(|e| chat.map_or(true, |c| e.message.chat == c))
                .map(|e| e.message.sender.as_str()),
        )
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
