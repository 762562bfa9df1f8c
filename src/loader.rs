use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::error::CoreError;
use crate::media::sniff_mime;
use crate::models::{Message, MISSING_MEDIA_PREFIX};

const SNIFF_BYTES: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaReconcileStats {
    pub checked: usize,
    pub missing: usize,
    pub sniffed: usize,
}

pub fn load_messages(path: &Path, default_chat: &str) -> Result<Vec<Message>, CoreError> {
    let raw = fs::read_to_string(path)?;
    parse_messages(&raw, default_chat)
}

/// Reads an exported `chat.json` message array.
pub fn parse_messages(raw: &str, default_chat: &str) -> Result<Vec<Message>, CoreError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::ImportFormat(format!("message export is not valid JSON: {}", e)))?;
    let Value::Array(records) = value else {
        return Err(CoreError::ImportFormat("message export must be a JSON array".to_string()));
    };
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| parse_record(idx, record, default_chat))
        .collect()
}

fn parse_record(idx: usize, record: &Value, default_chat: &str) -> Result<Message, CoreError> {
    let Value::Object(fields) = record else {
        return Err(CoreError::ImportFormat(format!("message {} is not an object", idx)));
    };
    let required = |name: &str| -> Result<String, CoreError> {
        fields
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::ImportFormat(format!("message {} has no {}", idx, name)))
    };
    let optional = |name: &str| -> Option<String> {
        fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(Message {
        chat: optional("chat").unwrap_or_else(|| default_chat.to_string()),
        sender: required("sender")?,
        is_owner: fields.get("is_owner").and_then(Value::as_bool).unwrap_or(false),
        content: required("content")?,
        timestamp: optional("timestamp").unwrap_or_default(),
        media: optional("media"),
        media_mime: optional("media_mime"),
    })
}

/// Checks attachments against the exported media folder.
///
/// Files that are not there get the `missing:` marker and lose their MIME
/// type; files that are there but carry no MIME type get one sniffed from
/// their leading bytes.
pub fn reconcile_media(messages: &mut [Message], media_dir: &Path) -> MediaReconcileStats {
    let mut stats = MediaReconcileStats::default();
    for message in messages.iter_mut() {
        let Some(name) = message.media.clone() else {
            continue;
        };
        if name.starts_with(MISSING_MEDIA_PREFIX) {
            continue;
        }
        stats.checked += 1;
        let path = media_dir.join(&name);
        if !path.is_file() {
            message.media = Some(format!("{}{}", MISSING_MEDIA_PREFIX, name));
            message.media_mime = None;
            stats.missing += 1;
            continue;
        }
        if message.media_mime.is_none() {
            if let Some(mime) = read_header(&path).and_then(|header| sniff_mime(&header, &path)) {
                message.media_mime = Some(mime.to_string());
                stats.sniffed += 1;
            }
        }
    }
    tracing::debug!(
        checked = stats.checked,
        missing = stats.missing,
        sniffed = stats.sniffed,
        "media reconciled"
    );
    stats
}

fn read_header(path: &Path) -> Option<Vec<u8>> {
    let file = fs::File::open(path).ok()?;
    let mut header = Vec::with_capacity(SNIFF_BYTES);
    file.take(SNIFF_BYTES as u64).read_to_end(&mut header).ok()?;
    Some(header)
}
