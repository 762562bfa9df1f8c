use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat name used when an export record carries none.
pub const DEFAULT_CHAT: &str = "Unknown Chat";

/// Media names starting with this prefix reference a file that was not found at export time.
pub const MISSING_MEDIA_PREFIX: &str = "missing:";

pub const PAYLOAD_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub chat: String,
    pub sender: String,
    pub is_owner: bool,
    pub content: String,
    pub timestamp: String,
    pub media: Option<String>,
    pub media_mime: Option<String>,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            chat: DEFAULT_CHAT.to_string(),
            sender: sender.into(),
            is_owner: false,
            content: content.into(),
            timestamp: timestamp.into(),
            media: None,
            media_mime: None,
        }
    }

    pub fn in_chat(mut self, chat: impl Into<String>) -> Self {
        self.chat = chat.into();
        self
    }

    pub fn with_media(mut self, media: impl Into<String>, mime: Option<&str>) -> Self {
        self.media = Some(media.into());
        self.media_mime = mime.map(str::to_string);
        self
    }

    pub fn owned(mut self) -> Self {
        self.is_owner = true;
        self
    }

    /// True when the attachment was referenced by the export but never copied.
    pub fn media_is_missing(&self) -> bool {
        self.media
            .as_deref()
            .map(|m| m.starts_with(MISSING_MEDIA_PREFIX))
            .unwrap_or(false)
    }

    /// Attachment file name with any `missing:` marker removed.
    pub fn media_file_name(&self) -> Option<&str> {
        self.media
            .as_deref()
            .map(|m| m.strip_prefix(MISSING_MEDIA_PREFIX).unwrap_or(m))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed annotation vocabulary. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationTag {
    Important,
    Relevant,
    FollowUp,
}

impl AnnotationTag {
    pub const ALL: [AnnotationTag; 3] = [
        AnnotationTag::Important,
        AnnotationTag::Relevant,
        AnnotationTag::FollowUp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnnotationTag::Important => "Important",
            AnnotationTag::Relevant => "Relevant",
            AnnotationTag::FollowUp => "Follow-up",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AnnotationTag::Important => "#e5484d",
            AnnotationTag::Relevant => "#3e63dd",
            AnnotationTag::FollowUp => "#f5a524",
        }
    }

    /// Looks a raw tag name up after trimming and collapsing inner whitespace.
    pub fn from_name(raw: &str) -> Option<Self> {
        let normalized = normalize_tag_name(raw);
        Self::ALL.into_iter().find(|tag| tag.name() == normalized)
    }
}

impl fmt::Display for AnnotationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn normalize_tag_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
    pub color: Option<String>,
}

impl FacetOption {
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub assignments: BTreeMap<MessageKey, Vec<String>>,
}
