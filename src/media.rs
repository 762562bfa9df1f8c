use std::path::Path;

use crate::models::{FacetOption, MISSING_MEDIA_PREFIX};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "3gp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "opus", "ogg"];
const PDF_EXTENSIONS: &[&str] = &["pdf"];
const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Pdf,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [MediaKind::Image, MediaKind::Video, MediaKind::Audio, MediaKind::Pdf];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Pdf => "pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "Images",
            MediaKind::Video => "Videos",
            MediaKind::Audio => "Audio",
            MediaKind::Pdf => "PDFs",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_EXTENSIONS,
            MediaKind::Video => VIDEO_EXTENSIONS,
            MediaKind::Audio => AUDIO_EXTENSIONS,
            MediaKind::Pdf => PDF_EXTENSIONS,
        }
    }

    pub fn facet_options() -> Vec<FacetOption> {
        Self::ALL
            .iter()
            .map(|kind| FacetOption {
                value: kind.as_str().to_string(),
                label: kind.label().to_string(),
                color: None,
            })
            .collect()
    }
}

/// Resolves a message attachment to a kind: MIME type first, file extension second.
pub fn resolve_kind(media: Option<&str>, mime: Option<&str>) -> Option<MediaKind> {
    let media = media.filter(|m| !m.is_empty())?;
    if let Some(kind) = mime.and_then(kind_from_mime) {
        return Some(kind);
    }
    let name = media.strip_prefix(MISSING_MEDIA_PREFIX).unwrap_or(media);
    kind_from_extension(name)
}

pub fn kind_from_mime(mime: &str) -> Option<MediaKind> {
    let mime = mime.trim().to_ascii_lowercase();
    if mime.starts_with("image/") {
        Some(MediaKind::Image)
    } else if mime.starts_with("video/") {
        Some(MediaKind::Video)
    } else if mime.starts_with("audio/") {
        Some(MediaKind::Audio)
    } else if mime == PDF_MIME {
        Some(MediaKind::Pdf)
    } else {
        None
    }
}

pub fn kind_from_extension(file_name: &str) -> Option<MediaKind> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    MediaKind::ALL
        .into_iter()
        .find(|kind| kind.extensions().contains(&ext.as_str()))
}

/// Guesses a MIME type from the first bytes of a media file.
///
/// ISO-BMFF containers (`ftyp`) are ambiguous between audio and video for the
/// generic brands, so the file extension decides those.
pub fn sniff_mime(header: &[u8], path: &Path) -> Option<&'static str> {
    if header.is_empty() {
        return None;
    }
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if header.starts_with(b"\x89PNG\r\n\x1A\n") {
        return Some("image/png");
    }
    if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if header.starts_with(b"%PDF-") {
        return Some(PDF_MIME);
    }
    if header.starts_with(b"OggS") {
        return Some("audio/ogg");
    }
    if header.starts_with(b"ID3") {
        return Some("audio/mpeg");
    }
    if header.len() >= 2 && header[0] == 0xFF && (header[1] & 0xE0) == 0xE0 {
        return Some("audio/mpeg");
    }
    if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WAVE" {
        return Some("audio/wav");
    }
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        let brand = &header[8..12];
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        return match brand {
            b"M4A " => Some("audio/mp4"),
            b"isom" | b"mp41" | b"mp42" if ext == "m4a" || ext == "aac" => Some("audio/mp4"),
            b"qt  " => Some("video/quicktime"),
            _ => Some("video/mp4"),
        };
    }
    if header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/webm");
    }
    None
}
