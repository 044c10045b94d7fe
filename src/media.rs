//! Media-type detection and file validation
//!
//! The backend runs a different detector per media class, so every request
//! starts with classifying the file itself: image, audio or video, from its
//! extension. Unknown extensions are rejected before anything is uploaded.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Accepted image extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];

/// Accepted audio extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "aac", "ogg", "wma"];

/// Accepted video extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "webm", "flv"];

/// The media class a file belongs to, which selects the detection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a path by extension. `None` for anything outside the
    /// accepted sets.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Backend detection endpoint for this media class.
    pub fn endpoint(&self) -> &'static str {
        match self {
            MediaKind::Image => "/api/detect/image",
            MediaKind::Audio => "/api/detect/audio",
            MediaKind::Video => "/api/detect/video",
        }
    }

    /// Endpoint used when the media class could not be determined.
    /// The backend's image detector is the most permissive of the three.
    pub fn fallback_endpoint() -> &'static str {
        MediaKind::Image.endpoint()
    }

    /// MIME type attached to the upload part. Coarse on purpose: the
    /// backend only checks the top-level type.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Audio => "audio/mpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Human-readable detection method shown in the statistics panel.
    pub fn detection_method(&self) -> &'static str {
        match self {
            MediaKind::Image => "Visual Analysis",
            MediaKind::Audio => "Spectral Analysis",
            MediaKind::Video => "Multi-modal Fusion",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "Image"),
            MediaKind::Audio => write!(f, "Audio"),
            MediaKind::Video => write!(f, "Video"),
        }
    }
}

/// True if the extension belongs to one of the accepted sets.
pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
    MediaKind::from_path(path).is_some()
}

/// Metadata for a selected file, captured once at selection time.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub kind: MediaKind,
}

impl FileInfo {
    /// Build file metadata from a path, rejecting unsupported extensions.
    /// The size is read from the filesystem; a missing file is reported as
    /// size 0 here and fails later at upload time.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let kind = MediaKind::from_path(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Some(Self {
            path: path.to_path_buf(),
            file_name,
            size_bytes,
            kind,
        })
    }

    pub fn size_display(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// Format a byte count the way the dashboard does: 1024-based units,
/// trailing zeros trimmed ("0 Bytes", "1.5 KB", "2.25 MB").
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let i = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let i = i.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(i as i32);

    // Two decimals max, no trailing zeros
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", s, UNITS[i])
}
