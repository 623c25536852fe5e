//! Media kinds, size caps, and upload key generation.

use std::path::{Component, Path};

use rand::Rng;

/// Maximum accepted video size (5 GiB).
pub const MAX_VIDEO_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum accepted PDF size (100 MiB).
pub const MAX_PDF_BYTES: u64 = 100 * 1024 * 1024;

/// Category of uploaded media. Each kind has its own storage root, URL
/// mount, size cap, and forced content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Pdf,
}

impl MediaKind {
    /// URL prefix the kind is served under.
    pub const fn mount(self) -> &'static str {
        match self {
            MediaKind::Video => "/uploads",
            MediaKind::Pdf => "/ebooks",
        }
    }

    pub const fn max_bytes(self) -> u64 {
        match self {
            MediaKind::Video => MAX_VIDEO_BYTES,
            MediaKind::Pdf => MAX_PDF_BYTES,
        }
    }

    /// Multipart field the upload route reads the file from.
    pub const fn form_field(self) -> &'static str {
        match self {
            MediaKind::Video => "file",
            MediaKind::Pdf => "pdf",
        }
    }

    /// Extension (lowercase, with dot) whose responses get a forced
    /// `Content-Type`, and that type.
    pub const fn forced_content_type(self) -> (&'static str, &'static str) {
        match self {
            MediaKind::Video => (".mp4", "video/mp4"),
            MediaKind::Pdf => (".pdf", "application/pdf"),
        }
    }

    /// Public path for a stored key, e.g. `/uploads/1700000000000-42.mp4`.
    pub fn served_path(self, key: &str) -> String {
        format!("{}/{}", self.mount(), key)
    }
}

/// Extension of `file_name` including the leading dot, or an empty string.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Generate a storage key: `<unix millis>-<random>` plus the original
/// file's extension.
pub fn generate_key(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let key = format!("{}-{}{}", millis, suffix, extension_of(original_name));
    if is_plain_key(&key) {
        key
    } else {
        // The extension carried something odd; drop it rather than store it.
        format!("{}-{}", millis, suffix)
    }
}

/// Whether `key` is a single ordinary file name with no directory parts.
pub fn is_plain_key(key: &str) -> bool {
    if key.is_empty() || key.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(key).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
