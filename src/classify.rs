use std::borrow::Cow;

use serde::Serialize;

pub const RAW_MARKER: &str = "raw=1";

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

const MIME_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogv", "video/ogg"),
    ("ogg", "video/ogg"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Everything needed to construct the player for one page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSourceDescriptor {
    pub url: String,
    pub mime_hint: String,
    pub is_audio: bool,
}

impl MediaSourceDescriptor {
    pub fn from_media_path(media_path: &str, serving_root: &str) -> Self {
        Self {
            url: raw_stream_url(serving_root, media_path),
            mime_hint: mime_hint(media_path).to_string(),
            is_audio: media_kind(media_path) == MediaKind::Audio,
        }
    }

    pub fn kind(&self) -> MediaKind {
        if self.is_audio {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }
}

/// Lower-cased extension of `media_path`. A `?` inside the decoded path is
/// either part of the file name (`what?.mp3`) or a carried query suffix
/// (`track.mp3?x=1`): the whole path wins when it ends in a known media
/// extension, otherwise the part before the first `?` is used.
pub fn extension(media_path: &str) -> Option<String> {
    let whole = file_extension(media_path);
    if whole.as_deref().is_some_and(is_known_extension) {
        return whole;
    }
    match media_path.split_once('?') {
        Some((file_part, _)) => file_extension(file_part).or(whole),
        None => whole,
    }
}

fn file_extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

fn is_known_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&ext) || MIME_TYPES.iter().any(|(known, _)| *known == ext)
}

pub fn media_kind(media_path: &str) -> MediaKind {
    match extension(media_path) {
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Audio,
        _ => MediaKind::Video,
    }
}

/// MIME hint for the `<source>` element. Unknown extensions yield an empty
/// hint so the player falls back to the response's content type.
pub fn mime_hint(media_path: &str) -> &'static str {
    let Some(ext) = extension(media_path) else {
        return "";
    };
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or_default()
}

/// Raw-bytes URL for `media_path`. The path goes out as decoded, except for
/// `%` and `#`, which would otherwise be read back as an escape or a fragment.
pub fn raw_stream_url(serving_root: &str, media_path: &str) -> String {
    let separator = if media_path.contains('?') { '&' } else { '?' };
    let path = escape_path(media_path);
    format!("{serving_root}{path}{separator}{RAW_MARKER}")
}

fn escape_path(media_path: &str) -> Cow<'_, str> {
    if media_path.contains(['%', '#']) {
        Cow::Owned(media_path.replace('%', "%25").replace('#', "%23"))
    } else {
        Cow::Borrowed(media_path)
    }
}
