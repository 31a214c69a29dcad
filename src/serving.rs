//! How the file server answers `GET /files/<path>` for a regular file.
//!
//! The controller never serves anything itself; this mirrors the server's
//! routing so the inspector can explain what a given URL will return.

use serde::Serialize;

use crate::classify::extension;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "mov", "m4v", "mkv", "avi"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeRoute {
    /// The file bytes, with range request support.
    Raw,
    /// The HTML shell that loads this controller.
    PlayerShell,
    MarkdownViewer,
    /// Any other file, served as-is.
    Direct,
}

pub fn is_media_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&ext) || AUDIO_EXTENSIONS.contains(&ext)
}

/// `raw` is whether the request carried `raw=1`.
pub fn route_for(file_path: &str, raw: bool) -> ServeRoute {
    if raw {
        return ServeRoute::Raw;
    }
    match extension(file_path).as_deref() {
        Some("md") => ServeRoute::MarkdownViewer,
        Some(ext) if is_media_extension(ext) => ServeRoute::PlayerShell,
        _ => ServeRoute::Direct,
    }
}

/// Routes a request target such as `/files/a.mp4?x=1&raw=1`.
pub fn route_request(target: &str) -> ServeRoute {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let raw = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == "raw" && value == "1");
    route_for(path, raw)
}
