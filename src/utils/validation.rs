use std::path::Path;

pub const AUDIO_MPEG: &str = "audio/mpeg";
pub const APPLICATION_JSON: &str = "application/json";

/// Content type sent with an object upload. Sidecars are JSON, everything
/// else is treated as audio.
pub fn content_type_for(path: &Path) -> &'static str {
    if has_extension(path, "json") {
        APPLICATION_JSON
    } else {
        AUDIO_MPEG
    }
}

/// Case-insensitive extension check; accepts filters written as `mp3` or `.mp3`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = normalize_extension(extension);
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

pub fn normalize_extension(extension: &str) -> &str {
    extension.trim().trim_start_matches('.')
}
