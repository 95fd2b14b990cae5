use std::path::{Component, Path};

const SEPARATOR: char = '/';

/// Builds the storage key for a file: `prefix/relative`, using `/` separators
/// and without leading or trailing separators.
pub fn storage_key(prefix: &str, relative: &Path) -> String {
    let relative = relative_to_posix(relative);
    join_key(prefix, &relative)
}

/// Joins a prefix and a key fragment, trimming stray separators on both.
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches(SEPARATOR);
    let name = name.trim_matches(SEPARATOR);
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}{}{}", prefix, SEPARATOR, name),
    }
}

/// Inverse of [`storage_key`]: the relative path a key was derived from.
pub fn strip_key_prefix<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let prefix = prefix.trim_matches(SEPARATOR);
    if prefix.is_empty() {
        return Some(key);
    }
    key.strip_prefix(prefix)?.strip_prefix(SEPARATOR)
}

/// Sequential object name used for remote sources: `track_001.mp3`.
pub fn sequential_name(number: u32, extension: &str) -> String {
    format!("track_{:03}.{}", number, extension.trim_start_matches('.'))
}

fn relative_to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
