//! Byte sizes written as `512MB`, `2G`, `1024`.

use thiserror::Error;

const KB: usize = 1024;
const MB: usize = KB * 1024;
const GB: usize = MB * 1024;

/// Longest suffixes first so `MB` wins over `B`-less `M`.
const SUFFIXES: [(&str, usize); 6] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid size '{0}', expected a byte count like '512MB', '2GB' or '1024'")]
pub struct SizeParseError(String);

/// Parses a size with an optional binary-unit suffix (case-insensitive).
///
/// ```
/// use agrotile::config::parse_size;
///
/// assert_eq!(parse_size("512MB").unwrap(), 512 * 1024 * 1024);
/// assert_eq!(parse_size("2 g").unwrap(), 2 * 1024 * 1024 * 1024);
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// ```
pub fn parse_size(input: &str) -> Result<usize, SizeParseError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), *multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError(trimmed.to_string()))
}

/// Renders a byte count with the largest unit that divides it exactly.
pub fn format_size(bytes: usize) -> String {
    match bytes {
        b if b >= GB && b % GB == 0 => format!("{}GB", b / GB),
        b if b >= MB && b % MB == 0 => format!("{}MB", b / MB),
        b if b >= KB && b % KB == 0 => format!("{}KB", b / KB),
        b => b.to_string(),
    }
}
