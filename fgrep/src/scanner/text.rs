use tracing::trace;

use super::{ContentScanner, ScanError};

/// Line oriented scanner used for every extension without a dedicated scanner.
///
/// Lines are decoded lossily: bytes that are not valid UTF-8 (for example
/// Latin-1 text, which sniffs as text) become U+FFFD in the returned
/// fragments, so a fragment can differ from the bytes on disk. Matching runs
/// on the decoded line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextScanner;

impl ContentScanner for TextScanner {
    fn scan(&self, content: &[u8], query: &str) -> Result<Vec<String>, ScanError> {
        let needle = query.to_lowercase();

        let matches: Vec<String> = content
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .map(String::from_utf8_lossy)
            .filter(|line| line.to_lowercase().contains(&needle))
            .map(|line| line.into_owned())
            .collect();

        trace!("Text scan found {} matching lines", matches.len());
        Ok(matches)
    }
}
