//! Content scanners.
//!
//! A scanner tests a file's bytes against a query and returns the matching
//! fragments in file order. Which scanner runs is decided by the file
//! extension through a registry that is built once and never mutated, so
//! frames on different threads consult it without any locking:
//!
//! ```rust,ignore
//! let fragments = scanner::scan("xml", &bytes, "elephant")?;
//! ```
//!
//! Before any scanner runs the content has to sniff as `text/`; binary files
//! are never scanned.
pub mod mime;
pub mod text;
pub mod xml;

use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

pub use text::TextScanner;
pub use xml::XmlScanner;

/// Why a file's content could not be scanned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("content is empty")]
    Empty,
    #[error("content type {mime} is not text")]
    NotText { mime: String },
    #[error("invalid UTF-8: {0}")]
    Encoding(String),
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl ScanError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Tests a byte buffer against a query string
pub trait ContentScanner: Send + Sync {
    /// Returns the matching fragments, or an error when the content cannot be
    /// scanned at all. `Ok(vec![])` means the content was scanned and nothing
    /// matched.
    fn scan(&self, content: &[u8], query: &str) -> Result<Vec<String>, ScanError>;
}

/// Scanner variants known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scanner {
    Text(TextScanner),
    Xml(XmlScanner),
}

impl ContentScanner for Scanner {
    fn scan(&self, content: &[u8], query: &str) -> Result<Vec<String>, ScanError> {
        match self {
            Scanner::Text(scanner) => scanner.scan(content, query),
            Scanner::Xml(scanner) => scanner.scan(content, query),
        }
    }
}

const XML_EXTENSIONS: &[&str] = &["xml", "xsd", "xsl", "xslt", "xaml", "csproj"];

static REGISTRY: Lazy<HashMap<&'static str, Scanner>> = Lazy::new(|| {
    XML_EXTENSIONS
        .iter()
        .map(|ext| (*ext, Scanner::Xml(XmlScanner)))
        .collect()
});

/// Selects the scanner for a file extension, falling back to [`TextScanner`].
///
/// The extension may be given with or without its leading dot and is matched
/// case-insensitively.
pub fn scanner_for(extension: &str) -> Scanner {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    REGISTRY
        .get(ext.as_str())
        .copied()
        .unwrap_or(Scanner::Text(TextScanner))
}

/// Scans `content` with the scanner registered for `extension`.
///
/// Empty content and content that does not sniff as text are rejected before
/// any scanner runs.
pub fn scan(extension: &str, content: &[u8], query: &str) -> Result<Vec<String>, ScanError> {
    if content.is_empty() {
        return Err(ScanError::Empty);
    }

    let mime = mime::sniff(content);
    if !mime.starts_with("text/") {
        trace!("Refusing to scan content of type {}", mime);
        return Err(ScanError::NotText { mime });
    }

    scanner_for(extension).scan(content, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner() {
        let cases = [
            ("txt", "trumpet", true, true, "this is a text trumpet file"),
            ("test", "trumpet", true, true, "this is a test trumpet test file"),
            (
                "xml",
                "dinosaur",
                true,
                true,
                "<parent><child1>one</child1><child2>two dinosaur</child2></parent>",
            ),
            ("gif", "", false, false, "GIF89a..."),
            ("midi", "", false, false, "MThd\x00\x00\x00\x06\x00\x01"),
            ("txt", "trumpet", false, false, ""),
        ];

        for (ext, query, found, ok, content) in cases {
            let result = scan(ext, content.as_bytes(), query);
            assert_eq!(result.is_ok(), ok, "ok mismatch for {ext}: {result:?}");
            let matched = result.map(|m| !m.is_empty()).unwrap_or(false);
            assert_eq!(matched, found, "match mismatch for {ext}");
        }
    }

    #[test]
    fn test_registry_selection() {
        assert_eq!(scanner_for("xml"), Scanner::Xml(XmlScanner));
        assert_eq!(scanner_for(".XML"), Scanner::Xml(XmlScanner));
        assert_eq!(scanner_for("csproj"), Scanner::Xml(XmlScanner));
        assert_eq!(scanner_for("txt"), Scanner::Text(TextScanner));
        assert_eq!(scanner_for(""), Scanner::Text(TextScanner));
        assert_eq!(scanner_for("rs"), Scanner::Text(TextScanner));
    }

    #[test]
    fn test_binary_rejected_regardless_of_extension() {
        for ext in ["txt", "xml", "gif", ""] {
            let result = scan(ext, b"GIF89a\x01\x00\x01\x00", "gif");
            assert!(
                matches!(result, Err(ScanError::NotText { .. })),
                "{ext} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(scan("txt", b"", "x"), Err(ScanError::Empty));
    }

    #[test]
    fn test_malformed_xml_has_no_partial_results() {
        let result = scan("xml", b"<a><b>elephant</b><c>elephant</a>", "elephant");
        assert!(matches!(result, Err(ScanError::Malformed(_))));
    }

    #[test]
    fn test_xml_extension_is_not_text_scanned() {
        let fragments = scan("xml", b"<a><b>needle</b></a>", "needle").unwrap();
        assert_eq!(fragments, vec!["<b>needle</b>"]);

        let fragments = scan("txt", b"<a><b>needle</b></a>", "needle").unwrap();
        assert_eq!(fragments, vec!["<a><b>needle</b></a>"]);
    }
}
