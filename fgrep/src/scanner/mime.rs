//! Content type sniffing.
//!
//! Magic bytes are matched with the `infer` crate. Plain text has no magic
//! number, so anything `infer` does not recognise is classified by looking for
//! control bytes that never occur in text.

/// Number of leading bytes inspected when sniffing
pub const SNIFF_LEN: usize = 512;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Returns the MIME type of `content` based on its first [`SNIFF_LEN`] bytes
pub fn sniff(content: &[u8]) -> String {
    let header = &content[..content.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(header) {
        return kind.mime_type().to_string();
    }

    if header.iter().copied().any(is_binary_byte) {
        OCTET_STREAM.to_string()
    } else {
        TEXT_PLAIN.to_string()
    }
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
