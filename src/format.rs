//! WebP container detection.
//!
//! Detection never trusts a file name alone when content is available, and
//! never reads past the 12-byte RIFF header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::trace;

/// Standard file extension for WebP files.
pub const WEBP_EXTENSION: &str = "webp";

/// MIME type for WebP.
pub const WEBP_MIME_TYPE: &str = "image/webp";

/// Bytes needed to identify a RIFF/WEBP container.
pub const HEADER_LEN: usize = 12;

const RIFF_TAG: &[u8; 4] = b"RIFF";
const WEBP_TAG: &[u8; 4] = b"WEBP";

/// Parsed 12-byte RIFF header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiffHeader {
    /// Size of everything after the first 8 bytes (file size minus 8).
    pub payload_size: u32,
    /// Four-byte form type at bytes 8..12.
    pub form_type: [u8; 4],
}

impl RiffHeader {
    /// Parse a RIFF header. Returns `None` if `data` is shorter than 12 bytes
    /// or does not start with `RIFF`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let header = data.get(..HEADER_LEN)?;
        if &header[0..4] != RIFF_TAG {
            return None;
        }
        let payload_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let form_type = [header[8], header[9], header[10], header[11]];
        Some(Self {
            payload_size,
            form_type,
        })
    }

    /// Whether the form type identifies a WebP payload.
    pub fn is_webp(&self) -> bool {
        &self.form_type == WEBP_TAG
    }
}

/// Check whether `data` starts with a RIFF/WEBP header.
///
/// Buffers shorter than 12 bytes are never WebP.
pub fn is_webp(data: &[u8]) -> bool {
    RiffHeader::parse(data).is_some_and(|h| h.is_webp())
}

/// Whether a file name carries the WebP extension (case-insensitive).
pub fn has_webp_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(WEBP_EXTENSION))
}

/// Check whether the file at `path` is a WebP image.
///
/// Unless `ignore_extension` is set, a `.webp` extension is accepted without
/// touching the file. Otherwise the first 12 bytes are read and sniffed.
/// Unreadable files are not WebP.
pub fn is_webp_file(path: &Path, ignore_extension: bool) -> bool {
    if !ignore_extension && has_webp_extension(path) {
        return true;
    }
    trace!(path = %path.display(), "sniffing file header");
    read_header(path).is_some_and(|h| is_webp(&h))
}

/// Check whether a location (plain path or URL) names a WebP image.
///
/// `file://` URLs and plain paths behave like [`is_webp_file`]. Any other
/// scheme is treated as remote: only the name is checked and the content is
/// never fetched.
pub fn is_webp_location(location: &str, ignore_extension: bool) -> bool {
    match split_scheme(location) {
        None => is_webp_file(Path::new(location), ignore_extension),
        Some(("file", rest)) => {
            // file:///tmp/x.webp and file://localhost/tmp/x.webp
            let path = rest.strip_prefix("localhost").unwrap_or(rest);
            is_webp_file(Path::new(strip_query(path)), ignore_extension)
        }
        Some((_, rest)) => {
            if ignore_extension {
                return false;
            }
            let path = strip_query(rest);
            let name = path.rsplit('/').next().unwrap_or(path);
            has_webp_extension(Path::new(name))
        }
    }
}

/// Split `scheme://rest`. Windows drive letters (`C:\`) are not schemes.
fn split_scheme(location: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = location.split_once("://")?;
    let valid = scheme.len() > 1
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn read_header(path: &Path) -> Option<[u8; HEADER_LEN]> {
    let mut file = File::open(path).ok()?;
    let mut header = [0u8; HEADER_LEN];
    file.read_exact(&mut header).ok()?;
    Some(header)
}
