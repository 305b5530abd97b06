//! File-specific validation functions

use image::ImageReader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::consts::{SIZE_UNITS, SNIFF_WINDOW};

const OOXML_WORD: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const OOXML_SHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const OOXML_SLIDES: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Extracts the lowercase extension of a file name, without the dot
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// Strips any path components from a client-supplied file name
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let filename = filename.trim().replace('\\', "/");

    if filename.is_empty() {
        return None;
    }

    Path::new(&filename)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

/// Renders a byte count in the largest unit where the value stays >= 1,
/// rounded to two decimals: 1536 gives `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Determines the content type of the file at `path` from its bytes.
///
/// Returns `None` when the file cannot be read.
pub fn sniff_mime(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut head = Vec::with_capacity(SNIFF_WINDOW.min(8192));
    file.take(SNIFF_WINDOW as u64).read_to_end(&mut head).ok()?;

    Some(sniff_bytes(&head).to_string())
}

/// Content type of a leading chunk of file content
pub fn sniff_bytes(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return "application/x-empty";
    }

    if head.starts_with(b"%PDF-") {
        return "application/pdf";
    }

    if let Ok(format) = image::guess_format(head) {
        return format.to_mime_type();
    }

    if head.starts_with(b"PK\x03\x04") {
        if contains(head, b"[Content_Types].xml") {
            if contains(head, b"word/") {
                return OOXML_WORD;
            }
            if contains(head, b"xl/") {
                return OOXML_SHEET;
            }
            if contains(head, b"ppt/") {
                return OOXML_SLIDES;
            }
        }
        return "application/zip";
    }

    // OLE compound file: legacy .doc, .xls and .ppt all report as msword
    if head.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
        return "application/msword";
    }
    if head.starts_with(&[0x1F, 0x8B]) {
        return "application/gzip";
    }
    if head.starts_with(b"BZh") {
        return "application/x-bzip2";
    }
    if head.starts_with(b"Rar!\x1A\x07") {
        return "application/vnd.rar";
    }
    if head.starts_with(&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]) {
        return "application/x-7z-compressed";
    }
    if head.len() > 262 && &head[257..262] == b"ustar" {
        return "application/x-tar";
    }

    if looks_like_text(head) {
        return "text/plain";
    }

    "application/octet-stream"
}

/// Reads the pixel dimensions of the image at `path` from its header
pub fn read_dimensions(path: &Path) -> Option<(u32, u32)> {
    ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }

    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte character cut at the end of the sniff window is fine
        Err(e) => e.error_len().is_none(),
    }
}
