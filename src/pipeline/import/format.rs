use std::path::Path;

use serde::{Deserialize, Serialize};

/// Broad document categories an upload can fall into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Email,
    Pdf,
    Image,
    Unsupported,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Email => "email",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatDetection {
    pub mime_type: String,
    pub format: DocumentFormat,
}

impl FormatDetection {
    fn new(mime_type: &str, format: DocumentFormat) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            format,
        }
    }
}

/// Classify an upload. Binary signatures win over the name or declared type,
/// since those are easily wrong; text is then split into e-mail or plain text.
pub fn detect_format(file_name: &str, declared_mime: Option<&str>, bytes: &[u8]) -> FormatDetection {
    let header = &bytes[..bytes.len().min(12)];
    match header {
        [0x25, 0x50, 0x44, 0x46, ..] => return FormatDetection::new("application/pdf", DocumentFormat::Pdf),
        [0xFF, 0xD8, 0xFF, ..] => return FormatDetection::new("image/jpeg", DocumentFormat::Image),
        [0x89, 0x50, 0x4E, 0x47, ..] => return FormatDetection::new("image/png", DocumentFormat::Image),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => {
            return FormatDetection::new("image/tiff", DocumentFormat::Image)
        }
        _ if header.len() >= 12 && &header[4..8] == b"ftyp" => {
            return FormatDetection::new("image/heic", DocumentFormat::Image)
        }
        _ => {}
    }

    if !is_likely_text(bytes) {
        return FormatDetection::new("application/octet-stream", DocumentFormat::Unsupported);
    }

    let mime = declared_mime
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty() && m != "application/octet-stream")
        .or_else(|| {
            mime_guess::from_path(file_name)
                .first()
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| "text/plain".to_string());

    if mime == "message/rfc822" {
        FormatDetection::new("message/rfc822", DocumentFormat::Email)
    } else {
        FormatDetection::new("text/plain", DocumentFormat::PlainText)
    }
}

/// Valid UTF-8 in the first 4 KiB and mostly printable.
fn is_likely_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let sample = &bytes[..bytes.len().min(4096)];
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // A multi-byte character cut at the sample edge is still text.
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };

    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    printable as f64 / total as f64 > 0.80
}

/// Strip path components and control characters from an uploaded file name.
pub fn sanitize_filename(original: &str) -> String {
    let name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let clean: String = name.chars().filter(|c| !c.is_control()).take(255).collect();

    if clean.trim().is_empty() {
        "document".to_string()
    } else {
        clean
    }
}
