use serde::{Deserialize, Serialize};

/// Process-unique transfer identifier, strictly increasing, never reused.
pub type SessionId = u64;

/// Immutable metadata about the file being relayed, fixed at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: sanitize_filename(&name.into()),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Keeps `A-Za-z0-9 -_.()`, strips surrounding whitespace, truncates to 256
/// characters, and substitutes `file.bin` when nothing survives.
pub fn sanitize_filename(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')')
        })
        .collect();
    let trimmed = filtered.trim();
    let truncated: String = trimmed.chars().take(256).collect();
    if truncated.is_empty() {
        "file.bin".to_string()
    } else {
        truncated
    }
}
