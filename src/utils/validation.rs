use anyhow::{Result, anyhow};
use std::path::Path;

/// Name used for staged files whose client filename is missing or unusable
pub const FALLBACK_FILENAME: &str = "upload";

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Reduces a client-supplied filename to a single safe path component
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Treat both separators as path separators regardless of platform
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(anyhow!(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        }));
    }

    Ok(sanitized)
}

/// Like [`sanitize_filename`], but never fails
pub fn staging_filename(filename: Option<&str>) -> String {
    filename
        .and_then(|name| sanitize_filename(name).ok())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// True when any `/`-separated segment is `.` or `..`
pub fn has_dot_segment(id: &str) -> bool {
    id.split('/').any(|segment| segment == "." || segment == "..")
}

/// Maps an external image id to the store's public id (`<folder>/<id>`).
///
/// Returns `None` for a missing or blank id, and for ids with `.` or `..`
/// segments, which would resolve outside the folder.
pub fn resolve_public_id(folder: &str, id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() || has_dot_segment(id) {
        return None;
    }
    Some(format!("{}/{}", folder, id))
}

/// Inverse of [`resolve_public_id`]: strips the folder prefix when present
pub fn external_id(folder: &str, public_id: &str) -> String {
    public_id
        .strip_prefix(folder)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(public_id)
        .to_string()
}

/// File extension with the leading dot, lowercased, if the name has one
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}
