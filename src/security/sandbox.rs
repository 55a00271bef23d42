//! Sandboxed file and directory reads for the file body strategy.
//!
//! # Responsibilities
//! - Reject traversal (`..`) and absolute paths outside the allowed prefixes
//! - Return file content as text, or a directory listing as JSON
//! - Cap file size and refuse to echo binary content
//!
//! # Design Decisions
//! - Every outcome is a body string; failures are JSON `{"error": ...}`
//!   payloads, never request failures
//! - Prefix checks run on the path as given, before canonicalization
//! - The prefix set is shared and mutable at runtime; readers take a
//!   snapshot per check

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::json;

/// Process-wide set of absolute path prefixes the guard permits.
#[derive(Debug, Default)]
pub struct AllowedPathSet {
    prefixes: RwLock<Vec<String>>,
}

impl AllowedPathSet {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = Self::default();
        set.replace(prefixes);
        set
    }

    /// Add a prefix if it is not already present.
    pub fn add(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        let mut prefixes = self.prefixes.write().unwrap_or_else(|e| e.into_inner());
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    /// Remove a prefix. Returns whether it was present.
    pub fn remove(&self, prefix: &str) -> bool {
        let mut prefixes = self.prefixes.write().unwrap_or_else(|e| e.into_inner());
        let before = prefixes.len();
        prefixes.retain(|p| p != prefix);
        prefixes.len() != before
    }

    /// Replace the whole set, dropping duplicates.
    pub fn replace<I, S>(&self, new: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for prefix in new {
            let prefix = prefix.into();
            if !deduped.contains(&prefix) {
                deduped.push(prefix);
            }
        }
        *self.prefixes.write().unwrap_or_else(|e| e.into_inner()) = deduped;
    }

    /// Snapshot of the current prefixes.
    pub fn prefixes(&self) -> Vec<String> {
        self.prefixes.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether `path` may be read at all.
    ///
    /// Prefix matching is textual: `/tmp` also admits `/tmpfiles`.
    pub fn permits(&self, path: &str) -> bool {
        if path.contains("..") {
            return false;
        }
        if Path::new(path).is_absolute() {
            let prefixes = self.prefixes.read().unwrap_or_else(|e| e.into_inner());
            return prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()));
        }
        !path.starts_with('/')
    }
}

#[derive(Debug, Serialize)]
struct DirectoryEntry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(rename = "modifiedTime", skip_serializing_if = "Option::is_none")]
    modified_time: Option<f64>,
}

/// Reads files and directories on behalf of clients, inside the sandbox.
#[derive(Debug, Clone)]
pub struct FileAccessGuard {
    allowed: Arc<AllowedPathSet>,
    max_file_size: u64,
}

impl FileAccessGuard {
    pub fn new(allowed: Arc<AllowedPathSet>, max_file_size: u64) -> Self {
        Self { allowed, max_file_size }
    }

    pub fn allowed(&self) -> &Arc<AllowedPathSet> {
        &self.allowed
    }

    /// Content of the file, a JSON listing of the directory, or a JSON error.
    pub fn resolve(&self, path: &str) -> String {
        if !self.allowed.permits(path) {
            tracing::warn!(path, "File access denied");
            return error_body("Access denied - path not allowed");
        }

        let resolved = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(e) => return io_error_body(&e),
        };
        let metadata = match fs::metadata(&resolved) {
            Ok(metadata) => metadata,
            Err(e) => return io_error_body(&e),
        };

        if metadata.is_dir() {
            self.list_directory(&resolved)
        } else if metadata.is_file() {
            self.read_file(&resolved, metadata.len())
        } else {
            error_body("File or directory not found")
        }
    }

    fn list_directory(&self, dir: &Path) -> String {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return error_body("Permission denied reading directory")
            }
            Err(e) => return error_body(&format!("Error listing directory: {e}")),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return error_body(&format!("Error listing directory: {e}")),
            };
            let is_dir = entry.path().is_dir();
            let mut listed = DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: if is_dir { "directory" } else { "file" },
                size: None,
                modified_time: None,
            };
            if !is_dir {
                // stats are best effort; a failure just omits them
                if let Ok(meta) = entry.metadata() {
                    listed.size = Some(meta.len());
                    listed.modified_time = meta
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_secs_f64());
                }
            }
            entries.push(listed);
        }
        entries.sort_by_key(|e| e.name.to_lowercase());

        serde_json::to_string_pretty(&entries)
            .unwrap_or_else(|e| error_body(&format!("Error listing directory: {e}")))
    }

    fn read_file(&self, file: &Path, size: u64) -> String {
        if size > self.max_file_size {
            return error_body(&format!(
                "File too large ({size} bytes), maximum allowed: {}",
                self.max_file_size
            ));
        }

        let bytes = match fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return error_body("Permission denied reading file")
            }
            Err(e) => return error_body(&format!("Error reading file: {e}")),
        };

        match decode_text(&bytes) {
            Some(text) => text,
            None => json!({
                "error": "Binary file detected",
                "info": {
                    "size": size,
                    "name": file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                    "type": "binary",
                }
            })
            .to_string(),
        }
    }
}

/// Try UTF-8, then BOM-marked UTF-16, then Latin-1 restricted to text.
///
/// Latin-1 maps every byte, so it only accepts input free of NUL and other
/// C0 control bytes besides tab, newline, form feed and carriage return.
/// Anything else is treated as binary.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_owned());
    }
    if let Some(text) = decode_utf16(bytes) {
        return Some(text);
    }
    let textual = bytes
        .iter()
        .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r' | 0x0c));
    if textual {
        return Some(bytes.iter().map(|&b| b as char).collect());
    }
    None
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return None,
    };
    if body.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

fn error_body(message: &str) -> String {
    json!({ "error": message }).to_string()
}

fn io_error_body(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => error_body("File or directory not found"),
        io::ErrorKind::PermissionDenied => error_body("Permission denied"),
        _ => error_body(&format!("OS error: {e}")),
    }
}
