//! Stored uploads: filename sanitizing and the upload directory.
//!
//! Client filenames are untrusted. [`sanitize_filename`] reduces them to a
//! single ASCII path component so a stored file can never land outside the
//! upload directory. Writes go through a temp file in the same directory and
//! a rename, so a concurrent request with the same name overwrites a complete
//! file rather than interleaving bytes (last write wins).

use crate::error::ApiError;
use axum::body::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use unicode_normalization::UnicodeNormalization;

/// Extensions accepted when extension validation is on.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Name used when sanitizing leaves nothing behind.
const FALLBACK_NAME: &str = "upload";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

/// DOS device names that stay special on Windows whatever the extension.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Lower-cased text after the last `.`, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `filename` carries one of [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// NFKD-normalises, drops non-ASCII, turns path separators into spaces,
/// joins whitespace runs with `_`, removes everything outside
/// `[A-Za-z0-9_.-]` and trims leading/trailing `.` and `_`. An empty result
/// becomes `upload`, keeping the extension when only the extension survived.
///
/// ```rust
/// use docbridge::inference::upload::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My cat.png"), "My_cat.png");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// ```
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let unslashed = ascii.replace(['/', '\\'], " ");
    let joined = unslashed.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = UNSAFE_CHARS.replace_all(&joined, "");
    let mut name = stripped.trim_matches(|c| c == '.' || c == '_').to_string();

    if name.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    // Only the extension survived ("日本.png" -> "png"): keep it as one.
    if !name.contains('.')
        && extension_of(raw).is_some_and(|ext| ext == name.to_ascii_lowercase())
    {
        return format!("{FALLBACK_NAME}.{name}");
    }

    let stem = name.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        name.insert(0, '_');
    }
    name
}

/// A file written into the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Sanitized name inside the upload directory.
    pub filename: String,
    /// Full path on disk.
    pub path: PathBuf,
}

impl StoredUpload {
    /// Public URL under which `GET /uploads/<filename>` serves the file.
    pub fn url(&self) -> String {
        format!("/uploads/{}", self.filename)
    }
}

/// The upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open (creating if needed) the upload directory.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under the sanitized form of `client_name`, replacing any
    /// file already stored under that name.
    pub async fn store(&self, client_name: &str, bytes: Bytes) -> Result<StoredUpload, ApiError> {
        let filename = sanitize_filename(client_name);
        let path = self.dir.join(&filename);
        let dir = self.dir.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(".upload-")
                .tempfile_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| ApiError::StorageFailure {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?
        .map_err(|source| ApiError::StorageFailure {
            path: path.clone(),
            source,
        })?;

        info!("Stored upload {} as {}", client_name, path.display());
        Ok(StoredUpload { filename, path })
    }
}
