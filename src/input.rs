//! Input validation: make sure a user-supplied path names a readable PDF
//! before any converter is started.
//!
//! PDF readers accept a `%PDF` header anywhere in the first kilobyte, so the
//! check looks for the marker in that window rather than at byte 0.

use crate::error::ConvertError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How far into the file the `%PDF` header may start.
const HEADER_WINDOW: usize = 1024;

const PDF_MARKER: &[u8] = b"%PDF";

/// Check `input` and return it as a path to hand to a converter.
///
/// # Errors
/// - [`ConvertError::InvalidInput`] for a blank string or a directory.
/// - [`ConvertError::MissingInput`] when nothing exists at the path.
/// - [`ConvertError::PermissionDenied`] when the file cannot be opened.
/// - [`ConvertError::NotAPdf`] when the header window has no `%PDF` marker.
pub fn resolve_input(input: &str) -> Result<PathBuf, ConvertError> {
    if input.trim().is_empty() {
        return Err(ConvertError::InvalidInput {
            input: input.to_string(),
        });
    }

    let path = PathBuf::from(input);
    if !path.exists() {
        return Err(ConvertError::MissingInput { path });
    }
    if path.is_dir() {
        return Err(ConvertError::InvalidInput {
            input: input.to_string(),
        });
    }

    let head = read_head(&path)?;
    if !has_pdf_header(&head) {
        let mut magic = [0u8; 4];
        let n = head.len().min(4);
        magic[..n].copy_from_slice(&head[..n]);
        return Err(ConvertError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Up to [`HEADER_WINDOW`] leading bytes of the file.
fn read_head(path: &Path) -> Result<Vec<u8>, ConvertError> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::MissingInput {
            path: path.to_path_buf(),
        },
    })?;

    let mut head = Vec::with_capacity(HEADER_WINDOW);
    file.take(HEADER_WINDOW as u64)
        .read_to_end(&mut head)
        .map_err(|e| ConvertError::Internal(format!("Failed to read '{}': {e}", path.display())))?;
    Ok(head)
}

fn has_pdf_header(head: &[u8]) -> bool {
    head.windows(PDF_MARKER.len()).any(|w| w == PDF_MARKER)
}
