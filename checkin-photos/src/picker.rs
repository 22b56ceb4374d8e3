// Asset picking from the local filesystem
//
// Turns image files into `PhotoAsset`s the registry can upload. Camera and
// gallery pickers on mobile platforms hand over the same triple
// (uri, mime type, display name); this module produces it from a path.

use std::path::{Path, PathBuf};

use crate::models::PhotoAsset;

const FILE_SCHEME: &str = "file://";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickerError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Not an image: {0}")]
    UnsupportedType(String),
    #[error("Too many photos selected ({selected}, limit {limit})")]
    SelectionLimit { selected: usize, limit: usize },
    #[error("Error: {0}")]
    Other(String),
}

/// Builds an asset for one image file
pub fn asset_from_path(path: &Path) -> Result<PhotoAsset, PickerError> {
    if !path.is_file() {
        return Err(PickerError::NotFound(path.display().to_string()));
    }

    let mime_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension)
        .ok_or_else(|| PickerError::UnsupportedType(path.display().to_string()))?;

    let absolute = path
        .canonicalize()
        .map_err(|e| PickerError::Other(format!("{}: {}", path.display(), e)))?;

    let mut asset = PhotoAsset::new(file_uri(&absolute)).with_mime_type(mime_type);
    if let Some(name) = absolute.file_name().and_then(|n| n.to_str()) {
        asset = asset.with_display_name(name);
    }
    Ok(asset)
}

/// Builds assets for a multi-selection, keeping the selection order
pub fn assets_from_paths<P: AsRef<Path>>(
    paths: &[P],
    limit: usize,
) -> Result<Vec<PhotoAsset>, PickerError> {
    if paths.len() > limit {
        return Err(PickerError::SelectionLimit {
            selected: paths.len(),
            limit,
        });
    }
    paths.iter().map(|p| asset_from_path(p.as_ref())).collect()
}

/// `file://` uri for an absolute path
pub fn file_uri(path: &Path) -> String {
    format!("{}{}", FILE_SCHEME, path.display())
}

/// Local path behind a `file://` uri (plain paths are passed through)
pub fn path_from_uri(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix(FILE_SCHEME).unwrap_or(uri))
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
