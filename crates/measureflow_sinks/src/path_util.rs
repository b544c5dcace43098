use std::path::{Path, PathBuf};

/// Appends `extension` to `base` unless it's already present, matching the
/// prototype's "append extension if missing" rule for `startNewFile`.
pub(crate) fn with_extension(base: &Path, extension: &str) -> PathBuf {
    let base_str = base.to_string_lossy();
    if base_str.ends_with(extension) {
        base.to_path_buf()
    } else {
        PathBuf::from(format!("{base_str}{extension}"))
    }
}
