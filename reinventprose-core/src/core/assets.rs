//! Locating the icon files shipped next to the executable.

use std::path::{Path, PathBuf};

/// Every image the application ships with.
pub const BUNDLED_ASSETS: [&str; 11] = [
    "app_icon.ico",
    "new_book.png",
    "edit.png",
    "edit2.png",
    "save.png",
    "library.png",
    "undo.png",
    "redo.png",
    "bold.png",
    "italic.png",
    "underline.png",
];

/// Finds `name` under `base/assets/` or, failing that, directly in `base`.
///
/// Returns `None` when neither file exists, so callers can fall back to a
/// text-only button.
pub fn asset_path(base: &Path, name: &str) -> Option<PathBuf> {
    [base.join("assets").join(name), base.join(name)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_prefers_assets_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets").join("save.png"), b"png").unwrap();
        fs::write(dir.path().join("save.png"), b"png").unwrap();

        assert_eq!(
            asset_path(dir.path(), "save.png"),
            Some(dir.path().join("assets").join("save.png"))
        );
    }

    #[test]
    fn test_falls_back_to_base_then_none() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bold.png"), b"png").unwrap();
        assert_eq!(asset_path(dir.path(), "bold.png"), Some(dir.path().join("bold.png")));
        assert_eq!(asset_path(dir.path(), "italic.png"), None);
    }

    #[test]
    fn test_bundled_asset_names_are_unique() {
        let mut names = BUNDLED_ASSETS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUNDLED_ASSETS.len());
    }
}
