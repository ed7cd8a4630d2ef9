//! Locating image files for seeded resources.
//!
//! Images live in a flat folder and are matched to resources by slug:
//! "Intro to Go" looks for `intro-to-go.png`, `intro-to-go.jpg`, and so on.
//! A file found under a non-canonical name is renamed in place so the folder
//! converges to `<slug>.<ext>` and later runs hit the fast path.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions probed, in order, when no hint is given.
pub const ASSET_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// A located image, already at its canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMatch {
    /// Where the file lives now.
    pub source_path: PathBuf,
    /// `<slug>.<ext>`.
    pub canonical_filename: String,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to scan asset folder {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves resource names to image files inside one folder.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    folder: PathBuf,
}

impl AssetResolver {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Find the image for `resource_name`, canonicalizing its filename.
    ///
    /// `hint` is an optional content type (`"image/webp"`) or bare extension
    /// (`"webp"`) that is probed before the default extension list.
    /// `Ok(None)` means no image exists, which callers report as a warning.
    pub fn resolve(
        &self,
        resource_name: &str,
        hint: Option<&str>,
    ) -> Result<Option<AssetMatch>, AssetError> {
        let slug = asset_slug(resource_name);
        if slug.is_empty() || !self.folder.is_dir() {
            return Ok(None);
        }

        let extensions = probe_extensions(hint);

        let found = match self.probe_exact(&slug, &extensions) {
            Some(path) => Some(path),
            None => self.scan_for_slug(&slug, &extensions)?,
        };

        let Some(found) = found else {
            return Ok(None);
        };

        let ext = found
            .extension()
            .and_then(|e| e.to_str())
            .map(canonical_extension)
            .unwrap_or_default();
        let canonical_filename = format!("{slug}.{ext}");
        let canonical_path = self.folder.join(&canonical_filename);

        if found != canonical_path {
            if canonical_path.exists() {
                tracing::debug!(
                    found = %found.display(),
                    canonical = %canonical_path.display(),
                    "Canonical asset already present, leaving duplicate untouched"
                );
            } else {
                fs::rename(&found, &canonical_path).map_err(|e| AssetError::Rename {
                    from: found.clone(),
                    to: canonical_path.clone(),
                    source: e,
                })?;
                tracing::info!(
                    from = %found.display(),
                    to = %canonical_path.display(),
                    "Renamed asset to canonical filename"
                );
            }
        }

        Ok(Some(AssetMatch {
            source_path: canonical_path,
            canonical_filename,
        }))
    }

    fn probe_exact(&self, slug: &str, extensions: &[String]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|ext| self.folder.join(format!("{slug}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Fallback: any image whose stem slugifies to `slug` (e.g. `Intro To Go.PNG`).
    fn scan_for_slug(
        &self,
        slug: &str,
        extensions: &[String],
    ) -> Result<Option<PathBuf>, AssetError> {
        let entries = fs::read_dir(&self.folder).map_err(|e| AssetError::Scan {
            path: self.folder.clone(),
            source: e,
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                let ext_ok = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| extensions.contains(&e.to_ascii_lowercase()));
                let stem_ok = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| asset_slug(s) == slug);
                ext_ok && stem_ok
            })
            .collect();

        candidates.sort_by_key(|path| {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            let rank = extensions
                .iter()
                .position(|e| *e == ext)
                .unwrap_or(usize::MAX);
            (rank, path.clone())
        });

        Ok(candidates.into_iter().next())
    }
}

/// Filename-safe slug for a resource name.
#[must_use]
pub fn asset_slug(name: &str) -> String {
    slug::slugify(name)
}

/// Extension from a hint such as `"image/png"`, `".png"` or `"PNG"`.
fn hint_extension(hint: &str) -> Option<String> {
    let ext = hint.rsplit('/').next().unwrap_or(hint);
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    (!ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

fn probe_extensions(hint: Option<&str>) -> Vec<String> {
    let mut extensions: Vec<String> = hint.and_then(hint_extension).into_iter().collect();
    for ext in ASSET_EXTENSIONS {
        if !extensions.iter().any(|e| e == ext) {
            extensions.push(ext.to_string());
        }
    }
    extensions
}

fn canonical_extension(ext: &str) -> String {
    match ext.to_ascii_lowercase().as_str() {
        "jpeg" => "jpg".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"\x89PNG").unwrap();
        path
    }

    #[test]
    fn slug_is_lowercase_and_hyphenated() {
        assert_eq!(asset_slug("Intro to Go"), "intro-to-go");
        assert_eq!(asset_slug("C++ / Systems!"), "c-systems");
        assert_eq!(asset_slug("  "), "");
    }

    #[test]
    fn resolves_canonical_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "intro-to-go.png");
        let resolver = AssetResolver::new(dir.path());

        let first = resolver.resolve("Intro to Go", None).unwrap().unwrap();
        assert_eq!(first.source_path, file);
        assert_eq!(first.canonical_filename, "intro-to-go.png");

        let second = resolver.resolve("Intro to Go", None).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn probes_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "rust.webp");
        touch(dir.path(), "rust.jpg");
        let resolver = AssetResolver::new(dir.path());

        let found = resolver.resolve("Rust", None).unwrap().unwrap();
        assert_eq!(found.canonical_filename, "rust.jpg");
    }

    #[test]
    fn hint_extension_is_probed_first() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "rust.png");
        touch(dir.path(), "rust.webp");
        let resolver = AssetResolver::new(dir.path());

        let found = resolver.resolve("Rust", Some("image/webp")).unwrap().unwrap();
        assert_eq!(found.canonical_filename, "rust.webp");
    }

    #[test]
    fn jpeg_is_renamed_to_jpg_once() {
        let dir = tempfile::tempdir().unwrap();
        let original = touch(dir.path(), "data-structures.jpeg");
        let resolver = AssetResolver::new(dir.path());

        let found = resolver.resolve("Data Structures", None).unwrap().unwrap();
        assert_eq!(found.canonical_filename, "data-structures.jpg");
        assert!(!original.exists());
        assert!(dir.path().join("data-structures.jpg").exists());

        let again = resolver.resolve("Data Structures", None).unwrap().unwrap();
        assert_eq!(again, found);
    }

    #[test]
    fn non_canonical_stem_is_found_and_renamed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Intro To Go.PNG");
        let resolver = AssetResolver::new(dir.path());

        let found = resolver.resolve("Intro to Go", None).unwrap().unwrap();
        assert_eq!(found.source_path, dir.path().join("intro-to-go.png"));
        assert!(found.source_path.exists());
        assert!(!dir.path().join("Intro To Go.PNG").exists());
    }

    #[test]
    fn missing_asset_is_none() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "other.png");
        let resolver = AssetResolver::new(dir.path());
        assert!(resolver.resolve("Intro to Go", None).unwrap().is_none());
    }

    #[test]
    fn missing_folder_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new(dir.path().join("nope"));
        assert!(resolver.resolve("Intro to Go", None).unwrap().is_none());
    }

    #[test]
    fn non_image_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "intro-to-go.txt");
        let resolver = AssetResolver::new(dir.path());
        assert!(resolver.resolve("Intro to Go", None).unwrap().is_none());
    }

    #[test]
    fn hint_parsing_accepts_mime_and_bare_extensions() {
        assert_eq!(hint_extension("image/png").as_deref(), Some("png"));
        assert_eq!(hint_extension(".JPG").as_deref(), Some("jpg"));
        assert_eq!(hint_extension("webp").as_deref(), Some("webp"));
        assert_eq!(hint_extension("image/").as_deref(), None);
    }
}
