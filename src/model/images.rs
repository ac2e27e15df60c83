use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("no such image: {0}")]
    NotFound(String),
    #[error("decoding {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where displayable images live. Listings are never cached.
pub trait ImageStore {
    /// Image names in lexicographic order, read fresh on every call.
    fn list(&self) -> Vec<String>;

    fn load(&self, name: &str) -> Result<RgbImage, ImageError>;
}

/// Images stored as files in one flat directory.
#[derive(Debug, Clone)]
pub struct DirImageStore {
    dir: PathBuf,
}

impl DirImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Only the final path component of `name` is honoured.
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        Path::new(name)
            .file_name()
            .map(|base| self.dir.join(base))
    }
}

impl ImageStore for DirImageStore {
    fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("cannot list images in {}: {err}", self.dir.display());
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    fn load(&self, name: &str) -> Result<RgbImage, ImageError> {
        let path = self
            .path_for(name)
            .filter(|path| path.is_file())
            .ok_or_else(|| ImageError::NotFound(name.to_string()))?;

        let decoded = image::open(&path).map_err(|source| ImageError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(decoded.to_rgb8())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str) {
        RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn lists_files_sorted_and_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirImageStore::new(dir.path());
        write_png(dir.path(), "b.png");
        write_png(dir.path(), "a.png");
        fs::create_dir(dir.path().join("subdir")).unwrap();
        assert_eq!(store.list(), vec!["a.png", "b.png"]);

        fs::remove_file(dir.path().join("a.png")).unwrap();
        write_png(dir.path(), "c.png");
        assert_eq!(store.list(), vec!["b.png", "c.png"]);
    }

    #[test]
    fn load_uses_basename_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirImageStore::new(dir.path());
        write_png(dir.path(), "cat.png");

        let image = store.load("../../elsewhere/cat.png").unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn missing_and_garbage_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirImageStore::new(dir.path());
        fs::write(dir.path().join("junk.png"), b"not a png").unwrap();

        assert!(matches!(store.load("ghost.png"), Err(ImageError::NotFound(_))));
        assert!(matches!(store.load("junk.png"), Err(ImageError::Decode { .. })));
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let store = DirImageStore::new("/definitely/not/here");
        assert!(store.list().is_empty());
    }
}
