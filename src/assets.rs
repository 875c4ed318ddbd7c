//! Sprite loading for entities.

use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A decoded sprite, cheap to clone and share between threads.
#[derive(Debug, Clone)]
pub struct Sprite(Arc<RgbaImage>);

impl Sprite {
    pub fn new(image: RgbaImage) -> Self {
        Sprite(Arc::new(image))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

/// Resolves a sprite path into a loaded sprite or a reason it could not be loaded.
pub trait AssetLoader: Sync {
    fn load(&self, path: &Path) -> Result<Sprite, String>;
}

/// Decodes sprites from files below a root directory.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, path: &Path) -> Result<Sprite, String> {
        let full = self.root.join(path);
        let decoded = image::open(&full).map_err(|e| format!("{}: {}", full.display(), e))?;
        Ok(Sprite::new(decoded.to_rgba8()))
    }
}

/// Generates a flat-colored square per path, for runs without image files.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderAssetLoader {
    pub size: u32,
}

impl Default for PlaceholderAssetLoader {
    fn default() -> Self {
        Self { size: 64 }
    }
}

impl AssetLoader for PlaceholderAssetLoader {
    fn load(&self, path: &Path) -> Result<Sprite, String> {
        // FNV-1a over the path, so each roster entry keeps its color across runs
        let hash = path
            .to_string_lossy()
            .bytes()
            .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
        let [r, g, b, _] = hash.to_le_bytes();
        let color = Rgba([r / 2 + 96, g / 2 + 96, b / 2 + 96, 255]);
        Ok(Sprite::new(RgbaImage::from_pixel(self.size, self.size, color)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_stable_per_path() {
        let loader = PlaceholderAssetLoader { size: 8 };
        let a = loader.load(Path::new("ISMAEL.png")).unwrap();
        let b = loader.load(Path::new("ISMAEL.png")).unwrap();
        assert_eq!((a.width(), a.height()), (8, 8));
        assert_eq!(a.image().get_pixel(0, 0), b.image().get_pixel(7, 7));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let loader = FsAssetLoader::new("/nonexistent-sprite-dir");
        let err = loader.load(Path::new("nobody.png")).unwrap_err();
        assert!(err.contains("nobody.png"));
    }
}
