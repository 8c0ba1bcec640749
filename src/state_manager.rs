//! Manages slide image loading and caching.
//!
//! Images are decoded on tokio's blocking pool and parked in a shared pending
//! map; the UI thread moves finished decodes into egui textures once per frame.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use egui::{ColorImage, TextureHandle, TextureOptions};
use super::errors::MediaError;
use log::{debug, error, info, trace, warn};

type PendingImages = Arc<Mutex<HashMap<usize, Result<ColorImage, MediaError>>>>;

/// Decodes an image file into an egui `ColorImage`.
pub fn decode_image_file(path: &std::path::Path) -> Result<ColorImage, MediaError> {
    trace!("Decoding slide image: {}", path.display());
    let bytes = std::fs::read(path)?;
    let img = image::load_from_memory(&bytes)?;
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice()))
}

/// Caches slide images by slide index.
pub struct SlideImageCache {
    textures: HashMap<usize, TextureHandle>,
    /// Slides whose image is being decoded or has failed; never requested twice.
    requested: HashSet<usize>,
    failed: HashSet<usize>,
    pending: PendingImages,
}

impl SlideImageCache {
    /// Creates a new, empty `SlideImageCache`.
    pub fn new() -> Self {
        debug!("Initializing new SlideImageCache.");
        Self {
            textures: HashMap::new(),
            requested: HashSet::new(),
            failed: HashSet::new(),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn texture(&self, slide_index: usize) -> Option<&TextureHandle> {
        self.textures.get(&slide_index)
    }

    pub fn is_loading(&self, slide_index: usize) -> bool {
        self.requested.contains(&slide_index)
            && !self.textures.contains_key(&slide_index)
            && !self.failed.contains(&slide_index)
    }

    /// Starts decoding the image for `slide_index` unless already requested.
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, slide_index: usize, path: PathBuf, ctx: egui::Context) {
        if !self.requested.insert(slide_index) {
            return;
        }
        info!("Loading image for slide {}: {}", slide_index, path.display());
        let pending = self.pending.clone();
        tokio::task::spawn_blocking(move || {
            let result = decode_image_file(&path);
            if let Ok(mut guard) = pending.lock() {
                guard.insert(slide_index, result);
            }
            ctx.request_repaint();
        });
    }

    /// Moves finished decodes into textures. Failed slides are logged and left without an image.
    pub fn collect_finished(&mut self, ctx: &egui::Context) {
        let finished: Vec<_> = match self.pending.lock() {
            Ok(mut guard) => guard.drain().collect(),
            Err(_) => {
                warn!("Slide image map poisoned; skipping this frame.");
                return;
            }
        };
        for (slide_index, result) in finished {
            match result {
                Ok(image) => {
                    debug!("Caching image texture for slide {}", slide_index);
                    let texture = ctx.load_texture(format!("slide_{}", slide_index), image, TextureOptions::LINEAR);
                    self.textures.insert(slide_index, texture);
                }
                Err(e) => {
                    error!("Failed to load image for slide {}: {}", slide_index, e);
                    self.failed.insert(slide_index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255])).save(&path).unwrap();
        let decoded = decode_image_file(&path).unwrap();
        assert_eq!(decoded.size, [3, 2]);
        assert_eq!(decoded.pixels[0], egui::Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn garbage_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(decode_image_file(&path), Err(MediaError::Image(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(decode_image_file(&dir.path().join("none.png")), Err(MediaError::Io(_))));
    }

    #[tokio::test]
    async fn requests_are_deduplicated_and_failures_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut cache = SlideImageCache::new();
        cache.request(0, dir.path().join("none.png"), ctx.clone());
        cache.request(0, dir.path().join("none.png"), ctx.clone());
        assert!(cache.is_loading(0));

        for _ in 0..200 {
            if !cache.pending.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(cache.pending.lock().unwrap().len(), 1);
        cache.collect_finished(&ctx);
        assert!(cache.texture(0).is_none());
        assert!(!cache.is_loading(0));
        assert!(cache.pending.lock().unwrap().is_empty());
    }
}
