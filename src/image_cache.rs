//! Image sources keyed by reference. Each reference is decoded at most once
//! per session; completions arrive over a channel and optionally wake the
//! host event loop.

use crate::drawing::ImageRef;
use crate::error::{EditorError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use tiny_skia::{ColorU8, Pixmap};

pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Decoded pixels in both straight RGBA (for cropping) and premultiplied
/// form (for painting).
pub struct LoadedImage {
    pub pixels: RgbaImage,
    pub pixmap: Pixmap,
}

impl LoadedImage {
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or(EditorError::InvalidCanvasSize { width, height })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(pixels.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(Self { pixels, pixmap })
    }

    pub fn natural_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.natural_size();
        write!(f, "LoadedImage({w}x{h})")
    }
}

#[derive(Debug, Clone)]
pub enum ImageState {
    Pending,
    Ready(Arc<LoadedImage>),
    Failed,
}

type Completion = (ImageRef, Result<LoadedImage>);

pub struct ImageCache {
    entries: HashMap<ImageRef, ImageState>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    waker: Option<Waker>,
    max_bytes: u64,
}

impl ImageCache {
    pub fn new(max_bytes: u64) -> Self {
        let (tx, rx) = channel();
        Self {
            entries: HashMap::new(),
            tx,
            rx,
            waker: None,
            max_bytes,
        }
    }

    /// Installs a callback run after each background decode finishes.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Starts loading `image` unless it is already known.
    pub fn request(&mut self, image: &ImageRef) {
        if self.entries.contains_key(image) {
            return;
        }
        self.entries.insert(image.clone(), ImageState::Pending);
        log::debug!("Loading image {image}");

        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let source = image.clone();
        let max_bytes = self.max_bytes;

        cfg_if::cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                let result = decode_image_source(&source, max_bytes);
                let _ = tx.send((source, result));
                if let Some(wake) = waker {
                    wake();
                }
            } else {
                std::thread::spawn(move || {
                    let result = decode_image_source(&source, max_bytes);
                    if tx.send((source, result)).is_ok() {
                        if let Some(wake) = waker {
                            wake();
                        }
                    }
                });
            }
        }
    }

    /// Registers pixels that are already decoded, such as a crop result.
    pub fn insert(&mut self, image: ImageRef, loaded: LoadedImage) -> Arc<LoadedImage> {
        let loaded = Arc::new(loaded);
        self.entries.insert(image, ImageState::Ready(loaded.clone()));
        loaded
    }

    pub fn state(&self, image: &ImageRef) -> Option<&ImageState> {
        self.entries.get(image)
    }

    pub fn get(&self, image: &ImageRef) -> Option<Arc<LoadedImage>> {
        match self.entries.get(image) {
            Some(ImageState::Ready(loaded)) => Some(loaded.clone()),
            _ => None,
        }
    }

    pub fn is_pending(&self, image: &ImageRef) -> bool {
        matches!(self.entries.get(image), Some(ImageState::Pending))
    }

    /// Drains finished decodes and returns the references that became ready.
    pub fn poll(&mut self) -> Vec<ImageRef> {
        let mut ready = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(image) = self.settle(completion) {
                ready.push(image);
            }
        }
        ready
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for the first completion.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn poll_blocking(&mut self, timeout: std::time::Duration) -> Vec<ImageRef> {
        let mut ready = Vec::new();
        if let Ok(completion) = self.rx.recv_timeout(timeout) {
            if let Some(image) = self.settle(completion) {
                ready.push(image);
            }
        }
        ready.extend(self.poll());
        ready
    }

    fn settle(&mut self, (image, result): Completion) -> Option<ImageRef> {
        match result {
            Ok(loaded) => {
                let (w, h) = loaded.natural_size();
                log::debug!("Image ready {image} ({w}x{h})");
                self.entries.insert(image.clone(), ImageState::Ready(Arc::new(loaded)));
                Some(image)
            }
            Err(e) => {
                log::warn!("Failed to load image {image}: {e}");
                self.entries.insert(image, ImageState::Failed);
                None
            }
        }
    }
}

/// Decodes a `data:` URL, or a file path on native targets.
pub fn decode_image_source(image: &ImageRef, max_bytes: u64) -> Result<LoadedImage> {
    let bytes = read_image_bytes(image, max_bytes)?;
    let pixels = image::load_from_memory(&bytes)?.to_rgba8();
    LoadedImage::from_rgba(pixels)
}

fn read_image_bytes(image: &ImageRef, max_bytes: u64) -> Result<Vec<u8>> {
    let source = image.as_str();
    if let Some(rest) = source.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EditorError::UnsupportedImageSource("malformed data URL".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(EditorError::UnsupportedImageSource(format!(
                "data URL without base64 payload ({header})"
            )));
        }
        // Decoded size is at most 3/4 of the encoded length.
        let estimate = (payload.len() as u64 / 4) * 3;
        if estimate > max_bytes + 3 {
            return Err(EditorError::ImageTooLarge {
                size: estimate,
                limit: max_bytes,
            });
        }
        let bytes = STANDARD.decode(payload.trim())?;
        check_size(bytes.len() as u64, max_bytes)?;
        return Ok(bytes);
    }

    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            Err(EditorError::UnsupportedImageSource(source.to_string()))
        } else {
            let size = std::fs::metadata(source)?.len();
            check_size(size, max_bytes)?;
            Ok(std::fs::read(source)?)
        }
    }
}

/// Wraps an uploaded file as a base64 data URL so the scene stays
/// self-contained. Files over `max_bytes` are rejected.
pub fn upload_to_data_url(bytes: &[u8], mime: &str, max_bytes: u64) -> Result<ImageRef> {
    check_size(bytes.len() as u64, max_bytes)?;
    Ok(ImageRef::new(format!("data:{mime};base64,{}", STANDARD.encode(bytes))))
}

/// MIME type for the image file extensions the decoder understands.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(EditorError::ImageTooLarge { size, limit });
    }
    Ok(())
}
