use crate::error::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use std::io::Cursor;
use tiny_skia::Pixmap;

/// A rendered canvas encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ExportedImage {
    pub fn from_pixmap(pixmap: &Pixmap) -> Result<Self> {
        let pixels = pixmap_to_rgba(pixmap);
        Ok(Self {
            width: pixmap.width(),
            height: pixmap.height(),
            png: encode_png(&pixels)?,
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.png)?;
        log::info!("Exported {}x{} PNG to {}", self.width, self.height, path.as_ref().display());
        Ok(())
    }
}

/// Converts premultiplied pixmap pixels to straight RGBA.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    out
}

pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(pixels.clone()).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

pub fn png_data_url(pixels: &RgbaImage) -> Result<String> {
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(encode_png(pixels)?)))
}
