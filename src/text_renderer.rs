use crate::drawing::{Point, Rgba, TextStyle};
use crate::error::{EditorError, Result};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use std::collections::HashMap;
use tiny_skia::{Mask, Paint, Pixmap, Rect, Transform};

const EMBEDDED_FONT: &[u8] = include_bytes!("../data/fonts/DejaVuSans.ttf");

struct FontFace {
    weight: u16,
    font: FontArc,
}

/// Fonts by family, with one face per registered weight, plus a default face.
#[derive(Default)]
pub struct FontBook {
    families: HashMap<String, Vec<FontFace>>,
    default: Option<FontArc>,
    default_family: String,
}

impl FontBook {
    pub fn new(default_family: impl Into<String>) -> Self {
        Self {
            families: HashMap::new(),
            default: None,
            default_family: default_family.into(),
        }
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    pub fn add_face(&mut self, family: &str, weight: u16, data: Vec<u8>) -> Result<()> {
        let font = FontArc::try_from_vec(data).map_err(|e| EditorError::Font {
            path: family.to_string(),
            reason: e.to_string(),
        })?;
        let faces = self.families.entry(family.to_ascii_lowercase()).or_default();
        faces.retain(|f| f.weight != weight);
        faces.push(FontFace { weight, font });
        Ok(())
    }

    pub fn set_default_face(&mut self, data: Vec<u8>) -> Result<()> {
        let font = FontArc::try_from_vec(data).map_err(|e| EditorError::Font {
            path: "<default>".to_string(),
            reason: e.to_string(),
        })?;
        self.default = Some(font);
        Ok(())
    }

    /// Loads a face from disk. `key` is `Family` or `Family:weight`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_face(&mut self, key: &str, path: &str) -> Result<()> {
        let (family, weight) = split_face_key(key);
        let data = std::fs::read(path).map_err(|e| EditorError::Font {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        self.add_face(family, weight, data)?;
        log::info!("Loaded font face {family} ({weight}) from {path}");
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_default(&mut self, path: &str) -> Result<()> {
        let data = std::fs::read(path).map_err(|e| EditorError::Font {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        self.set_default_face(data)?;
        log::info!("Loaded default font from {path}");
        Ok(())
    }

    /// Uses the face bundled with the crate as the default.
    pub fn load_embedded_default(&mut self) -> Result<()> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT).map_err(|e| EditorError::Font {
            path: "<embedded>".to_string(),
            reason: e.to_string(),
        })?;
        self.default = Some(font);
        Ok(())
    }

    pub fn has_fonts(&self) -> bool {
        self.default.is_some() || !self.families.is_empty()
    }

    /// Resolves family + weight to a face: exact family with the nearest
    /// weight, then the session default family, then the default face.
    pub fn resolve(&self, style: &TextStyle) -> Option<&FontArc> {
        let family = style.family_or(&self.default_family).to_ascii_lowercase();
        self.nearest(&family, style.font_weight)
            .or_else(|| self.nearest(&self.default_family.to_ascii_lowercase(), style.font_weight))
            .or(self.default.as_ref())
    }

    fn nearest(&self, family: &str, weight: u16) -> Option<&FontArc> {
        self.families
            .get(family)?
            .iter()
            .min_by_key(|face| face.weight.abs_diff(weight))
            .map(|face| &face.font)
    }

    /// Advance width of `text` at the style's effective font.
    pub fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        match self.resolve(style) {
            Some(font) => {
                let scaled = font.as_scaled(em_scale(font, style.font_size));
                let mut width = 0.0;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let gid = scaled.glyph_id(ch);
                    if let Some(prev) = prev {
                        width += scaled.kern(prev, gid);
                    }
                    width += scaled.h_advance(gid);
                    prev = Some(gid);
                }
                width
            }
            // 0.6 em per character when no face is available.
            None => text.chars().count() as f32 * style.font_size * 3.0 / 5.0,
        }
    }

    /// Fills the glyphs of `text` centered on `center`, both axes.
    pub fn draw_text(&self, pixmap: &mut Pixmap, text: &str, center: Point, color: Rgba, style: &TextStyle) {
        let Some(font) = self.resolve(style) else {
            return;
        };
        let scaled = font.as_scaled(em_scale(font, style.font_size));
        let width = self.measure(text, style);
        let baseline = center[1] + (scaled.ascent() + scaled.descent()) / 2.0;
        let mut pen_x = center[0] - width / 2.0;

        let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
            return;
        };
        let mask_width = pixmap.width() as i32;
        let mask_height = pixmap.height() as i32;
        let mut bounds: Option<(f32, f32, f32, f32)> = None;

        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let gid = scaled.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += scaled.kern(prev, gid);
            }
            let glyph = gid.with_scale_and_position(scaled.scale(), point(pen_x, baseline));
            pen_x += scaled.h_advance(gid);
            prev = Some(gid);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let px = outlined.px_bounds();
            bounds = Some(match bounds {
                None => (px.min.x, px.min.y, px.max.x, px.max.y),
                Some((x0, y0, x1, y1)) => (x0.min(px.min.x), y0.min(px.min.y), x1.max(px.max.x), y1.max(px.max.y)),
            });
            let data = mask.data_mut();
            outlined.draw(|gx, gy, coverage| {
                let x = px.min.x as i32 + gx as i32;
                let y = px.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= mask_width || y >= mask_height {
                    return;
                }
                let idx = (y * mask_width + x) as usize;
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                data[idx] = data[idx].max(value);
            });
        }

        let Some((x0, y0, x1, y1)) = bounds else {
            return;
        };
        let Some(rect) = Rect::from_ltrb(x0.floor(), y0.floor(), x1.ceil(), y1.ceil()) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(crate::color::to_skia(color));
        paint.anti_alias = false;
        pixmap.fill_rect(rect, &paint, Transform::identity(), Some(&mask));
    }
}

/// ab_glyph scales by ascent-to-descent height; CSS sizes are em sizes.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    match font.units_per_em() {
        Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
        _ => PxScale::from(size),
    }
}

fn split_face_key(key: &str) -> (&str, u16) {
    match key.rsplit_once(':') {
        Some((family, weight)) => match weight.trim().parse() {
            Ok(weight) => (family.trim(), weight),
            Err(_) => (key.trim(), 400),
        },
        None => (key.trim(), 400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(size: f32) -> TextStyle {
        TextStyle {
            font_size: size,
            font_weight: 400,
            font_family: None,
        }
    }

    #[test]
    fn measurement_falls_back_without_fonts() {
        let book = FontBook::new("Arial");
        assert!(!book.has_fonts());
        assert_eq!(book.measure("Hello", &style(20.0)), 60.0);
        assert_eq!(book.measure("", &style(20.0)), 0.0);
    }

    #[test]
    fn face_keys_carry_an_optional_weight() {
        assert_eq!(split_face_key("Roboto"), ("Roboto", 400));
        assert_eq!(split_face_key("Roboto:700"), ("Roboto", 700));
        assert_eq!(split_face_key("Odd:Name"), ("Odd:Name", 400));
    }

    #[test]
    fn bad_font_bytes_are_rejected() {
        let mut book = FontBook::new("Arial");
        assert!(matches!(
            book.add_face("Arial", 400, vec![0, 1, 2, 3]),
            Err(EditorError::Font { .. })
        ));
    }

    #[test]
    fn drawing_without_fonts_leaves_the_surface_untouched() {
        let book = FontBook::new("Arial");
        let mut pixmap = Pixmap::new(40, 20).unwrap();
        book.draw_text(&mut pixmap, "Hi", [20.0, 10.0], [0.0, 0.0, 0.0, 1.0], &style(12.0));
        assert!(pixmap.data().iter().all(|b| *b == 0));
    }

    fn embedded() -> FontBook {
        let mut book = FontBook::new("Arial");
        book.load_embedded_default().unwrap();
        book
    }

    #[test]
    fn embedded_face_measures_glyph_advances() {
        let book = embedded();
        assert!(book.has_fonts());
        let hi = book.measure("Hi", &style(24.0));
        assert!(hi > 0.0);
        assert_ne!(hi, 2.0 * 24.0 * 0.6);
        assert!(book.measure("Hii", &style(24.0)) > hi);
        assert!((book.measure("Hi", &style(48.0)) - 2.0 * hi).abs() < 0.01);
    }

    #[test]
    fn drawn_ink_stays_inside_the_measured_box() {
        let book = embedded();
        let text_style = style(24.0);
        let width = book.measure("Hi", &text_style);
        let mut pixmap = Pixmap::new(200, 60).unwrap();
        book.draw_text(&mut pixmap, "Hi", [100.0, 30.0], [0.0, 0.0, 0.0, 1.0], &text_style);

        let inked: Vec<(u32, u32)> = (0..60)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| pixmap.pixel(x, y).is_some_and(|p| p.alpha() > 0))
            .collect();
        assert!(!inked.is_empty());
        let left = 100.0 - width / 2.0 - 1.0;
        let right = 100.0 + width / 2.0 + 1.0;
        for (x, y) in inked {
            assert!((x as f32) >= left && (x as f32) <= right, "x {x} outside {left}..{right}");
            assert!((17..=42).contains(&y), "y {y} outside the 24px line box");
        }
    }
}
