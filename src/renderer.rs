//! CPU rasterization of a scene into a `tiny_skia::Pixmap`.

use crate::background::Background;
use crate::color::to_skia;
use crate::drawing::{DrawingElement, Point, Rgba};
use crate::error::{EditorError, Result};
use crate::hit_test::{Bounds, HANDLE_SIZE, element_bounds};
use crate::image_cache::ImageCache;
use crate::scene::Scene;
use crate::text_renderer::FontBook;
use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, LineCap, LineJoin, LinearGradient, Mask, Paint, Path, PathBuilder,
    Pixmap, PixmapPaint, Rect, SpreadMode, Stroke, StrokeDash, Transform,
};

fn selection_color() -> Color {
    Color::from_rgba8(0xFF, 0xC1, 0x07, 0xFF)
}

fn crop_dim_color() -> Color {
    Color::from_rgba8(0, 0, 0, 128)
}

fn brush_outline_color() -> Color {
    Color::from_rgba8(0x80, 0x80, 0x80, 0xFF)
}

/// Output raster size and the rounded-corner radius clipping it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub corner_radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct LiveStroke<'a> {
    pub points: &'a [Point],
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct BrushPreview {
    pub center: Point,
    pub size: f32,
    pub color: Rgba,
}

/// Inline editing of a text element: the buffer replaces its content.
#[derive(Debug, Clone, Copy)]
pub struct TextEditOverlay<'a> {
    pub index: usize,
    pub buffer: &'a str,
    pub caret_visible: bool,
}

/// Everything drawn on top of the scene that is not part of it. Exports
/// render with `Decorations::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decorations<'a> {
    pub selected: Option<usize>,
    pub crop_rect: Option<Bounds>,
    pub live_stroke: Option<LiveStroke<'a>>,
    pub brush_preview: Option<BrushPreview>,
    pub text_edit: Option<TextEditOverlay<'a>>,
}

pub struct Renderer<'a> {
    pub fonts: &'a FontBook,
    pub images: &'a ImageCache,
}

impl<'a> Renderer<'a> {
    pub fn new(fonts: &'a FontBook, images: &'a ImageCache) -> Self {
        Self { fonts, images }
    }

    pub fn render(
        &self,
        scene: &Scene,
        background: &Background,
        surface: Surface,
        decorations: &Decorations<'_>,
    ) -> Result<Pixmap> {
        let mut pixmap = Pixmap::new(surface.width, surface.height).ok_or(EditorError::InvalidCanvasSize {
            width: surface.width,
            height: surface.height,
        })?;

        self.paint_background(&mut pixmap, background);

        for (index, element) in scene.iter().enumerate() {
            let edited = decorations.text_edit.filter(|edit| edit.index == index);
            self.paint_element(&mut pixmap, element, edited.map(|edit| edit.buffer));
            if let Some(edit) = edited {
                self.paint_caret(&mut pixmap, element, edit);
            }
        }

        if let Some(index) = decorations.selected {
            if let Some(element) = scene.get(index) {
                self.paint_selection(&mut pixmap, element);
            }
        }

        if let Some(rect) = decorations.crop_rect {
            paint_crop_overlay(&mut pixmap, rect);
        }

        if let Some(stroke) = decorations.live_stroke {
            paint_polyline(&mut pixmap, stroke.points, stroke.color, stroke.width, None);
        }

        if let Some(preview) = decorations.brush_preview {
            paint_brush_preview(&mut pixmap, preview);
        }

        if let Some(mask) = corner_mask(surface) {
            pixmap.apply_mask(&mask);
        }

        Ok(pixmap)
    }

    fn paint_background(&self, pixmap: &mut Pixmap, background: &Background) {
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        match background {
            Background::Color(color) => pixmap.fill(to_skia(*color)),
            Background::Gradient { start, end, direction } => {
                let (from, to) = direction.endpoints(w, h);
                let shader = LinearGradient::new(
                    tiny_skia::Point::from_xy(from[0], from[1]),
                    tiny_skia::Point::from_xy(to[0], to[1]),
                    vec![GradientStop::new(0.0, to_skia(*start)), GradientStop::new(1.0, to_skia(*end))],
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                match (shader, Rect::from_xywh(0.0, 0.0, w, h)) {
                    (Some(shader), Some(rect)) => {
                        let paint = Paint {
                            shader,
                            anti_alias: false,
                            ..Paint::default()
                        };
                        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                    }
                    _ => pixmap.fill(to_skia(*start)),
                }
            }
            Background::Image(image) => {
                if let Some(loaded) = self.images.get(image) {
                    draw_scaled(pixmap, &loaded.pixmap, [0.0, 0.0], [w, h]);
                }
            }
            Background::Transparent => {}
        }
    }

    fn paint_element(&self, pixmap: &mut Pixmap, element: &DrawingElement, text_override: Option<&str>) {
        match element {
            DrawingElement::Line {
                start,
                end,
                color,
                stroke_width,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(start[0], start[1]);
                pb.line_to(end[0], end[1]);
                if let Some(path) = pb.finish() {
                    stroke_plain(pixmap, &path, *color, *stroke_width);
                }
            }
            DrawingElement::Rectangle {
                position,
                size,
                color,
                stroke_width,
            } => {
                let rect = Bounds::new(position[0], position[1], size[0], size[1]).normalized();
                if let Some(rect) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
                    stroke_plain(pixmap, &PathBuilder::from_rect(rect), *color, *stroke_width);
                }
            }
            DrawingElement::Circle {
                center,
                radius,
                color,
                stroke_width,
            } => {
                if let Some(path) = PathBuilder::from_circle(center[0], center[1], *radius) {
                    stroke_plain(pixmap, &path, *color, *stroke_width);
                }
            }
            DrawingElement::Text {
                position,
                content,
                color,
                style,
            } => {
                let text = text_override.unwrap_or(content);
                if !text.is_empty() {
                    self.fonts.draw_text(pixmap, text, *position, *color, style);
                }
            }
            DrawingElement::Path {
                points,
                color,
                stroke_width,
            } => paint_polyline(pixmap, points, *color, *stroke_width, None),
            DrawingElement::Image {
                position, size, image, ..
            } => {
                if let Some(loaded) = self.images.get(image) {
                    draw_scaled(pixmap, &loaded.pixmap, *position, *size);
                }
            }
        }
    }

    fn paint_selection(&self, pixmap: &mut Pixmap, element: &DrawingElement) {
        let Some(bounds) = element_bounds(element, self.fonts) else {
            return;
        };

        // Text gets a little breathing room around its glyph box.
        let outline = if element.is_text() {
            Bounds::new(bounds.x - 5.0, bounds.y - 5.0, bounds.width + 10.0, bounds.height + 10.0)
        } else {
            bounds
        };
        stroke_dashed_rect(pixmap, outline, selection_color());

        let mut fill = Paint::default();
        fill.set_color(selection_color());
        let mut border = Paint::default();
        border.set_color(Color::BLACK);
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        for (_, center) in bounds.handle_points() {
            let half = HANDLE_SIZE / 2.0;
            if let Some(rect) = Rect::from_xywh(center[0] - half, center[1] - half, HANDLE_SIZE, HANDLE_SIZE) {
                pixmap.fill_rect(rect, &fill, Transform::identity(), None);
                pixmap.stroke_path(&PathBuilder::from_rect(rect), &border, &stroke, Transform::identity(), None);
            }
        }
    }

    fn paint_caret(&self, pixmap: &mut Pixmap, element: &DrawingElement, edit: TextEditOverlay<'_>) {
        let DrawingElement::Text {
            position, color, style, ..
        } = element
        else {
            return;
        };
        let width = self.fonts.measure(edit.buffer, style);
        let box_bounds = Bounds::new(
            position[0] - width / 2.0 - 4.0,
            position[1] - style.font_size / 2.0 - 4.0,
            width + 8.0,
            style.font_size + 8.0,
        );
        stroke_dashed_rect(pixmap, box_bounds, selection_color());

        if edit.caret_visible {
            let x = position[0] + width / 2.0 + 1.0;
            let half = style.font_size / 2.0;
            let mut pb = PathBuilder::new();
            pb.move_to(x, position[1] - half);
            pb.line_to(x, position[1] + half);
            if let Some(path) = pb.finish() {
                stroke_plain(pixmap, &path, *color, 1.5);
            }
        }
    }
}

/// Strokes one freehand segment with round caps, optionally through a clip mask.
pub fn stroke_segment(pixmap: &mut Pixmap, from: Point, to: Point, color: Rgba, width: f32, clip: Option<&Mask>) {
    paint_polyline(pixmap, &[from, to], color, width, clip);
}

/// Coverage mask for the rounded canvas corners, or `None` when square.
pub fn corner_mask(surface: Surface) -> Option<Mask> {
    if surface.corner_radius <= 0.0 {
        return None;
    }
    let path = rounded_rect_path(surface.width as f32, surface.height as f32, surface.corner_radius)?;
    let mut mask = Mask::new(surface.width, surface.height)?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Some(mask)
}

fn rounded_rect_path(w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = radius.min(w / 2.0).min(h / 2.0);
    // Distance from a corner to its cubic control points for a quarter circle.
    let k = r * (1.0 - 0.552_284_8);
    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(w - r, 0.0);
    pb.cubic_to(w - k, 0.0, w, k, w, r);
    pb.line_to(w, h - r);
    pb.cubic_to(w, h - k, w - k, h, w - r, h);
    pb.line_to(r, h);
    pb.cubic_to(k, h, 0.0, h - k, 0.0, h - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, k, k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

fn paint_polyline(pixmap: &mut Pixmap, points: &[Point], color: Rgba, width: f32, clip: Option<&Mask>) {
    if points.len() < 2 || width <= 0.0 {
        return;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(points[0][0], points[0][1]);
    for p in &points[1..] {
        pb.line_to(p[0], p[1]);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), clip);
}

fn stroke_plain(pixmap: &mut Pixmap, path: &Path, color: Rgba, width: f32) {
    if width <= 0.0 {
        return;
    }
    let mut paint = Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
}

fn stroke_dashed_rect(pixmap: &mut Pixmap, bounds: Bounds, color: Color) {
    let b = bounds.normalized();
    let Some(rect) = Rect::from_xywh(b.x, b.y, b.width, b.height) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color);
    let stroke = Stroke {
        width: 2.0,
        dash: StrokeDash::new(vec![5.0, 5.0], 0.0),
        ..Stroke::default()
    };
    pixmap.stroke_path(&PathBuilder::from_rect(rect), &paint, &stroke, Transform::identity(), None);
}

fn paint_crop_overlay(pixmap: &mut Pixmap, rect: Bounds) {
    let Some(full) = Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32) else {
        return;
    };
    let window = rect.normalized();
    let mut pb = PathBuilder::new();
    pb.push_rect(full);
    if let Some(inner) = Rect::from_xywh(window.x, window.y, window.width, window.height) {
        pb.push_rect(inner);
    }
    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(crop_dim_color());
        pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }
    stroke_dashed_rect(pixmap, window, selection_color());
}

fn paint_brush_preview(pixmap: &mut Pixmap, preview: BrushPreview) {
    let radius = (preview.size / 2.0).max(1.0);
    let Some(path) = PathBuilder::from_circle(preview.center[0], preview.center[1], radius) else {
        return;
    };
    let mut fill = Paint::default();
    let [r, g, b, a] = preview.color;
    fill.set_color(to_skia([r, g, b, a * 0.5]));
    pixmap.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);

    let mut outline = Paint::default();
    outline.set_color(brush_outline_color());
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
}

fn draw_scaled(pixmap: &mut Pixmap, source: &Pixmap, position: Point, size: [f32; 2]) {
    if size[0] <= 0.0 || size[1] <= 0.0 || source.width() == 0 || source.height() == 0 {
        return;
    }
    let sx = size[0] / source.width() as f32;
    let sy = size[1] / source.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &paint,
        Transform::from_row(sx, 0.0, 0.0, sy, position[0], position[1]),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::GradientDirection;
    use crate::drawing::{ImageRef, TextStyle};
    use crate::image_cache::LoadedImage;

    const RED: Rgba = [1.0, 0.0, 0.0, 1.0];

    fn surface(w: u32, h: u32) -> Surface {
        Surface {
            width: w,
            height: h,
            corner_radius: 0.0,
        }
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn line_scene() -> Scene {
        Scene::from_elements(vec![DrawingElement::Path {
            points: vec![[10.0, 50.0], [90.0, 50.0]],
            color: RED,
            stroke_width: 6.0,
        }])
    }

    #[test]
    fn same_input_renders_identical_pixels() {
        let fonts = FontBook::new("Arial");
        let images = ImageCache::new(1024);
        let renderer = Renderer::new(&fonts, &images);
        let a = renderer
            .render(&line_scene(), &Background::default(), surface(100, 100), &Decorations::default())
            .unwrap();
        let b = renderer
            .render(&line_scene(), &Background::default(), surface(100, 100), &Decorations::default())
            .unwrap();
        assert_eq!(a.data(), b.data());
        assert_eq!(pixel(&a, 50, 50), [255, 0, 0, 255]);
        assert_eq!(pixel(&a, 50, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn rounded_corners_stay_transparent() {
        let fonts = FontBook::new("Arial");
        let images = ImageCache::new(1024);
        let pixmap = Renderer::new(&fonts, &images)
            .render(
                &Scene::new(),
                &Background::Color(RED),
                Surface {
                    width: 100,
                    height: 60,
                    corner_radius: 20.0,
                },
                &Decorations::default(),
            )
            .unwrap();
        assert_eq!(pixel(&pixmap, 0, 0)[3], 0);
        assert_eq!(pixel(&pixmap, 99, 59)[3], 0);
        assert_eq!(pixel(&pixmap, 50, 30), [255, 0, 0, 255]);
    }

    #[test]
    fn corner_mask_covers_only_the_rounded_rect() {
        assert!(corner_mask(surface(100, 60)).is_none());
        let mask = corner_mask(Surface {
            width: 100,
            height: 60,
            corner_radius: 20.0,
        })
        .unwrap();
        assert_eq!(mask.data()[0], 0);
        assert_eq!(mask.data()[30 * 100 + 50], 255);
    }

    #[test]
    fn gradient_runs_between_its_stops() {
        let fonts = FontBook::new("Arial");
        let images = ImageCache::new(1024);
        let background = Background::Gradient {
            start: [0.0, 0.0, 0.0, 1.0],
            end: [1.0, 1.0, 1.0, 1.0],
            direction: GradientDirection::ToRight,
        };
        let pixmap = Renderer::new(&fonts, &images)
            .render(&Scene::new(), &background, surface(100, 10), &Decorations::default())
            .unwrap();
        assert!(pixel(&pixmap, 1, 5)[0] < 20);
        assert!(pixel(&pixmap, 98, 5)[0] > 235);
    }

    #[test]
    fn selection_decorations_only_when_requested() {
        let fonts = FontBook::new("Arial");
        let mut images = ImageCache::new(1024);
        let image = ImageRef::new("mem://blue");
        let blue = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        images.insert(image.clone(), LoadedImage::from_rgba(blue).unwrap());
        let scene = Scene::from_elements(vec![DrawingElement::image([20.0, 20.0], [40.0, 40.0], image)]);
        let renderer = Renderer::new(&fonts, &images);

        let plain = renderer
            .render(&scene, &Background::default(), surface(100, 100), &Decorations::default())
            .unwrap();
        assert_eq!(pixel(&plain, 40, 40), [0, 0, 255, 255]);
        assert_eq!(pixel(&plain, 20, 20), [0, 0, 255, 255]);
        assert_eq!(pixel(&plain, 17, 17), [255, 255, 255, 255]);

        let selected = renderer
            .render(
                &scene,
                &Background::default(),
                surface(100, 100),
                &Decorations {
                    selected: Some(0),
                    ..Decorations::default()
                },
            )
            .unwrap();
        // North-west handle square centered on the image corner.
        assert_eq!(pixel(&selected, 18, 18), [0xFF, 0xC1, 0x07, 0xFF]);
        assert_eq!(pixel(&selected, 40, 40), [0, 0, 255, 255]);
    }

    #[test]
    fn crop_overlay_dims_only_outside_the_window() {
        let fonts = FontBook::new("Arial");
        let images = ImageCache::new(1024);
        let pixmap = Renderer::new(&fonts, &images)
            .render(
                &Scene::new(),
                &Background::default(),
                surface(100, 100),
                &Decorations {
                    crop_rect: Some(Bounds::new(80.0, 80.0, -60.0, -60.0)),
                    ..Decorations::default()
                },
            )
            .unwrap();
        assert_eq!(pixel(&pixmap, 50, 50), [255, 255, 255, 255]);
        let outside = pixel(&pixmap, 5, 5);
        assert!(outside[0] > 120 && outside[0] < 135, "{outside:?}");
    }

    #[test]
    fn text_without_fonts_renders_nothing_but_still_selects() {
        let fonts = FontBook::new("Arial");
        let images = ImageCache::new(1024);
        let scene = Scene::from_elements(vec![DrawingElement::text(
            [50.0, 50.0],
            "Hi",
            RED,
            TextStyle {
                font_size: 20.0,
                font_weight: 400,
                font_family: None,
            },
        )]);
        let pixmap = Renderer::new(&fonts, &images)
            .render(
                &scene,
                &Background::default(),
                surface(100, 100),
                &Decorations {
                    selected: Some(0),
                    ..Decorations::default()
                },
            )
            .unwrap();
        assert_eq!(pixel(&pixmap, 50, 50), [255, 255, 255, 255]);
        // Bounds are 24x20 around (50, 50); the handle at the west edge is at (38, 50).
        assert_eq!(pixel(&pixmap, 38, 50), [0xFF, 0xC1, 0x07, 0xFF]);
    }

    #[test]
    fn zero_sized_surface_is_an_error() {
        let fonts = FontBook::new("Arial");
        let images = ImageCache::new(1024);
        let err = Renderer::new(&fonts, &images)
            .render(&Scene::new(), &Background::default(), surface(0, 10), &Decorations::default())
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidCanvasSize { width: 0, height: 10 }));
    }
}
