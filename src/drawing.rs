use serde::{Deserialize, Serialize};
use std::fmt;

pub type Point = [f32; 2];
pub type Rgba = [f32; 4];

pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Select,
    Pen,
    Eraser,
    TextInsert,
    ImageInsert,
}

impl Tool {
    pub fn is_freehand(self) -> bool {
        matches!(self, Tool::Pen | Tool::Eraser)
    }
}

/// Opaque reference to a pixel source: a `data:` URL or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_data_url() {
            let head: String = self.0.chars().take(32).collect();
            write!(f, "{head}… ({} bytes)", self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f32,
    pub font_weight: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl TextStyle {
    pub fn family_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.font_family.as_deref().unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawingElement {
    Line {
        start: Point,
        end: Point,
        color: Rgba,
        stroke_width: f32,
    },
    Rectangle {
        position: Point,
        size: [f32; 2],
        color: Rgba,
        stroke_width: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Rgba,
        stroke_width: f32,
    },
    Text {
        position: Point,
        content: String,
        color: Rgba,
        style: TextStyle,
    },
    Path {
        points: Vec<Point>,
        color: Rgba,
        stroke_width: f32,
    },
    Image {
        position: Point,
        size: [f32; 2],
        image: ImageRef,
        #[serde(default = "default_draggable")]
        draggable: bool,
    },
}

fn default_draggable() -> bool {
    true
}

impl DrawingElement {
    /// Builds a text element; the font size is clamped to the editable range.
    pub fn text(position: Point, content: impl Into<String>, color: Rgba, mut style: TextStyle) -> Self {
        style.font_size = style.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        DrawingElement::Text {
            position,
            content: content.into(),
            color,
            style,
        }
    }

    pub fn image(position: Point, size: [f32; 2], image: ImageRef) -> Self {
        DrawingElement::Image {
            position,
            size,
            image,
            draggable: true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DrawingElement::Line { .. } => "line",
            DrawingElement::Rectangle { .. } => "rectangle",
            DrawingElement::Circle { .. } => "circle",
            DrawingElement::Text { .. } => "text",
            DrawingElement::Path { .. } => "path",
            DrawingElement::Image { .. } => "image",
        }
    }

    pub fn same_kind(&self, other: &DrawingElement) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DrawingElement::Text { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, DrawingElement::Image { .. })
    }

    /// Images can be pinned in place; everything else moves.
    pub fn is_draggable(&self) -> bool {
        !matches!(self, DrawingElement::Image { draggable: false, .. })
    }

    pub fn color(&self) -> Rgba {
        match self {
            DrawingElement::Line { color, .. }
            | DrawingElement::Rectangle { color, .. }
            | DrawingElement::Circle { color, .. }
            | DrawingElement::Text { color, .. }
            | DrawingElement::Path { color, .. } => *color,
            DrawingElement::Image { .. } => crate::color::BLACK,
        }
    }

    /// Text derives its stroke width from the font size; images have none.
    pub fn stroke_width(&self) -> f32 {
        match self {
            DrawingElement::Line { stroke_width, .. }
            | DrawingElement::Rectangle { stroke_width, .. }
            | DrawingElement::Circle { stroke_width, .. }
            | DrawingElement::Path { stroke_width, .. } => *stroke_width,
            DrawingElement::Text { style, .. } => (style.font_size / 8.0).floor(),
            DrawingElement::Image { .. } => 0.0,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            DrawingElement::Line { start, .. } => *start,
            DrawingElement::Rectangle { position, .. }
            | DrawingElement::Text { position, .. }
            | DrawingElement::Image { position, .. } => *position,
            DrawingElement::Circle { center, .. } => *center,
            DrawingElement::Path { points, .. } => points.first().copied().unwrap_or([0.0, 0.0]),
        }
    }

    /// Moves the element so that its anchor lands on `to`, carrying any
    /// secondary geometry along.
    pub fn set_position(&mut self, to: Point) {
        let from = self.position();
        let dx = to[0] - from[0];
        let dy = to[1] - from[1];
        match self {
            DrawingElement::Line { start, end, .. } => {
                *start = to;
                end[0] += dx;
                end[1] += dy;
            }
            DrawingElement::Rectangle { position, .. }
            | DrawingElement::Text { position, .. }
            | DrawingElement::Image { position, .. } => *position = to,
            DrawingElement::Circle { center, .. } => *center = to,
            DrawingElement::Path { points, .. } => {
                for point in points.iter_mut() {
                    point[0] += dx;
                    point[1] += dy;
                }
            }
        }
    }

    pub fn set_color(&mut self, new_color: Rgba) {
        match self {
            DrawingElement::Line { color, .. }
            | DrawingElement::Rectangle { color, .. }
            | DrawingElement::Circle { color, .. }
            | DrawingElement::Text { color, .. }
            | DrawingElement::Path { color, .. } => *color = new_color,
            DrawingElement::Image { .. } => {}
        }
    }

    pub fn text_style_mut(&mut self) -> Option<&mut TextStyle> {
        match self {
            DrawingElement::Text { style, .. } => Some(style),
            _ => None,
        }
    }

    pub fn set_font_size(&mut self, size: f32) {
        if let Some(style) = self.text_style_mut() {
            style.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
    }

    pub fn font_size(&self) -> Option<f32> {
        match self {
            DrawingElement::Text { style, .. } => Some(style.font_size),
            _ => None,
        }
    }

    pub fn image_ref(&self) -> Option<&ImageRef> {
        match self {
            DrawingElement::Image { image, .. } => Some(image),
            _ => None,
        }
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
    fn text_stroke_width_follows_font_size() {
        let mut text = DrawingElement::text([0.0, 0.0], "hi", [0.0; 4], style(24.0));
        assert_eq!(text.stroke_width(), 3.0);
        text.set_font_size(63.0);
        assert_eq!(text.stroke_width(), 7.0);
        text.set_font_size(1000.0);
        assert_eq!(text.font_size(), Some(MAX_FONT_SIZE));
        assert_eq!(text.stroke_width(), 25.0);
    }

    #[test]
    fn moving_a_path_translates_every_point() {
        let mut path = DrawingElement::Path {
            points: vec![[1.0, 1.0], [3.0, 4.0]],
            color: [0.0; 4],
            stroke_width: 2.0,
        };
        path.set_position([11.0, 21.0]);
        match path {
            DrawingElement::Path { points, .. } => assert_eq!(points, vec![[11.0, 21.0], [13.0, 24.0]]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn moving_a_line_keeps_its_vector() {
        let mut line = DrawingElement::Line {
            start: [0.0, 0.0],
            end: [10.0, 5.0],
            color: [0.0; 4],
            stroke_width: 1.0,
        };
        line.set_position([2.0, 2.0]);
        assert_eq!(
            line,
            DrawingElement::Line {
                start: [2.0, 2.0],
                end: [12.0, 7.0],
                color: [0.0; 4],
                stroke_width: 1.0,
            }
        );
    }

    #[test]
    fn elements_serialize_with_a_type_tag() {
        let image = DrawingElement::image([1.0, 2.0], [30.0, 40.0], ImageRef::new("banner.png"));
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["image"], "banner.png");
        let back: DrawingElement = serde_json::from_value(json).unwrap();
        assert_eq!(back, image);
    }
}
