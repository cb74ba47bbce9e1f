use crate::drawing::{DrawingElement, Point};
use crate::scene::Scene;
use crate::text_renderer::FontBook;

/// Side length of a resize handle square.
pub const HANDLE_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Flips negative extents so that width and height are non-negative.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self { x, y, width, height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p[0] >= self.x && p[0] <= self.x + self.width && p[1] >= self.y && p[1] <= self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn handle_points(&self) -> [(Handle, Point); 8] {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        [
            (Handle::NorthWest, [x, y]),
            (Handle::North, [x + w / 2.0, y]),
            (Handle::NorthEast, [x + w, y]),
            (Handle::East, [x + w, y + h / 2.0]),
            (Handle::SouthEast, [x + w, y + h]),
            (Handle::South, [x + w / 2.0, y + h]),
            (Handle::SouthWest, [x, y + h]),
            (Handle::West, [x, y + h / 2.0]),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::NorthWest => "nw-resize",
            Handle::North => "n-resize",
            Handle::NorthEast => "ne-resize",
            Handle::East => "e-resize",
            Handle::SouthEast => "se-resize",
            Handle::South => "s-resize",
            Handle::SouthWest => "sw-resize",
            Handle::West => "w-resize",
        }
    }

    pub fn moves_west(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::West | Handle::SouthWest)
    }

    pub fn moves_east(self) -> bool {
        matches!(self, Handle::NorthEast | Handle::East | Handle::SouthEast)
    }

    pub fn moves_north(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::North | Handle::NorthEast)
    }

    pub fn moves_south(self) -> bool {
        matches!(self, Handle::SouthWest | Handle::South | Handle::SouthEast)
    }
}

/// Pointer shape the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorIcon {
    Default,
    Move,
    Resize(Handle),
    Crosshair,
    Hidden,
}

/// Bounding box used for selection, handles and the highlight outline.
/// Only text and images are selectable; other kinds return `None`.
pub fn element_bounds(element: &DrawingElement, fonts: &FontBook) -> Option<Bounds> {
    match element {
        DrawingElement::Text {
            position,
            content,
            style,
            ..
        } => {
            let width = fonts.measure(content, style);
            let height = style.font_size;
            Some(Bounds::new(position[0] - width / 2.0, position[1] - height / 2.0, width, height))
        }
        DrawingElement::Image { position, size, .. } => Some(Bounds::new(position[0], position[1], size[0], size[1])),
        _ => None,
    }
}

/// Topmost selectable element under `p`.
pub fn find_element_at(scene: &Scene, p: Point, fonts: &FontBook) -> Option<usize> {
    scene
        .iter()
        .enumerate()
        .rev()
        .find(|(_, element)| element_bounds(element, fonts).is_some_and(|b| b.contains(p)))
        .map(|(index, _)| index)
}

pub fn find_resize_handle(p: Point, element: &DrawingElement, fonts: &FontBook) -> Option<Handle> {
    let bounds = element_bounds(element, fonts)?;
    let tolerance = HANDLE_SIZE / 2.0;
    bounds
        .handle_points()
        .into_iter()
        .find(|(_, c)| (p[0] - c[0]).abs() <= tolerance && (p[1] - c[1]).abs() <= tolerance)
        .map(|(handle, _)| handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{ImageRef, TextStyle};

    fn image_at(x: f32, y: f32, w: f32, h: f32) -> DrawingElement {
        DrawingElement::image([x, y], [w, h], ImageRef::new("i.png"))
    }

    #[test]
    fn topmost_element_wins() {
        let fonts = FontBook::new("Arial");
        let scene = Scene::from_elements(vec![image_at(0.0, 0.0, 100.0, 100.0), image_at(50.0, 50.0, 100.0, 100.0)]);
        assert_eq!(find_element_at(&scene, [75.0, 75.0], &fonts), Some(1));
        assert_eq!(find_element_at(&scene, [10.0, 10.0], &fonts), Some(0));
        assert_eq!(find_element_at(&scene, [300.0, 300.0], &fonts), None);
    }

    #[test]
    fn paths_and_shapes_are_not_selectable() {
        let fonts = FontBook::new("Arial");
        let scene = Scene::from_elements(vec![DrawingElement::Rectangle {
            position: [0.0, 0.0],
            size: [50.0, 50.0],
            color: [0.0; 4],
            stroke_width: 2.0,
        }]);
        assert_eq!(find_element_at(&scene, [25.0, 25.0], &fonts), None);
    }

    #[test]
    fn text_box_is_centered_on_its_anchor() {
        let fonts = FontBook::new("Arial");
        let text = DrawingElement::text(
            [100.0, 50.0],
            "abcd",
            [0.0; 4],
            TextStyle {
                font_size: 20.0,
                font_weight: 400,
                font_family: None,
            },
        );
        let bounds = element_bounds(&text, &fonts).unwrap();
        assert_eq!(bounds, Bounds::new(76.0, 40.0, 48.0, 20.0));
    }

    #[test]
    fn handles_hit_within_half_their_size() {
        let fonts = FontBook::new("Arial");
        let image = image_at(10.0, 10.0, 100.0, 50.0);
        assert_eq!(find_resize_handle([13.0, 7.0], &image, &fonts), Some(Handle::NorthWest));
        assert_eq!(find_resize_handle([60.0, 60.0], &image, &fonts), Some(Handle::South));
        assert_eq!(find_resize_handle([114.0, 35.0], &image, &fonts), Some(Handle::East));
        assert_eq!(find_resize_handle([15.0, 15.0], &image, &fonts), None);
        assert_eq!(Handle::SouthEast.cursor(), "se-resize");
    }

    #[test]
    fn normalizing_flips_negative_extents() {
        let b = Bounds::new(60.0, 60.0, -50.0, -20.0).normalized();
        assert_eq!(b, Bounds::new(10.0, 40.0, 50.0, 20.0));
    }
}
