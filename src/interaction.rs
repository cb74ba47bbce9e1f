use crate::drawing::{MAX_FONT_SIZE, MIN_FONT_SIZE, Point, Rgba};
use crate::hit_test::Handle;

/// Smallest width or height an image can be resized to.
pub const MIN_IMAGE_SIZE: f32 = 20.0;

/// Element geometry captured when a resize starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeStart {
    Image { position: Point, size: [f32; 2] },
    Text { font_size: f32 },
}

/// What the pointer is doing right now. At most one mode is active.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging {
        index: usize,
        offset: Point,
    },
    Resizing {
        index: usize,
        handle: Handle,
        origin: Point,
        start: ResizeStart,
    },
    FreehandDrawing {
        points: Vec<Point>,
        color: Rgba,
        width: f32,
    },
    CroppingRect {
        anchor: Point,
    },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Dragging { .. } => "dragging",
            InteractionMode::Resizing { .. } => "resizing",
            InteractionMode::FreehandDrawing { .. } => "freehand",
            InteractionMode::CroppingRect { .. } => "cropping",
        }
    }
}

/// New position and size of an image dragged by `handle` by `(dx, dy)`.
/// Sides never shrink below [`MIN_IMAGE_SIZE`]; when a west or north side is
/// clamped, the opposite edge stays where it was.
pub fn resize_image(position: Point, size: [f32; 2], handle: Handle, dx: f32, dy: f32) -> (Point, [f32; 2]) {
    let [mut x, mut y] = position;
    let [mut w, mut h] = size;

    if handle.moves_east() {
        w = (size[0] + dx).max(MIN_IMAGE_SIZE);
    }
    if handle.moves_west() {
        w = (size[0] - dx).max(MIN_IMAGE_SIZE);
        x = position[0] + size[0] - w;
    }
    if handle.moves_south() {
        h = (size[1] + dy).max(MIN_IMAGE_SIZE);
    }
    if handle.moves_north() {
        h = (size[1] - dy).max(MIN_IMAGE_SIZE);
        y = position[1] + size[1] - h;
    }

    ([x, y], [w, h])
}

/// Text scales by 20px for every 100px the pointer travels along its
/// dominant axis.
pub fn resize_text_size(start_size: f32, dx: f32, dy: f32) -> f32 {
    (start_size + dx.max(dy) / 100.0 * 20.0).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Scales `natural` down to fit within 80% of the canvas, never up.
pub fn fit_size(natural: (u32, u32), canvas: (u32, u32)) -> [f32; 2] {
    let (w, h) = (natural.0 as f32, natural.1 as f32);
    if w <= 0.0 || h <= 0.0 {
        return [w, h];
    }
    let max_w = canvas.0 as f32 * 0.8;
    let max_h = canvas.1 as f32 * 0.8;
    let ratio = (max_w / w).min(max_h / h).min(1.0);
    [w * ratio, h * ratio]
}
