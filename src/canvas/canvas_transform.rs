#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub offset: [f32; 2],
    pub scale: f32,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasTransform {
    pub fn new() -> Self {
        Self {
            offset: [0.0, 0.0],
            scale: 1.0,
        }
    }

    // Shrinks to fit, never enlarges.
    pub fn fit(canvas: (u32, u32), origin: [f32; 2], viewport: [f32; 2], margin: f32) -> Self {
        let (cw, ch) = (canvas.0 as f32, canvas.1 as f32);
        let avail_w = (viewport[0] - 2.0 * margin).max(1.0);
        let avail_h = (viewport[1] - 2.0 * margin).max(1.0);
        let scale = (avail_w / cw).min(avail_h / ch).min(1.0);
        Self {
            offset: [
                origin[0] + (viewport[0] - cw * scale) / 2.0,
                origin[1] + (viewport[1] - ch * scale) / 2.0,
            ],
            scale,
        }
    }

    pub fn screen_to_canvas(&self, screen_pos: [f32; 2]) -> [f32; 2] {
        [
            (screen_pos[0] - self.offset[0]) / self.scale,
            (screen_pos[1] - self.offset[1]) / self.scale,
        ]
    }

    pub fn canvas_to_screen(&self, canvas_pos: [f32; 2]) -> [f32; 2] {
        [
            canvas_pos[0] * self.scale + self.offset[0],
            canvas_pos[1] * self.scale + self.offset[1],
        ]
    }

    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(self.scale, 0.0, 0.0, self.scale, self.offset[0], self.offset[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_canvases_are_centered_at_natural_size() {
        let t = CanvasTransform::fit((800, 400), [0.0, 56.0], [1000.0, 600.0], 20.0);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.offset, [100.0, 156.0]);
        assert_eq!(t.screen_to_canvas([100.0, 156.0]), [0.0, 0.0]);
    }

    #[test]
    fn large_canvases_shrink_to_fit() {
        let t = CanvasTransform::fit((2000, 500), [0.0, 0.0], [1040.0, 600.0], 20.0);
        assert_eq!(t.scale, 0.5);
        let p = t.canvas_to_screen([2000.0, 500.0]);
        assert_eq!(t.screen_to_canvas(p), [2000.0, 500.0]);
    }
}
