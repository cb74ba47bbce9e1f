//! Toolbar strip drawn above the canvas.

use crate::color::to_skia;
use crate::drawing::{Point, Rgba, TextStyle, Tool};
use crate::text_renderer::FontBook;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

pub const TOOLBAR_HEIGHT: f32 = 56.0;

const BUTTON: f32 = 40.0;
const SWATCH: f32 = 22.0;

pub const PALETTE: [Rgba; 8] = [
    [0.0, 0.0, 0.0, 1.0],
    [1.0, 1.0, 1.0, 1.0],
    [0.898, 0.224, 0.208, 1.0],
    [1.0, 0.757, 0.027, 1.0],
    [0.263, 0.627, 0.278, 1.0],
    [0.118, 0.533, 0.898, 1.0],
    [0.557, 0.141, 0.667, 1.0],
    [0.475, 0.333, 0.282, 1.0],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiAction {
    Tool(Tool),
    Color(Rgba),
    BrushSmaller,
    BrushLarger,
    FontSmaller,
    FontLarger,
    ToggleBold,
    AddText,
    PickImage,
    Crop,
    ConfirmCrop,
    CancelCrop,
    Delete,
    Undo,
    Redo,
    Export,
}

struct ToolIcon {
    tool: Tool,
    position: [f32; 2],
    size: [f32; 2],
    key_binding: &'static str,
}

struct Button {
    action: UiAction,
    label: &'static str,
    position: [f32; 2],
    size: [f32; 2],
}

#[derive(Debug, Clone, Copy)]
pub struct ToolbarState {
    pub tool: Tool,
    pub color: Rgba,
    pub brush_size: f32,
    pub font_size: f32,
    pub bold: bool,
    pub cropping: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct UiRenderer {
    tool_icons: Vec<ToolIcon>,
    swatches: Vec<(Rgba, [f32; 2])>,
    buttons: Vec<Button>,
}

impl Default for UiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl UiRenderer {
    pub fn new() -> Self {
        let tools = [
            (Tool::Select, "1"),
            (Tool::Pen, "2"),
            (Tool::Eraser, "3"),
            (Tool::TextInsert, "4"),
            (Tool::ImageInsert, "5"),
        ];
        let tool_icons = tools
            .iter()
            .enumerate()
            .map(|(i, &(tool, key_binding))| ToolIcon {
                tool,
                position: [8.0 + i as f32 * (BUTTON + 6.0), 8.0],
                size: [BUTTON, BUTTON],
                key_binding,
            })
            .collect::<Vec<_>>();

        let palette_x = 8.0 + tools.len() as f32 * (BUTTON + 6.0) + 10.0;
        let swatches = PALETTE
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let col = (i / 2) as f32;
                let row = (i % 2) as f32;
                (*color, [palette_x + col * (SWATCH + 4.0), 4.0 + row * (SWATCH + 4.0)])
            })
            .collect::<Vec<_>>();

        let mut x = palette_x + (PALETTE.len() / 2) as f32 * (SWATCH + 4.0) + 10.0;
        let mut buttons = Vec::new();
        let mut push = |action, label, width: f32| {
            buttons.push(Button {
                action,
                label,
                position: [x, 12.0],
                size: [width, 32.0],
            });
            x += width + 4.0;
        };
        push(UiAction::BrushSmaller, "B-", 32.0);
        push(UiAction::BrushLarger, "B+", 32.0);
        push(UiAction::FontSmaller, "A-", 32.0);
        push(UiAction::FontLarger, "A+", 32.0);
        push(UiAction::ToggleBold, "Bold", 44.0);
        push(UiAction::AddText, "Text", 44.0);
        push(UiAction::PickImage, "Image", 52.0);
        push(UiAction::Crop, "Crop", 44.0);
        push(UiAction::ConfirmCrop, "Apply", 52.0);
        push(UiAction::CancelCrop, "Cancel", 58.0);
        push(UiAction::Delete, "Delete", 58.0);
        push(UiAction::Undo, "Undo", 48.0);
        push(UiAction::Redo, "Redo", 48.0);
        push(UiAction::Export, "Export", 58.0);

        Self {
            tool_icons,
            swatches,
            buttons,
        }
    }

    pub fn is_mouse_over_ui(&self, mouse_pos: Point) -> bool {
        mouse_pos[1] < TOOLBAR_HEIGHT
    }

    pub fn tool_for_key(&self, key: &str) -> Option<Tool> {
        self.tool_icons.iter().find(|icon| icon.key_binding == key).map(|icon| icon.tool)
    }

    pub fn handle_click(&self, mouse_pos: Point) -> Option<UiAction> {
        let inside = |position: [f32; 2], size: [f32; 2]| {
            mouse_pos[0] >= position[0]
                && mouse_pos[0] <= position[0] + size[0]
                && mouse_pos[1] >= position[1]
                && mouse_pos[1] <= position[1] + size[1]
        };
        if let Some(icon) = self.tool_icons.iter().find(|icon| inside(icon.position, icon.size)) {
            return Some(UiAction::Tool(icon.tool));
        }
        if let Some((color, _)) = self.swatches.iter().find(|(_, p)| inside(*p, [SWATCH, SWATCH])) {
            return Some(UiAction::Color(*color));
        }
        self.buttons
            .iter()
            .find(|button| inside(button.position, button.size))
            .map(|button| button.action)
    }

    pub fn draw(&self, pixmap: &mut Pixmap, state: &ToolbarState, fonts: &FontBook) {
        let width = pixmap.width() as f32;
        fill_rect(pixmap, [0.0, 0.0], [width, TOOLBAR_HEIGHT], [0.95, 0.95, 0.95, 1.0]);
        fill_rect(pixmap, [0.0, TOOLBAR_HEIGHT - 1.0], [width, 1.0], [0.8, 0.8, 0.8, 1.0]);

        let label_style = TextStyle {
            font_size: 12.0,
            font_weight: 400,
            font_family: None,
        };

        for icon in &self.tool_icons {
            let background = if icon.tool == state.tool {
                [0.5, 0.7, 1.0, 1.0]
            } else {
                [0.8, 0.8, 0.8, 1.0]
            };
            fill_rect(pixmap, icon.position, icon.size, background);
            let center = [icon.position[0] + icon.size[0] / 2.0, icon.position[1] + icon.size[1] / 2.0];
            draw_tool_glyph(pixmap, icon.tool, center, state);
            fonts.draw_text(
                pixmap,
                icon.key_binding,
                [icon.position[0] + 6.0, icon.position[1] + 7.0],
                [0.3, 0.3, 0.3, 1.0],
                &TextStyle {
                    font_size: 9.0,
                    ..label_style.clone()
                },
            );
        }

        for (color, position) in &self.swatches {
            fill_rect(pixmap, *position, [SWATCH, SWATCH], *color);
            let selected = *color == state.color;
            outline_rect(
                pixmap,
                *position,
                [SWATCH, SWATCH],
                if selected { [0.1, 0.4, 0.9, 1.0] } else { [0.6, 0.6, 0.6, 1.0] },
                if selected { 2.0 } else { 1.0 },
            );
        }

        for button in &self.buttons {
            let enabled = match button.action {
                UiAction::ConfirmCrop | UiAction::CancelCrop => state.cropping,
                UiAction::Undo => state.can_undo,
                UiAction::Redo => state.can_redo,
                _ => true,
            };
            let active = button.action == UiAction::ToggleBold && state.bold;
            let background = match (enabled, active) {
                (_, true) => [0.5, 0.7, 1.0, 1.0],
                (true, false) => [0.88, 0.88, 0.88, 1.0],
                (false, false) => [0.93, 0.93, 0.93, 1.0],
            };
            fill_rect(pixmap, button.position, button.size, background);
            outline_rect(pixmap, button.position, button.size, [0.7, 0.7, 0.7, 1.0], 1.0);
            let text_color = if enabled { [0.15, 0.15, 0.15, 1.0] } else { [0.6, 0.6, 0.6, 1.0] };
            fonts.draw_text(
                pixmap,
                button.label,
                [button.position[0] + button.size[0] / 2.0, button.position[1] + button.size[1] / 2.0],
                text_color,
                &label_style,
            );
        }

        let status = format!("brush {:.0}px  text {:.0}px", state.brush_size, state.font_size);
        let status_x = self
            .buttons
            .last()
            .map(|b| b.position[0] + b.size[0] + 12.0)
            .unwrap_or(width / 2.0);
        let status_w = fonts.measure(&status, &label_style);
        if status_x + status_w < width {
            fonts.draw_text(
                pixmap,
                &status,
                [status_x + status_w / 2.0, TOOLBAR_HEIGHT / 2.0],
                [0.35, 0.35, 0.35, 1.0],
                &label_style,
            );
        }
    }
}

fn draw_tool_glyph(pixmap: &mut Pixmap, tool: Tool, center: Point, state: &ToolbarState) {
    let ink = [0.2, 0.2, 0.2, 1.0];
    let [cx, cy] = center;
    match tool {
        Tool::Select => {
            let mut pb = PathBuilder::new();
            pb.move_to(cx - 5.0, cy - 9.0);
            pb.line_to(cx + 6.0, cy + 1.0);
            pb.line_to(cx + 1.0, cy + 2.0);
            pb.line_to(cx + 4.0, cy + 9.0);
            pb.line_to(cx + 1.0, cy + 10.0);
            pb.line_to(cx - 2.0, cy + 3.0);
            pb.line_to(cx - 5.0, cy + 6.0);
            pb.close();
            fill_path(pixmap, pb, ink);
        }
        Tool::Pen => {
            let mut pb = PathBuilder::new();
            pb.move_to(cx - 10.0, cy + 6.0);
            pb.cubic_to(cx - 4.0, cy - 8.0, cx + 2.0, cy + 10.0, cx + 10.0, cy - 6.0);
            stroke_path(pixmap, pb, state.color, 2.5);
        }
        Tool::Eraser => {
            fill_rect(pixmap, [cx - 9.0, cy - 5.0], [18.0, 10.0], [0.95, 0.6, 0.65, 1.0]);
            outline_rect(pixmap, [cx - 9.0, cy - 5.0], [18.0, 10.0], ink, 1.5);
        }
        Tool::TextInsert => {
            fill_rect(pixmap, [cx - 8.0, cy - 9.0], [16.0, 3.0], ink);
            fill_rect(pixmap, [cx - 1.5, cy - 9.0], [3.0, 18.0], ink);
        }
        Tool::ImageInsert => {
            outline_rect(pixmap, [cx - 10.0, cy - 8.0], [20.0, 16.0], ink, 1.5);
            let mut pb = PathBuilder::new();
            pb.move_to(cx - 8.0, cy + 6.0);
            pb.line_to(cx - 2.0, cy - 1.0);
            pb.line_to(cx + 2.0, cy + 3.0);
            pb.line_to(cx + 5.0, cy);
            pb.line_to(cx + 8.0, cy + 6.0);
            pb.close();
            fill_path(pixmap, pb, ink);
        }
    }
}

fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    paint
}

fn fill_rect(pixmap: &mut Pixmap, position: [f32; 2], size: [f32; 2], color: Rgba) {
    if let Some(rect) = Rect::from_xywh(position[0], position[1], size[0], size[1]) {
        pixmap.fill_rect(rect, &solid(color), Transform::identity(), None);
    }
}

fn outline_rect(pixmap: &mut Pixmap, position: [f32; 2], size: [f32; 2], color: Rgba, width: f32) {
    if let Some(rect) = Rect::from_xywh(position[0], position[1], size[0], size[1]) {
        let mut pb = PathBuilder::new();
        pb.push_rect(rect);
        stroke_path(pixmap, pb, color, width);
    }
}

fn fill_path(pixmap: &mut Pixmap, pb: PathBuilder, color: Rgba) {
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
    }
}

fn stroke_path(pixmap: &mut Pixmap, pb: PathBuilder, color: Rgba, width: f32) {
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolbar_state() -> ToolbarState {
        ToolbarState {
            tool: Tool::Pen,
            color: PALETTE[2],
            brush_size: 5.0,
            font_size: 24.0,
            bold: false,
            cropping: false,
            can_undo: false,
            can_redo: false,
        }
    }

    #[test]
    fn clicks_map_to_tools_swatches_and_buttons() {
        let ui = UiRenderer::new();
        assert_eq!(ui.handle_click([28.0, 28.0]), Some(UiAction::Tool(Tool::Select)));
        assert_eq!(ui.handle_click([74.0, 28.0]), Some(UiAction::Tool(Tool::Pen)));

        let (color, position) = ui.swatches[3];
        assert_eq!(ui.handle_click([position[0] + 5.0, position[1] + 5.0]), Some(UiAction::Color(color)));

        let export = ui.buttons.iter().find(|b| b.action == UiAction::Export).unwrap();
        assert_eq!(
            ui.handle_click([export.position[0] + 1.0, export.position[1] + 1.0]),
            Some(UiAction::Export)
        );
        assert_eq!(ui.handle_click([5.0, 300.0]), None);
    }

    #[test]
    fn number_keys_follow_icon_bindings() {
        let ui = UiRenderer::new();
        assert_eq!(ui.tool_for_key("3"), Some(Tool::Eraser));
        assert_eq!(ui.tool_for_key("5"), Some(Tool::ImageInsert));
        assert_eq!(ui.tool_for_key("9"), None);
    }

    #[test]
    fn active_tool_is_highlighted() {
        let ui = UiRenderer::new();
        let mut pixmap = Pixmap::new(1400, 80).unwrap();
        ui.draw(&mut pixmap, &toolbar_state(), &FontBook::new("Arial"));
        // Corner of the pen icon, away from its glyph.
        let px = pixmap.pixel(56, 10).unwrap();
        assert!(px.blue() > px.red());
        // Below the strip stays untouched.
        assert_eq!(pixmap.pixel(5, 70).unwrap().alpha(), 0);
    }
}
