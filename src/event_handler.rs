use crate::app_state::{State, fit_canvas};
use crate::host;
use crate::state::FrameTexture;
use crate::ui::UiAction;
use winit::event::*;
use winit::keyboard::{KeyCode, PhysicalKey};

const BRUSH_STEP: f32 = 1.0;
const FONT_STEP: f32 = 2.0;

impl State {
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.gpu.config.width = new_size.width;
            self.gpu.config.height = new_size.height;
            self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);

            self.frame = FrameTexture::new(
                &self.gpu.device,
                &self.gpu.frame_layout,
                &self.gpu.sampler,
                (new_size.width, new_size.height),
            );
            let surface = self.editor.surface();
            self.canvas = fit_canvas((surface.width, surface.height), new_size, self.host.padding);
            self.needs_compose = true;
        }
    }

    fn canvas_point(&self) -> Option<[f32; 2]> {
        if self.ui.is_mouse_over_ui(self.input.mouse_pos) {
            return None;
        }
        let p = self.canvas.screen_to_canvas(self.input.mouse_pos);
        let surface = self.editor.surface();
        let inside = p[0] >= 0.0 && p[1] >= 0.0 && p[0] <= surface.width as f32 && p[1] <= surface.height as f32;
        inside.then_some(p)
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        let handled = self.handle_event(event);
        if handled {
            self.needs_compose = true;
        }
        handled
    }

    fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.input.modifiers = modifiers.state();
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.mouse_pos = [position.x as f32, position.y as f32];
                match self.canvas_point() {
                    Some(p) => {
                        self.input.over_canvas = true;
                        self.editor.pointer_move(p);
                    }
                    None if self.input.over_canvas => {
                        self.input.over_canvas = false;
                        self.editor.pointer_leave();
                    }
                    None => {}
                }
                true
            }
            WindowEvent::CursorLeft { .. } => {
                if self.input.over_canvas {
                    self.input.over_canvas = false;
                    self.editor.pointer_leave();
                }
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        if self.ui.is_mouse_over_ui(self.input.mouse_pos) {
                            if let Some(action) = self.ui.handle_click(self.input.mouse_pos) {
                                self.apply_ui_action(action);
                            }
                            return true;
                        }
                        let Some(p) = self.canvas_point() else {
                            return true;
                        };
                        let double = self.input.register_click(p);
                        self.input.left_down = true;
                        self.editor.pointer_down(p);
                        if double {
                            self.input.pending_double_click = Some(p);
                        }
                        if self.editor.is_editing_text() {
                            self.caret.restart();
                        }
                    }
                    ElementState::Released => {
                        if self.input.left_down {
                            self.input.left_down = false;
                            self.editor.pointer_up();
                        }
                        if let Some(p) = self.input.pending_double_click.take() {
                            self.editor.double_click(p);
                            self.caret.restart();
                        }
                    }
                }
                true
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state != ElementState::Pressed {
                    return false;
                }
                let keycode = match key_event.physical_key {
                    PhysicalKey::Code(code) => Some(code),
                    _ => None,
                };
                let is_ctrl_or_cmd = self.input.modifiers.control_key() || self.input.modifiers.super_key();

                if self.editor.is_editing_text() {
                    match keycode {
                        Some(KeyCode::Enter | KeyCode::NumpadEnter) => {
                            self.editor.confirm_text_edit();
                        }
                        Some(KeyCode::Escape) => self.editor.cancel_text_edit(),
                        Some(KeyCode::Backspace) => self.editor.text_backspace(),
                        _ if !is_ctrl_or_cmd => {
                            if let Some(text) = &key_event.text {
                                self.editor.text_input(text);
                            }
                        }
                        _ => {}
                    }
                    self.caret.restart();
                    return true;
                }

                match keycode {
                    Some(code) => self.handle_key(code, is_ctrl_or_cmd),
                    None => false,
                }
            }
            WindowEvent::Ime(Ime::Commit(text)) => {
                if self.editor.is_editing_text() {
                    self.editor.text_input(text);
                    self.caret.restart();
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, code: KeyCode, is_ctrl_or_cmd: bool) -> bool {
        let shift = self.input.modifiers.shift_key();
        match code {
            KeyCode::KeyZ if is_ctrl_or_cmd && shift => self.editor.redo(),
            KeyCode::KeyZ if is_ctrl_or_cmd => self.editor.undo(),
            KeyCode::KeyY if is_ctrl_or_cmd => self.editor.redo(),
            KeyCode::KeyS if is_ctrl_or_cmd => {
                self.apply_ui_action(UiAction::Export);
                true
            }
            KeyCode::KeyO if is_ctrl_or_cmd => {
                self.apply_ui_action(UiAction::PickImage);
                true
            }
            KeyCode::Delete | KeyCode::Backspace => {
                self.apply_ui_action(UiAction::Delete);
                true
            }
            KeyCode::Enter | KeyCode::NumpadEnter if self.editor.is_cropping() => {
                self.apply_ui_action(UiAction::ConfirmCrop);
                true
            }
            KeyCode::Escape if self.editor.is_cropping() => {
                self.editor.cancel_crop();
                true
            }
            KeyCode::Escape if self.editor.selected().is_some() => {
                self.editor.select(None);
                true
            }
            KeyCode::BracketLeft => {
                self.apply_ui_action(UiAction::BrushSmaller);
                true
            }
            KeyCode::BracketRight => {
                self.apply_ui_action(UiAction::BrushLarger);
                true
            }
            KeyCode::Digit1 | KeyCode::Digit2 | KeyCode::Digit3 | KeyCode::Digit4 | KeyCode::Digit5 => {
                let key = match code {
                    KeyCode::Digit1 => "1",
                    KeyCode::Digit2 => "2",
                    KeyCode::Digit3 => "3",
                    KeyCode::Digit4 => "4",
                    _ => "5",
                };
                match self.ui.tool_for_key(key) {
                    Some(tool) => {
                        self.apply_ui_action(UiAction::Tool(tool));
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    pub fn apply_ui_action(&mut self, action: UiAction) {
        let max_bytes = self.editor.images().max_bytes();
        match action {
            UiAction::Tool(crate::drawing::Tool::ImageInsert) => {
                if let Some(image) = host::pick_image(max_bytes) {
                    self.editor.stage_image(image);
                }
            }
            UiAction::Tool(tool) => self.editor.set_tool(tool),
            UiAction::Color(color) => self.editor.set_color(color),
            UiAction::BrushSmaller => self.editor.set_brush_size(self.editor.brush_size() - BRUSH_STEP),
            UiAction::BrushLarger => self.editor.set_brush_size(self.editor.brush_size() + BRUSH_STEP),
            UiAction::FontSmaller => {
                let size = self.toolbar_state().font_size;
                self.editor.set_font_size(size - FONT_STEP);
            }
            UiAction::FontLarger => {
                let size = self.toolbar_state().font_size;
                self.editor.set_font_size(size + FONT_STEP);
            }
            UiAction::ToggleBold => {
                let weight = if self.editor.text_style().font_weight >= 700 { 400 } else { 700 };
                self.editor.set_font_weight(weight);
            }
            UiAction::AddText => {
                self.editor.add_text();
            }
            UiAction::PickImage => {
                if let Some(image) = host::pick_image(max_bytes) {
                    self.editor.insert_image(image);
                }
            }
            UiAction::Crop => {
                self.editor.begin_crop();
            }
            UiAction::ConfirmCrop => {
                if let Err(e) = self.editor.confirm_crop() {
                    log::error!("Crop failed: {e}");
                }
            }
            UiAction::CancelCrop => self.editor.cancel_crop(),
            UiAction::Delete => {
                let outcome = self.editor.delete(host::confirm_clear);
                log::debug!("Delete: {outcome:?}");
            }
            UiAction::Undo => {
                self.editor.undo();
            }
            UiAction::Redo => {
                self.editor.redo();
            }
            UiAction::Export => {
                if let Err(e) = self.editor.trigger_export() {
                    log::error!("Export failed: {e}");
                }
            }
        }
        self.needs_compose = true;
    }
}
