use crate::app_state::State;
use crate::hit_test::{CursorIcon, Handle};
use crate::host;
use crate::ui::ToolbarState;
use anyhow::Context;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint};

impl State {
    pub fn update(&mut self) {
        if self.editor.poll_images() {
            self.needs_compose = true;
        }

        if self.editor.is_editing_text() && self.caret.due() {
            self.editor.toggle_caret();
        }

        self.flush_autosave(false);
        self.update_cursor();

        if self.needs_compose || self.editor.needs_redraw() {
            match self.compose() {
                Ok(()) => self.needs_compose = false,
                Err(e) => log::error!("Failed to compose frame: {e:#}"),
            }
        }
    }

    // Unforced writes are throttled while edits keep arriving.
    pub fn flush_autosave(&mut self, force: bool) {
        if !self.host.autosave_due.get() || !(force || self.autosave.ready()) {
            return;
        }
        self.host.autosave_due.set(false);
        self.autosave.mark();
        if let Err(e) = host::write_autosave(self.editor.scene().elements(), self.host.autosave_path.as_ref()) {
            log::warn!("Autosave failed: {e:#}");
        }
    }

    fn update_cursor(&self) {
        if self.ui.is_mouse_over_ui(self.input.mouse_pos) || !self.input.over_canvas {
            self.window.set_cursor_visible(true);
            self.window.set_cursor(winit::window::CursorIcon::Default);
            return;
        }
        let icon = match self.editor.cursor() {
            CursorIcon::Hidden => {
                self.window.set_cursor_visible(false);
                return;
            }
            CursorIcon::Default => winit::window::CursorIcon::Default,
            CursorIcon::Move => winit::window::CursorIcon::Move,
            CursorIcon::Crosshair => winit::window::CursorIcon::Crosshair,
            CursorIcon::Resize(handle) => match handle {
                Handle::NorthWest => winit::window::CursorIcon::NwResize,
                Handle::North => winit::window::CursorIcon::NResize,
                Handle::NorthEast => winit::window::CursorIcon::NeResize,
                Handle::East => winit::window::CursorIcon::EResize,
                Handle::SouthEast => winit::window::CursorIcon::SeResize,
                Handle::South => winit::window::CursorIcon::SResize,
                Handle::SouthWest => winit::window::CursorIcon::SwResize,
                Handle::West => winit::window::CursorIcon::WResize,
            },
        };
        self.window.set_cursor_visible(true);
        self.window.set_cursor(icon);
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        let style = self.editor.text_style();
        let selected_text = self
            .editor
            .selected()
            .and_then(|i| self.editor.scene().get(i))
            .filter(|element| element.is_text());
        ToolbarState {
            tool: self.editor.tool(),
            color: self.editor.color(),
            brush_size: self.editor.brush_size(),
            font_size: selected_text.and_then(|e| e.font_size()).unwrap_or(style.font_size),
            bold: style.font_weight >= 700,
            cropping: self.editor.is_cropping(),
            can_undo: self.editor.can_undo(),
            can_redo: self.editor.can_redo(),
        }
    }

    fn compose(&mut self) -> anyhow::Result<()> {
        let (width, height) = self.frame.size;
        let mut window_pixmap = Pixmap::new(width, height).context("window pixmap")?;
        window_pixmap.fill(Color::from_rgba8(0xE6, 0xE6, 0xE6, 0xFF));

        let toolbar = self.toolbar_state();
        let transform = self.canvas.to_skia();
        let quality = if self.canvas.scale == 1.0 {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        let frame = self.editor.frame()?;
        window_pixmap.draw_pixmap(
            0,
            0,
            frame.as_ref(),
            &PixmapPaint {
                quality,
                ..PixmapPaint::default()
            },
            transform,
            None,
        );

        self.ui.draw(&mut window_pixmap, &toolbar, self.editor.fonts());
        self.frame.upload(&self.gpu.queue, window_pixmap.data());
        Ok(())
    }
}
