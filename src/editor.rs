//! The editing session: one scene, its history, and the pointer state
//! machine that mutates it.

use crate::background::Background;
use crate::config::EditorConfig;
use crate::crop::{CropSession, crop_pixels, source_region};
use crate::drawing::{DrawingElement, ImageRef, Point, Rgba, TextStyle, Tool};
use crate::error::{EditorError, Result};
use crate::export::{ExportedImage, png_data_url};
use crate::hit_test::{Bounds, CursorIcon, element_bounds, find_element_at, find_resize_handle};
use crate::history::History;
use crate::image_cache::{ImageCache, ImageState, LoadedImage, Waker};
use crate::interaction::{InteractionMode, ResizeStart, fit_size, resize_image, resize_text_size};
use crate::renderer::{
    BrushPreview, Decorations, LiveStroke, Renderer, Surface, TextEditOverlay, corner_mask, stroke_segment,
};
use crate::scene::Scene;
use crate::text_renderer::FontBook;
use tiny_skia::{Mask, Pixmap};
use uuid::Uuid;

/// Content of a freshly inserted text element.
pub const PLACEHOLDER_TEXT: &str = "Double click to edit";

/// Host callbacks.
pub trait EditorObserver {
    fn on_export(&mut self, _image: &ExportedImage) {}

    /// Called after every scene mutation, live drag and resize moves included.
    fn on_content_change(&mut self, _elements: &[DrawingElement]) {}
}

pub struct NoopObserver;

impl EditorObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The selected element was removed.
    Removed,
    /// Nothing was selected and the whole scene was cleared.
    Cleared,
    /// The clear-all prompt was declined.
    Declined,
    /// Nothing selected and nothing to clear.
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
struct TextEdit {
    index: usize,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingInsert {
    image: ImageRef,
    center: Option<Point>,
    /// Part of session seeding rather than a user action.
    seed: bool,
}

pub struct Editor {
    session_id: Uuid,
    surface: Surface,
    scene: Scene,
    history: History,
    selected: Option<usize>,
    tool: Tool,
    mode: InteractionMode,
    crop: Option<CropSession>,
    text_edit: Option<TextEdit>,
    caret_visible: bool,
    hover: Option<Point>,

    color: Rgba,
    text_style: TextStyle,
    brush_size: f32,
    background: Background,
    erase_color: Rgba,

    fonts: FontBook,
    images: ImageCache,
    staged_image: Option<ImageRef>,
    pending_inserts: Vec<PendingInsert>,

    observer: Box<dyn EditorObserver>,
    frame: Option<Pixmap>,
    corner_clip: Option<Mask>,
    dirty: bool,
}

impl Editor {
    /// Builds a session with the fonts named by the config. The bundled
    /// face stands in when no default font is configured.
    pub fn new(config: &EditorConfig) -> Result<Self> {
        let mut fonts = FontBook::new(config.font_family.clone());
        #[cfg(not(target_arch = "wasm32"))]
        let default_loaded = {
            for (key, path) in &config.fonts {
                if let Err(e) = fonts.load_face(key, &path.to_string_lossy()) {
                    log::warn!("{e}");
                }
            }
            match &config.default_font {
                Some(path) => fonts
                    .load_default(&path.to_string_lossy())
                    .map_err(|e| log::warn!("{e}"))
                    .is_ok(),
                None => false,
            }
        };
        #[cfg(target_arch = "wasm32")]
        let default_loaded = false;

        if !default_loaded {
            if let Err(e) = fonts.load_embedded_default() {
                log::warn!("{e}");
            }
        }
        if !fonts.has_fonts() {
            log::warn!("No fonts loaded; text will be measured but not drawn");
        }
        Self::with_font_book(config, fonts)
    }

    pub fn with_font_book(config: &EditorConfig, fonts: FontBook) -> Result<Self> {
        config.validate()?;
        let session_id = Uuid::new_v4();
        let surface = Surface {
            width: config.width,
            height: config.height,
            corner_radius: config.corner_radius,
        };
        let background = config.background()?;
        let color = config.text_color()?;
        let text_style = config.text_style();

        let mut images = ImageCache::new(config.max_image_bytes);
        if let Some(image) = background.image_ref() {
            images.request(image);
        }

        let mut scene = Scene::new();
        if let Some(text) = config.initial_text.as_deref().filter(|t| !t.is_empty()) {
            scene.push(DrawingElement::text(
                [config.width as f32 / 2.0, config.height as f32 / 2.0],
                text,
                color,
                text_style.clone(),
            ));
        }

        let mut pending_inserts = Vec::new();
        if let Some(source) = &config.initial_image {
            let image = ImageRef::new(source.clone());
            images.request(&image);
            pending_inserts.push(PendingInsert {
                image,
                center: None,
                seed: true,
            });
        }

        log::info!(
            "[{session_id}] Editor session started ({}x{}, {} seeded elements)",
            surface.width,
            surface.height,
            scene.len()
        );

        let mut editor = Self {
            session_id,
            surface,
            history: History::new(scene.clone()),
            scene,
            selected: None,
            tool: Tool::Select,
            mode: InteractionMode::Idle,
            crop: None,
            text_edit: None,
            caret_visible: true,
            hover: None,
            color,
            text_style,
            brush_size: config.brush_size,
            background,
            erase_color: config.background_color()?,
            fonts,
            images,
            staged_image: None,
            pending_inserts,
            observer: Box::new(NoopObserver),
            frame: None,
            corner_clip: corner_mask(surface),
            dirty: true,
        };
        editor.poll_images();
        Ok(editor)
    }

    pub fn set_observer(&mut self, observer: Box<dyn EditorObserver>) {
        self.observer = observer;
    }

    /// Called from the decode worker whenever an image finishes loading.
    pub fn set_image_waker(&mut self, waker: Waker) {
        self.images.set_waker(waker);
    }

    // ---- pointer input -------------------------------------------------

    pub fn pointer_down(&mut self, p: Point) {
        self.hover = Some(p);
        if self.text_edit.is_some() {
            self.confirm_text_edit();
        }

        if let Some(crop) = &mut self.crop {
            crop.rect = Some(Bounds::new(p[0], p[1], 0.0, 0.0));
            self.mode = InteractionMode::CroppingRect { anchor: p };
            self.dirty = true;
            return;
        }

        match self.tool {
            Tool::Select => self.begin_select(p),
            Tool::Pen | Tool::Eraser => {
                let color = if self.tool == Tool::Eraser {
                    self.erase_color
                } else {
                    self.color
                };
                self.mode = InteractionMode::FreehandDrawing {
                    points: vec![p],
                    color,
                    width: self.brush_size,
                };
            }
            Tool::TextInsert => {
                self.insert_text(PLACEHOLDER_TEXT, p);
            }
            Tool::ImageInsert => match self.staged_image.clone() {
                Some(image) => self.queue_insert(image, Some(p)),
                None => log::info!("[{}] No image staged for insertion", self.session_id),
            },
        }
        self.dirty = true;
    }

    fn begin_select(&mut self, p: Point) {
        if let Some(index) = self.selected {
            if let Some(element) = self.scene.get(index) {
                if let Some(handle) = find_resize_handle(p, element, &self.fonts) {
                    let start = match element {
                        DrawingElement::Image { position, size, .. } => ResizeStart::Image {
                            position: *position,
                            size: *size,
                        },
                        _ => ResizeStart::Text {
                            font_size: element.font_size().unwrap_or(self.text_style.font_size),
                        },
                    };
                    self.mode = InteractionMode::Resizing {
                        index,
                        handle,
                        origin: p,
                        start,
                    };
                    return;
                }
            }
        }

        self.selected = find_element_at(&self.scene, p, &self.fonts);
        if let Some(index) = self.selected {
            let element = &self.scene.elements()[index];
            if element.is_draggable() {
                let anchor = element.position();
                self.mode = InteractionMode::Dragging {
                    index,
                    offset: [p[0] - anchor[0], p[1] - anchor[1]],
                };
            }
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        self.hover = Some(p);
        match &mut self.mode {
            InteractionMode::Idle => {
                if self.tool.is_freehand() {
                    self.dirty = true;
                }
            }
            InteractionMode::Dragging { index, offset } => {
                let (index, offset) = (*index, *offset);
                if let Some(element) = self.scene.get_mut(index) {
                    element.set_position([p[0] - offset[0], p[1] - offset[1]]);
                }
                self.content_changed();
            }
            InteractionMode::Resizing {
                index,
                handle,
                origin,
                start,
            } => {
                let dx = p[0] - origin[0];
                let dy = p[1] - origin[1];
                let (index, handle, start) = (*index, *handle, *start);
                if let Some(element) = self.scene.get_mut(index) {
                    match start {
                        ResizeStart::Image { position: p0, size: s0 } => {
                            if let DrawingElement::Image { position, size, .. } = element {
                                (*position, *size) = resize_image(p0, s0, handle, dx, dy);
                            }
                        }
                        ResizeStart::Text { font_size } => element.set_font_size(resize_text_size(font_size, dx, dy)),
                    }
                }
                self.content_changed();
            }
            InteractionMode::FreehandDrawing { points, color, width } => {
                let last = points.last().copied().unwrap_or(p);
                points.push(p);
                if !self.dirty {
                    if let Some(frame) = &mut self.frame {
                        stroke_segment(frame, last, p, *color, *width, self.corner_clip.as_ref());
                    }
                }
            }
            InteractionMode::CroppingRect { anchor } => {
                let anchor = *anchor;
                if let Some(crop) = &mut self.crop {
                    crop.rect = Some(Bounds::new(anchor[0], anchor[1], p[0] - anchor[0], p[1] - anchor[1]));
                }
                self.dirty = true;
            }
        }
    }

    pub fn pointer_up(&mut self) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle | InteractionMode::CroppingRect { .. } => {}
            InteractionMode::Dragging { .. } => self.commit_if_changed("move"),
            InteractionMode::Resizing { .. } => self.commit_if_changed("resize"),
            InteractionMode::FreehandDrawing { points, color, width } => {
                if points.len() >= 2 {
                    self.scene.push(DrawingElement::Path {
                        points,
                        color,
                        stroke_width: width,
                    });
                    self.commit("stroke");
                } else {
                    log::debug!("[{}] Discarded single-point stroke", self.session_id);
                }
            }
        }
        self.dirty = true;
    }

    /// The pointer left the canvas. An active gesture ends as if released.
    pub fn pointer_leave(&mut self) {
        if !self.mode.is_idle() {
            log::debug!("[{}] Pointer left the canvas while {}", self.session_id, self.mode.name());
            self.pointer_up();
        }
        self.hover = None;
        self.dirty = true;
    }

    pub fn double_click(&mut self, p: Point) {
        if self.tool != Tool::Select || self.crop.is_some() {
            return;
        }
        let Some(index) = find_element_at(&self.scene, p, &self.fonts) else {
            return;
        };
        if let Some(DrawingElement::Text { content, .. }) = self.scene.get(index) {
            self.text_edit = Some(TextEdit {
                index,
                buffer: content.clone(),
            });
            self.selected = Some(index);
            self.mode = InteractionMode::Idle;
            self.caret_visible = true;
            self.dirty = true;
            log::debug!("[{}] Editing text element {index}", self.session_id);
        }
    }

    // ---- inline text editing --------------------------------------------

    pub fn is_editing_text(&self) -> bool {
        self.text_edit.is_some()
    }

    pub fn text_edit_buffer(&self) -> Option<&str> {
        self.text_edit.as_ref().map(|edit| edit.buffer.as_str())
    }

    pub fn text_input(&mut self, text: &str) {
        if let Some(edit) = &mut self.text_edit {
            edit.buffer.extend(text.chars().filter(|c| !c.is_control()));
            self.caret_visible = true;
            self.dirty = true;
        }
    }

    pub fn text_backspace(&mut self) {
        if let Some(edit) = &mut self.text_edit {
            edit.buffer.pop();
            self.caret_visible = true;
            self.dirty = true;
        }
    }

    /// Applies the edit buffer when it has visible content; blank edits are dropped.
    pub fn confirm_text_edit(&mut self) -> bool {
        let Some(edit) = self.text_edit.take() else {
            return false;
        };
        self.dirty = true;
        if edit.buffer.trim().is_empty() {
            return false;
        }
        let changed = match self.scene.get_mut(edit.index) {
            Some(DrawingElement::Text { content, .. }) if *content != edit.buffer => {
                *content = edit.buffer;
                true
            }
            _ => false,
        };
        if changed {
            self.commit("text edit");
        }
        changed
    }

    pub fn cancel_text_edit(&mut self) {
        if self.text_edit.take().is_some() {
            self.dirty = true;
        }
    }

    /// Flips caret visibility; the host drives the blink interval.
    pub fn toggle_caret(&mut self) {
        if self.text_edit.is_some() {
            self.caret_visible = !self.caret_visible;
            self.dirty = true;
        }
    }

    // ---- tools and styles ------------------------------------------------

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool == tool {
            return;
        }
        if self.text_edit.is_some() {
            self.confirm_text_edit();
        }
        if !self.mode.is_idle() {
            self.pointer_up();
        }
        log::debug!("[{}] Tool {:?} -> {:?}", self.session_id, self.tool, tool);
        self.tool = tool;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
        self.restyle_selected_text("color", |element| element.set_color(color));
    }

    pub fn set_font_size(&mut self, size: f32) {
        let size = size.clamp(crate::drawing::MIN_FONT_SIZE, crate::drawing::MAX_FONT_SIZE);
        self.text_style.font_size = size;
        self.restyle_selected_text("font size", |element| element.set_font_size(size));
    }

    pub fn set_font_weight(&mut self, weight: u16) {
        self.text_style.font_weight = weight;
        self.restyle_selected_text("font weight", |element| {
            if let Some(style) = element.text_style_mut() {
                style.font_weight = weight;
            }
        });
    }

    pub fn set_font_family(&mut self, family: Option<String>) {
        self.text_style.font_family = family.clone();
        self.restyle_selected_text("font family", move |element| {
            if let Some(style) = element.text_style_mut() {
                style.font_family = family;
            }
        });
    }

    fn restyle_selected_text(&mut self, what: &str, apply: impl FnOnce(&mut DrawingElement)) {
        let Some(index) = self.selected else {
            return;
        };
        let Some(element) = self.scene.get_mut(index) else {
            return;
        };
        if !element.is_text() {
            return;
        }
        let before = element.clone();
        apply(element);
        if *element != before {
            self.commit(what);
        }
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = size.max(1.0);
        self.dirty = true;
    }

    pub fn set_background(&mut self, background: Background) {
        if let Some(image) = background.image_ref() {
            self.images.request(image);
        }
        if let Background::Color(color) = &background {
            self.erase_color = *color;
        }
        self.background = background;
        self.dirty = true;
    }

    // ---- inserts ----------------------------------------------------------

    /// Inserts the placeholder text at the canvas center.
    pub fn add_text(&mut self) -> usize {
        let center = self.canvas_center();
        self.insert_text(PLACEHOLDER_TEXT, center)
    }

    /// Inserts a text element centered on `center`, selects it and switches
    /// to the select tool.
    pub fn insert_text(&mut self, content: &str, center: Point) -> usize {
        let index = self.scene.push(DrawingElement::text(
            center,
            content,
            self.color,
            self.text_style.clone(),
        ));
        self.commit("insert text");
        self.selected = Some(index);
        self.tool = Tool::Select;
        index
    }

    /// Inserts an image centered on the canvas once its pixels are available.
    pub fn insert_image(&mut self, image: ImageRef) {
        self.queue_insert(image, None);
    }

    /// Arms the image-insert tool: the next click places `image`.
    pub fn stage_image(&mut self, image: ImageRef) {
        self.images.request(&image);
        self.staged_image = Some(image);
        self.set_tool(Tool::ImageInsert);
    }

    fn queue_insert(&mut self, image: ImageRef, center: Option<Point>) {
        self.images.request(&image);
        self.pending_inserts.push(PendingInsert {
            image,
            center,
            seed: false,
        });
        self.settle_pending_inserts();
    }

    fn settle_pending_inserts(&mut self) {
        let mut waiting = Vec::new();
        for pending in std::mem::take(&mut self.pending_inserts) {
            let natural = match self.images.state(&pending.image) {
                Some(ImageState::Ready(loaded)) => loaded.natural_size(),
                Some(ImageState::Pending) => {
                    waiting.push(pending);
                    continue;
                }
                _ => {
                    log::warn!("[{}] Dropping insert of unloadable image {}", self.session_id, pending.image);
                    continue;
                }
            };
            self.place_image(pending, natural);
        }
        self.pending_inserts.extend(waiting);
    }

    fn place_image(&mut self, pending: PendingInsert, natural: (u32, u32)) {
        let size = fit_size(natural, (self.surface.width, self.surface.height));
        let center = pending.center.unwrap_or_else(|| self.canvas_center());
        let position = [center[0] - size[0] / 2.0, center[1] - size[1] / 2.0];
        let index = self.scene.push(DrawingElement::image(position, size, pending.image));

        if pending.seed && self.history.rebase(self.scene.clone()) {
            log::debug!("[{}] Initial image joined the base snapshot", self.session_id);
            self.content_changed();
            return;
        }
        self.commit("insert image");
        if !pending.seed {
            self.selected = Some(index);
            self.tool = Tool::Select;
        }
    }

    /// Drains finished image loads. Returns true when a repaint is needed.
    pub fn poll_images(&mut self) -> bool {
        let ready = self.images.poll();
        let had_pending = !self.pending_inserts.is_empty();
        if had_pending {
            self.settle_pending_inserts();
        }
        if !ready.is_empty() {
            self.dirty = true;
        }
        !ready.is_empty() || (had_pending && self.dirty)
    }

    /// Blocks up to `timeout` for outstanding image loads. Meant for headless use.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait_for_images(&mut self, timeout: std::time::Duration) {
        let deadline = std::time::Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(std::time::Instant::now()) {
            if !self.has_pending_images() {
                break;
            }
            if !self.images.poll_blocking(remaining).is_empty() {
                self.dirty = true;
            }
            self.settle_pending_inserts();
        }
    }

    fn has_pending_images(&self) -> bool {
        !self.pending_inserts.is_empty()
            || self.scene.iter().filter_map(DrawingElement::image_ref).any(|i| self.images.is_pending(i))
            || self.background.image_ref().is_some_and(|i| self.images.is_pending(i))
            || self.staged_image.as_ref().is_some_and(|i| self.images.is_pending(i))
    }

    // ---- crop -------------------------------------------------------------

    /// Enters crop mode for the selected image. Returns false when the
    /// selection is not an image.
    pub fn begin_crop(&mut self) -> bool {
        match self.selected {
            Some(index) if self.scene.get(index).is_some_and(DrawingElement::is_image) => {
                self.crop = Some(CropSession::new(index));
                self.dirty = true;
                log::info!("[{}] Crop mode on element {index}", self.session_id);
                true
            }
            _ => {
                log::info!("[{}] Crop requested without a selected image", self.session_id);
                false
            }
        }
    }

    /// Applies the pending crop rectangle. Stays in crop mode and returns
    /// `Ok(false)` when there is nothing usable to crop yet.
    pub fn confirm_crop(&mut self) -> Result<bool> {
        let Some(CropSession { index, rect: Some(rect) }) = self.crop else {
            return Ok(false);
        };
        let Some(DrawingElement::Image {
            position,
            size,
            image,
            draggable,
        }) = self.scene.get(index).cloned()
        else {
            self.cancel_crop();
            return Ok(false);
        };
        let Some(loaded) = self.images.get(&image) else {
            log::info!("[{}] Crop waits for image pixels", self.session_id);
            return Ok(false);
        };
        let image_box = Bounds::new(position[0], position[1], size[0], size[1]);
        let Some((kept, region)) = source_region(rect, image_box, loaded.natural_size()) else {
            return Ok(false);
        };

        let cropped = crop_pixels(&loaded.pixels, region);
        let cropped_ref = ImageRef::new(png_data_url(&cropped)?);
        self.images.insert(cropped_ref.clone(), LoadedImage::from_rgba(cropped)?);
        self.scene.replace(
            index,
            DrawingElement::Image {
                position: [kept.x, kept.y],
                size: [kept.width, kept.height],
                image: cropped_ref,
                draggable,
            },
        )?;
        self.crop = None;
        if matches!(self.mode, InteractionMode::CroppingRect { .. }) {
            self.mode = InteractionMode::Idle;
        }
        log::info!(
            "[{}] Cropped element {index} to {}x{} source pixels",
            self.session_id,
            region.width,
            region.height
        );
        self.commit("crop");
        Ok(true)
    }

    pub fn cancel_crop(&mut self) {
        self.crop = None;
        if matches!(self.mode, InteractionMode::CroppingRect { .. }) {
            self.mode = InteractionMode::Idle;
        }
        self.dirty = true;
    }

    // ---- delete / history ------------------------------------------------

    /// Removes the selection, or clears the whole scene after `confirm`
    /// agrees when nothing is selected.
    pub fn delete(&mut self, confirm: impl FnOnce() -> bool) -> DeleteOutcome {
        if let Some(index) = self.selected.take() {
            if self.scene.remove(index).is_ok() {
                self.reset_transient();
                self.commit("delete");
                return DeleteOutcome::Removed;
            }
        }
        if self.scene.is_empty() {
            return DeleteOutcome::Nothing;
        }
        if !confirm() {
            return DeleteOutcome::Declined;
        }
        self.scene.clear();
        self.reset_transient();
        self.commit("clear");
        DeleteOutcome::Cleared
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().map(|scene| scene.elements().to_vec()) else {
            return false;
        };
        self.restore(snapshot, "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().map(|scene| scene.elements().to_vec()) else {
            return false;
        };
        self.restore(snapshot, "redo");
        true
    }

    fn restore(&mut self, snapshot: Vec<DrawingElement>, what: &str) {
        self.scene.replace_all(snapshot);
        self.reset_transient();
        if self.selected.is_some_and(|i| i >= self.scene.len()) {
            self.selected = None;
        }
        log::debug!(
            "[{}] {what} to step {} of {}",
            self.session_id,
            self.history.cursor(),
            self.history.len()
        );
        self.content_changed();
    }

    fn reset_transient(&mut self) {
        self.mode = InteractionMode::Idle;
        self.crop = None;
        self.text_edit = None;
    }

    fn commit(&mut self, what: &str) {
        self.history.commit(&self.scene);
        log::debug!(
            "[{}] Commit {what}: {} elements, step {}",
            self.session_id,
            self.scene.len(),
            self.history.cursor()
        );
        self.content_changed();
    }

    fn commit_if_changed(&mut self, what: &str) {
        if self.scene != *self.history.current() {
            self.commit(what);
        }
    }

    fn content_changed(&mut self) {
        self.dirty = true;
        self.observer.on_content_change(self.scene.elements());
    }

    // ---- output -------------------------------------------------------------

    /// Renders the scene without any editing decorations.
    pub fn export(&self) -> Result<ExportedImage> {
        let pixmap = self.renderer().render(&self.scene, &self.background, self.surface, &Decorations::default())?;
        ExportedImage::from_pixmap(&pixmap)
    }

    /// Exports and hands the result to the observer.
    pub fn trigger_export(&mut self) -> Result<()> {
        let image = self.export()?;
        log::info!("[{}] Export {}x{}", self.session_id, image.width, image.height);
        self.observer.on_export(&image);
        Ok(())
    }

    /// The interactive frame, re-rendered only when something changed.
    pub fn frame(&mut self) -> Result<&Pixmap> {
        if self.dirty || self.frame.is_none() {
            let pixmap = self
                .renderer()
                .render(&self.scene, &self.background, self.surface, &self.decorations())?;
            self.frame = Some(pixmap);
            self.dirty = false;
        }
        self.frame.as_ref().ok_or(EditorError::InvalidCanvasSize {
            width: self.surface.width,
            height: self.surface.height,
        })
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.fonts, &self.images)
    }

    fn decorations(&self) -> Decorations<'_> {
        let live_stroke = match &self.mode {
            InteractionMode::FreehandDrawing { points, color, width } => Some(LiveStroke {
                points,
                color: *color,
                width: *width,
            }),
            _ => None,
        };
        let brush_preview = match (self.tool.is_freehand() && self.mode.is_idle(), self.hover) {
            (true, Some(center)) => Some(BrushPreview {
                center,
                size: self.brush_size,
                color: if self.tool == Tool::Eraser {
                    self.erase_color
                } else {
                    self.color
                },
            }),
            _ => None,
        };
        Decorations {
            selected: self.selected.filter(|_| self.tool == Tool::Select),
            crop_rect: self.crop.and_then(|crop| crop.rect),
            live_stroke,
            brush_preview,
            text_edit: self.text_edit.as_ref().map(|edit| TextEditOverlay {
                index: edit.index,
                buffer: &edit.buffer,
                caret_visible: self.caret_visible,
            }),
        }
    }

    /// Pointer shape for the current hover position.
    pub fn cursor(&self) -> CursorIcon {
        if self.crop.is_some() {
            return CursorIcon::Crosshair;
        }
        match &self.mode {
            InteractionMode::Resizing { handle, .. } => return CursorIcon::Resize(*handle),
            InteractionMode::Dragging { .. } => return CursorIcon::Move,
            _ => {}
        }
        match self.tool {
            Tool::Pen | Tool::Eraser => CursorIcon::Hidden,
            Tool::TextInsert | Tool::ImageInsert => CursorIcon::Crosshair,
            Tool::Select => {
                let Some(p) = self.hover else {
                    return CursorIcon::Default;
                };
                if let Some(handle) = self
                    .selected
                    .and_then(|i| self.scene.get(i))
                    .and_then(|element| find_resize_handle(p, element, &self.fonts))
                {
                    return CursorIcon::Resize(handle);
                }
                match find_element_at(&self.scene, p, &self.fonts).and_then(|i| self.scene.get(i)) {
                    Some(element) if element.is_draggable() => CursorIcon::Move,
                    _ => CursorIcon::Default,
                }
            }
        }
    }

    // ---- accessors ----------------------------------------------------------

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn canvas_center(&self) -> Point {
        [self.surface.width as f32 / 2.0, self.surface.height as f32 / 2.0]
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.scene.len());
        self.dirty = true;
    }

    pub fn selected_bounds(&self) -> Option<Bounds> {
        let element = self.scene.get(self.selected?)?;
        element_bounds(element, &self.fonts)
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn crop(&self) -> Option<&CropSession> {
        self.crop.as_ref()
    }

    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.text_style
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Color of eraser strokes.
    pub fn erase_color(&self) -> Rgba {
        self.erase_color
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        Editor::with_font_book(&EditorConfig::default(), FontBook::new("Arial")).unwrap()
    }

    #[test]
    fn initial_text_is_seeded_into_the_base_snapshot() {
        let config = EditorConfig {
            initial_text: Some("Summer sale".to_string()),
            ..EditorConfig::default()
        };
        let mut editor = Editor::with_font_book(&config, FontBook::new("Arial")).unwrap();
        assert_eq!(editor.scene().len(), 1);
        assert_eq!(editor.scene().get(0).unwrap().position(), [400.0, 200.0]);
        assert!(!editor.undo());
    }

    #[test]
    fn text_insert_tool_places_placeholder_and_selects_it() {
        let mut editor = editor();
        editor.set_tool(Tool::TextInsert);
        editor.pointer_down([100.0, 80.0]);
        editor.pointer_up();

        assert_eq!(editor.tool(), Tool::Select);
        assert_eq!(editor.selected(), Some(0));
        match editor.scene().get(0) {
            Some(DrawingElement::Text { content, position, .. }) => {
                assert_eq!(content, PLACEHOLDER_TEXT);
                assert_eq!(*position, [100.0, 80.0]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(editor.can_undo());
    }

    #[test]
    fn click_select_without_moving_does_not_commit() {
        let mut editor = editor();
        editor.add_text();
        let steps = editor.history().len();
        editor.select(None);
        editor.pointer_down([400.0, 200.0]);
        editor.pointer_up();
        assert_eq!(editor.selected(), Some(0));
        assert_eq!(editor.history().len(), steps);
    }

    #[test]
    fn style_setters_restyle_the_selected_text() {
        let mut editor = editor();
        editor.add_text();
        editor.set_color([1.0, 0.0, 0.0, 1.0]);
        editor.set_font_size(48.0);
        editor.set_font_weight(700);
        match editor.scene().get(0) {
            Some(element @ DrawingElement::Text { color, style, .. }) => {
                assert_eq!(*color, [1.0, 0.0, 0.0, 1.0]);
                assert_eq!(style.font_size, 48.0);
                assert_eq!(style.font_weight, 700);
                assert_eq!(element.stroke_width(), 6.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(editor.history().len(), 5);
    }

    #[test]
    fn cursor_tracks_hover_targets() {
        let mut editor = editor();
        assert_eq!(editor.cursor(), CursorIcon::Default);
        editor.add_text();
        editor.pointer_move([400.0, 200.0]);
        assert_eq!(editor.cursor(), CursorIcon::Move);
        let bounds = editor.selected_bounds().unwrap();
        editor.pointer_move([bounds.right(), bounds.bottom()]);
        assert_eq!(editor.cursor(), CursorIcon::Resize(crate::hit_test::Handle::SouthEast));
        editor.set_tool(Tool::Pen);
        assert_eq!(editor.cursor(), CursorIcon::Hidden);
    }

    #[test]
    fn pinned_images_do_not_offer_a_move_cursor() {
        let mut editor = editor();
        editor.scene.push(DrawingElement::Image {
            position: [100.0, 100.0],
            size: [50.0, 50.0],
            image: ImageRef::new("pinned.png"),
            draggable: false,
        });
        editor.pointer_move([120.0, 120.0]);
        assert_eq!(editor.cursor(), CursorIcon::Default);

        editor.pointer_down([120.0, 120.0]);
        assert_eq!(editor.selected(), Some(0));
        assert!(editor.mode().is_idle());
        editor.pointer_up();

        editor.scene.push(DrawingElement::image([300.0, 100.0], [50.0, 50.0], ImageRef::new("free.png")));
        editor.pointer_move([320.0, 120.0]);
        assert_eq!(editor.cursor(), CursorIcon::Move);
    }

    #[test]
    fn freehand_segments_draw_straight_onto_the_cached_frame() {
        let mut editor = editor();
        editor.set_tool(Tool::Pen);
        editor.set_brush_size(6.0);
        editor.pointer_down([10.0, 10.0]);
        editor.frame().unwrap();
        editor.pointer_move([60.0, 10.0]);
        assert!(!editor.needs_redraw());
        let frame = editor.frame().unwrap();
        let px = frame.pixel(35, 10).unwrap().demultiply();
        assert_eq!((px.red(), px.green(), px.blue()), (0, 0, 0));
    }
}
