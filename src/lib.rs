//! Banner canvas editor: a scene of text, images and freehand strokes over a
//! configurable background, with undo history, cropping and PNG export.
//!
//! The engine (`Editor` and everything it uses) renders on the CPU and runs
//! headless; `run` wraps it in a winit window presented through wgpu.

mod app;
mod app_state;
pub mod background;
mod canvas;
pub mod color;
pub mod config;
pub mod crop;
pub mod drawing;
pub mod editor;
pub mod error;
mod event_handler;
pub mod export;
pub mod history;
pub mod hit_test;
mod host;
pub mod image_cache;
pub mod interaction;
mod present;
pub mod renderer;
pub mod scene;
mod state;
pub mod text_renderer;
mod ui;
mod update_logic;

// Re-export the main public interface
pub use app::run;
pub use background::{Background, GradientDirection};
pub use config::EditorConfig;
pub use drawing::{DrawingElement, ImageRef, Point, Rgba, TextStyle, Tool};
pub use editor::{DeleteOutcome, Editor, EditorObserver};
pub use error::{EditorError, Result};
pub use export::ExportedImage;
pub use scene::Scene;

// Re-export for WASM compatibility
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub fn start() {
    if let Err(e) = run() {
        log::error!("{e:#}");
    }
}
