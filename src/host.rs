//! Platform side of the editor callbacks: file dialogs and downloads,
//! autosave, and the clear-all confirmation.

use crate::config::EditorConfig;
use crate::drawing::{DrawingElement, ImageRef};
use crate::editor::EditorObserver;
use crate::export::ExportedImage;
use anyhow::Context;
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

pub const EXPORT_FILE_NAME: &str = "banner.png";

pub struct AppObserver {
    export_path: Option<PathBuf>,
    autosave_due: Rc<Cell<bool>>,
}

impl AppObserver {
    pub fn new(config: &EditorConfig, autosave_due: Rc<Cell<bool>>) -> Self {
        Self {
            export_path: config.export_path.clone(),
            autosave_due,
        }
    }
}

impl EditorObserver for AppObserver {
    fn on_export(&mut self, image: &ExportedImage) {
        if let Err(e) = deliver_export(image, self.export_path.as_ref()) {
            log::error!("Export failed: {e:#}");
        }
    }

    fn on_content_change(&mut self, _elements: &[DrawingElement]) {
        self.autosave_due.set(true);
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use wasm_bindgen::JsCast;

        const AUTOSAVE_KEY: &str = "bannercanvas.autosave";

        fn js_error(e: wasm_bindgen::JsValue) -> anyhow::Error {
            anyhow::anyhow!("{e:?}")
        }

        fn deliver_export(image: &ExportedImage, _path: Option<&PathBuf>) -> anyhow::Result<()> {
            let document = web_sys::window()
                .and_then(|win| win.document())
                .context("no document")?;
            let anchor: web_sys::HtmlAnchorElement = document
                .create_element("a")
                .map_err(js_error)?
                .dyn_into()
                .map_err(|_| anyhow::anyhow!("anchor element has an unexpected type"))?;
            anchor.set_href(&image.to_data_url());
            anchor.set_download(EXPORT_FILE_NAME);
            anchor.click();
            log::info!("Downloaded {}x{} export", image.width, image.height);
            Ok(())
        }

        pub fn write_autosave(elements: &[DrawingElement], _path: Option<&PathBuf>) -> anyhow::Result<()> {
            let json = serde_json::to_string(elements)?;
            let storage = web_sys::window()
                .context("no window")?
                .local_storage()
                .map_err(js_error)?
                .context("local storage unavailable")?;
            storage.set_item(AUTOSAVE_KEY, &json).map_err(js_error)?;
            Ok(())
        }

        pub fn confirm_clear() -> bool {
            web_sys::window()
                .and_then(|win| win.confirm_with_message("Are you sure you want to clear the canvas?").ok())
                .unwrap_or(false)
        }

        pub fn pick_image(_max_bytes: u64) -> Option<ImageRef> {
            log::info!("Image upload is not available in the browser build; use initial_image instead");
            None
        }
    } else {
        fn deliver_export(image: &ExportedImage, path: Option<&PathBuf>) -> anyhow::Result<()> {
            let target = match path {
                Some(path) => Some(path.clone()),
                None => rfd::FileDialog::new()
                    .set_file_name(EXPORT_FILE_NAME)
                    .add_filter("PNG image", &["png"])
                    .save_file(),
            };
            match target {
                Some(path) => image
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display())),
                None => {
                    log::info!("Export cancelled");
                    Ok(())
                }
            }
        }

        pub fn write_autosave(elements: &[DrawingElement], path: Option<&PathBuf>) -> anyhow::Result<()> {
            let Some(path) = path else {
                return Ok(());
            };
            let json = serde_json::to_string_pretty(elements)?;
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            log::debug!("Autosaved {} elements to {}", elements.len(), path.display());
            Ok(())
        }

        pub fn confirm_clear() -> bool {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title("Clear canvas")
                .set_description("Are you sure you want to clear the canvas?")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show()
                == rfd::MessageDialogResult::Yes
        }

        pub fn pick_image(max_bytes: u64) -> Option<ImageRef> {
            let path = rfd::FileDialog::new()
                .add_filter("Images", &["png", "jpg", "jpeg"])
                .pick_file()?;
            match read_upload(&path, max_bytes) {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("Could not use {}: {e:#}", path.display());
                    None
                }
            }
        }

        fn read_upload(path: &std::path::Path, max_bytes: u64) -> anyhow::Result<ImageRef> {
            let mime = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(crate::image_cache::mime_for_extension)
                .context("unsupported image type")?;
            let bytes = std::fs::read(path)?;
            Ok(crate::image_cache::upload_to_data_url(&bytes, mime, max_bytes)?)
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::drawing::TextStyle;

    #[test]
    fn content_changes_flag_an_autosave() {
        let due = Rc::new(Cell::new(false));
        let mut observer = AppObserver::new(&EditorConfig::default(), due.clone());
        observer.on_content_change(&[]);
        assert!(due.get());
    }

    #[test]
    fn autosave_writes_the_element_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let elements = vec![DrawingElement::text(
            [10.0, 10.0],
            "Hi",
            [0.0, 0.0, 0.0, 1.0],
            TextStyle {
                font_size: 24.0,
                font_weight: 400,
                font_family: None,
            },
        )];
        write_autosave(&elements, Some(&path)).unwrap();
        let restored: Vec<DrawingElement> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, elements);

        write_autosave(&elements, None).unwrap();
    }

    #[test]
    fn configured_export_path_skips_the_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig {
            export_path: Some(dir.path().join("out.png")),
            ..EditorConfig::default()
        };
        let mut observer = AppObserver::new(&config, Rc::new(Cell::new(false)));
        let pixmap = tiny_skia::Pixmap::new(4, 4).unwrap();
        observer.on_export(&ExportedImage::from_pixmap(&pixmap).unwrap());
        assert!(dir.path().join("out.png").exists());
    }
}
