//! Editor settings. Every field is optional in the JSON file and falls back
//! to the defaults below.

use crate::background::{Background, GradientDirection};
use crate::color::parse_css_color;
use crate::drawing::{ImageRef, Rgba, TextStyle};
use crate::error::{EditorError, Result};
use crate::image_cache::DEFAULT_MAX_IMAGE_BYTES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "BANNERCANVAS_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    #[default]
    Color,
    Gradient,
    Image,
    Transparent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub width: u32,
    pub height: u32,
    pub background_type: BackgroundType,
    pub background_color: String,
    pub background_image: Option<String>,
    pub gradient_start: String,
    pub gradient_end: String,
    pub gradient_direction: String,
    pub initial_text: Option<String>,
    pub initial_image: Option<String>,
    pub text_color: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub font_family: String,
    pub padding: f32,
    pub corner_radius: f32,
    pub brush_size: f32,
    /// Font files by face key (`Family` or `Family:weight`).
    pub fonts: BTreeMap<String, PathBuf>,
    pub default_font: Option<PathBuf>,
    pub max_image_bytes: u64,
    pub export_path: Option<PathBuf>,
    pub autosave_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background_type: BackgroundType::Color,
            background_color: "#ffffff".to_string(),
            background_image: None,
            gradient_start: "#ffffff".to_string(),
            gradient_end: "#000000".to_string(),
            gradient_direction: "to right".to_string(),
            initial_text: None,
            initial_image: None,
            text_color: "#000000".to_string(),
            font_size: 24.0,
            font_weight: 400,
            font_family: "Arial".to_string(),
            padding: 0.0,
            corner_radius: 0.0,
            brush_size: 5.0,
            fonts: BTreeMap::new(),
            default_font: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            export_path: None,
            autosave_path: None,
        }
    }
}

impl EditorConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reads the file named by the first argument, else by
    /// `BANNERCANVAS_CONFIG`, else returns defaults.
    pub fn from_args_or_env(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let path = args
            .next()
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
            .filter(|p| !p.trim().is_empty());
        match path {
            Some(path) => Self::load_from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EditorError::InvalidCanvasSize {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.font_size > 0.0) {
            return Err(invalid("font_size", "must be > 0"));
        }
        if !(self.brush_size > 0.0) {
            return Err(invalid("brush_size", "must be > 0"));
        }
        if self.padding < 0.0 || self.corner_radius < 0.0 {
            return Err(invalid("padding", "padding and corner_radius must be >= 0"));
        }
        self.text_color()?;
        self.background_color()?;
        self.background()?;
        Ok(())
    }

    pub fn text_color(&self) -> Result<Rgba> {
        color_setting("text_color", &self.text_color)
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            font_weight: self.font_weight,
            font_family: Some(self.font_family.clone()),
        }
    }

    /// `background_color` is parsed for every background type; the eraser
    /// paints with it even over gradients, images and transparency.
    pub fn background_color(&self) -> Result<Rgba> {
        color_setting("background_color", &self.background_color)
    }

    pub fn background(&self) -> Result<Background> {
        Ok(match self.background_type {
            BackgroundType::Color => Background::Color(self.background_color()?),
            BackgroundType::Gradient => Background::Gradient {
                start: color_setting("gradient_start", &self.gradient_start)?,
                end: color_setting("gradient_end", &self.gradient_end)?,
                direction: self
                    .gradient_direction
                    .parse::<GradientDirection>()
                    .map_err(|reason| invalid("gradient_direction", &reason))?,
            },
            BackgroundType::Image => match &self.background_image {
                Some(source) => Background::Image(ImageRef::new(source.clone())),
                None => return Err(invalid("background_image", "required when background_type is image")),
            },
            BackgroundType::Transparent => Background::Transparent,
        })
    }
}

fn color_setting(key: &str, value: &str) -> Result<Rgba> {
    parse_css_color(value).ok_or_else(|| invalid(key, &format!("'{value}' is not a color")))
}

fn invalid(key: &str, reason: &str) -> EditorError {
    EditorError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
