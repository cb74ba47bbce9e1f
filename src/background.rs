use crate::drawing::{ImageRef, Point, Rgba};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientDirection {
    #[serde(rename = "to right")]
    ToRight,
    #[serde(rename = "to bottom")]
    ToBottom,
    #[serde(rename = "to bottom right")]
    ToBottomRight,
    #[serde(rename = "to top right")]
    ToTopRight,
}

impl GradientDirection {
    /// Start and end points of the gradient axis on a `width` x `height` surface.
    pub fn endpoints(self, width: f32, height: f32) -> (Point, Point) {
        match self {
            GradientDirection::ToRight => ([0.0, 0.0], [width, 0.0]),
            GradientDirection::ToBottom => ([0.0, 0.0], [0.0, height]),
            GradientDirection::ToBottomRight => ([0.0, 0.0], [width, height]),
            GradientDirection::ToTopRight => ([0.0, height], [width, 0.0]),
        }
    }
}

impl FromStr for GradientDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        match normalized.as_str() {
            "to right" => Ok(GradientDirection::ToRight),
            "to bottom" => Ok(GradientDirection::ToBottom),
            "to bottom right" | "to right bottom" => Ok(GradientDirection::ToBottomRight),
            "to top right" | "to right top" => Ok(GradientDirection::ToTopRight),
            other => Err(format!("unknown gradient direction '{other}'")),
        }
    }
}

/// Canvas backdrop. Lives outside the element list and outside undo history.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(Rgba),
    Gradient {
        start: Rgba,
        end: Rgba,
        direction: GradientDirection,
    },
    Image(ImageRef),
    Transparent,
}

impl Background {
    pub fn image_ref(&self) -> Option<&ImageRef> {
        match self {
            Background::Image(image) => Some(image),
            _ => None,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::Color(crate::color::WHITE)
    }
}
