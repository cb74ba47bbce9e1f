//! CSS-style color strings as they appear in editor settings.

use crate::drawing::Rgba;

pub const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];
pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)`, `transparent`
/// and a handful of named colors.
pub fn parse_css_color(input: &str) -> Option<Rgba> {
    let s = input.trim().to_ascii_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(body) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |p: &str| p.parse::<f32>().ok().map(|v| (v / 255.0).clamp(0.0, 1.0));
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = match parts.get(3) {
            Some(p) => p.parse::<f32>().ok()?.clamp(0.0, 1.0),
            None => 1.0,
        };
        return Some([r, g, b, a]);
    }

    match s.as_str() {
        "transparent" => Some([0.0, 0.0, 0.0, 0.0]),
        "black" => Some(BLACK),
        "white" => Some(WHITE),
        "red" => Some([1.0, 0.0, 0.0, 1.0]),
        "green" => Some([0.0, 128.0 / 255.0, 0.0, 1.0]),
        "blue" => Some([0.0, 0.0, 1.0, 1.0]),
        "yellow" => Some([1.0, 1.0, 0.0, 1.0]),
        "gray" | "grey" => Some([128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0, 1.0]),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as f32);
    let bytes = hex.as_bytes();
    if !bytes.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    match bytes.len() {
        3 => Some([
            nibble(bytes[0])? * 17.0 / 255.0,
            nibble(bytes[1])? * 17.0 / 255.0,
            nibble(bytes[2])? * 17.0 / 255.0,
            1.0,
        ]),
        6 | 8 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| v as f32 / 255.0);
            let alpha = if bytes.len() == 8 { byte(6)? } else { 1.0 };
            Some([byte(0)?, byte(2)?, byte(4)?, alpha])
        }
        _ => None,
    }
}

pub fn to_skia(color: Rgba) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color[0].clamp(0.0, 1.0),
        color[1].clamp(0.0, 1.0),
        color[2].clamp(0.0, 1.0),
        color[3].clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

pub fn to_hex(color: Rgba) -> String {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    if color[3] >= 1.0 {
        format!("#{:02x}{:02x}{:02x}", c(color[0]), c(color[1]), c(color[2]))
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", c(color[0]), c(color[1]), c(color[2]), c(color[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_css_color("#ffffff"), Some(WHITE));
        assert_eq!(parse_css_color("#000"), Some(BLACK));
        assert_eq!(parse_css_color("#FF000080").map(|c| (c[0], (c[3] * 255.0).round())), Some((1.0, 128.0)));
        assert_eq!(parse_css_color("#12345"), None);
        assert_eq!(parse_css_color("#zzzzzz"), None);
    }

    #[test]
    fn parses_functional_and_named_forms() {
        assert_eq!(parse_css_color("rgb(255, 0, 0)"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_css_color("rgba(0,0,0,0.5)"), Some([0.0, 0.0, 0.0, 0.5]));
        assert_eq!(parse_css_color("transparent").map(|c| c[3]), Some(0.0));
        assert_eq!(parse_css_color("White"), Some(WHITE));
        assert_eq!(parse_css_color("rgb(1,2)"), None);
    }

    #[test]
    fn hex_round_trips_opaque_colors() {
        assert_eq!(to_hex(parse_css_color("#ffc107").unwrap()), "#ffc107");
    }
}
