use crate::hit_test::Bounds;
use image::RgbaImage;

/// Crop mode state for the selected image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSession {
    pub index: usize,
    /// Pending rectangle in canvas coordinates; may have negative extents
    /// while the pointer is dragging up or left.
    pub rect: Option<Bounds>,
}

impl CropSession {
    pub fn new(index: usize) -> Self {
        Self { index, rect: None }
    }
}

/// Pixel rectangle inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a crop rectangle drawn over an image displayed at `image_box` onto
/// the image's natural pixels. Returns the display rectangle actually kept
/// (the crop clipped to the image box) and the matching source region.
pub fn source_region(rect: Bounds, image_box: Bounds, natural: (u32, u32)) -> Option<(Bounds, SourceRegion)> {
    let rect = rect.normalized();
    let image_box = image_box.normalized();
    if image_box.width <= 0.0 || image_box.height <= 0.0 || natural.0 == 0 || natural.1 == 0 {
        return None;
    }

    let left = rect.x.max(image_box.x);
    let top = rect.y.max(image_box.y);
    let right = rect.right().min(image_box.right());
    let bottom = rect.bottom().min(image_box.bottom());
    if right - left < 1.0 || bottom - top < 1.0 {
        return None;
    }
    let kept = Bounds::new(left, top, right - left, bottom - top);

    let scale_x = natural.0 as f32 / image_box.width;
    let scale_y = natural.1 as f32 / image_box.height;
    let to_source = |v: f32, scale: f32, limit: u32| ((v * scale).round().max(0.0) as u32).min(limit);

    let x0 = to_source(left - image_box.x, scale_x, natural.0);
    let y0 = to_source(top - image_box.y, scale_y, natural.1);
    let x1 = to_source(right - image_box.x, scale_x, natural.0);
    let y1 = to_source(bottom - image_box.y, scale_y, natural.1);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some((
        kept,
        SourceRegion {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        },
    ))
}

pub fn crop_pixels(pixels: &RgbaImage, region: SourceRegion) -> RgbaImage {
    image::imageops::crop_imm(pixels, region.x, region.y, region.width, region.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn display_rect_maps_to_natural_pixels() {
        let (kept, region) = source_region(
            Bounds::new(10.0, 10.0, 50.0, 50.0),
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            (200, 200),
        )
        .unwrap();
        assert_eq!(kept, Bounds::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(
            region,
            SourceRegion {
                x: 20,
                y: 20,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn rectangles_drawn_backwards_are_normalized() {
        let (kept, region) = source_region(
            Bounds::new(60.0, 60.0, -50.0, -50.0),
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            (200, 200),
        )
        .unwrap();
        assert_eq!(kept, Bounds::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(region.x, 20);
    }

    #[test]
    fn crop_is_clipped_to_the_image() {
        let (kept, region) = source_region(
            Bounds::new(80.0, 80.0, 100.0, 100.0),
            Bounds::new(50.0, 50.0, 100.0, 100.0),
            (100, 100),
        )
        .unwrap();
        assert_eq!(kept, Bounds::new(80.0, 80.0, 70.0, 70.0));
        assert_eq!(
            region,
            SourceRegion {
                x: 30,
                y: 30,
                width: 70,
                height: 70
            }
        );
    }

    #[test]
    fn empty_or_outside_rects_are_rejected() {
        let image_box = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert!(source_region(Bounds::new(10.0, 10.0, 0.0, 0.0), image_box, (100, 100)).is_none());
        assert!(source_region(Bounds::new(200.0, 200.0, 30.0, 30.0), image_box, (100, 100)).is_none());
    }

    #[test]
    fn cropping_copies_the_region() {
        let pixels = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let out = crop_pixels(
            &pixels,
            SourceRegion {
                x: 1,
                y: 2,
                width: 2,
                height: 2,
            },
        );
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(out.get_pixel(0, 0).0, [1, 2, 0, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [2, 3, 0, 255]);
    }
}
