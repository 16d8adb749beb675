//! EXIF orientation correction.
//!
//! | Tag | Transform |
//! |---|---|
//! | 2 | horizontal flip |
//! | 3 | flip both axes (180°) |
//! | 4 | vertical flip |
//! | 5 | rotate 90° clockwise, then horizontal flip |
//! | 6 | rotate 90° clockwise |
//! | 7 | rotate 90° counter-clockwise, then horizontal flip |
//! | 8 | rotate 90° counter-clockwise |
//!
//! Tag 1, an absent tag, and any other value leave the image untouched.

use image::DynamicImage;
use image::metadata::Orientation;

/// Apply the transform for `tag` and return the upright image.
pub fn normalize_orientation(mut image: DynamicImage, tag: Option<u8>) -> DynamicImage {
    let Some(orientation) = tag.and_then(Orientation::from_exif) else {
        return image;
    };
    if orientation != Orientation::NoTransforms {
        tracing::debug!(?orientation, "applying EXIF orientation");
        image.apply_orientation(orientation);
    }
    image
}

/// Whether the transform for `tag` swaps width and height.
pub fn swaps_axes(tag: Option<u8>) -> bool {
    matches!(
        tag.and_then(Orientation::from_exif),
        Some(
            Orientation::Rotate90
                | Orientation::Rotate270
                | Orientation::Rotate90FlipH
                | Orientation::Rotate270FlipH
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma};

    /// 3x2 image where each pixel value encodes its source position.
    fn marked() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(3, 2, |x, y| {
            Luma([(10 * y + x) as u8])
        }))
    }

    fn value_at(img: &DynamicImage, x: u32, y: u32) -> u8 {
        img.as_luma8().unwrap().get_pixel(x, y).0[0]
    }

    /// Source value (original x, y) found at (nx, ny) for every destination pixel.
    fn assert_mapping(tag: u8, map: impl Fn(u32, u32) -> (u32, u32)) {
        let src = marked();
        let out = normalize_orientation(src.clone(), Some(tag));
        for y in 0..2 {
            for x in 0..3 {
                let (nx, ny) = map(x, y);
                assert_eq!(
                    value_at(&out, nx, ny),
                    value_at(&src, x, y),
                    "tag {tag}: source ({x},{y}) expected at ({nx},{ny})"
                );
            }
        }
    }

    #[test]
    fn absent_and_normal_tags_are_noops() {
        let src = marked();
        assert_eq!(normalize_orientation(src.clone(), None).as_bytes(), src.as_bytes());
        assert_eq!(normalize_orientation(src.clone(), Some(1)).as_bytes(), src.as_bytes());
    }

    #[test]
    fn unknown_tags_are_noops() {
        let src = marked();
        for tag in [0, 9, 42, 255] {
            let out = normalize_orientation(src.clone(), Some(tag));
            assert_eq!(out.as_bytes(), src.as_bytes(), "tag {tag}");
        }
    }

    #[test]
    fn tag_2_flips_horizontally() {
        assert_mapping(2, |x, y| (2 - x, y));
    }

    #[test]
    fn tag_3_flips_both_axes() {
        assert_mapping(3, |x, y| (2 - x, 1 - y));
    }

    #[test]
    fn tag_4_flips_vertically() {
        assert_mapping(4, |x, y| (x, 1 - y));
    }

    #[test]
    fn tag_5_transposes() {
        assert_mapping(5, |x, y| (y, x));
    }

    #[test]
    fn tag_6_rotates_clockwise() {
        assert_mapping(6, |x, y| (1 - y, x));
    }

    #[test]
    fn tag_7_transverses() {
        assert_mapping(7, |x, y| (1 - y, 2 - x));
    }

    #[test]
    fn tag_8_rotates_counter_clockwise() {
        assert_mapping(8, |x, y| (y, 2 - x));
    }

    #[test]
    fn tag_3_equals_tag_2_then_tag_4() {
        let src = marked();
        let both = normalize_orientation(src.clone(), Some(3));
        let sequential = normalize_orientation(normalize_orientation(src, Some(2)), Some(4));
        assert_eq!(both.as_bytes(), sequential.as_bytes());
    }

    #[test]
    fn rotating_tags_swap_dimensions() {
        for tag in 1..=8u8 {
            let out = normalize_orientation(marked(), Some(tag));
            let expected = if swaps_axes(Some(tag)) { (2, 3) } else { (3, 2) };
            assert_eq!(out.dimensions(), expected, "tag {tag}");
        }
        assert!(!swaps_axes(None));
        assert!(!swaps_axes(Some(9)));
    }
}
