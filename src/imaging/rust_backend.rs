//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Orientation | `ImageDecoder::orientation` (EXIF in JPEG, PNG, TIFF, WebP) |
//! | Encode | `DynamicImage::save` (format from extension) |
//!
//! Decoding keeps the source channel count and bit depth (8- or 16-bit,
//! 1/2/3/4 channels); normalization happens later in the pipeline.

use super::backend::{BackendError, ImageBackend, ImageSize};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Codec backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<ImageSize, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(ImageSize { width, height })
    }

    /// Parses headers only. An upright image reports `None`, since the
    /// decoder does not distinguish tag 1 from a missing tag.
    fn read_orientation(&self, path: &Path) -> Result<Option<u8>, BackendError> {
        let mut decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
        let orientation = decoder.orientation().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read orientation: {}", e))
        })?;
        Ok(match orientation {
            Orientation::NoTransforms => None,
            other => Some(other.to_exif()),
        })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
    }

    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError> {
        image
            .save(path)
            .map_err(|e| BackendError::Encode(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp", "gif", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn is_supported_image_ignores_case() {
        assert!(is_supported_image(Path::new("/a/B.PNG")));
        assert!(is_supported_image(Path::new("photo.Jpeg")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no-extension")));
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, ImageSize::new(200, 150));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn decode_keeps_sixteen_bit_depth() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("deep.png");
        let img = image::ImageBuffer::<image::Rgb<u16>, Vec<u16>>::from_pixel(
            3,
            2,
            image::Rgb([65535, 0, 1000]),
        );
        DynamicImage::ImageRgb16(img).save(&path).unwrap();

        let decoded = RustBackend::new().decode(&path).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb16(_)));
        assert_eq!(decoded.dimensions(), (3, 2));
    }

    #[test]
    fn decode_empty_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();

        assert!(RustBackend::new().decode(&path).is_err());
    }

    #[test]
    fn decode_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corrupt.jpg");
        std::fs::write(&path, b"\xFF\xD8garbage that is not a jpeg").unwrap();

        assert!(RustBackend::new().decode(&path).is_err());
    }

    #[test]
    fn encode_png_roundtrip_is_lossless() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_fn(5, 4, |x, y| {
            image::Rgba([x as u8 * 40, y as u8 * 60, 7, 128 + x as u8])
        }));

        let backend = RustBackend::new();
        backend.encode(&img, &path).unwrap();
        let back = backend.decode(&path).unwrap();
        assert_eq!(back.as_bytes(), img.as_bytes());
    }

    #[test]
    fn encode_unknown_extension_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.unknown");
        let result = RustBackend::new().encode(&DynamicImage::new_rgb8(2, 2), &path);
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }

    /// Little-endian TIFF header with IFD0 holding only the orientation tag.
    fn exif_with_orientation(tag: u16) -> Vec<u8> {
        let mut tiff = b"II*\0".to_vec();
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff
    }

    #[test]
    fn read_orientation_from_jpeg_exif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rotated.jpg");
        let img = RgbImage::new(8, 4);
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file));
        encoder.set_exif_metadata(exif_with_orientation(6)).unwrap();
        encoder
            .write_image(img.as_raw(), 8, 4, image::ExtendedColorType::Rgb8)
            .unwrap();

        assert_eq!(RustBackend::new().read_orientation(&path).unwrap(), Some(6));
    }

    #[test]
    fn read_orientation_from_png_exif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rotated.png");
        let img = RgbImage::new(8, 4);
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = image::codecs::png::PngEncoder::new(std::io::BufWriter::new(file));
        encoder.set_exif_metadata(exif_with_orientation(8)).unwrap();
        encoder
            .write_image(img.as_raw(), 8, 4, image::ExtendedColorType::Rgb8)
            .unwrap();

        assert_eq!(RustBackend::new().read_orientation(&path).unwrap(), Some(8));
    }

    #[test]
    fn read_orientation_nonexistent_file_errors() {
        let result = RustBackend::new().read_orientation(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn read_orientation_plain_jpeg_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        create_test_jpeg(&path, 16, 16);

        assert_eq!(RustBackend::new().read_orientation(&path).unwrap(), None);
    }
}
