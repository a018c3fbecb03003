//! Bitmap loading with EXIF orientation handling and size capping.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use image::ImageReader;

use super::resize::{calculate_fit_dimensions, resize};
use super::{DecodeError, FilterType, Orientation, SourceImage};
use crate::raster::Raster;

/// Decode image bytes into a [`SourceImage`].
///
/// The format is sniffed from the content. EXIF orientation is applied, then
/// if the longer side exceeds `max_size` both sides are scaled by
/// `max_size / max(width, height)`. Images are never scaled up.
///
/// # Errors
///
/// Returns `DecodeError::Empty` for empty input, `DecodeError::InvalidFormat`
/// when the format cannot be recognized, and `DecodeError::CorruptedFile`
/// when decoding fails. Nothing is produced on failure.
pub fn load(bytes: &[u8], max_size: u32, filter: FilterType) -> Result<SourceImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let raster = Raster::from_rgba_image(apply_orientation(img, orientation).into_rgba8());
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSized { width, height });
    }

    let capped = cap_raster(raster, max_size, filter)?;
    log::debug!(
        "decoded {}x{} image ({:?}), working size {}x{}",
        width,
        height,
        orientation,
        capped.width,
        capped.height
    );

    Ok(SourceImage::new(width, height, capped))
}

/// Scale a raster down so its longer side equals `max_size`.
///
/// Rasters that already fit are returned unchanged.
pub fn cap_raster(raster: Raster, max_size: u32, filter: FilterType) -> Result<Raster, DecodeError> {
    let max_size = max_size.max(1);
    if raster.width <= max_size && raster.height <= max_size {
        return Ok(raster);
    }

    let (new_width, new_height) = calculate_fit_dimensions(raster.width, raster.height, max_size);
    resize(&raster, new_width, new_height, filter)
}

/// Extract EXIF orientation from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::png_bytes;
    use super::*;

    #[test]
    fn test_load_below_cap_is_untouched() {
        let src = load(&png_bytes(800, 600), 1000, FilterType::Bilinear).unwrap();

        assert_eq!(src.dimensions(), (800, 600));
        assert_eq!((src.intrinsic_width, src.intrinsic_height), (800, 600));
        assert!(!src.was_downscaled());
        assert_eq!(src.raster().pixel(12, 34), [12, 34, 7, 255]);
    }

    #[test]
    fn test_load_landscape_is_capped() {
        let src = load(&png_bytes(2000, 1000), 1000, FilterType::Bilinear).unwrap();

        assert_eq!(src.dimensions(), (1000, 500));
        assert_eq!((src.intrinsic_width, src.intrinsic_height), (2000, 1000));
        assert!(src.was_downscaled());
    }

    #[test]
    fn test_load_portrait_is_capped() {
        let src = load(&png_bytes(300, 1200), 600, FilterType::Bilinear).unwrap();
        assert_eq!(src.dimensions(), (150, 600));
    }

    #[test]
    fn test_load_exactly_at_cap() {
        let src = load(&png_bytes(1000, 10), 1000, FilterType::Nearest).unwrap();
        assert_eq!(src.dimensions(), (1000, 10));
    }

    #[test]
    fn test_load_empty_bytes() {
        assert_eq!(
            load(&[], 1000, FilterType::Bilinear),
            Err(DecodeError::Empty)
        );
    }

    #[test]
    fn test_load_garbage_bytes() {
        let result = load(b"definitely not an image", 1000, FilterType::Bilinear);
        assert_eq!(result, Err(DecodeError::InvalidFormat));
    }

    #[test]
    fn test_load_truncated_png() {
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(bytes.len() / 2);

        let result = load(&bytes, 1000, FilterType::Bilinear);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_defaults_without_exif() {
        assert_eq!(extract_orientation(&png_bytes(4, 4)), Orientation::Normal);
        assert_eq!(extract_orientation(b"junk"), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_swaps_dimensions() {
        let img = DynamicImage::new_rgba8(30, 10);
        let rotated = apply_orientation(img, Orientation::Rotate90CW);
        assert_eq!((rotated.width(), rotated.height()), (10, 30));
    }

    #[test]
    fn test_cap_raster_zero_cap_treated_as_one() {
        let raster = Raster::transparent(4, 2);
        let capped = cap_raster(raster, 0, FilterType::Nearest).unwrap();
        assert_eq!(capped.dimensions(), (1, 1));
    }
}
