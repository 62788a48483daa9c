use std::fs;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use unicode_normalization::UnicodeNormalization;

use crate::date;
use crate::error::ExtractionError;
use crate::pptx;
use crate::record::ImageRecord;

/// Open one photograph and derive its record. Category stays unset.
pub fn extract_metadata(path: &Path) -> Result<ImageRecord, ExtractionError> {
    let open_err = |source| ExtractionError::Open { path: path.to_path_buf(), source };
    let decode_err = |source| ExtractionError::Decode { path: path.to_path_buf(), source };

    let reader = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?;
    let format = reader.format();
    let decoder = reader.into_decoder().map_err(decode_err)?;
    let (width, height) = decoder.dimensions();
    let color_mode = color_mode_name(decoder.color_type());
    // Embedded as-is formats only need the header; the rest get re-encoded
    // at render time, so a broken body must surface here
    if format.and_then(pptx::embedded_extension).is_none() {
        DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    }

    let exif_date = date::exif::read_capture_time(path);
    let modified = fs::metadata(path).ok().and_then(|m| date::file_modified(&m));
    let resolved = date::resolve_timestamp(exif_date, modified);

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().nfc().collect::<String>())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    Ok(ImageRecord {
        path: path.to_path_buf(),
        filename,
        width,
        height,
        format: format.map(format_name).unwrap_or_else(|| "UNKNOWN".to_string()),
        color_mode: color_mode.to_string(),
        creation_timestamp: resolved.date,
        timestamp_source: resolved.source,
        category: None,
        category_label: None,
    })
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

fn color_mode_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TimestampSource;
    use chrono::NaiveDate;

    #[test]
    fn test_png_falls_back_to_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("side.png");
        image::RgbaImage::new(12, 7).save(&path).unwrap();

        let record = extract_metadata(&path).unwrap();
        assert_eq!(record.filename, "side.png");
        assert_eq!((record.width, record.height), (12, 7));
        assert_eq!(record.format, "PNG");
        assert_eq!(record.color_mode, "RGBA");
        assert_eq!(record.timestamp_source, TimestampSource::FileModified);
        assert!(record.category.is_none());
    }

    #[test]
    fn test_jpeg_uses_exif_capture_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.jpg");
        std::fs::write(&path, date::exif::tests::jpeg_with_capture_time("2021:01:02 03:04:05")).unwrap();

        let record = extract_metadata(&path).unwrap();
        assert_eq!(record.format, "JPEG");
        assert_eq!(record.color_mode, "RGB");
        assert_eq!(record.timestamp_source, TimestampSource::Exif);
        assert_eq!(
            record.creation_timestamp,
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_truncated_webp_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let whole = dir.path().join("whole.webp");
        image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([(x * 4) as u8, (y * 4) as u8, 128]))
            .save(&whole)
            .unwrap();
        assert_eq!(extract_metadata(&whole).unwrap().format, "WEBP");

        let bytes = std::fs::read(&whole).unwrap();
        let cut = dir.path().join("cut.webp");
        std::fs::write(&cut, &bytes[..bytes.len() * 2 / 3]).unwrap();
        let err = extract_metadata(&cut).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode { .. }));
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = extract_metadata(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, ExtractionError::Open { .. }));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = extract_metadata(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode { .. }));
    }
}
