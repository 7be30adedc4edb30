use std::io::Cursor;

use anyhow::Context;
use image::{DynamicImage, ImageFormat};

use crate::discord_bot::errors::UploadResult;

pub const PREVIEW_FILENAME: &str = "generated_preview.png";
pub const NO_PREVIEW_PREFIX: &str = "no_preview - ";
pub const ORIGINAL_PREFIX: &str = "original_image_file - ";

/// Formats Discord refuses to render inline; posts in these formats get a
/// synthesized PNG preview alongside the original file.
const CONVERSION_FORMATS: [ImageFormat; 1] = [ImageFormat::Bmp];

pub enum ImageKind {
    /// The decoder rejected the bytes. An expected outcome, not an error.
    Undecodable,
    NeedsConversion(ImageFormat, DynamicImage),
    Direct(ImageFormat),
}

/// Classifies raw attachment bytes. Malformed input maps to `Undecodable`,
/// this never panics and never errors.
pub fn classify(bytes: &[u8]) -> ImageKind {
    let format = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(_) => return ImageKind::Undecodable,
    };

    match image::load_from_memory_with_format(bytes, format) {
        Ok(decoded) if CONVERSION_FORMATS.contains(&format) => ImageKind::NeedsConversion(format, decoded),
        Ok(_) => ImageKind::Direct(format),
        Err(_) => ImageKind::Undecodable,
    }
}

pub struct PlannedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Decides which files get attached to the anonymous post.
///
/// Undecodable bytes go out as-is with a `no_preview` marker so reviewers know
/// Discord will not render them. Legacy bitmap formats get a PNG preview first
/// and the original second, relabeled as the source file. Everything else is
/// attached unmodified.
pub fn plan_attachments(bytes: Vec<u8>, filename: &str, content_type: Option<&str>) -> UploadResult<Vec<PlannedFile>> {
    let original_content_type = content_type.map(|ct| ct.to_string());

    match classify(&bytes) {
        ImageKind::Undecodable => Ok(vec![PlannedFile {
            filename: format!("{NO_PREVIEW_PREFIX}{filename}"),
            content_type: original_content_type,
            bytes,
        }]),
        ImageKind::NeedsConversion(_, decoded) => {
            let preview = encode_png(&decoded)?;
            Ok(vec![
                PlannedFile {
                    filename: PREVIEW_FILENAME.to_string(),
                    content_type: Some("image/png".to_string()),
                    bytes: preview,
                },
                PlannedFile {
                    filename: format!("{ORIGINAL_PREFIX}{filename}"),
                    content_type: original_content_type,
                    bytes,
                },
            ])
        }
        ImageKind::Direct(_) => Ok(vec![PlannedFile {
            filename: filename.to_string(),
            content_type: original_content_type,
            bytes,
        }]),
    }
}

/// Encodes the preview in memory, no filesystem round trip.
fn encode_png(decoded: &DynamicImage) -> UploadResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    decoded.write_to(&mut buffer, ImageFormat::Png).context("Failed to encode preview image")?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([120, 30, 200])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn garbage_bytes_are_undecodable() {
        assert!(matches!(classify(b"definitely not an image"), ImageKind::Undecodable));
        assert!(matches!(classify(&[]), ImageKind::Undecodable));
    }

    #[test]
    fn truncated_bmp_is_undecodable() {
        let mut bytes = encode(ImageFormat::Bmp);
        bytes.truncate(20);
        assert!(matches!(classify(&bytes), ImageKind::Undecodable));
    }

    #[test]
    fn png_header_with_garbage_body_is_undecodable() {
        let mut bytes = encode(ImageFormat::Png);
        bytes.truncate(24);
        assert!(matches!(classify(&bytes), ImageKind::Undecodable));
    }

    #[test]
    fn bmp_needs_conversion() {
        let bytes = encode(ImageFormat::Bmp);
        assert!(matches!(classify(&bytes), ImageKind::NeedsConversion(ImageFormat::Bmp, _)));
    }

    #[test]
    fn png_is_direct() {
        let bytes = encode(ImageFormat::Png);
        assert!(matches!(classify(&bytes), ImageKind::Direct(ImageFormat::Png)));
    }

    #[test]
    fn direct_image_plans_single_unmodified_file() {
        let bytes = encode(ImageFormat::Png);
        let files = plan_attachments(bytes.clone(), "cover.png", Some("image/png")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "cover.png");
        assert_eq!(files[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(files[0].bytes, bytes);
    }

    #[test]
    fn bmp_plans_preview_then_relabeled_original() {
        let bytes = encode(ImageFormat::Bmp);
        let files = plan_attachments(bytes.clone(), "scan.bmp", Some("image/bmp")).unwrap();
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].filename, "generated_preview.png");
        assert_eq!(files[0].content_type.as_deref(), Some("image/png"));
        assert!(matches!(classify(&files[0].bytes), ImageKind::Direct(ImageFormat::Png)));

        assert_eq!(files[1].filename, "original_image_file - scan.bmp");
        assert_eq!(files[1].content_type.as_deref(), Some("image/bmp"));
        assert_eq!(files[1].bytes, bytes);
    }

    #[test]
    fn undecodable_plans_single_flagged_file() {
        let bytes = b"not an image at all".to_vec();
        let files = plan_attachments(bytes.clone(), "mystery.dat", None).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "no_preview - mystery.dat");
        assert_eq!(files[0].content_type, None);
        assert_eq!(files[0].bytes, bytes);
    }
}
