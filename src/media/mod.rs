use std::{fs, io::Cursor, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GenericImageView, ImageOutputFormat};

use crate::{
    error::{AppError, AppResult},
    models::AspectRatio,
};

const SUPPORTED_MIMES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];
const JPEG_QUALITY: u8 = 92;

/// User-supplied image payload sent alongside an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ReferenceImage {
    pub fn from_data_url(data_url: &str) -> AppResult<Self> {
        if !data_url.starts_with("data:") {
            return Err(AppError::validation("expected a data URL with image payload"));
        }

        let (metadata, payload) = data_url
            .split_once(',')
            .ok_or_else(|| AppError::validation("invalid data URL format"))?;

        if !metadata.contains(";base64") {
            return Err(AppError::validation("data URL must be base64 encoded"));
        }

        let mime = metadata
            .trim_start_matches("data:")
            .split(';')
            .next()
            .unwrap_or_default();
        if !SUPPORTED_MIMES.contains(&mime) {
            return Err(AppError::validation(format!(
                "unsupported image mime type: {mime}. allowed: png/jpeg/webp"
            )));
        }

        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self {
            mime_type: mime.to_string(),
            bytes,
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    pub fn base64_data(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Center-crops the image to `aspect_ratio`, keeping jpeg as jpeg and
    /// re-encoding everything else as png.
    pub fn center_crop_to(&self, aspect_ratio: AspectRatio) -> AppResult<Self> {
        let image = image::load_from_memory(&self.bytes)?;
        let (x, y, width, height) = crop_window(image.dimensions(), aspect_ratio.ratio());
        let cropped = image.crop_imm(x, y, width, height);

        let mut buffer = Cursor::new(Vec::new());
        let mime_type = if matches!(self.mime_type.as_str(), "image/jpeg" | "image/jpg") {
            DynamicImage::ImageRgb8(cropped.to_rgb8())
                .write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
            "image/jpeg"
        } else {
            cropped.write_to(&mut buffer, ImageOutputFormat::Png)?;
            "image/png"
        };

        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes: buffer.into_inner(),
        })
    }

    /// Like [`center_crop_to`](Self::center_crop_to) but keeps the original
    /// payload when the image cannot be decoded.
    pub fn normalized_for(&self, aspect_ratio: AspectRatio) -> Self {
        match self.center_crop_to(aspect_ratio) {
            Ok(cropped) => cropped,
            Err(error) => {
                tracing::warn!(%error, %aspect_ratio, "failed to crop reference image, sending original");
                self.clone()
            }
        }
    }
}

/// Source window `(x, y, width, height)` of the largest centered region with
/// the target ratio.
fn crop_window((width, height): (u32, u32), target_ratio: f64) -> (u32, u32, u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0, width, height);
    }

    let original_ratio = width as f64 / height as f64;
    if target_ratio > original_ratio {
        let crop_height = ((width as f64 / target_ratio).round() as u32).clamp(1, height);
        (0, (height - crop_height) / 2, width, crop_height)
    } else if target_ratio < original_ratio {
        let crop_width = ((height as f64 * target_ratio).round() as u32).clamp(1, width);
        ((width - crop_width) / 2, 0, crop_width, height)
    } else {
        (0, 0, width, height)
    }
}

pub fn read_image_path_as_data_url(path: &Path) -> AppResult<String> {
    if !path.exists() {
        return Err(AppError::validation(format!(
            "image path not found: {}",
            path.display()
        )));
    }

    let bytes = fs::read(path)?;
    let mime = match path.extension().and_then(|ext| ext.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    };

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_data_url(width: u32, height: u32) -> String {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(buffer.into_inner()))
    }

    #[test]
    fn parses_data_url_and_round_trips_header() {
        let data_url = png_data_url(4, 4);
        let image = ReferenceImage::from_data_url(&data_url).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.to_data_url(), data_url);
    }

    #[test]
    fn rejects_non_image_payloads() {
        assert!(ReferenceImage::from_data_url("https://example.com/a.png").is_err());
        assert!(ReferenceImage::from_data_url("data:image/png,abc").is_err());
        let gif = ReferenceImage::from_data_url("data:image/gif;base64,R0lGOD").unwrap_err();
        assert!(gif.to_string().contains("image/gif"));
    }

    #[test]
    fn crop_window_centers_on_the_long_side() {
        assert_eq!(crop_window((400, 200), 1.0), (100, 0, 200, 200));
        assert_eq!(crop_window((100, 100), 16.0 / 9.0), (0, 22, 100, 56));
        assert_eq!(crop_window((300, 400), 3.0 / 4.0), (0, 0, 300, 400));
    }

    #[test]
    fn center_crop_produces_target_dimensions() {
        let image = ReferenceImage::from_data_url(&png_data_url(400, 200)).unwrap();
        let cropped = image.center_crop_to(AspectRatio::Square).unwrap();
        let decoded = image::load_from_memory(&cropped.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 200));
        assert_eq!(cropped.mime_type, "image/png");
    }

    #[test]
    fn undecodable_reference_falls_back_to_original() {
        let broken = ReferenceImage {
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(broken.normalized_for(AspectRatio::Portrait), broken);
    }
}
