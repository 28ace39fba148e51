// src/services/image_codec.rs
use crate::errors::TimeMachineError;
use crate::models::{DownloadPayload, EmbeddedImage, EraId};
use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat as ImgFormat;

/// Largest upload accepted as a source image.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }

    /// Embeds uploaded file bytes. A declared `image/*` type is trusted as-is;
    /// anything else falls back to sniffing the magic number.
    pub fn encode(
        &self,
        data: &[u8],
        declared_media_type: Option<&str>,
    ) -> Result<EmbeddedImage, TimeMachineError> {
        if data.is_empty() {
            return Err(TimeMachineError::UnreadableFile("file is empty".to_string()));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(too_large());
        }

        let media_type = match declared_media_type.map(str::trim) {
            Some(declared) if declared.starts_with("image/") => declared.to_string(),
            _ => sniff_media_type(data)?.to_string(),
        };

        Ok(EmbeddedImage::new(
            media_type,
            general_purpose::STANDARD.encode(data),
        ))
    }

    pub fn decode(&self, image: &EmbeddedImage) -> Result<Vec<u8>, TimeMachineError> {
        general_purpose::STANDARD
            .decode(image.data.as_bytes())
            .map_err(|e| {
                TimeMachineError::InvalidEmbeddedImage(format!("bad base64 payload: {}", e))
            })
    }

    pub fn download_payload(
        &self,
        image: &EmbeddedImage,
        era: EraId,
    ) -> Result<DownloadPayload, TimeMachineError> {
        Ok(DownloadPayload {
            file_name: download_file_name(era),
            media_type: image.media_type.clone(),
            bytes: self.decode(image)?,
        })
    }
}

pub fn too_large() -> TimeMachineError {
    TimeMachineError::UnreadableFile(format!("file exceeds {} bytes", MAX_IMAGE_BYTES))
}

pub fn download_file_name(era: EraId) -> String {
    format!("time-machine-{}.png", era)
}

fn sniff_media_type(data: &[u8]) -> Result<&'static str, TimeMachineError> {
    let format = image::guess_format(data)
        .map_err(|e| TimeMachineError::UnreadableFile(format!("unrecognized image data: {}", e)))?;

    match format {
        ImgFormat::Png => Ok("image/png"),
        ImgFormat::Jpeg => Ok("image/jpeg"),
        ImgFormat::Gif => Ok("image/gif"),
        ImgFormat::WebP => Ok("image/webp"),
        ImgFormat::Bmp => Ok("image/bmp"),
        ImgFormat::Tiff => Ok("image/tiff"),
        ImgFormat::Ico => Ok("image/x-icon"),
        ImgFormat::Avif => Ok("image/avif"),
        other => Err(TimeMachineError::UnreadableFile(format!(
            "unsupported image format: {:?}",
            other
        ))),
    }
}
