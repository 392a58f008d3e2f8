//! Pending report attachments.
//!
//! An attached image is validated once, when the user picks it, and held
//! as raw bytes until a submission succeeds or the form is reset. Encoding
//! to the inline base64 form happens at each submission attempt, so a
//! failed submit retries with the same bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;

use crate::{ImageError, MAX_IMAGE_BYTES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    data: Vec<u8>,
    format: ImageFormat,
}

impl PendingImage {
    /// Validates size and sniffs the format from the magic bytes. Only
    /// formats the matching backend renders inline are accepted.
    pub fn new(data: Vec<u8>) -> Result<Self, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Empty);
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                size: data.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let format = image::guess_format(&data).map_err(|_| ImageError::UnsupportedFormat)?;
        match format {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => {}
            _ => return Err(ImageError::UnsupportedFormat),
        }

        Ok(Self { data, format })
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Inline `data:` URI used as the `image` field of a submission.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.data))
    }
}
