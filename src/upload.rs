//! Image uploads handed to detection backends.
//!
//! Decoding happens once, up front: the intrinsic pixel dimensions are
//! needed to normalize pixel-corner predictions, and an image that cannot
//! be decoded never reaches a provider.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use image::GenericImageView;

#[derive(Clone, Debug)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: &'static str,
    width: u32,
    height: u32,
}

impl ImageUpload {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Self::from_bytes(bytes, file_name)
    }

    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self> {
        let format = image::guess_format(&bytes).context("detect image format")?;
        let decoded = image::load_from_memory_with_format(&bytes, format).context("decode image")?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow!("image has zero-sized dimensions {}x{}", width, height));
        }
        Ok(Self {
            bytes,
            file_name: file_name.into(),
            mime_type: format.to_mime_type(),
            width,
            height,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Intrinsic (decoded) width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic (decoded) height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::png_bytes;
    use super::*;

    #[test]
    fn decodes_dimensions_and_mime_type() {
        let upload = ImageUpload::from_bytes(png_bytes(400, 500), "street.png").unwrap();
        assert_eq!(upload.width(), 400);
        assert_eq!(upload.height(), 500);
        assert_eq!(upload.mime_type(), "image/png");
        assert_eq!(upload.file_name(), "street.png");
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let err = ImageUpload::from_bytes(b"not an image".to_vec(), "x.jpg").unwrap_err();
        assert!(err.to_string().contains("image format"));
    }
}
