//! PNG packaging of a rasterized card into a named file

use crate::rendering::RasterImage;
use crate::{Error, Result};

pub const DEFAULT_FILE_NAME: &str = "resumo-leilao.png";
pub const PNG_MIME: &str = "image/png";

/// A named binary file ready to be shared, opened or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), mime: mime.into(), bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode the bitmap as PNG (lossless, so always at maximum quality)
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let bytes = raster
        .pixmap
        .encode_png()
        .map_err(|e| Error::EncodingFailed(e.to_string()))?;
    if bytes.is_empty() {
        return Err(Error::EncodingFailed("encoder produced no data".into()));
    }
    Ok(bytes)
}

/// Encode and wrap the bitmap into a PNG file named `name`
pub fn package(raster: &RasterImage, name: &str) -> Result<ImageAsset> {
    Ok(ImageAsset::new(name, PNG_MIME, encode_png(raster)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Pixmap;

    fn raster() -> RasterImage {
        let pixmap = Pixmap::new(8, 4).unwrap();
        RasterImage { width: 8, height: 4, pixmap }
    }

    #[test]
    fn packages_png_with_signature() {
        let asset = package(&raster(), DEFAULT_FILE_NAME).unwrap();
        assert_eq!(asset.name, "resumo-leilao.png");
        assert_eq!(asset.mime, "image/png");
        assert_eq!(&asset.bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn asset_reports_its_size() {
        let asset = ImageAsset::new("a.png", PNG_MIME, vec![1, 2, 3]);
        assert_eq!(asset.len(), 3);
        assert!(!asset.is_empty());
    }
}
