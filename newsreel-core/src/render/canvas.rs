use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{CanvasSize, Rgba8};
use crate::foundation::error::{NewsreelError, NewsreelResult};

/// Fixed-size RGBA8 pixel buffer.
///
/// Canvases produced by this crate are fully opaque, so the bytes are valid both as
/// straight and as premultiplied RGBA8. Row-major, 4 bytes per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl Canvas {
    pub fn filled(size: CanvasSize, color: Rgba8) -> Self {
        let px = [color.r, color.g, color.b, 255];
        Self {
            width: size.width,
            height: size.height,
            data: px.repeat(size.pixel_count()),
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> NewsreelResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| NewsreelError::validation("canvas size overflow"))?;
        if data.len() != expected {
            return Err(NewsreelError::validation(format!(
                "canvas data length {} does not match {width}x{height}x4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub fn save_png(&self, path: &Path) -> NewsreelResult<()> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}
