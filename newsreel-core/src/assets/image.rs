//! Source image fetching and letterboxing onto a fixed-size canvas.

use std::path::PathBuf;

use image::imageops::FilterType;
use reqwest::blocking::Client;

use crate::foundation::core::CanvasSize;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::blur::{BlurSettings, blur_canvas};
use crate::render::canvas::Canvas;
use crate::services::http::{HttpSettings, get_ok, read_bytes};

/// Where a background image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Interpret `s` as a URL when it has an http(s) scheme, otherwise as a local path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(PathBuf::from(s))
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImagePreparer {
    client: Client,
}

impl ImagePreparer {
    pub fn new(http: &HttpSettings) -> NewsreelResult<Self> {
        Ok(Self {
            client: http.build_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn fetch(&self, url: &str) -> NewsreelResult<Vec<u8>> {
        let what = format!("fetch image '{url}'");
        let resp = get_ok(&self.client, url, &what)?;
        read_bytes(resp, &what)
    }

    pub fn load(&self, source: &ImageSource) -> NewsreelResult<Vec<u8>> {
        match source {
            ImageSource::Url(url) => self.fetch(url),
            ImageSource::Path(path) => std::fs::read(path).map_err(|e| {
                NewsreelError::fetch(format!("read image '{}': {e}", path.display()))
            }),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// Fetch, decode and letterbox `source` to exactly `size`, then optionally soften it.
    #[tracing::instrument(level = "debug", skip(self, source), fields(w = size.width, h = size.height))]
    pub fn prepare(
        &self,
        source: &ImageSource,
        size: CanvasSize,
        blur: Option<BlurSettings>,
    ) -> NewsreelResult<Canvas> {
        let bytes = self.load(source)?;
        let img = decode_image(&bytes)?;
        let mut canvas = letterbox(&img, size);
        if let Some(b) = blur {
            blur_canvas(&mut canvas, b.radius, b.sigma)?;
        }
        Ok(canvas)
    }
}

pub fn decode_image(bytes: &[u8]) -> NewsreelResult<image::RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| NewsreelError::decode(format!("decode image: {e}")))?;
    Ok(img.to_rgba8())
}

/// Size the image takes inside `target` before padding.
///
/// Wider-than-target sources are scaled to the target width, everything else to the target
/// height.
pub fn fitted_size(src_w: u32, src_h: u32, target: CanvasSize) -> (u32, u32) {
    let src_aspect = f64::from(src_w) / f64::from(src_h.max(1));
    if src_aspect > target.aspect() {
        let h = (f64::from(target.width) / src_aspect).round() as u32;
        (target.width, h.clamp(1, target.height))
    } else {
        let w = (f64::from(target.height) * src_aspect).round() as u32;
        (w.clamp(1, target.width), target.height)
    }
}

/// Scale `img` preserving its aspect ratio and center it on an opaque black canvas.
pub fn letterbox(img: &image::RgbaImage, target: CanvasSize) -> Canvas {
    let (src_w, src_h) = img.dimensions();
    let mut bg = image::RgbaImage::from_pixel(
        target.width,
        target.height,
        image::Rgba([0, 0, 0, 255]),
    );
    if src_w == 0 || src_h == 0 {
        return Canvas::from_image(bg);
    }

    let (w, h) = fitted_size(src_w, src_h, target);
    let resized = if (w, h) == (src_w, src_h) {
        img.clone()
    } else {
        image::imageops::resize(img, w, h, FilterType::Lanczos3)
    };
    let x = i64::from((target.width - w) / 2);
    let y = i64::from((target.height - h) / 2);
    image::imageops::overlay(&mut bg, &resized, x, y);
    Canvas::from_image(bg)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
