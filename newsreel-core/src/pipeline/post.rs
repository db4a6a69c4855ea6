//! Single captioned social-post image.

use std::path::{Path, PathBuf};

use crate::assets::font::FontSource;
use crate::assets::image::{ImagePreparer, ImageSource};
use crate::config::{Config, PathSettings, PostSettings};
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::canvas::Canvas;
use crate::render::caption::Compositor;
use crate::render::composite::{fill_over, stroke_border};
use crate::render::glyphs::glyph_renderer_for;

/// Which background a post image ended up with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostBackground {
    Provided,
    Placeholder,
    Black,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostArtifact {
    pub path: PathBuf,
    pub public_path: String,
    pub background: PostBackground,
}

#[derive(Debug)]
pub struct PostImageGenerator {
    images: ImagePreparer,
    font: Option<FontSource>,
    settings: PostSettings,
    paths: PathSettings,
}

impl PostImageGenerator {
    pub fn new(images: ImagePreparer, font: Option<FontSource>, config: &Config) -> Self {
        Self {
            images,
            font,
            settings: config.post.clone(),
            paths: config.paths.clone(),
        }
    }

    /// Background canvas: `image`, else the placeholder, else solid black. Never fails.
    pub fn background(&self, image: Option<&ImageSource>) -> (Canvas, PostBackground) {
        let size = self.settings.size;
        if let Some(src) = image {
            match self.images.prepare(src, size, None) {
                Ok(c) => return (c, PostBackground::Provided),
                Err(e) => tracing::warn!(error = %e, "post image unavailable, using placeholder"),
            }
        }
        if let Some(url) = &self.settings.placeholder_url {
            match self.images.prepare(&ImageSource::Url(url.clone()), size, None) {
                Ok(c) => return (c, PostBackground::Placeholder),
                Err(e) => tracing::warn!(error = %e, "placeholder unavailable, using black"),
            }
        }
        (Canvas::filled(size, Rgba8::BLACK), PostBackground::Black)
    }

    /// Compose the post over `image` (or a fallback) with `summary` as its caption.
    pub fn render(
        &self,
        summary: &str,
        image: Option<&ImageSource>,
    ) -> NewsreelResult<(Canvas, PostBackground)> {
        let (mut canvas, background) = self.background(image);
        fill_over(&mut canvas, self.settings.overlay);
        let mut compositor = Compositor::new(glyph_renderer_for(self.font.as_ref()));
        compositor.compose_in_place(&mut canvas, summary.trim(), &self.settings.caption)?;
        stroke_border(&mut canvas, self.settings.border_px, self.settings.border_color);
        Ok((canvas, background))
    }

    /// Render into `<uploads>/post_<uuid>.png`.
    pub fn generate(
        &self,
        summary: &str,
        image: Option<&ImageSource>,
    ) -> NewsreelResult<PostArtifact> {
        let name = format!("post_{}.png", uuid::Uuid::new_v4());
        let out = self.paths.uploads_path().join(&name);
        let mut artifact = self.generate_to(summary, image, &out)?;
        artifact.public_path = self.paths.public_path(&name);
        Ok(artifact)
    }

    /// Render into `out`. The PNG is written beside `out` and renamed into place, so a
    /// failed write never leaves a partial file.
    #[tracing::instrument(level = "info", skip(self, summary, image), fields(out = %out.display()))]
    pub fn generate_to(
        &self,
        summary: &str,
        image: Option<&ImageSource>,
        out: &Path,
    ) -> NewsreelResult<PostArtifact> {
        let (canvas, background) = self.render(summary, image)?;
        ensure_parent_dir(out)?;
        let dir = match out.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".post_")
            .suffix(".png")
            .tempfile_in(&dir)
            .map_err(|e| {
                NewsreelError::render(format!("create temp post in '{}': {e}", dir.display()))
            })?;
        canvas.save_png(tmp.path())?;
        tmp.persist(out).map_err(|e| {
            NewsreelError::render(format!("move post image to '{}': {}", out.display(), e.error))
        })?;

        tracing::info!(background = ?background, "post image ready");
        Ok(PostArtifact {
            path: out.to_path_buf(),
            public_path: out.to_string_lossy().replace('\\', "/"),
            background,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/post.rs"]
mod tests;
