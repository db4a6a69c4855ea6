//! Caption compositing: wrapped text on a translucent panel with an outline stroke.

use crate::foundation::core::Rgba8;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::foundation::text::greedy_wrap;
use crate::render::canvas::Canvas;
use crate::render::composite::{PixelRect, fill_rect_over};
use crate::render::glyphs::{GlyphPass, GlyphRenderer};

/// Vertical placement of the caption block.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptionAnchor {
    Center,
    /// Block bottom edge sits `margin_px` above the canvas bottom.
    Bottom { margin_px: u32 },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font_size_px: f32,
    pub text_color: Rgba8,
    pub panel_color: Rgba8,
    pub panel_padding_px: u32,
    pub max_line_chars: usize,
    pub line_spacing: f32,
    pub anchor: CaptionAnchor,
    pub outline_color: Rgba8,
    pub outline_width_px: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::video()
    }
}

impl CaptionStyle {
    pub fn video() -> Self {
        Self {
            font_size_px: 40.0,
            text_color: Rgba8::WHITE,
            panel_color: Rgba8::rgba(0, 0, 0, 160),
            panel_padding_px: 20,
            max_line_chars: 50,
            line_spacing: 1.2,
            anchor: CaptionAnchor::Center,
            outline_color: Rgba8::BLACK,
            outline_width_px: 2,
        }
    }

    pub fn post() -> Self {
        Self {
            font_size_px: 44.0,
            panel_color: Rgba8::rgba(0, 0, 0, 180),
            panel_padding_px: 15,
            max_line_chars: 35,
            anchor: CaptionAnchor::Bottom { margin_px: 120 },
            ..Self::video()
        }
    }

    pub fn validate(&self) -> NewsreelResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(NewsreelError::validation(
                "caption font_size_px must be finite and > 0",
            ));
        }
        if !self.line_spacing.is_finite() || self.line_spacing <= 0.0 {
            return Err(NewsreelError::validation(
                "caption line_spacing must be finite and > 0",
            ));
        }
        if self.max_line_chars == 0 {
            return Err(NewsreelError::validation(
                "caption max_line_chars must be > 0",
            ));
        }
        Ok(())
    }
}

/// Greedy character-count word wrap. Words longer than `max_chars` are split.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    greedy_wrap(text, max_chars)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where every line and the backing panel land on a canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub lines: Vec<PlacedLine>,
    pub block_height: f32,
    pub panel: PixelRect,
}

/// Draws captions with one glyph renderer. Reuse a compositor across frames so font
/// layouts are cached.
pub struct Compositor {
    glyphs: Box<dyn GlyphRenderer>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("glyphs", &self.glyphs.name())
            .finish()
    }
}

impl Compositor {
    pub fn new(glyphs: Box<dyn GlyphRenderer>) -> Self {
        Self { glyphs }
    }

    pub fn glyph_renderer_name(&self) -> &str {
        self.glyphs.name()
    }

    pub fn layout(
        &mut self,
        width: u32,
        height: u32,
        text: &str,
        style: &CaptionStyle,
    ) -> NewsreelResult<CaptionLayout> {
        style.validate()?;
        let wrapped = wrap_words(text, style.max_line_chars);
        if wrapped.is_empty() {
            return Ok(CaptionLayout {
                lines: Vec::new(),
                block_height: 0.0,
                panel: PixelRect::new(0, 0, 0, 0),
            });
        }

        let mut extents = Vec::with_capacity(wrapped.len());
        for line in &wrapped {
            extents.push(self.glyphs.measure(line, style.font_size_px)?);
        }

        let gap = style.font_size_px * (style.line_spacing - 1.0);
        let block_height: f32 = extents.iter().map(|e| e.height).sum::<f32>()
            + (wrapped.len() as f32 - 1.0) * gap;
        let max_width = extents.iter().map(|e| e.width).fold(0.0f32, f32::max);

        let (w, h) = (width as f32, height as f32);
        let top = match style.anchor {
            CaptionAnchor::Center => (h - block_height) / 2.0,
            CaptionAnchor::Bottom { margin_px } => h - margin_px as f32 - block_height,
        };

        let pad = style.panel_padding_px as f32;
        let panel = PixelRect::new(
            ((w - max_width) / 2.0 - pad).floor() as i64,
            (top - pad).floor() as i64,
            ((w + max_width) / 2.0 + pad).ceil() as i64,
            (top + block_height + pad).ceil() as i64,
        )
        .clip(width, height);

        let mut lines = Vec::with_capacity(wrapped.len());
        let mut y = top;
        for (text, extent) in wrapped.into_iter().zip(extents) {
            lines.push(PlacedLine {
                text,
                x: ((w - extent.width) / 2.0).round(),
                y: y.round(),
                width: extent.width,
                height: extent.height,
            });
            y += extent.height + gap;
        }

        Ok(CaptionLayout {
            lines,
            block_height,
            panel,
        })
    }

    /// Return a copy of `base` with `text` captioned onto it. `base` is never modified.
    pub fn compose(
        &mut self,
        base: &Canvas,
        text: &str,
        style: &CaptionStyle,
    ) -> NewsreelResult<Canvas> {
        let mut out = base.clone();
        self.compose_in_place(&mut out, text, style)?;
        Ok(out)
    }

    pub fn compose_in_place(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        style: &CaptionStyle,
    ) -> NewsreelResult<()> {
        let layout = self.layout(canvas.width, canvas.height, text, style)?;
        if layout.lines.is_empty() {
            return Ok(());
        }

        fill_rect_over(canvas, layout.panel, style.panel_color);

        let ow = style.outline_width_px as i32;
        let mut passes = Vec::new();
        for line in &layout.lines {
            for dy in -ow..=ow {
                for dx in -ow..=ow {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    passes.push(GlyphPass {
                        text: &line.text,
                        x: line.x + dx as f32,
                        y: line.y + dy as f32,
                        color: style.outline_color,
                    });
                }
            }
            passes.push(GlyphPass {
                text: &line.text,
                x: line.x,
                y: line.y,
                color: style.text_color,
            });
        }

        self.glyphs.draw(canvas, style.font_size_px, &passes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
