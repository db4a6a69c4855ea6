//! Text rasterization behind a small trait so captions can run with or without a font file.

use std::collections::HashMap;

use crate::assets::font::FontSource;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::bitmap_font::BitmapGlyphRenderer;
use crate::render::canvas::Canvas;
use crate::render::composite::over_in_place;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// One single-line draw of `text` with its top-left corner at `(x, y)`.
#[derive(Clone, Copy, Debug)]
pub struct GlyphPass<'a> {
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    pub color: Rgba8,
}

pub trait GlyphRenderer {
    fn name(&self) -> &str;

    /// Size of `text` laid out on a single line.
    fn measure(&mut self, text: &str, size_px: f32) -> NewsreelResult<TextExtent>;

    /// Draw every pass in order onto `canvas`. Later passes blend over earlier ones.
    fn draw(
        &mut self,
        canvas: &mut Canvas,
        size_px: f32,
        passes: &[GlyphPass<'_>],
    ) -> NewsreelResult<()>;
}

const MAX_CACHED_LAYOUTS: usize = 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LayoutBrush;

/// Shapes text with parley and rasterizes it with vello_cpu.
pub struct FontGlyphRenderer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<LayoutBrush>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    label: String,
    layouts: HashMap<(String, u32), parley::Layout<LayoutBrush>>,
}

impl std::fmt::Debug for FontGlyphRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontGlyphRenderer")
            .field("family_name", &self.family_name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl FontGlyphRenderer {
    pub fn new(source: &FontSource) -> NewsreelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(source.bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            NewsreelError::render(format!(
                "no font families registered from '{}'",
                source.path.display()
            ))
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| NewsreelError::render("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(source.bytes.to_vec()),
            0,
        );

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            label: source.path.display().to_string(),
            layouts: HashMap::new(),
        })
    }

    fn layout(&mut self, text: &str, size_px: f32) -> NewsreelResult<&parley::Layout<LayoutBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(NewsreelError::validation(
                "text size must be finite and > 0",
            ));
        }
        let key = (text.to_owned(), size_px.to_bits());
        if !self.layouts.contains_key(&key) {
            if self.layouts.len() >= MAX_CACHED_LAYOUTS {
                self.layouts.clear();
            }
            let mut builder = self
                .layout_ctx
                .ranged_builder(&mut self.font_ctx, text, 1.0, true);
            builder.push_default(parley::style::StyleProperty::FontStack(
                parley::style::FontStack::Source(std::borrow::Cow::Owned(
                    self.family_name.clone(),
                )),
            ));
            builder.push_default(parley::style::StyleProperty::FontSize(size_px));
            builder.push_default(parley::style::StyleProperty::Brush(LayoutBrush));
            let mut layout: parley::Layout<LayoutBrush> = builder.build(text);
            layout.break_all_lines(None);
            self.layouts.insert(key.clone(), layout);
        }
        self.layouts
            .get(&key)
            .ok_or_else(|| NewsreelError::render("text layout cache miss"))
    }
}

impl GlyphRenderer for FontGlyphRenderer {
    fn name(&self) -> &str {
        &self.label
    }

    fn measure(&mut self, text: &str, size_px: f32) -> NewsreelResult<TextExtent> {
        if text.is_empty() {
            return Ok(TextExtent::default());
        }
        let layout = self.layout(text, size_px)?;
        Ok(TextExtent {
            width: layout.width(),
            height: layout.height(),
        })
    }

    fn draw(
        &mut self,
        canvas: &mut Canvas,
        size_px: f32,
        passes: &[GlyphPass<'_>],
    ) -> NewsreelResult<()> {
        if passes.is_empty() {
            return Ok(());
        }
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| NewsreelError::render("canvas width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| NewsreelError::render("canvas height exceeds u16"))?;

        for pass in passes {
            if !pass.text.is_empty() {
                self.layout(pass.text, size_px)?;
            }
        }

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        for pass in passes {
            if pass.text.is_empty() || pass.color.a == 0 {
                continue;
            }
            let key = (pass.text.to_owned(), size_px.to_bits());
            let Some(layout) = self.layouts.get(&key) else {
                continue;
            };
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(pass.x),
                f64::from(pass.y),
            )));
            let c = pass.color;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));

            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let mut pen_x = run.offset();
                    let baseline = run.baseline();
                    let glyphs = run.glyphs().map(|g| {
                        let glyph = vello_cpu::Glyph {
                            id: g.id,
                            x: pen_x + g.x,
                            y: baseline - g.y,
                        };
                        pen_x += g.advance;
                        glyph
                    });
                    ctx.glyph_run(&self.font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
        ctx.flush();

        let mut layer = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut layer);
        over_in_place(&mut canvas.data, layer.data_as_u8_slice(), 1.0)
    }
}

/// Pick a renderer for `font`, falling back to the built-in bitmap font when no font is
/// available or it cannot be loaded.
pub fn glyph_renderer_for(font: Option<&FontSource>) -> Box<dyn GlyphRenderer> {
    match font {
        Some(source) => match FontGlyphRenderer::new(source) {
            Ok(r) => {
                tracing::debug!(font = %source.path.display(), "using font renderer");
                Box::new(r)
            }
            Err(e) => {
                tracing::warn!(
                    font = %source.path.display(),
                    error = %e,
                    "font could not be loaded, using built-in bitmap font"
                );
                Box::new(BitmapGlyphRenderer::new())
            }
        },
        None => {
            tracing::warn!("no font available, using built-in bitmap font");
            Box::new(BitmapGlyphRenderer::new())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/glyphs.rs"]
mod tests;
