use crate::foundation::core::Rgba8;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::foundation::math::mul_div255;
use crate::render::canvas::Canvas;

pub type PremulRgba8 = [u8; 4];

/// Axis-aligned pixel rectangle, `x1`/`y1` exclusive. May extend past the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelRect {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(self) -> i64 {
        (self.x1 - self.x0).max(0)
    }

    pub fn height(self) -> i64 {
        (self.y1 - self.y0).max(0)
    }

    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Intersect with `[0, width) x [0, height)`.
    pub fn clip(self, width: u32, height: u32) -> Self {
        Self {
            x0: self.x0.clamp(0, i64::from(width)),
            y0: self.y0.clamp(0, i64::from(height)),
            x1: self.x1.clamp(0, i64::from(width)),
            y1: self.y1.clamp(0, i64::from(height)),
        }
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> NewsreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(NewsreelError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Blend a solid color over `rect` (clipped to the canvas).
pub fn fill_rect_over(canvas: &mut Canvas, rect: PixelRect, color: Rgba8) {
    let rect = rect.clip(canvas.width, canvas.height);
    if rect.is_empty() || color.a == 0 {
        return;
    }
    let src = color.premul();
    let stride = canvas.width as usize * 4;
    for y in rect.y0..rect.y1 {
        let row = y as usize * stride;
        for x in rect.x0..rect.x1 {
            let idx = row + x as usize * 4;
            let d = &mut canvas.data[idx..idx + 4];
            let out = over([d[0], d[1], d[2], d[3]], src, 1.0);
            d.copy_from_slice(&out);
        }
    }
}

/// Blend a solid color over the whole canvas.
pub fn fill_over(canvas: &mut Canvas, color: Rgba8) {
    let full = PixelRect::new(0, 0, i64::from(canvas.width), i64::from(canvas.height));
    fill_rect_over(canvas, full, color);
}

/// Draw a solid border of `width_px` along every canvas edge.
pub fn stroke_border(canvas: &mut Canvas, width_px: u32, color: Rgba8) {
    if width_px == 0 {
        return;
    }
    let (w, h, b) = (
        i64::from(canvas.width),
        i64::from(canvas.height),
        i64::from(width_px),
    );
    fill_rect_over(canvas, PixelRect::new(0, 0, w, b), color);
    fill_rect_over(canvas, PixelRect::new(0, h - b, w, h), color);
    fill_rect_over(canvas, PixelRect::new(0, b, b, h - b), color);
    fill_rect_over(canvas, PixelRect::new(w - b, b, w, h - b), color);
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
