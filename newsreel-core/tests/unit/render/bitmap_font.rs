use super::*;
use crate::foundation::core::{CanvasSize, Rgba8};

#[test]
fn scale_rounds_to_cell_height() {
    assert_eq!(BitmapGlyphRenderer::scale_for(8.0), 1);
    assert_eq!(BitmapGlyphRenderer::scale_for(2.0), 1);
    assert_eq!(BitmapGlyphRenderer::scale_for(40.0), 5);
    assert_eq!(BitmapGlyphRenderer::scale_for(f32::NAN), 1);
}

#[test]
fn measure_counts_chars_without_trailing_gap() {
    let mut r = BitmapGlyphRenderer::new();
    assert_eq!(r.measure("", 40.0).unwrap(), TextExtent::default());
    let one = r.measure("A", 40.0).unwrap();
    assert_eq!(one.width, 25.0);
    assert_eq!(one.height, 40.0);
    let three = r.measure("abc", 40.0).unwrap();
    assert_eq!(three.width, 85.0);
}

#[test]
fn non_ascii_draws_like_question_mark() {
    assert_eq!(glyph_for('é'), glyph_for('?'));
    assert_eq!(glyph_for('\u{0928}'), glyph_for('?'));
}

#[test]
fn draw_only_touches_glyph_cells() {
    let mut canvas = Canvas::filled(CanvasSize::new(20, 10).unwrap(), Rgba8::BLACK);
    let mut r = BitmapGlyphRenderer::new();
    let pass = GlyphPass {
        text: "I",
        x: 2.0,
        y: 1.0,
        color: Rgba8::WHITE,
    };
    r.draw(&mut canvas, 8.0, &[pass]).unwrap();

    // 'I' has a full vertical stroke in its middle column.
    for row in 0..7 {
        assert_eq!(canvas.pixel(4, 1 + row), [255, 255, 255, 255]);
    }
    assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(canvas.pixel(15, 5), [0, 0, 0, 255]);
}

#[test]
fn transparent_pass_is_skipped() {
    let mut canvas = Canvas::filled(CanvasSize::new(10, 10).unwrap(), Rgba8::BLACK);
    let before = canvas.clone();
    let pass = GlyphPass {
        text: "#",
        x: 0.0,
        y: 0.0,
        color: Rgba8::WHITE.with_alpha(0),
    };
    BitmapGlyphRenderer::new()
        .draw(&mut canvas, 8.0, &[pass])
        .unwrap();
    assert_eq!(canvas, before);
}
