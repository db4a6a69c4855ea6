use std::sync::Arc;

use super::*;
use crate::foundation::core::CanvasSize;

fn garbage_font() -> FontSource {
    FontSource {
        path: "garbage.ttf".into(),
        bytes: Arc::new(b"definitely not an sfnt".to_vec()),
    }
}

#[test]
fn missing_font_falls_back_to_bitmap() {
    let r = glyph_renderer_for(None);
    assert_eq!(r.name(), "builtin-5x7");
}

#[test]
fn unparseable_font_falls_back_to_bitmap() {
    assert!(FontGlyphRenderer::new(&garbage_font()).is_err());
    let r = glyph_renderer_for(Some(&garbage_font()));
    assert_eq!(r.name(), "builtin-5x7");
}

#[test]
fn system_font_measures_and_draws_when_available() {
    let Some(font) = FontSource::discover(None) else {
        return;
    };
    let Ok(mut r) = FontGlyphRenderer::new(&font) else {
        return;
    };

    let short = r.measure("Hi", 32.0).unwrap();
    let long = r.measure("Hi there, world", 32.0).unwrap();
    assert!(short.width > 0.0);
    assert!(long.width > short.width);
    assert!(short.height >= 32.0 * 0.8);
    assert!(r.measure("x", 0.0).is_err());

    let mut canvas = Canvas::filled(CanvasSize::new(200, 60).unwrap(), Rgba8::BLACK);
    let before = canvas.clone();
    let pass = GlyphPass {
        text: "Hi",
        x: 10.0,
        y: 10.0,
        color: Rgba8::WHITE,
    };
    r.draw(&mut canvas, 32.0, &[pass]).unwrap();
    assert_ne!(canvas, before);
    assert!(canvas.data.chunks_exact(4).all(|px| px[3] == 255));
}
