use super::*;
use crate::foundation::core::CanvasSize;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_half_black_darkens_white() {
    let out = over([255, 255, 255, 255], Rgba8::rgba(0, 0, 0, 128).premul(), 1.0);
    assert_eq!(out[3], 255);
    assert!(out[0] > 120 && out[0] < 135);
}

#[test]
fn fill_rect_is_clipped_to_canvas() {
    let mut canvas = Canvas::filled(CanvasSize::new(4, 4).unwrap(), Rgba8::BLACK);
    fill_rect_over(&mut canvas, PixelRect::new(-10, -10, 2, 2), Rgba8::WHITE);
    assert_eq!(canvas.pixel(0, 0), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(1, 1), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 255]);

    fill_rect_over(&mut canvas, PixelRect::new(10, 10, 20, 20), Rgba8::WHITE);
    assert_eq!(canvas.pixel(3, 3), [0, 0, 0, 255]);
}

#[test]
fn stroke_border_covers_edges_only() {
    let mut canvas = Canvas::filled(CanvasSize::new(8, 8).unwrap(), Rgba8::BLACK);
    stroke_border(&mut canvas, 2, Rgba8::WHITE);
    assert_eq!(canvas.pixel(0, 4), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(7, 4), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(4, 1), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(4, 6), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(4, 4), [0, 0, 0, 255]);
    assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 255]);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}
