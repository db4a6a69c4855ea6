use super::*;
use crate::foundation::core::{CanvasSize, Rgba8};

#[test]
fn radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = blur_rgba8(&src, 1, 2, 0, 1.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn constant_canvas_is_unchanged() {
    let mut canvas = Canvas::filled(CanvasSize::new(6, 5).unwrap(), Rgba8::rgb(10, 20, 30));
    let before = canvas.clone();
    blur_canvas(&mut canvas, 3, 2.0).unwrap();
    assert_eq!(canvas, before);
}

#[test]
fn blur_spreads_energy_and_keeps_opacity() {
    let mut canvas = Canvas::filled(CanvasSize::new(5, 5).unwrap(), Rgba8::BLACK);
    let center = ((2 * 5 + 2) * 4) as usize;
    canvas.data[center..center + 3].copy_from_slice(&[255, 255, 255]);

    blur_canvas(&mut canvas, 2, 1.2).unwrap();

    let lit = canvas.data.chunks_exact(4).filter(|px| px[0] != 0).count();
    assert!(lit > 1);
    assert!(canvas.data.chunks_exact(4).all(|px| px[3] == 255));
    let sum_r: u32 = canvas.data.chunks_exact(4).map(|px| u32::from(px[0])).sum();
    assert!((sum_r as i32 - 255).abs() <= 6);
}

#[test]
fn rejects_bad_sigma_and_size() {
    assert!(blur_rgba8(&[0u8; 16], 2, 2, 1, 0.0).is_err());
    assert!(blur_rgba8(&[0u8; 12], 2, 2, 1, 1.0).is_err());
}

#[test]
fn kernel_taps_sum_to_one_and_are_symmetric() {
    for (radius, sigma) in [(1, 0.5), (4, 2.0), (9, 0.01), (12, 30.0)] {
        let k = Kernel::gaussian(radius, sigma).unwrap();
        assert_eq!(k.taps.len(), 2 * radius as usize + 1);
        assert_eq!(k.taps.iter().sum::<u32>(), Q16_ONE, "r={radius} s={sigma}");
        let rev: Vec<u32> = k.taps.iter().rev().copied().collect();
        assert_eq!(k.taps, rev);
    }
}

#[test]
fn vertical_stripe_only_spreads_sideways() {
    let (w, h) = (5usize, 4usize);
    let mut src = vec![0u8; w * h * 4];
    for y in 0..h {
        let i = (y * w + 2) * 4;
        src[i..i + 4].copy_from_slice(&[200, 200, 200, 255]);
    }
    let out = blur_rgba8(&src, w as u32, h as u32, 1, 1.0).unwrap();

    let row = |y: usize| out[y * w * 4..(y + 1) * w * 4].to_vec();
    for y in 1..h {
        assert_eq!(row(y), row(0));
    }
    assert!(out[4] > 0);
    assert!(out[2 * 4] < 200);
}
