use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::canvas::Canvas;

/// Gaussian softening applied to video backgrounds before captioning.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlurSettings {
    pub radius: u32,
    pub sigma: f32,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            radius: 4,
            sigma: 2.0,
        }
    }
}

/// Separable gaussian blur over the whole canvas. `radius == 0` leaves it untouched.
pub fn blur_canvas(canvas: &mut Canvas, radius: u32, sigma: f32) -> NewsreelResult<()> {
    if radius == 0 {
        return Ok(());
    }
    canvas.data = blur_rgba8(&canvas.data, canvas.width, canvas.height, radius, sigma)?;
    Ok(())
}

pub fn blur_rgba8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> NewsreelResult<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let len = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| NewsreelError::render("blur buffer size overflow"))?;
    if src.len() != len {
        return Err(NewsreelError::render(format!(
            "blur input is {} bytes, expected {len} for {width}x{height} RGBA",
            src.len()
        )));
    }
    if radius == 0 || len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = Kernel::gaussian(radius, sigma)?;
    let mut rows = vec![0u8; len];
    let mut out = vec![0u8; len];
    convolve(src, &mut rows, w, h, Axis::Horizontal, &kernel);
    convolve(&rows, &mut out, w, h, Axis::Vertical, &kernel);
    Ok(out)
}

const Q16_ONE: u32 = 1 << 16;

/// Symmetric gaussian taps in 16.16 fixed point, summing to exactly [`Q16_ONE`].
#[derive(Debug)]
struct Kernel {
    taps: Vec<u32>,
}

impl Kernel {
    fn gaussian(radius: u32, sigma: f32) -> NewsreelResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(NewsreelError::validation("blur sigma must be > 0"));
        }
        let two_var = 2.0 * f64::from(sigma).powi(2);
        let r = i64::from(radius);
        let raw: Vec<f64> = (-r..=r)
            .map(|d| (-((d * d) as f64) / two_var).exp())
            .collect();
        // The center weight is 1.0, so the total is never zero.
        let total: f64 = raw.iter().sum();
        let mut taps: Vec<u32> = raw
            .iter()
            .map(|w| (w / total * f64::from(Q16_ONE)).round() as u32)
            .collect();

        // Center tap absorbs the quantization residue.
        let assigned: u32 = taps.iter().sum();
        let mid = radius as usize;
        taps[mid] = (taps[mid] + Q16_ONE).saturating_sub(assigned);
        Ok(Self { taps })
    }

    fn radius(&self) -> usize {
        self.taps.len() / 2
    }
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One 1-D pass along `axis` with clamp-to-edge sampling.
fn convolve(src: &[u8], dst: &mut [u8], width: usize, height: usize, axis: Axis, k: &Kernel) {
    // A "line" is a row for horizontal passes and a column for vertical ones.
    let (lines, len, line_step, px_step) = match axis {
        Axis::Horizontal => (height, width, width * 4, 4),
        Axis::Vertical => (width, height, 4, width * 4),
    };
    let r = k.radius() as isize;
    let last = len as isize - 1;

    for line in 0..lines {
        let base = line * line_step;
        for i in 0..len {
            let mut acc = [0u64; 4];
            for (t, &weight) in k.taps.iter().enumerate() {
                let j = (i as isize + t as isize - r).clamp(0, last) as usize;
                let px = &src[base + j * px_step..][..4];
                for (a, &v) in acc.iter_mut().zip(px) {
                    *a += u64::from(weight) * u64::from(v);
                }
            }
            let out = &mut dst[base + i * px_step..][..4];
            for (o, a) in out.iter_mut().zip(acc) {
                *o = ((a + u64::from(Q16_ONE / 2)) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
