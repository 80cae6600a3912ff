//! Median blur used to suppress sensor noise before HSV thresholding.

use crate::ColorImage;

/// Per-channel median filter with a square `ksize x ksize` window.
///
/// Borders are replicated. Even kernel sizes are rounded up to the next odd
/// size; `ksize <= 1` returns a copy of the input.
///
/// Uses a sliding 256-bin histogram per row, so the cost per pixel is
/// `O(ksize)` instead of `O(ksize²)`.
pub fn median_blur(src: &ColorImage, ksize: usize) -> ColorImage {
    if ksize <= 1 || src.is_empty() {
        return src.clone();
    }

    let k = ksize | 1;
    let r = (k / 2) as i64;
    let half = (k * k / 2) as u32;
    let (w, h) = (src.width, src.height);
    let clamp_x = |x: i64| x.clamp(0, w as i64 - 1) as usize;
    let clamp_y = |y: i64| y.clamp(0, h as i64 - 1) as usize;
    let sample = |x: usize, y: usize, c: usize| src.data[(y * w + x) * 3 + c] as usize;

    let mut out = vec![0u8; src.data.len()];

    for c in 0..3 {
        for y in 0..h {
            let mut hist = [0u32; 256];
            for dy in -r..=r {
                let yy = clamp_y(y as i64 + dy);
                for dx in -r..=r {
                    hist[sample(clamp_x(dx), yy, c)] += 1;
                }
            }
            out[(y * w) * 3 + c] = histogram_median(&hist, half);

            for x in 1..w {
                let x_out = clamp_x(x as i64 - 1 - r);
                let x_in = clamp_x(x as i64 + r);
                for dy in -r..=r {
                    let yy = clamp_y(y as i64 + dy);
                    hist[sample(x_out, yy, c)] -= 1;
                    hist[sample(x_in, yy, c)] += 1;
                }
                out[(y * w + x) * 3 + c] = histogram_median(&hist, half);
            }
        }
    }

    ColorImage {
        width: w,
        height: h,
        data: out,
    }
}

#[inline]
fn histogram_median(hist: &[u32; 256], half: u32) -> u8 {
    let mut acc = 0u32;
    for (v, &n) in hist.iter().enumerate() {
        acc += n;
        if acc > half {
            return v as u8;
        }
    }
    255
}
