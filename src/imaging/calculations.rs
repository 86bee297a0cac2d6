//! Pure calculation functions for image geometry and percentages.
//!
//! All functions here are pure and testable without any I/O or images.

/// Reduced grid size for pixel-art rendering.
///
/// Each output block covers `cell_size × cell_size` source pixels. When the
/// image is smaller than one cell along an axis, the cell shrinks so every
/// axis keeps at least one block.
///
/// # Examples
/// ```
/// # use emo_check::imaging::calculations::reduced_dimensions;
/// assert_eq!(reduced_dimensions((240, 240), 8), (30, 30));
/// assert_eq!(reduced_dimensions((100, 20), 8), (12, 2));
/// assert_eq!(reduced_dimensions((100, 5), 8), (20, 1));
/// ```
pub fn reduced_dimensions(source: (u32, u32), cell_size: u32) -> (u32, u32) {
    let (width, height) = source;
    let cell = cell_size.min(width).min(height).max(1);
    ((width / cell).max(1), (height / cell).max(1))
}

/// Font size of the date stamp: 6% of the shorter edge, never below 16px.
pub fn stamp_font_size(dims: (u32, u32)) -> f32 {
    let short = dims.0.min(dims.1) as f64;
    ((short * 0.06).floor() as f32).max(16.0)
}

/// Margin between the stamp and the bottom-right corner: 3% of the shorter edge.
pub fn stamp_margin(dims: (u32, u32)) -> u32 {
    (dims.0.min(dims.1) as f64 * 0.03).floor() as u32
}

/// Top-left drawing origin that puts a `text` box `margin` pixels away from
/// the bottom-right corner. Negative when the text is wider than the image.
pub fn stamp_origin(dims: (u32, u32), text: (u32, u32), margin: u32) -> (i32, i32) {
    let x = dims.0 as i64 - text.0 as i64 - margin as i64;
    let y = dims.1 as i64 - text.1 as i64 - margin as i64;
    (x as i32, y as i32)
}

/// 1-D Gaussian kernel of `len` taps with spread `sigma`, normalised to sum 1.
///
/// Tap `i` is centred on `(len - 1) / 2`, so even lengths have no single peak.
pub fn gaussian_kernel(len: usize, sigma: f64) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    let center = (len as f64 - 1.0) / 2.0;
    let sigma = sigma.max(f64::EPSILON);
    let denom = 2.0 * sigma * sigma;
    let taps: Vec<f64> = (0..len)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f64 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Convert cluster counts to percentages with one decimal place.
///
/// Uses largest-remainder rounding on tenths of a percent, so the result
/// always sums to exactly 100.0 (or is all zeros when `counts` sums to zero).
/// Ties in the remainder favour the earlier index.
///
/// A single entry can therefore sit 0.1 away from its own share rounded in
/// isolation: counts `[1, 1, 1]` give `[33.4, 33.3, 33.3]`, not three 33.3s.
pub fn percentages_one_decimal(counts: &[usize]) -> Vec<f64> {
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }

    let mut tenths: Vec<u64> = Vec::with_capacity(counts.len());
    let mut remainders: Vec<(usize, u64)> = Vec::with_capacity(counts.len());
    for (i, &c) in counts.iter().enumerate() {
        let scaled = c as u64 * 1000;
        tenths.push(scaled / total);
        remainders.push((i, scaled % total));
    }

    let assigned: u64 = tenths.iter().sum();
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for &(i, _) in remainders.iter().take((1000 - assigned) as usize) {
        tenths[i] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}
