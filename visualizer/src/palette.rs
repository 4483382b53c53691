//! Diverging blue-to-red colour map for correlations.

use plotters::style::RGBColor;

/// Anchor colours of the map at 0, 0.25, 0.5, 0.75 and 1.
const COOLWARM: [(f64, f64, f64); 5] = [
    (0.2298, 0.2987, 0.7537),
    (0.5543, 0.6901, 0.9955),
    (0.8654, 0.8654, 0.8654),
    (0.9567, 0.5980, 0.4773),
    (0.7057, 0.0156, 0.1502),
];

pub const MISSING: RGBColor = RGBColor(160, 160, 160);

/// Colour at `t` in `[0, 1]`; out-of-range input is clamped.
pub fn coolwarm(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let segments = (COOLWARM.len() - 1) as f64;
    let scaled = t * segments;
    let lower = (scaled.floor() as usize).min(COOLWARM.len() - 2);
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = COOLWARM[lower];
    let (r1, g1, b1) = COOLWARM[lower + 1];
    let channel = |a: f64, b: f64| ((a + (b - a) * frac) * 255.0).round() as u8;
    RGBColor(channel(r0, r1), channel(g0, g1), channel(b0, b1))
}

/// Colour for a correlation in `[-1, 1]`, centred on 0. Undefined values are
/// grey.
pub fn correlation_color(value: Option<f64>) -> RGBColor {
    match value {
        Some(v) if v.is_finite() => coolwarm((v + 1.0) / 2.0),
        _ => MISSING,
    }
}

/// The `index`-th of `count` evenly spaced colours, skipping both ends.
pub fn sample(index: usize, count: usize) -> RGBColor {
    coolwarm((index + 1) as f64 / (count + 1) as f64)
}
