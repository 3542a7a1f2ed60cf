//! Centered-row layout math shared by the alien grid and the barrier row.

/// Starting x that centers a row of `count` sprites spaced `stride` apart:
/// the centers span `stride * (count - 1)` pixels and both margins are equal.
pub fn centered_row_start(surface_w: f32, stride: f32, count: u32) -> f32 {
    (surface_w - stride * count.saturating_sub(1) as f32) / 2.0
}

/// Every x position of a centered row, left to right.
pub fn centered_row_positions(surface_w: f32, stride: f32, count: u32) -> Vec<f32> {
    let start = centered_row_start(surface_w, stride, count);
    (0..count).map(|k| start + stride * k as f32).collect()
}
