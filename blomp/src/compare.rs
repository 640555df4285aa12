use crate::{
    error::{Error, Result},
    raster::Image,
};

/// How alike two images of the same size are, from `0.0` to `1.0`.
///
/// The mean squared channel difference is raised to the 128th power after
/// being subtracted from one, so any visible difference is punished hard
/// while near identical images stay close to `1.0`.
pub fn similarity(a: &Image, b: &Image) -> Result<f32> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: a.dimensions(),
            found: b.dimensions(),
        });
    }

    let count = a.pixels().len();
    if count == 0 {
        return Ok(1.0);
    }

    let diff_sum: f64 = a
        .pixels()
        .iter()
        .zip(b.pixels())
        .map(|(&pa, &pb)| {
            let diff = pa - pb;
            ((diff * diff).channel_sum() / 3.0) as f64
        })
        .sum();

    let mean = (diff_sum / count as f64) as f32;
    Ok((1.0 - mean).powi(128))
}

/// Size of the compressed data relative to the original.
pub fn data_ratio(original_size: u64, compressed_size: u64) -> f32 {
    compressed_size as f32 / original_size as f32
}

/// Rank an encoding by both its fidelity and how much it shrank the data.
pub fn score(similarity: f32, original_size: u64, compressed_size: u64) -> f32 {
    similarity / data_ratio(original_size, compressed_size)
}
