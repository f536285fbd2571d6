//! Centroid lists written by the spot-detection tool.
//!
//! One `row, column` pair per line, in integer pixel coordinates (the first
//! pixel's centre is `0, 0`). Lines that do not hold exactly two numbers are
//! headers or comments and are skipped.

use crate::io::read_text_file;
use crate::{CalibrationInput, PipelineError};
use domecal_core::synthetic::{canonical_angles, CANONICAL_DIRECTION_COUNT};
use domecal_core::{CorrespondenceRecord, PixelCoord};
use std::path::Path;

/// Parse a centroid list into [`PixelCoord`]s (pixel centres at `+0.5`).
pub fn parse_centroid_list(text: &str) -> Vec<PixelCoord> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<PixelCoord> {
    let (row, col) = line.split_once(',')?;
    let row: f64 = row.trim().parse().ok()?;
    let col: f64 = col.trim().parse().ok()?;
    let pixel = PixelCoord::new(row + 0.5, col + 0.5);
    pixel.is_finite().then_some(pixel)
}

pub fn read_centroid_list(path: &Path) -> Result<Vec<PixelCoord>, PipelineError> {
    Ok(parse_centroid_list(&read_text_file(path)?))
}

/// Inverse of [`parse_centroid_list`].
pub fn format_centroid_list(pixels: &[PixelCoord]) -> String {
    pixels
        .iter()
        .map(|p| format!("{}, {}\n", p.row - 0.5, p.col - 0.5))
        .collect()
}

/// Pair centroids, in file order, with the reference calibration directions.
pub fn pair_with_canonical_directions(
    centroids: &[PixelCoord],
) -> Result<CalibrationInput, PipelineError> {
    if centroids.len() != CANONICAL_DIRECTION_COUNT {
        return Err(PipelineError::CentroidCount {
            found: centroids.len(),
            expected: CANONICAL_DIRECTION_COUNT,
        });
    }
    let correspondences = centroids
        .iter()
        .zip(canonical_angles())
        .map(|(p, a)| CorrespondenceRecord {
            pixel_row: p.row,
            pixel_col: p.col,
            yaw_deg: a.yaw_deg,
            pitch_deg: a.pitch_deg,
        })
        .collect();
    Ok(CalibrationInput { correspondences })
}
