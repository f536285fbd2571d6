//! Persistence of warp tables.
//!
//! `.exr` files hold a three-channel 32-bit float image the size of the
//! projector: red = source column, green = source row, blue = screen index,
//! all `-1` for unmapped pixels. `.json` files hold the serde form.

use crate::{SourceSample, WarpTable};
use domecal_core::Real;
use image::{DynamicImage, ImageFormat, Rgb, Rgb32FImage};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const UNMAPPED: f32 = -1.0;

#[derive(Debug, Error)]
pub enum WarpIoError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported warp table format: {} (expected .exr or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("warp table data does not match its declared size")]
    SizeMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Exr,
    Json,
}

fn format_of(path: &Path) -> Result<Format, WarpIoError> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("exr") => Ok(Format::Exr),
        Some("json") => Ok(Format::Json),
        _ => Err(WarpIoError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Encode `table` as a float image.
pub fn to_image(table: &WarpTable) -> Rgb32FImage {
    Rgb32FImage::from_fn(table.width(), table.height(), |x, y| match table.get(y, x) {
        Some(s) => Rgb([s.col as f32, s.row as f32, s.screen as f32]),
        None => Rgb([UNMAPPED; 3]),
    })
}

/// Decode a float image written by [`to_image`].
pub fn from_image(image: &Rgb32FImage) -> Result<WarpTable, WarpIoError> {
    let entries = image
        .pixels()
        .map(|Rgb([col, row, screen])| {
            (*screen >= 0.0).then(|| SourceSample {
                screen: screen.round() as usize,
                row: *row as Real,
                col: *col as Real,
            })
        })
        .collect();
    WarpTable::from_entries(image.width(), image.height(), entries).ok_or(WarpIoError::SizeMismatch)
}

/// Save by extension: `.exr` or `.json`.
pub fn save_warp_table(table: &WarpTable, path: &Path) -> Result<(), WarpIoError> {
    match format_of(path)? {
        Format::Exr => {
            DynamicImage::ImageRgb32F(to_image(table)).save_with_format(path, ImageFormat::OpenExr)?;
        }
        Format::Json => {
            let json = serde_json::to_string(table)?;
            fs::write(path, json).map_err(|source| WarpIoError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Load a table written by [`save_warp_table`].
pub fn load_warp_table(path: &Path) -> Result<WarpTable, WarpIoError> {
    match format_of(path)? {
        Format::Exr => {
            let image = image::open(path)?.into_rgb32f();
            from_image(&image)
        }
        Format::Json => {
            let data = fs::read_to_string(path).map_err(|source| WarpIoError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let table: WarpTable = serde_json::from_str(&data)?;
            WarpTable::from_entries(table.width(), table.height(), table.entries().to_vec())
                .ok_or(WarpIoError::SizeMismatch)
        }
    }
}
