use crate::PipelineError;
use domecal_core::DomeDisplay;
use domecal_warp::{save_warp_table, DirectionGrid, SourceImage, WarpSummary, WarpTable};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Screens of the canonical source image.
    pub source: SourceImage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarpOutput {
    pub table: WarpTable,
    pub summary: WarpSummary,
}

/// Build the warp table of `display` against the configured source image.
pub fn run_warp(display: &DomeDisplay, config: &WarpConfig) -> WarpOutput {
    let grid = DirectionGrid::evaluate(display);
    let table = WarpTable::from_grid(&grid, &config.source);
    let summary = table.summary(grid.field_of_view());
    if let Some(fov) = summary.field_of_view {
        info!(
            "display shows yaw {:.1}..{:.1} deg, pitch {:.1}..{:.1} deg",
            fov.min_yaw_deg, fov.max_yaw_deg, fov.min_pitch_deg, fov.max_pitch_deg
        );
    }
    WarpOutput { table, summary }
}

/// [`run_warp`] and persist the table (`.exr` or `.json`).
pub fn run_warp_to_file(
    display: &DomeDisplay,
    config: &WarpConfig,
    path: &Path,
) -> Result<WarpSummary, PipelineError> {
    let output = run_warp(display, config);
    save_warp_table(&output.table, path)?;
    Ok(output.summary)
}
