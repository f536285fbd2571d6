use crate::{DirectionGrid, FieldOfView, SourceImage, SourceSample};
use domecal_core::{DomeDisplay, Real};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-pixel lookup from projector pixels into the source image.
///
/// Row-major, one entry per projector pixel. `None` marks pixels that miss
/// the mirror or dome, or whose direction no source screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpTable {
    width: u32,
    height: u32,
    entries: Vec<Option<SourceSample>>,
}

/// Coverage statistics of a built table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarpSummary {
    pub width: u32,
    pub height: u32,
    pub mapped: usize,
    pub unmapped: usize,
    pub field_of_view: Option<FieldOfView>,
}

impl WarpTable {
    /// Evaluate every projector pixel of `display` and look it up in `source`.
    pub fn build(display: &DomeDisplay, source: &SourceImage) -> Self {
        Self::from_grid(&DirectionGrid::evaluate(display), source)
    }

    /// Table over the cells of `grid` (one entry per cell).
    pub fn from_grid(grid: &DirectionGrid, source: &SourceImage) -> Self {
        let entries: Vec<Option<SourceSample>> = grid
            .directions()
            .par_iter()
            .map(|d| d.as_ref().and_then(|d| source.locate(d)))
            .collect();
        let table = Self {
            width: grid.cols(),
            height: grid.rows(),
            entries,
        };
        info!(
            "warp table {}x{}: {} of {} pixels mapped",
            table.width,
            table.height,
            table.mapped_count(),
            table.entries.len()
        );
        table
    }

    /// `None` unless `entries.len() == width * height`.
    pub fn from_entries(width: u32, height: u32, entries: Vec<Option<SourceSample>>) -> Option<Self> {
        (entries.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            entries,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, row: u32, col: u32) -> Option<SourceSample> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.entries[row as usize * self.width as usize + col as usize]
    }

    pub fn entries(&self) -> &[Option<SourceSample>] {
        &self.entries
    }

    /// `((row, col), entry)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), Option<SourceSample>)> + '_ {
        let width = self.width.max(1);
        self.entries
            .iter()
            .enumerate()
            .map(move |(k, e)| (((k as u32) / width, (k as u32) % width), *e))
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Fraction of projector pixels that show part of the source image.
    pub fn coverage(&self) -> Real {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.mapped_count() as Real / self.entries.len() as Real
    }

    pub fn summary(&self, field_of_view: Option<FieldOfView>) -> WarpSummary {
        let mapped = self.mapped_count();
        WarpSummary {
            width: self.width,
            height: self.height,
            mapped,
            unmapped: self.entries.len() - mapped,
            field_of_view,
        }
    }
}
