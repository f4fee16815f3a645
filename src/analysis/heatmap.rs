//! Fixation density grid over the stimulus image
//!
//! A 2D histogram of fixation positions, the data behind the heat-map and
//! density-contour views.

use crate::config::defaults;
use crate::pipeline::FixationTable;
use serde::{Deserialize, Serialize};

/// Which X coordinate to bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XSource {
    /// `NormalizedXFixationPointX`, falling back to mapped X per row
    #[default]
    Normalized,
    /// `MappedFixationPointX`
    Mapped,
}

/// Grid shape and the stimulus extent it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub bins_x: usize,
    pub bins_y: usize,
    /// Stimulus width in pixels
    pub width: f64,
    /// Stimulus height in pixels
    pub height: f64,
    pub x_source: XSource,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            bins_x: defaults::HEATMAP_BINS,
            bins_y: defaults::HEATMAP_BINS,
            width: defaults::STIMULUS_WIDTH_PX,
            height: defaults::STIMULUS_HEIGHT_PX,
            x_source: XSource::Normalized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityGrid {
    pub spec: GridSpec,
    /// `counts[y][x]`, row 0 at y = 0
    pub counts: Vec<Vec<u32>>,
    /// Fixations inside the extent
    pub total: u32,
    /// Fixations outside the extent, not counted in any cell
    pub clipped: u32,
    pub max_count: u32,
}

impl DensityGrid {
    /// Count in the cell containing pixel `(x, y)`, if inside the extent.
    pub fn count_at(&self, x: f64, y: f64) -> Option<u32> {
        let (bx, by) = cell(&self.spec, x, y)?;
        Some(self.counts[by][bx])
    }
}

/// Bin index along one axis; the far edge belongs to the last bin.
fn bin(value: f64, extent: f64, bins: usize) -> Option<usize> {
    if !(0.0..=extent).contains(&value) {
        return None;
    }
    let idx = (value / extent * bins as f64) as usize;
    Some(idx.min(bins - 1))
}

fn cell(spec: &GridSpec, x: f64, y: f64) -> Option<(usize, usize)> {
    Some((bin(x, spec.width, spec.bins_x)?, bin(y, spec.height, spec.bins_y)?))
}

/// Bin every fixation of `table` into a `bins_x` × `bins_y` grid.
///
/// Zero bins or a non-positive extent yield an all-clipped empty grid.
pub fn density_grid(table: &FixationTable, spec: GridSpec) -> DensityGrid {
    let usable = spec.bins_x > 0 && spec.bins_y > 0 && spec.width > 0.0 && spec.height > 0.0;
    let mut counts = if usable {
        vec![vec![0u32; spec.bins_x]; spec.bins_y]
    } else {
        Vec::new()
    };
    let mut total = 0u32;
    let mut clipped = 0u32;

    let prefer_normalized = spec.x_source == XSource::Normalized;
    for row in table.iter() {
        let hit = if usable {
            cell(&spec, row.plot_x(prefer_normalized), row.mapped_y)
        } else {
            None
        };
        match hit {
            Some((bx, by)) => {
                counts[by][bx] += 1;
                total += 1;
            }
            None => clipped += 1,
        }
    }

    let max_count = counts.iter().flatten().copied().max().unwrap_or(0);
    tracing::debug!(total, clipped, max_count, "Density grid built");

    DensityGrid {
        spec,
        counts,
        total,
        clipped,
        max_count,
    }
}
