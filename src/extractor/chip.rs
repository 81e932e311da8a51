//! Chips and chip windows
//!
//! A chip window spans a band range for one observation year and a square
//! of `2k + 1` pixels anchored on the pixel containing a point. Windows are
//! computed in signed mosaic coordinates and only then resolved against
//! the mosaic according to the edge policy.

use ndarray::{s, Array3};
use std::ops::Range;

use super::options::EdgePolicy;
use crate::coordinate::Point;
use crate::raster::GeoTransform;

/// A window cut from the mosaic for one point and one year
#[derive(Debug, Clone)]
pub struct Chip {
    /// Index of the point in input order
    pub point_index: usize,
    /// Observation year, 0-based
    pub year: usize,
    pub point: Point,
    /// `(bands, rows, cols)` samples
    pub data: Array3<f64>,
    /// Georeferencing of `data[[.., 0, 0]]`
    pub transform: GeoTransform,
}

impl Chip {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Whether the chip has the full `(bands, 2k + 1, 2k + 1)` shape
    pub fn is_complete(&self, bands_per_year: usize, chip_size: usize) -> bool {
        let side = 2 * chip_size + 1;
        self.shape() == (bands_per_year, side, side)
    }
}

/// Half-open index ranges of a chip along the band, row and column axes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipWindow {
    pub bands: Range<i64>,
    pub rows: Range<i64>,
    pub cols: Range<i64>,
}

/// Clamps `range` to `[0, len)`; ranges entirely outside collapse to empty
fn clamp_range(range: &Range<i64>, len: usize) -> Range<usize> {
    let len = len as i64;
    let start = range.start.clamp(0, len);
    let end = range.end.clamp(start, len);
    start as usize..end as usize
}

impl ChipWindow {
    /// Window around pixel `(row, col)` for `year`
    pub fn around(row: i64, col: i64, chip_size: usize, year: usize, bands_per_year: usize) -> Self {
        let k = chip_size as i64;
        let first_band = (year * bands_per_year) as i64;
        ChipWindow {
            bands: first_band..first_band + bands_per_year as i64,
            rows: row - k..row + k + 1,
            cols: col - k..col + k + 1,
        }
    }

    /// Whether the window lies entirely within an array of `shape`
    pub fn fits(&self, shape: (usize, usize, usize)) -> bool {
        let inside = |range: &Range<i64>, len: usize| range.start >= 0 && range.end <= len as i64;
        inside(&self.bands, shape.0) && inside(&self.rows, shape.1) && inside(&self.cols, shape.2)
    }

    /// Cuts the window out of `data`
    ///
    /// Returns the samples and the `(row, col)` of their first cell in
    /// mosaic coordinates, or `None` when the window does not fit and the
    /// policy is `Reject`.
    pub fn cut(&self, data: &Array3<f64>, policy: EdgePolicy, pad_value: f64) -> Option<(Array3<f64>, (i64, i64))> {
        let (bands, rows, cols) = data.dim();
        let b = clamp_range(&self.bands, bands);
        let r = clamp_range(&self.rows, rows);
        let c = clamp_range(&self.cols, cols);

        match policy {
            EdgePolicy::Reject if !self.fits(data.dim()) => None,
            EdgePolicy::Truncate | EdgePolicy::Reject => {
                let chip = data.slice(s![b.clone(), r.clone(), c.clone()]).to_owned();
                Some((chip, (r.start as i64, c.start as i64)))
            },
            EdgePolicy::Pad => {
                let len = |range: &Range<i64>| (range.end - range.start).max(0) as usize;
                let mut chip = Array3::from_elem(
                    (len(&self.bands), len(&self.rows), len(&self.cols)), pad_value);

                // Offsets of the overlap inside the padded chip
                let offset = |clamped: &Range<usize>, range: &Range<i64>| {
                    let start = (clamped.start as i64 - range.start) as usize;
                    start..start + clamped.len()
                };
                let (pb, pr, pc) = (offset(&b, &self.bands), offset(&r, &self.rows), offset(&c, &self.cols));
                if !b.is_empty() && !r.is_empty() && !c.is_empty() {
                    chip.slice_mut(s![pb, pr, pc]).assign(&data.slice(s![b, r, c]));
                }
                Some((chip, (self.rows.start, self.cols.start)))
            },
        }
    }
}
