//! Mosaicking of adjacent rasters
//!
//! Sources are pasted into one grid covering the union of their extents.
//! Resolution, band count and nodata come from the first source. Where
//! sources overlap, the first valid value wins.

use log::{debug, info};
use ndarray::Array3;

use super::georaster::Raster;
use super::transform::GeoTransform;
use crate::errors::{ChipError, ChipResult};

/// Merges `sources` into a single raster
///
/// Each output cell takes the value of the source pixel under its centre,
/// which is an exact copy for sources on the output grid and a
/// nearest-neighbour sample otherwise.
pub fn merge(sources: &[Raster]) -> ChipResult<Raster> {
    let first = sources.first()
        .ok_or_else(|| ChipError::Raster("Nothing to merge".to_string()))?;

    if let Some(rotated) = sources.iter().position(|s| !s.transform.is_north_up()) {
        return Err(ChipError::Raster(format!("Source {} has a rotated geotransform", rotated)));
    }

    let bands = first.band_count();
    if let Some(index) = sources.iter().position(|s| s.band_count() != bands) {
        return Err(ChipError::Raster(format!(
            "Source {} has {} bands, expected {}", index, sources[index].band_count(), bands)));
    }

    let (res_x, res_y) = first.transform.resolution();
    if res_x == 0.0 || res_y == 0.0 {
        return Err(ChipError::Raster("First source has a zero pixel size".to_string()));
    }

    let extent = sources.iter()
        .skip(1)
        .fold(first.bounds(), |acc, s| acc.union(&s.bounds()));
    let cols = (extent.width() / res_x).round() as usize;
    let rows = (extent.height() / res_y).round() as usize;
    let transform = GeoTransform::new(extent.min_x, res_x, extent.max_y, -res_y);

    let fill = first.nodata.unwrap_or(0.0);
    let mut data = Array3::from_elem((bands, rows, cols), fill);
    info!("Merging {} rasters into a {}x{}x{} mosaic", sources.len(), bands, rows, cols);

    for (index, source) in sources.iter().enumerate() {
        let bounds = source.bounds();
        let col_off = ((bounds.min_x - extent.min_x) / res_x).round() as i64;
        let row_off = ((extent.max_y - bounds.max_y) / res_y).round() as i64;
        let width = (bounds.width() / res_x).round() as i64;
        let height = (bounds.height() / res_y).round() as i64;

        let row_range = row_off.max(0) as usize..((row_off + height).max(0) as usize).min(rows);
        let col_range = col_off.max(0) as usize..((col_off + width).max(0) as usize).min(cols);
        debug!("Source {} -> rows {:?}, cols {:?}", index, row_range, col_range);

        for r in row_range {
            for c in col_range.clone() {
                let centre = transform.pixel_to_geo(c as f64 + 0.5, r as f64 + 0.5);
                let Some((src_row, src_col)) = source.transform.rowcol(centre.x, centre.y) else {
                    continue;
                };
                if src_row < 0 || src_col < 0
                    || src_row as usize >= source.height() || src_col as usize >= source.width() {
                    continue;
                }

                for b in 0..bands {
                    let current = data[[b, r, c]];
                    let empty = current.is_nan() || current == fill;
                    let value = source.data[[b, src_row as usize, src_col as usize]];
                    if empty && !source.is_nodata(value) {
                        data[[b, r, c]] = value;
                    }
                }
            }
        }
    }

    Ok(Raster::new(data, transform, first.nodata))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f64, bands: usize, rows: usize, cols: usize, origin: (f64, f64), nodata: Option<f64>) -> Raster {
        Raster::new(
            Array3::from_elem((bands, rows, cols), value),
            GeoTransform::new(origin.0, 1.0, origin.1, -1.0),
            nodata,
        )
    }

    #[test]
    fn test_side_by_side() {
        let left = constant(1.0, 2, 3, 4, (0.0, 3.0), None);
        let right = constant(2.0, 2, 3, 4, (4.0, 3.0), None);

        let mosaic = merge(&[left, right]).unwrap();

        assert_eq!(mosaic.data.dim(), (2, 3, 8));
        assert_eq!(mosaic.transform.to_gdal(), [0.0, 1.0, 0.0, 3.0, 0.0, -1.0]);
        assert_eq!(mosaic.data[[1, 2, 3]], 1.0);
        assert_eq!(mosaic.data[[0, 0, 4]], 2.0);
    }

    #[test]
    fn test_first_wins_on_overlap() {
        let a = constant(1.0, 1, 2, 2, (0.0, 2.0), Some(-1.0));
        let b = constant(2.0, 1, 2, 2, (1.0, 2.0), Some(-1.0));

        let mosaic = merge(&[a, b]).unwrap();

        assert_eq!(mosaic.data.dim(), (1, 2, 3));
        assert_eq!(mosaic.data[[0, 0, 1]], 1.0);
        assert_eq!(mosaic.data[[0, 0, 2]], 2.0);
    }

    #[test]
    fn test_nodata_filled_by_later_source() {
        let mut a = constant(1.0, 1, 2, 2, (0.0, 2.0), Some(-1.0));
        a.data[[0, 0, 0]] = -1.0;
        let b = constant(5.0, 1, 2, 2, (0.0, 2.0), Some(-1.0));

        let mosaic = merge(&[a, b]).unwrap();

        assert_eq!(mosaic.data[[0, 0, 0]], 5.0);
        assert_eq!(mosaic.data[[0, 1, 1]], 1.0);
    }

    #[test]
    fn test_gap_keeps_fill_value() {
        let a = constant(1.0, 1, 1, 1, (0.0, 1.0), Some(-9.0));
        let b = constant(2.0, 1, 1, 1, (2.0, 1.0), None);

        let mosaic = merge(&[a, b]).unwrap();

        assert_eq!(mosaic.data.dim(), (1, 1, 3));
        assert_eq!(mosaic.data[[0, 0, 1]], -9.0);
        assert_eq!(mosaic.nodata, Some(-9.0));
    }

    #[test]
    fn test_nan_samples_are_never_copied() {
        let mut a = constant(1.0, 1, 2, 2, (0.0, 2.0), None);
        a.data[[0, 0, 0]] = f64::NAN;
        let b = constant(5.0, 1, 2, 2, (0.0, 2.0), None);

        let alone = merge(std::slice::from_ref(&a)).unwrap();
        assert_eq!(alone.data[[0, 0, 0]], 0.0);

        let mosaic = merge(&[a, b]).unwrap();
        assert_eq!(mosaic.data[[0, 0, 0]], 5.0);
        assert_eq!(mosaic.data[[0, 1, 1]], 1.0);
    }

    #[test]
    fn test_finer_source_sampled_nearest() {
        let north = constant(1.0, 1, 2, 2, (0.0, 4.0), None);
        let south = Raster::new(
            Array3::from_shape_fn((1, 4, 2), |(_, r, c)| (r * 10 + c + 100) as f64),
            GeoTransform::new(0.0, 1.0, 2.0, -0.5),
            None,
        );

        let mosaic = merge(&[north, south]).unwrap();

        // Output grid follows the first source
        assert_eq!(mosaic.data.dim(), (1, 4, 2));
        assert_eq!(mosaic.transform.to_gdal(), [0.0, 1.0, 0.0, 4.0, 0.0, -1.0]);
        assert_eq!(mosaic.data[[0, 1, 1]], 1.0);
        // Centres at y = 1.5 and 0.5 fall in source rows 1 and 3
        assert_eq!(mosaic.data[[0, 2, 0]], 110.0);
        assert_eq!(mosaic.data[[0, 3, 1]], 131.0);
    }

    #[test]
    fn test_band_mismatch() {
        let a = constant(1.0, 2, 1, 1, (0.0, 1.0), None);
        let b = constant(1.0, 3, 1, 1, (1.0, 1.0), None);
        assert!(matches!(merge(&[a, b]), Err(ChipError::Raster(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(&[]).is_err());
    }
}
