//! Raster loading
//!
//! `RasterProvider` is the seam between chip extraction and raster I/O.
//! `GeoTiffProvider` decodes the first image of a GeoTIFF into memory.

use log::{debug, info};
use ndarray::Array3;
use std::path::Path;

use super::georaster::Raster;
use super::layout::PixelLayout;
use super::strip_reader::StripReader;
use super::tile_reader::TileReader;
use super::transform::GeoTransform;
use crate::errors::{ChipError, ChipResult};
use crate::tiff::constants::geokeys;
use crate::tiff::geo_key_parser::GeoKeyParser;
use crate::tiff::reader::TiffReader;

/// Source of georeferenced rasters
pub trait RasterProvider {
    /// Loads the raster stored at `path`
    fn load(&self, path: &Path) -> ChipResult<Raster>;
}

/// Reads GeoTIFF files with the crate's own TIFF decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffProvider;

impl RasterProvider for GeoTiffProvider {
    fn load(&self, path: &Path) -> ChipResult<Raster> {
        info!("Loading raster {}", path.display());

        let mut tiff_reader = TiffReader::new();
        let tiff = tiff_reader.load(path)?;
        let ifd = tiff.main_ifd()
            .ok_or_else(|| ChipError::Raster(format!("{} holds no image", path.display())))?;
        if tiff.ifd_count() > 1 {
            debug!("Ignoring {} additional IFDs in {}", tiff.ifd_count() - 1, path.display());
        }

        let mut reader = tiff_reader.create_reader()?;
        let layout = PixelLayout::from_ifd(&mut reader, &tiff_reader, ifd)?;
        match GeoKeyParser::read_geo_key(&mut reader, &tiff_reader, ifd, geokeys::GT_MODEL_TYPE)? {
            Some(model) if model != geokeys::MODEL_TYPE_GEOGRAPHIC => {
                return Err(ChipError::Raster(format!(
                    "{} is not in geographic coordinates (GTModelType {})", path.display(), model)));
            },
            Some(_) => {},
            None => debug!("{} has no GTModelType, assuming lon/lat", path.display()),
        }
        let geotransform = GeoKeyParser::read_geotransform(&mut reader, &tiff_reader, ifd)?;
        let nodata = GeoKeyParser::read_nodata(&mut reader, &tiff_reader, ifd)?;

        let mut data = Array3::zeros((layout.bands, layout.height, layout.width));
        if ifd.is_tiled() {
            TileReader::new(reader, ifd, &tiff_reader, &layout).read_into(&mut data)?;
        } else {
            StripReader::new(reader, ifd, &tiff_reader, &layout).read_into(&mut data)?;
        }

        Ok(Raster::new(data, GeoTransform::from_gdal(geotransform), nodata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{AdobeDeflateHandler, ZstdHandler};
    use crate::raster::sample::SampleType;
    use crate::tiff::constants::geokeys;
    use crate::tiff::tests::test_utils::set_geo_key;
    use crate::tiff::writer::{ChunkLayout, GeoTiffWriter};
    use ndarray::Array3;

    const GEOTRANSFORM: [f64; 6] = [10.0, 0.01, 0.0, 50.0, 0.0, -0.01];

    fn gradient(bands: usize, rows: usize, cols: usize) -> Array3<f64> {
        Array3::from_shape_fn((bands, rows, cols), |(b, r, c)| (b * 1000 + r * 37 + c) as f64)
    }

    fn write_and_load(writer: GeoTiffWriter, data: &Array3<f64>, nodata: Option<f64>) -> Raster {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tif");
        writer.write(&path, data, GEOTRANSFORM, nodata).unwrap();
        GeoTiffProvider.load(&path).unwrap()
    }

    #[test]
    fn test_single_strip_float() {
        let data = gradient(2, 5, 7);
        let raster = write_and_load(GeoTiffWriter::new(SampleType::F64), &data, Some(-9999.0));

        assert_eq!(raster.data, data);
        assert_eq!(raster.transform.to_gdal(), GEOTRANSFORM);
        assert_eq!(raster.nodata, Some(-9999.0));
    }

    #[test]
    fn test_multi_strip_deflate_predictor() {
        let data = gradient(3, 11, 9);
        let writer = GeoTiffWriter::new(SampleType::U16)
            .with_layout(ChunkLayout::Strips { rows_per_strip: 4 })
            .with_compression(Box::new(AdobeDeflateHandler))
            .with_horizontal_predictor();
        let raster = write_and_load(writer, &data, None);

        assert_eq!(raster.data, data);
        assert_eq!(raster.nodata, None);
    }

    #[test]
    fn test_separate_planes() {
        let data = gradient(3, 6, 5);
        let writer = GeoTiffWriter::new(SampleType::I32)
            .with_layout(ChunkLayout::Strips { rows_per_strip: 4 })
            .with_separate_planes();
        let raster = write_and_load(writer, &data, None);

        assert_eq!(raster.data, data);
    }

    #[test]
    fn test_tiled_with_edge_padding() {
        let data = gradient(2, 20, 35);
        let writer = GeoTiffWriter::new(SampleType::F32)
            .with_layout(ChunkLayout::Tiles { width: 16, height: 16 })
            .with_compression(Box::new(ZstdHandler::new()));
        let raster = write_and_load(writer, &data, None);

        assert_eq!(raster.data, data);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = GeoTiffProvider.load(&dir.path().join("absent.tif"));
        assert!(matches!(result, Err(ChipError::Io(_))));
    }

    #[test]
    fn test_garbage_is_raster_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.tif");
        std::fs::write(&path, b"not a tiff at all").unwrap();

        let result = GeoTiffProvider.load(&path);
        assert!(matches!(result, Err(ChipError::Raster(_))));
    }

    fn load_with_geo_key(key: u16, value: u16) -> ChipResult<Raster> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tif");
        let data = gradient(1, 4, 4);
        let mut bytes = GeoTiffWriter::new(SampleType::F64).encode(&data, GEOTRANSFORM, None).unwrap();
        set_geo_key(&mut bytes, key, value);
        std::fs::write(&path, bytes).unwrap();
        GeoTiffProvider.load(&path)
    }

    #[test]
    fn test_pixel_is_point_origin() {
        let raster = load_with_geo_key(geokeys::GT_RASTER_TYPE, geokeys::RASTER_PIXEL_IS_POINT).unwrap();

        approx::assert_relative_eq!(raster.transform.origin_x, 9.995, epsilon = 1e-12);
        approx::assert_relative_eq!(raster.transform.origin_y, 50.005, epsilon = 1e-12);
        // A point on the first pixel's centre stays in that pixel
        assert_eq!(raster.transform.rowcol(10.0, 50.0), Some((0, 0)));
    }

    #[test]
    fn test_projected_tile_is_raster_error() {
        // 1 = ModelTypeProjected, e.g. EPSG:3857 tiles
        let result = load_with_geo_key(geokeys::GT_MODEL_TYPE, 1);
        assert!(matches!(result, Err(ChipError::Raster(_))));
    }
}
