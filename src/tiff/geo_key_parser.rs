//! GeoTIFF georeferencing parser
//!
//! Turns the model tags of an IFD into a GDAL-ordered geotransform
//! `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`
//! and reads the GDAL nodata marker and individual GeoKeys.

use log::{debug, warn};

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{geokeys, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Parser for GeoTIFF model tags
pub struct GeoKeyParser;

impl GeoKeyParser {
    /// Reads the geotransform of an IFD
    ///
    /// `ModelTransformation` wins when present; otherwise the first tiepoint
    /// is combined with `ModelPixelScale`. For `PixelIsPoint` rasters the
    /// origin moves back half a pixel so that it names the corner of the
    /// first pixel, as GDAL does.
    pub fn read_geotransform(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD
    ) -> TiffResult<[f64; 6]> {
        let mut geotransform = Self::read_model_geotransform(reader, tiff_reader, ifd)?;

        if Self::read_geo_key(reader, tiff_reader, ifd, geokeys::GT_RASTER_TYPE)?
            == Some(geokeys::RASTER_PIXEL_IS_POINT) {
            debug!("PixelIsPoint raster, shifting origin by half a pixel");
            geotransform[0] -= 0.5 * (geotransform[1] + geotransform[2]);
            geotransform[3] -= 0.5 * (geotransform[4] + geotransform[5]);
        }

        debug!("Geotransform: {:?}", geotransform);
        Ok(geotransform)
    }

    fn read_model_geotransform(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD
    ) -> TiffResult<[f64; 6]> {
        if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            let matrix = tiff_reader.read_tag_f64_values(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
            if matrix.len() < 16 {
                return Err(TiffError::GenericError(format!(
                    "ModelTransformation holds {} values, expected 16", matrix.len())));
            }
            return Ok([matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5]]);
        }

        if !ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) || !ifd.has_tag(tags::MODEL_TIEPOINT_TAG) {
            return Err(TiffError::MissingGeoreference);
        }

        let pixel_scale = tiff_reader.read_tag_f64_values(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
        let tiepoint = tiff_reader.read_tag_f64_values(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;

        if pixel_scale.len() < 2 || tiepoint.len() < 6 {
            return Err(TiffError::GenericError("Incomplete GeoTIFF information".to_string()));
        }
        if tiepoint.len() > 6 {
            warn!("{} tiepoints present, only the first is used", tiepoint.len() / 6);
        }

        let pixel_width = pixel_scale[0];
        let pixel_height = -pixel_scale[1];
        let origin_x = tiepoint[3] - tiepoint[0] * pixel_width;
        let origin_y = tiepoint[4] - tiepoint[1] * pixel_height;

        Ok([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    /// Reads a SHORT GeoKey stored inline in the GeoKey directory
    ///
    /// Returns `None` when the IFD has no directory or the key is absent.
    pub fn read_geo_key(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD,
        key: u16
    ) -> TiffResult<Option<u16>> {
        if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
            return Ok(None);
        }

        let directory = tiff_reader.read_tag_values(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?;
        if directory.len() < 4 {
            return Err(TiffError::GenericError("GeoKey directory header is truncated".to_string()));
        }

        let declared = directory[3] as usize;
        let value = directory[4..]
            .chunks_exact(4)
            .take(declared)
            // location 0 means the value is the fourth field itself
            .find(|entry| entry[0] == u64::from(key) && entry[1] == 0)
            .map(|entry| entry[3] as u16);

        Ok(value)
    }

    /// Reads the GDAL nodata value, if any
    ///
    /// An unparseable marker is logged and treated as absent.
    pub fn read_nodata(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD
    ) -> TiffResult<Option<f64>> {
        if !ifd.has_tag(tags::GDAL_NODATA) {
            return Ok(None);
        }

        let text = tiff_reader.read_tag_ascii(reader, ifd, tags::GDAL_NODATA)?;
        match text.parse::<f64>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!("Ignoring unparseable GDAL_NODATA value '{}'", text);
                Ok(None)
            }
        }
    }
}
