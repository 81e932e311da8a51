//! End-to-end extraction over fabricated tile directories

use std::fs;
use std::path::Path;

use ndarray::Array3;
use serde_json::json;
use tempfile::TempDir;

use chipkit::coordinate::{Point, TileId, TilingScheme, WebMercatorTiling};
use chipkit::extractor::{ChipFormat, ChipWriter, EdgePolicy, ExtractionOptions};
use chipkit::raster::{GeoTiffProvider, GeoTransform, RasterProvider};
use chipkit::tiff::GeoTiffWriter;
use chipkit::{ChipError, ChipExtractor, ChipKit};

const ZOOM: u8 = 12;
const TILE_PIXELS: usize = 32;

/// Tile containing (10, 50) at zoom 12
fn home_tile() -> TileId {
    TileId::new(2161, 1389, ZOOM)
}

fn tile_transform(tile: TileId) -> GeoTransform {
    let bounds = WebMercatorTiling.bounds(tile);
    GeoTransform::new(
        bounds.min_x,
        bounds.width() / TILE_PIXELS as f64,
        bounds.max_y,
        -bounds.height() / TILE_PIXELS as f64,
    )
}

/// Writes a tile whose samples encode `offset + band * 10000 + row * 100 + col`
fn write_tile(dir: &Path, tile: TileId, bands: usize, offset: f64) {
    let data = Array3::from_shape_fn((bands, TILE_PIXELS, TILE_PIXELS), |(b, r, c)| {
        offset + (b * 10000 + r * 100 + c) as f64
    });
    GeoTiffWriter::default()
        .write(&dir.join(format!("{}.tif", tile)), &data, tile_transform(tile).to_gdal(), None)
        .unwrap();
}

fn write_points(path: &Path, points: &[(f64, f64)]) {
    let features: Vec<_> = points.iter().enumerate().map(|(i, (lon, lat))| json!({
        "type": "Feature",
        "properties": { "id": i },
        "geometry": { "type": "Point", "coordinates": [lon, lat] }
    })).collect();
    let collection = json!({ "type": "FeatureCollection", "features": features });
    fs::write(path, serde_json::to_string_pretty(&collection).unwrap()).unwrap();
}

fn home_dir(bands: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_tile(dir.path(), home_tile(), bands, 0.0);
    dir
}

fn options() -> ExtractionOptions {
    ExtractionOptions::new(2, 10.0, 2, 4)
}

#[test]
fn test_interior_point_yields_full_chips() {
    let dir = home_dir(8);
    let chips = ChipExtractor::new(options())
        .extract(&vec![Point::new(10.0, 50.0)], dir.path())
        .unwrap();

    assert_eq!(chips.len(), 2);
    let (row, col) = tile_transform(home_tile()).rowcol(10.0, 50.0).unwrap();
    for (year, chip) in chips.iter().enumerate() {
        assert_eq!(chip.shape(), (4, 5, 5));
        assert!(chip.is_complete(4, 2));
        let centre = (year * 4 * 10000) as f64 + (row * 100 + col) as f64;
        assert_eq!(chip.data[[0, 2, 2]], centre);
        assert_eq!(chip.data[[3, 0, 0]], centre + 30000.0 - 202.0);
    }
}

#[test]
fn test_chips_are_point_major() {
    let dir = home_dir(6);
    let points = vec![Point::new(10.0, 50.0), Point::new(9.96, 49.99)];
    let options = ExtractionOptions::new(1, 10.0, 3, 2);
    let chips = ChipExtractor::new(options).extract(&points, dir.path()).unwrap();

    let order: Vec<(usize, usize)> = chips.iter().map(|c| (c.point_index, c.year)).collect();
    assert_eq!(order, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    assert_eq!(chips[4].point, points[1]);
    assert_eq!(chips[4].data[[0, 1, 1]] - chips[3].data[[0, 1, 1]], 20000.0);
}

#[test]
fn test_extraction_is_idempotent() {
    let dir = home_dir(8);
    let extractor = ChipExtractor::new(options());
    let points = vec![Point::new(10.0, 50.0), Point::new(9.97, 49.98)];

    let first = extractor.extract_arrays(&points, dir.path()).unwrap();
    let second = extractor.extract_arrays(&points, dir.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_extra_tile_is_a_mismatch() {
    let dir = home_dir(8);
    let extra = TileId::new(2161, 1390, ZOOM);
    write_tile(dir.path(), extra, 8, 0.0);

    let result = ChipExtractor::new(options()).extract(&vec![Point::new(10.0, 50.0)], dir.path());
    match result {
        Err(ChipError::TileAvailability { required, available }) => {
            assert_eq!(required.into_iter().collect::<Vec<_>>(), vec![home_tile()]);
            assert_eq!(available.len(), 2);
            assert!(available.contains(&extra));
        },
        other => panic!("expected a tile availability error, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn test_missing_tile_is_a_mismatch() {
    let dir = home_dir(8);
    // On the shared edge with the next tile east
    let east_edge = WebMercatorTiling.bounds(home_tile()).max_x;

    let result = ChipExtractor::new(options()).extract(&vec![Point::new(east_edge, 50.0)], dir.path());
    assert!(matches!(result, Err(ChipError::TileAvailability { .. })));
}

/// A point in the first pixel row, half a pixel below the top edge
fn top_row_point() -> Point {
    let transform = tile_transform(home_tile());
    let centre = transform.pixel_to_geo(16.5, 0.5);
    Point::new(centre.x, centre.y)
}

#[test]
fn test_row_zero_truncates_without_wrapping() {
    let dir = home_dir(8);
    let chips = ChipExtractor::new(options()).extract(&vec![top_row_point()], dir.path()).unwrap();

    assert_eq!(chips[0].shape(), (4, 3, 5));
    // First row of the chip is mosaic row 0, never the bottom of the raster
    assert_eq!(chips[0].data[[0, 0, 2]], 16.0);
    assert_eq!(chips[0].transform.origin_y, tile_transform(home_tile()).origin_y);
}

#[test]
fn test_row_zero_padded() {
    let dir = home_dir(8);
    let options = options().with_edge_policy(EdgePolicy::Pad).with_pad_value(-1.0);
    let chips = ChipExtractor::new(options).extract(&vec![top_row_point()], dir.path()).unwrap();

    let chip = &chips[1];
    assert_eq!(chip.shape(), (4, 5, 5));
    assert_eq!(chip.data[[0, 1, 2]], -1.0);
    assert_eq!(chip.data[[0, 2, 2]], 40016.0);
}

#[test]
fn test_row_zero_rejected() {
    let dir = home_dir(8);
    let options = options().with_edge_policy(EdgePolicy::Reject);
    let points = vec![Point::new(10.0, 50.0), top_row_point()];
    let result = ChipExtractor::new(options).extract(&points, dir.path());

    assert!(matches!(result, Err(ChipError::ChipOutOfBounds { point_index: 1, year: 0 })));
}

#[test]
fn test_adjacent_tiles_are_stitched() {
    let dir = tempfile::tempdir().unwrap();
    let west = home_tile();
    let east = TileId::new(2162, 1389, ZOOM);
    write_tile(dir.path(), west, 8, 0.0);
    write_tile(dir.path(), east, 8, 0.5);

    // Centre of the first column of the east tile; 100 m pixels make the
    // buffer reach across the shared edge
    let point = tile_transform(east).pixel_to_geo(0.5, 10.5);
    let options = ExtractionOptions::new(2, 100.0, 2, 4);
    let chips = ChipExtractor::new(options).extract(&vec![point], dir.path()).unwrap();

    let chip = &chips[0];
    assert_eq!(chip.shape(), (4, 5, 5));
    assert_eq!(chip.data[[0, 2, 0]], 1030.0);
    assert_eq!(chip.data[[0, 2, 1]], 1031.0);
    assert_eq!(chip.data[[0, 2, 2]], 1000.5);
    assert_eq!(chip.data[[0, 2, 4]], 1002.5);
}

#[test]
fn test_vertically_adjacent_tiles_are_stitched() {
    let dir = tempfile::tempdir().unwrap();
    let north = home_tile();
    let south = TileId::new(2161, 1390, ZOOM);
    write_tile(dir.path(), north, 8, 0.0);
    write_tile(dir.path(), south, 8, 0.5);

    // The two tiles differ slightly in pixel height
    assert_ne!(tile_transform(north).pixel_height, tile_transform(south).pixel_height);

    // Centre of the first row of the south tile
    let point = tile_transform(south).pixel_to_geo(10.5, 0.5);
    let options = ExtractionOptions::new(2, 100.0, 2, 4);
    let chips = ChipExtractor::new(options).extract(&vec![point], dir.path()).unwrap();

    let chip = &chips[0];
    assert_eq!(chip.shape(), (4, 5, 5));
    let centre_column: Vec<f64> = (0..5).map(|r| chip.data[[0, r, 2]]).collect();
    assert_eq!(centre_column, vec![3010.0, 3110.0, 10.5, 110.5, 210.5]);
}

#[test]
fn test_geojson_points_through_facade() {
    let dir = home_dir(8);
    let vectors = tempfile::tempdir().unwrap();
    let points_file = vectors.path().join("points.geojson");
    write_points(&points_file, &[(10.0, 50.0), (9.97, 49.98)]);

    let kit = ChipKit::new(options());
    let chips = kit.extract(&points_file, dir.path()).unwrap();

    assert_eq!(chips.len(), 4);
    assert_eq!(chips[2].point, Point::new(9.97, 49.98));
}

#[test]
fn test_dataset_pairs_chips_with_points() {
    let dir = home_dir(8);
    let points = [Point::new(10.0, 50.0), Point::new(9.97, 49.98)];
    let dataset = ChipKit::new(options()).dataset(&points, dir.path()).unwrap();

    assert_eq!(dataset.len(), 4);
    let (chip, point) = dataset.get(3).unwrap();
    assert_eq!(chip.dim(), (4, 5, 5));
    assert_eq!(*point, points[1]);
}

#[test]
fn test_npy_export() {
    let dir = home_dir(8);
    let out = tempfile::tempdir().unwrap();
    let chips = ChipExtractor::new(options()).extract(&vec![Point::new(10.0, 50.0)], dir.path()).unwrap();

    let manifest = ChipWriter::new(out.path(), ChipFormat::Npy).write_all(&chips).unwrap();

    let bytes = fs::read(out.path().join("chip_0_1.npy")).unwrap();
    assert_eq!(&bytes[..6], b"\x93NUMPY");
    let header_len = 10 + u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    assert_eq!(header_len % 64, 0);
    assert_eq!(bytes.len(), header_len + 4 * 5 * 5 * 8);
    assert_eq!(fs::read_to_string(manifest).unwrap().lines().count(), 3);
}

#[test]
fn test_geotiff_export_is_georeferenced() {
    let dir = home_dir(8);
    let out = tempfile::tempdir().unwrap();
    let chips = ChipExtractor::new(options()).extract(&vec![Point::new(10.0, 50.0)], dir.path()).unwrap();

    ChipWriter::new(out.path(), ChipFormat::GeoTiff).write_all(&chips).unwrap();

    let raster = GeoTiffProvider.load(&out.path().join("chip_0_0.tif")).unwrap();
    assert_eq!(raster.data, chips[0].data);
    let centre = raster.transform.pixel_to_geo(2.5, 2.5);
    assert!((centre.x - 10.0).abs() < raster.transform.pixel_width);
}

#[test]
fn test_inspect_reports_zoom() {
    let dir = home_dir(8);
    write_tile(dir.path(), TileId::new(2162, 1389, ZOOM), 8, 0.0);
    let inventory = ChipKit::new(options()).inspect(dir.path()).unwrap();

    assert_eq!(inventory.zoom(), ZOOM);
    assert_eq!(inventory.len(), 2);
}

#[test]
fn test_empty_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = ChipExtractor::new(options()).extract(&vec![Point::new(10.0, 50.0)], dir.path());
    assert!(matches!(result, Err(ChipError::Precondition(_))));
}
