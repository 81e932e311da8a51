//! Slippy-map tiling scheme
//!
//! Raster tiles are named after their Web Mercator tile index. A tile is
//! identified by `(x, y, z)` with `x` growing eastwards and `y` growing
//! southwards from the north-west corner of the world square.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::bbox::BoundingBox;
use super::transform::CoordinateTransformer;

/// Nudge applied before flooring so that tile edges fall into the tile
/// to their east/south
const TILE_EPSILON: f64 = 1e-14;

/// Identifier of a map tile
///
/// Field order makes the derived ordering sort by zoom, then column, then row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        TileId { z, x, y }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.x, self.y, self.z)
    }
}

impl FromStr for TileId {
    type Err = String;

    /// Parses `"{x}_{y}_{z}"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 3 {
            return Err(format!("Tile name '{}' is not of the form x_y_z", s));
        }

        let x = parts[0].parse::<u32>()
            .map_err(|_| format!("Invalid tile column '{}'", parts[0]))?;
        let y = parts[1].parse::<u32>()
            .map_err(|_| format!("Invalid tile row '{}'", parts[1]))?;
        let z = parts[2].parse::<u8>()
            .map_err(|_| format!("Invalid zoom level '{}'", parts[2]))?;

        if z >= 32 || u64::from(x) >= 1u64 << z || u64::from(y) >= 1u64 << z {
            return Err(format!("Tile {} lies outside the zoom {} grid", s, z));
        }

        Ok(TileId::new(x, y, z))
    }
}

/// Maps geographic coordinates to tiles and back
pub trait TilingScheme {
    /// Tile containing the lon/lat coordinate at the given zoom
    fn tile(&self, lon: f64, lat: f64, zoom: u8) -> TileId;

    /// Lon/lat bounds of a tile
    fn bounds(&self, tile: TileId) -> BoundingBox;
}

/// The standard Web Mercator slippy-map scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorTiling;

impl WebMercatorTiling {
    /// Scales a unit-square coordinate to a tile index, clamped to the grid
    fn tile_index(value: f64, zoom: u8) -> u32 {
        let tiles = 2f64.powi(zoom as i32);
        if value <= 0.0 {
            0
        } else if value >= 1.0 {
            tiles as u32 - 1
        } else {
            let index = ((value + TILE_EPSILON) * tiles).floor();
            (index as u32).min(tiles as u32 - 1)
        }
    }
}

impl TilingScheme for WebMercatorTiling {
    fn tile(&self, lon: f64, lat: f64, zoom: u8) -> TileId {
        let x = lon / 360.0 + 0.5;
        let sin_lat = lat.to_radians().sin();
        let y = 0.5 - 0.25 * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / PI;

        TileId::new(Self::tile_index(x, zoom), Self::tile_index(y, zoom), zoom)
    }

    fn bounds(&self, tile: TileId) -> BoundingBox {
        let transformer = CoordinateTransformer;
        let extent = transformer.mercator_extent();
        let size = 2.0 * extent / 2f64.powi(tile.z as i32);

        let left = -extent + tile.x as f64 * size;
        let top = extent - tile.y as f64 * size;

        let north_west = transformer.web_mercator_to_wgs84(left, top);
        let south_east = transformer.web_mercator_to_wgs84(left + size, top - size);

        BoundingBox::new(north_west.x, south_east.y, south_east.x, north_west.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tile_name_round_trip() {
        let tile: TileId = "540_347_10".parse().unwrap();
        assert_eq!(tile, TileId::new(540, 347, 10));
        assert_eq!(tile.to_string(), "540_347_10");
    }

    #[test]
    fn test_tile_name_errors() {
        assert!("540_347".parse::<TileId>().is_err());
        assert!("a_1_2".parse::<TileId>().is_err());
        assert!("4_0_2".parse::<TileId>().is_err());
    }

    #[test]
    fn test_ordering_is_zoom_column_row() {
        let mut tiles = vec![TileId::new(2, 0, 3), TileId::new(1, 5, 3), TileId::new(9, 9, 2)];
        tiles.sort();
        assert_eq!(tiles, vec![TileId::new(9, 9, 2), TileId::new(1, 5, 3), TileId::new(2, 0, 3)]);
    }

    #[test]
    fn test_known_tiles() {
        let tiling = WebMercatorTiling;
        assert_eq!(tiling.tile(0.0, 0.0, 0), TileId::new(0, 0, 0));
        assert_eq!(tiling.tile(0.0, 0.0, 1), TileId::new(1, 1, 1));
        assert_eq!(tiling.tile(10.0, 50.0, 10), TileId::new(540, 347, 10));
    }

    #[test]
    fn test_world_edges_clamp() {
        let tiling = WebMercatorTiling;
        assert_eq!(tiling.tile(-180.0, 89.0, 4), TileId::new(0, 0, 4));
        assert_eq!(tiling.tile(180.0, -89.0, 4), TileId::new(15, 15, 4));
    }

    #[test]
    fn test_bounds_contain_their_points() {
        let tiling = WebMercatorTiling;
        let tile = tiling.tile(10.0, 50.0, 12);
        let bounds = tiling.bounds(tile);

        assert!(bounds.contains(&crate::coordinate::Point::new(10.0, 50.0)));
        let center = bounds.center();
        assert_eq!(tiling.tile(center.x, center.y, 12), tile);
        assert_relative_eq!(bounds.width(), 360.0 / 4096.0, epsilon = 1e-9);
    }
}
