//! GeoJSON point reader

use geojson::{GeoJson, Geometry, Value};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::PointSource;
use crate::coordinate::Point;
use crate::errors::{ChipError, ChipResult};

/// Reads points from a GeoJSON file
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry.
/// Point and MultiPoint geometries contribute their positions in file
/// order; any other geometry, or a feature without geometry, is an error.
#[derive(Debug, Clone)]
pub struct GeoJsonPointSource {
    path: PathBuf,
}

impl GeoJsonPointSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        GeoJsonPointSource { path: path.as_ref().to_path_buf() }
    }

    /// Parses GeoJSON text
    pub fn parse_str(text: &str) -> ChipResult<Vec<Point>> {
        let geojson = text.parse::<GeoJson>()?;
        let mut points = Vec::new();

        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for (index, feature) in collection.features.iter().enumerate() {
                    let geometry = feature.geometry.as_ref()
                        .ok_or_else(|| ChipError::Vector(format!("Feature {} has no geometry", index)))?;
                    collect_points(geometry, &mut points)?;
                }
            },
            GeoJson::Feature(feature) => {
                let geometry = feature.geometry.as_ref()
                    .ok_or_else(|| ChipError::Vector("Feature has no geometry".to_string()))?;
                collect_points(geometry, &mut points)?;
            },
            GeoJson::Geometry(geometry) => collect_points(&geometry, &mut points)?,
        }

        Ok(points)
    }
}

fn position_to_point(position: &[f64]) -> ChipResult<Point> {
    match position {
        [x, y, ..] => Ok(Point::new(*x, *y)),
        _ => Err(ChipError::Vector(format!("Position {:?} has fewer than two coordinates", position))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn collect_points(geometry: &Geometry, points: &mut Vec<Point>) -> ChipResult<()> {
    match &geometry.value {
        Value::Point(position) => points.push(position_to_point(position)?),
        Value::MultiPoint(positions) => {
            for position in positions {
                points.push(position_to_point(position)?);
            }
        },
        other => {
            return Err(ChipError::Vector(format!(
                "Unsupported geometry type {}, expected Point or MultiPoint", type_name(other))))
        }
    }
    Ok(())
}

impl PointSource for GeoJsonPointSource {
    fn read_points(&self) -> ChipResult<Vec<Point>> {
        info!("Reading points from {}", self.path.display());
        let text = fs::read_to_string(&self.path)?;
        let points = Self::parse_str(&text)?;
        debug!("Read {} points", points.len());
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection_order() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [10.0, 50.0]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "MultiPoint", "coordinates": [[11.0, 51.0], [12.0, 52.0]]}}
            ]
        }"#;

        let points = GeoJsonPointSource::parse_str(text).unwrap();
        assert_eq!(points, vec![Point::new(10.0, 50.0), Point::new(11.0, 51.0), Point::new(12.0, 52.0)]);
    }

    #[test]
    fn test_bare_geometry() {
        let points = GeoJsonPointSource::parse_str(r#"{"type": "Point", "coordinates": [1.5, -2.5, 100.0]}"#).unwrap();
        assert_eq!(points, vec![Point::new(1.5, -2.5)]);
    }

    #[test]
    fn test_polygon_rejected() {
        let text = r#"{"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}"#;
        assert!(matches!(GeoJsonPointSource::parse_str(text), Err(ChipError::Vector(_))));
    }

    #[test]
    fn test_null_geometry_rejected() {
        let text = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        assert!(matches!(GeoJsonPointSource::parse_str(text), Err(ChipError::Vector(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(GeoJsonPointSource::parse_str("{ nope"), Err(ChipError::Vector(_))));
    }

    #[test]
    fn test_missing_file() {
        let source = GeoJsonPointSource::new("/definitely/not/here.geojson");
        assert!(matches!(source.read_points(), Err(ChipError::Io(_))));
    }
}
