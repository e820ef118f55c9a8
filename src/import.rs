// import.rs

use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

use crate::error::PlotError;

/// Reads a GeoJSON file and extracts the polygon to import.
pub fn read_geometry_file(path: &Path) -> Result<Geometry, PlotError> {
    let text = fs::read_to_string(path).map_err(|e| {
        PlotError::invalid_geometry(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_geometry(&text)
}

/// Accepts a `Feature`, a `FeatureCollection` (first feature) or a bare
/// `Polygon`/`MultiPolygon`. Anything else is invalid input.
pub fn parse_geometry(text: &str) -> Result<Geometry, PlotError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| PlotError::invalid_geometry(e.to_string()))?;

    let geometry = match geojson {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| PlotError::invalid_geometry("feature collection has no features"))?
            .geometry,
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::Geometry(geometry) => Some(geometry),
    };
    let geometry = geometry.ok_or_else(|| PlotError::invalid_geometry("feature has no geometry"))?;

    if !matches!(geometry.value, Value::Polygon(_) | Value::MultiPolygon(_)) {
        return Err(PlotError::invalid_geometry(format!(
            "expected a Polygon or MultiPolygon, found {}",
            type_name(&geometry.value)
        )));
    }
    Ok(geometry)
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

#[cfg(test)]
mod tests {
    use super::*;

    const POLYGON: &str =
        r#"{"type":"Polygon","coordinates":[[[0,0],[0,0.01],[0.01,0.01],[0,0]]]}"#;

    fn assert_invalid(result: Result<Geometry, PlotError>) {
        assert!(
            matches!(result, Err(PlotError::InvalidGeometryInput { .. })),
            "{:?}",
            result
        );
    }

    #[test]
    fn test_bare_polygon_and_multipolygon() {
        assert!(parse_geometry(POLYGON).is_ok());
        let multi = r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[0,1],[1,1],[0,0]]]]}"#;
        assert!(matches!(
            parse_geometry(multi).unwrap().value,
            Value::MultiPolygon(_)
        ));
    }

    #[test]
    fn test_feature_and_first_feature_of_collection() {
        let feature = format!(r#"{{"type":"Feature","properties":{{}},"geometry":{}}}"#, POLYGON);
        assert!(parse_geometry(&feature).is_ok());

        let collection = format!(
            r#"{{"type":"FeatureCollection","features":[{},{{"type":"Feature","properties":{{}},"geometry":{{"type":"Point","coordinates":[1,2]}}}}]}}"#,
            feature
        );
        assert!(matches!(
            parse_geometry(&collection).unwrap().value,
            Value::Polygon(_)
        ));
    }

    #[test]
    fn test_empty_feature_collection_is_invalid() {
        assert_invalid(parse_geometry(r#"{"type":"FeatureCollection","features":[]}"#));
    }

    #[test]
    fn test_non_polygon_types_are_invalid() {
        assert_invalid(parse_geometry(r#"{"type":"Point","coordinates":[1,2]}"#));
        assert_invalid(parse_geometry(
            r#"{"type":"LineString","coordinates":[[1,2],[3,4]]}"#,
        ));
        assert_invalid(parse_geometry(
            r#"{"type":"Feature","properties":{},"geometry":null}"#,
        ));
    }

    #[test]
    fn test_malformed_text_and_missing_file_are_invalid() {
        assert_invalid(parse_geometry("not geojson"));
        assert_invalid(parse_geometry(r#"{"type":"Topology"}"#));
        assert_invalid(read_geometry_file(Path::new("/nonexistent/plot.geojson")));
    }
}
