// map_view.rs

use geojson::{FeatureCollection, Value};
use ratatui::layout::Rect;

use crate::render_sync::{self, DisplayColor, RenderSurface};
use crate::plot::PlotId;
use crate::selection::CameraDirective;

/// Zoom limits, in web-map zoom levels.
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 20.0;

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

/// Visible part of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `[longitude, latitude]`
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Viewport {
    pub fn new(center: [f64; 2], zoom: f64) -> Self {
        Viewport {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Degrees of longitude across the view.
    pub fn lon_span(&self) -> f64 {
        360.0 / 2f64.powf(self.zoom)
    }

    /// `(x_bounds, y_bounds)` for a canvas of `width` x `height` cells.
    pub fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let half_lon = self.lon_span() / 2.0;
        let half_lat = if width == 0 {
            half_lon
        } else {
            half_lon * (height as f64 * CELL_ASPECT) / width as f64
        };
        (
            [self.center[0] - half_lon, self.center[0] + half_lon],
            [self.center[1] - half_lat, self.center[1] + half_lat],
        )
    }

    /// Distance the drawing cursor moves per key press.
    pub fn cursor_step(&self) -> f64 {
        self.lon_span() / 40.0
    }

    pub fn pan(&mut self, d_lon: f64, d_lat: f64) {
        self.center = [
            (self.center[0] + d_lon).clamp(-180.0, 180.0),
            (self.center[1] + d_lat).clamp(-90.0, 90.0),
        ];
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn apply(&mut self, directive: CameraDirective) {
        self.center = directive.center;
        self.zoom = directive.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Geographic position of a terminal cell inside `area`.
    pub fn cell_to_lon_lat(&self, area: Rect, column: u16, row: u16) -> Option<[f64; 2]> {
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        let (x_bounds, y_bounds) = self.bounds(area.width, area.height);
        let fx = (column - area.x) as f64 + 0.5;
        let fy = (row - area.y) as f64 + 0.5;
        let lon = x_bounds[0] + fx / area.width as f64 * (x_bounds[1] - x_bounds[0]);
        let lat = y_bounds[1] - fy / area.height as f64 * (y_bounds[1] - y_bounds[0]);
        Some([lon, lat])
    }
}

/// One plot as the map layer draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPlot {
    pub id: PlotId,
    pub name: String,
    pub color: DisplayColor,
    /// Every ring of every polygon, as `(lon, lat)` pairs.
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// The plot layer of the terminal map.
///
/// It only accepts data after the first frame has been laid out, the same
/// way a web map only accepts sources once its style has loaded.
#[derive(Debug, Default)]
pub struct MapLayer {
    ready: bool,
    plots: Vec<RenderedPlot>,
}

impl MapLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn plots(&self) -> &[RenderedPlot] {
        &self.plots
    }

    /// Bounding box `[min_lon, min_lat, max_lon, max_lat]` of the layer.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        let mut points = self
            .plots
            .iter()
            .flat_map(|p| p.rings.iter())
            .flat_map(|r| r.iter());
        let &(x, y) = points.next()?;
        Some(points.fold([x, y, x, y], |b, &(x, y)| {
            [b[0].min(x), b[1].min(y), b[2].max(x), b[3].max(y)]
        }))
    }
}

impl RenderSurface for MapLayer {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn set_data(&mut self, features: FeatureCollection) {
        self.plots = features
            .features
            .iter()
            .filter_map(|feature| {
                let id = render_sync::feature_plot_id(feature)?;
                let color = render_sync::feature_color(feature)?;
                let name = feature
                    .property(render_sync::PROP_NAME)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let rings = match &feature.geometry.as_ref()?.value {
                    Value::Polygon(rings) => rings.iter().map(|r| to_pairs(r)).collect(),
                    Value::MultiPolygon(polygons) => polygons
                        .iter()
                        .flat_map(|rings| rings.iter().map(|r| to_pairs(r)))
                        .collect(),
                    _ => Vec::new(),
                };
                Some(RenderedPlot {
                    id,
                    name,
                    color,
                    rings,
                })
            })
            .collect();
        log::debug!("Map layer now holds {} plots", self.plots.len());
    }
}

fn to_pairs(ring: &[Vec<f64>]) -> Vec<(f64, f64)> {
    ring.iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::CultureType;
    use crate::render_sync::PlotRenderSync;
    use crate::render_sync::tests::plot;
    use approx::assert_relative_eq;

    #[test]
    fn test_layer_unpacks_synced_features() {
        let mut layer = MapLayer::new();
        let mut sync = PlotRenderSync::with_seed(11);
        let plots = vec![plot(1, CultureType::Wheat), plot(2, CultureType::Olives)];
        sync.sync(&plots, &mut layer);
        assert!(layer.plots().is_empty());

        layer.mark_ready();
        sync.on_surface_ready(&mut layer);
        assert_eq!(layer.plots().len(), 2);
        assert_eq!(layer.plots()[1].id, PlotId(2));
        assert_eq!(Some(layer.plots()[1].color), sync.color_of(PlotId(2)));
        assert_eq!(layer.plots()[0].rings[0].len(), 5);
        assert_eq!(layer.bbox(), Some([0.0, 0.0, 0.002, 0.002]));
    }

    #[test]
    fn test_viewport_bounds_and_cell_mapping() {
        let viewport = Viewport::new([10.0, 20.0], 8.0);
        let (x, y) = viewport.bounds(100, 25);
        assert_relative_eq!(x[1] - x[0], 360.0 / 256.0);
        assert_relative_eq!(y[1] - y[0], (360.0 / 256.0) * 0.5);

        let area = Rect::new(0, 0, 100, 25);
        let top_left = viewport.cell_to_lon_lat(area, 0, 0).unwrap();
        assert!(top_left[0] < 10.0 && top_left[1] > 20.0);
        assert!(viewport.cell_to_lon_lat(area, 100, 0).is_none());
    }

    #[test]
    fn test_camera_directive_recenters() {
        let mut viewport = Viewport::new([0.0, 0.0], 11.0);
        viewport.apply(CameraDirective {
            center: [-7.6, 33.5],
            zoom: 25.0,
        });
        assert_eq!(viewport.center, [-7.6, 33.5]);
        assert_eq!(viewport.zoom, MAX_ZOOM);
    }
}
