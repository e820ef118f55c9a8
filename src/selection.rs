// selection.rs

use geo::Contains;

use crate::area::{outer_ring, to_geo};
use crate::error::PlotError;
use crate::plot::{Plot, PlotId};

/// Zoom the camera flies to when a plot is selected.
pub const DEFAULT_FOLLOW_ZOOM: f64 = 16.0;

/// Request to recenter the map on a selected plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDirective {
    /// `[longitude, latitude]` of the first vertex of the outer ring
    pub center: [f64; 2],
    pub zoom: f64,
}

/// Currently highlighted plot, held by id only.
pub struct SelectionController {
    selected: Option<PlotId>,
    follow_zoom: f64,
}

impl SelectionController {
    pub fn new(follow_zoom: f64) -> Self {
        SelectionController {
            selected: None,
            follow_zoom,
        }
    }

    pub fn selected(&self) -> Option<PlotId> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Selects `id` if it is present in `plots`.
    ///
    /// A stale id silently clears the selection. The directive is `None`
    /// in that case and for a plot without coordinates.
    pub fn select(&mut self, id: PlotId, plots: &[Plot]) -> Option<CameraDirective> {
        let Some(plot) = plots.iter().find(|p| p.id == id) else {
            log::debug!("{}", PlotError::StaleSelection(id));
            self.selected = None;
            return None;
        };
        self.selected = Some(id);
        self.directive_for(plot)
    }

    /// Drops the selection if its plot is gone from `plots`.
    pub fn retain_existing(&mut self, plots: &[Plot]) {
        if let Some(id) = self.selected {
            if !plots.iter().any(|p| p.id == id) {
                log::debug!("Selected plot {} disappeared, clearing selection", id);
                self.selected = None;
            }
        }
    }

    fn directive_for(&self, plot: &Plot) -> Option<CameraDirective> {
        let first = outer_ring(&plot.geometry)?.first()?;
        match first.as_slice() {
            [lon, lat, ..] => Some(CameraDirective {
                center: [*lon, *lat],
                zoom: self.follow_zoom,
            }),
            _ => None,
        }
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOW_ZOOM)
    }
}

/// Top-most plot containing the point, later plots being drawn on top.
pub fn plot_at(plots: &[Plot], lon: f64, lat: f64) -> Option<PlotId> {
    let point = geo::Point::new(lon, lat);
    plots
        .iter()
        .rev()
        .find(|plot| match to_geo(&plot.geometry) {
            Some(geo::Geometry::Polygon(polygon)) => polygon.contains(&point),
            Some(geo::Geometry::MultiPolygon(polygons)) => polygons.contains(&point),
            _ => false,
        })
        .map(|plot| plot.id)
}
