// workspace.rs

use geojson::Geometry;
use std::path::Path;

use crate::drawing::{DrawingModeController, DrawingSession, DrawingState, DrawingTool};
use crate::error::PlotError;
use crate::import;
use crate::plot::{Plot, PlotFields, PlotId};
use crate::render_sync::{DisplayColor, PlotRenderSync, RenderSurface, SyncOutcome};
use crate::selection::{self, CameraDirective, SelectionController};
use crate::store::{PlotStore, StoreError};

pub struct PlotWorkspace<S: PlotStore, T: DrawingTool, R: RenderSurface> {
    store: S,
    surface: R,
    plots: Vec<Plot>,
    drawing: DrawingModeController<T>,
    selection: SelectionController,
    render: PlotRenderSync,
}

impl<S: PlotStore, T: DrawingTool, R: RenderSurface> PlotWorkspace<S, T, R> {
    pub fn new(
        store: S,
        tool: T,
        surface: R,
        selection: SelectionController,
        render: PlotRenderSync,
    ) -> Self {
        PlotWorkspace {
            store,
            surface,
            plots: Vec::new(),
            drawing: DrawingModeController::new(tool),
            selection,
            render,
        }
    }

    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    pub fn plot(&self, id: PlotId) -> Option<&Plot> {
        self.plots.iter().find(|p| p.id == id)
    }

    pub fn drawing_state(&self) -> &DrawingState {
        self.drawing.state()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_drawing()
    }

    pub fn current_session(&self) -> Option<&DrawingSession> {
        self.drawing.current_session()
    }

    pub fn selected(&self) -> Option<&Plot> {
        self.selection.selected().and_then(|id| self.plot(id))
    }

    pub fn color_of(&self, id: PlotId) -> Option<DisplayColor> {
        self.render.color_of(id)
    }

    pub fn tool(&self) -> &T {
        self.drawing.tool()
    }

    pub fn tool_mut(&mut self) -> &mut T {
        self.drawing.tool_mut()
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn tool_in_sync(&self) -> bool {
        self.drawing.is_in_sync()
    }

    /// Reloads the plot list from the store and re-renders it.
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        let plots = self.store.list_plots()?;
        log::info!("Loaded {} plots", plots.len());
        self.replace_plots(plots);
        Ok(())
    }

    fn replace_plots(&mut self, plots: Vec<Plot>) {
        self.plots = plots;
        self.selection.retain_existing(&self.plots);
        self.render.sync(&self.plots, &mut self.surface);
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    /// Readiness signal from the render surface: flushes a deferred layer.
    pub fn surface_ready(&mut self) -> SyncOutcome {
        self.render.on_surface_ready(&mut self.surface)
    }

    /// Starts polygon drawing, clearing the selection.
    pub fn start_drawing(&mut self) -> bool {
        let started = self.drawing.start_drawing();
        if started {
            self.selection.clear();
        }
        started
    }

    /// Forwards a completed shape from the drawing tool.
    pub fn on_shape_completed(&mut self, geometry: Geometry) -> Result<(), PlotError> {
        self.drawing.on_shape_completed(geometry)
    }

    pub fn cancel(&mut self) {
        self.drawing.cancel();
    }

    /// Imports a GeoJSON document as a new pending session.
    pub fn import_geojson(&mut self, text: &str) -> Result<(), PlotError> {
        let geometry = import::parse_geometry(text)?;
        self.import_geometry(geometry);
        Ok(())
    }

    pub fn import_file(&mut self, path: &Path) -> Result<(), PlotError> {
        let geometry = import::read_geometry_file(path)?;
        self.import_geometry(geometry);
        Ok(())
    }

    fn import_geometry(&mut self, geometry: Geometry) {
        self.selection.clear();
        self.drawing.import(geometry);
    }

    /// Saves the pending session and refreshes the plot list.
    pub fn submit(&mut self, fields: PlotFields) -> Result<Plot, PlotError> {
        let created = self.drawing.submit(fields, &mut self.store)?;
        match self.store.list_plots() {
            Ok(plots) => self.replace_plots(plots),
            Err(e) => {
                log::warn!("Could not reload plots after saving: {}", e);
                let mut plots = std::mem::take(&mut self.plots);
                plots.push(created.clone());
                self.replace_plots(plots);
            }
        }
        Ok(created)
    }

    /// Highlights a plot. Ignored while drawing; a stale id clears the
    /// selection without error.
    pub fn select(&mut self, id: PlotId) -> Option<CameraDirective> {
        if self.drawing.is_drawing() {
            log::debug!("Ignoring selection of {} while drawing", id);
            return None;
        }
        self.selection.select(id, &self.plots)
    }

    /// Map-click selection. Clicking empty map clears the selection.
    pub fn pick(&mut self, lon: f64, lat: f64) -> Option<CameraDirective> {
        if self.drawing.is_drawing() {
            return None;
        }
        match selection::plot_at(&self.plots, lon, lat) {
            Some(id) => self.select(id),
            None => {
                self.selection.clear();
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}
