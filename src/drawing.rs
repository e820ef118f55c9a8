// drawing.rs

use geojson::Geometry;

use crate::area::{self, AreaStrategy, GeodesicStrategy, PlanarApproxStrategy};
use crate::error::PlotError;
use crate::plot::{Plot, PlotDraft, PlotFields};
use crate::store::PlotStore;

/// Internal mode of the interactive drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    SimpleSelect,
    DrawPolygon,
}

/// Commands the controller issues to the interactive drawing tool.
pub trait DrawingTool {
    fn mode(&self) -> ToolMode;
    fn enter_polygon_mode(&mut self);
    fn enter_neutral_mode(&mut self);
    /// Drops any shape the tool is holding so it is not rendered twice.
    fn discard_draft(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    Drawn,
    Imported,
}

impl SessionOrigin {
    /// Area policy for this entry path. The two policies give different
    /// numbers for the same shape.
    pub fn area_strategy(&self) -> &'static dyn AreaStrategy {
        match self {
            SessionOrigin::Drawn => &GeodesicStrategy,
            SessionOrigin::Imported => &PlanarApproxStrategy,
        }
    }
}

/// Candidate plot awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSession {
    pub geometry: Geometry,
    /// Square meters, computed when the session was created.
    pub area: f64,
    pub origin: SessionOrigin,
}

impl DrawingSession {
    pub fn new(geometry: Geometry, origin: SessionOrigin) -> Self {
        let area = origin.area_strategy().compute_area(&geometry);
        DrawingSession {
            geometry,
            area,
            origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawingState {
    #[default]
    Idle,
    Drawing,
    PendingConfirmation(DrawingSession),
}

impl DrawingState {
    pub fn name(&self) -> &'static str {
        match self {
            DrawingState::Idle => "Idle",
            DrawingState::Drawing => "Drawing",
            DrawingState::PendingConfirmation(_) => "Pending confirmation",
        }
    }
}

pub struct DrawingModeController<T: DrawingTool> {
    state: DrawingState,
    tool: T,
}

impl<T: DrawingTool> DrawingModeController<T> {
    pub fn new(mut tool: T) -> Self {
        tool.discard_draft();
        tool.enter_neutral_mode();
        DrawingModeController {
            state: DrawingState::Idle,
            tool,
        }
    }

    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawingState::Drawing)
    }

    pub fn current_session(&self) -> Option<&DrawingSession> {
        match &self.state {
            DrawingState::PendingConfirmation(session) => Some(session),
            _ => None,
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Mutable access for feeding user input to the tool. Mode changes must
    /// still go through the controller.
    pub fn tool_mut(&mut self) -> &mut T {
        &mut self.tool
    }

    pub fn expected_tool_mode(&self) -> ToolMode {
        match self.state {
            DrawingState::Drawing => ToolMode::DrawPolygon,
            _ => ToolMode::SimpleSelect,
        }
    }

    pub fn is_in_sync(&self) -> bool {
        self.tool.mode() == self.expected_tool_mode()
    }

    /// `Idle -> Drawing`. Returns whether the transition happened; a pending
    /// session has to be submitted or cancelled first.
    pub fn start_drawing(&mut self) -> bool {
        match self.state {
            DrawingState::Idle => {
                self.tool.discard_draft();
                self.tool.enter_polygon_mode();
                self.state = DrawingState::Drawing;
                log::debug!("Entered polygon drawing mode");
                true
            }
            DrawingState::Drawing => true,
            DrawingState::PendingConfirmation(_) => {
                log::debug!("Ignoring start drawing while a session is pending");
                false
            }
        }
    }

    /// `Drawing -> PendingConfirmation` on a shape reported by the tool.
    ///
    /// Completions outside `Drawing` are ignored so a duplicate event cannot
    /// replace a pending session. A shape with fewer than three distinct
    /// vertices leaves the controller drawing.
    pub fn on_shape_completed(&mut self, geometry: Geometry) -> Result<(), PlotError> {
        if !self.is_drawing() {
            log::debug!(
                "Ignoring shape completion in state {}",
                self.state.name()
            );
            return Ok(());
        }

        let vertices = area::distinct_vertex_count(&geometry);
        if vertices < area::MIN_POLYGON_VERTICES {
            return Err(PlotError::DegenerateShape {
                vertices,
                required: area::MIN_POLYGON_VERTICES,
            });
        }

        let session = DrawingSession::new(geometry, SessionOrigin::Drawn);
        log::info!("Shape completed, geodesic area {} m²", session.area);
        self.tool.discard_draft();
        self.tool.enter_neutral_mode();
        self.state = DrawingState::PendingConfirmation(session);
        Ok(())
    }

    /// Returns to `Idle` from any state, leaving no draft in the tool.
    pub fn cancel(&mut self) {
        if self.state != DrawingState::Idle {
            log::debug!("Cancelled from state {}", self.state.name());
        }
        self.tool.discard_draft();
        self.tool.enter_neutral_mode();
        self.state = DrawingState::Idle;
    }

    /// Enters `PendingConfirmation` with an imported geometry, resetting any
    /// drawing or session in progress first.
    pub fn import(&mut self, geometry: Geometry) {
        self.cancel();
        let session = DrawingSession::new(geometry, SessionOrigin::Imported);
        log::info!("Imported shape, planar area {:.0} m²", session.area);
        self.state = DrawingState::PendingConfirmation(session);
    }

    /// Persists the pending session. On failure the session stays pending so
    /// the user can retry or cancel.
    pub fn submit<S: PlotStore>(
        &mut self,
        fields: PlotFields,
        store: &mut S,
    ) -> Result<Plot, PlotError> {
        let session = self.current_session().ok_or(PlotError::NoSession)?;
        if fields.name.trim().is_empty() {
            return Err(PlotError::EmptyName);
        }

        let draft = PlotDraft::new(fields, session.area, session.geometry.clone());
        let plot = store.create_plot(draft).map_err(|e| {
            log::warn!("Plot submission failed: {}", e);
            PlotError::from(e)
        })?;
        self.state = DrawingState::Idle;
        Ok(plot)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::plot::CultureType;
    use crate::store::MemoryStore;
    use geojson::Value;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ToolCommand {
        Polygon,
        Neutral,
        Discard,
    }

    /// Drawing tool double that records every command.
    #[derive(Default)]
    pub struct RecordingTool {
        pub mode: ToolMode,
        pub has_draft: bool,
        pub commands: Vec<ToolCommand>,
    }

    impl DrawingTool for RecordingTool {
        fn mode(&self) -> ToolMode {
            self.mode
        }

        fn enter_polygon_mode(&mut self) {
            self.mode = ToolMode::DrawPolygon;
            self.commands.push(ToolCommand::Polygon);
        }

        fn enter_neutral_mode(&mut self) {
            self.mode = ToolMode::SimpleSelect;
            self.commands.push(ToolCommand::Neutral);
        }

        fn discard_draft(&mut self) {
            self.has_draft = false;
            self.commands.push(ToolCommand::Discard);
        }
    }

    pub fn square(side: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![0.0, side],
            vec![side, side],
            vec![side, 0.0],
            vec![0.0, 0.0],
        ]]))
    }

    fn controller() -> DrawingModeController<RecordingTool> {
        let mut controller = DrawingModeController::new(RecordingTool::default());
        controller.tool_mut().commands.clear();
        controller
    }

    fn fields(name: &str) -> PlotFields {
        PlotFields {
            name: name.to_string(),
            description: None,
            culture_type: CultureType::Wheat,
        }
    }

    #[test]
    fn test_start_then_cancel_returns_to_idle_with_neutral_tool() {
        let mut controller = controller();
        assert!(controller.start_drawing());
        assert_eq!(controller.tool().mode, ToolMode::DrawPolygon);
        controller.tool_mut().has_draft = true;

        controller.cancel();
        assert_eq!(controller.state(), &DrawingState::Idle);
        assert!(controller.current_session().is_none());
        assert_eq!(controller.tool().mode, ToolMode::SimpleSelect);
        assert!(!controller.tool().has_draft);
        assert!(controller.is_in_sync());
    }

    #[test]
    fn test_two_vertex_shape_keeps_drawing() {
        let mut controller = controller();
        controller.start_drawing();
        let line = Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]));
        let result = controller.on_shape_completed(line);
        assert!(matches!(
            result,
            Err(PlotError::DegenerateShape { vertices: 2, .. })
        ));
        assert!(controller.is_drawing());
        assert!(controller.is_in_sync());
    }

    #[test]
    fn test_completion_creates_geodesic_session_and_discards_draft() {
        let mut controller = controller();
        controller.start_drawing();
        controller.tool_mut().commands.clear();

        controller.on_shape_completed(square(0.001)).unwrap();
        let session = controller.current_session().unwrap();
        assert_eq!(session.origin, SessionOrigin::Drawn);
        assert_eq!(session.area, GeodesicStrategy.compute_area(&square(0.001)));
        assert_eq!(
            controller.tool().commands,
            vec![ToolCommand::Discard, ToolCommand::Neutral]
        );
        assert!(controller.is_in_sync());
    }

    #[test]
    fn test_duplicate_completion_is_ignored() {
        let mut controller = controller();
        controller.start_drawing();
        controller.on_shape_completed(square(0.001)).unwrap();
        let first = controller.current_session().cloned();

        controller.on_shape_completed(square(0.5)).unwrap();
        assert_eq!(controller.current_session().cloned(), first);
    }

    #[test]
    fn test_completion_while_idle_is_ignored() {
        let mut controller = controller();
        controller.on_shape_completed(square(0.001)).unwrap();
        assert_eq!(controller.state(), &DrawingState::Idle);
    }

    #[test]
    fn test_start_drawing_refused_while_pending() {
        let mut controller = controller();
        controller.import(square(0.01));
        assert!(!controller.start_drawing());
        assert!(controller.current_session().is_some());
        assert!(controller.is_in_sync());
    }

    #[test]
    fn test_import_resets_drawing_and_uses_planar_area() {
        let mut controller = controller();
        controller.start_drawing();
        controller.import(square(0.01));
        let area = controller.current_session().map(|s| s.area).unwrap();
        assert_eq!(area, PlanarApproxStrategy.compute_area(&square(0.01)));
        assert_eq!(
            controller.current_session().map(|s| s.origin),
            Some(SessionOrigin::Imported)
        );
        assert_eq!(controller.tool().mode, ToolMode::SimpleSelect);
    }

    #[test]
    fn test_submit_success_returns_to_idle() {
        let mut controller = controller();
        let mut store = MemoryStore::default();
        controller.start_drawing();
        controller.on_shape_completed(square(0.001)).unwrap();

        let plot = controller.submit(fields("Field"), &mut store).unwrap();
        assert_eq!(plot.surface, GeodesicStrategy.compute_area(&square(0.001)));
        assert_eq!(store.plots.len(), 1);
        assert_eq!(controller.state(), &DrawingState::Idle);
    }

    #[test]
    fn test_submit_failure_keeps_session_for_retry() {
        let mut controller = controller();
        let mut store = MemoryStore {
            fail_creates: true,
            ..Default::default()
        };
        controller.import(square(0.01));

        let result = controller.submit(fields("Field"), &mut store);
        assert!(matches!(result, Err(PlotError::PersistenceFailure(_))));
        assert!(controller.current_session().is_some());

        store.fail_creates = false;
        controller.submit(fields("Field"), &mut store).unwrap();
        assert_eq!(store.create_calls, 2);
        assert!(controller.current_session().is_none());
    }

    #[test]
    fn test_submit_validation() {
        let mut controller = controller();
        let mut store = MemoryStore::default();
        assert!(matches!(
            controller.submit(fields("Field"), &mut store),
            Err(PlotError::NoSession)
        ));

        controller.import(square(0.01));
        assert!(matches!(
            controller.submit(fields("   "), &mut store),
            Err(PlotError::EmptyName)
        ));
        assert_eq!(store.create_calls, 0);
    }

    #[test]
    fn test_cancel_pending_has_no_store_effect() {
        let mut controller = controller();
        controller.import(square(0.01));
        controller.cancel();
        assert_eq!(controller.state(), &DrawingState::Idle);
        assert!(controller.is_in_sync());
    }
}
