// canvas_tool.rs

use geojson::{Geometry, Value};

use crate::drawing::{DrawingTool, ToolMode};

/// Keyboard-driven polygon drawing tool for the terminal map.
///
/// A cursor is moved over the map and vertices are placed at its position.
/// `finish_shape` plays the role of a draw-complete event: it hands back the
/// closed polygon, which the caller forwards to the drawing controller.
#[derive(Debug, Default)]
pub struct CanvasDrawTool {
    mode: ToolMode,
    cursor: [f64; 2],
    draft: Vec<[f64; 2]>,
}

impl CanvasDrawTool {
    pub fn new(cursor: [f64; 2]) -> Self {
        CanvasDrawTool {
            mode: ToolMode::SimpleSelect,
            cursor,
            draft: Vec::new(),
        }
    }

    pub fn cursor(&self) -> [f64; 2] {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: [f64; 2]) {
        self.cursor = [cursor[0].clamp(-180.0, 180.0), cursor[1].clamp(-90.0, 90.0)];
    }

    pub fn move_cursor(&mut self, d_lon: f64, d_lat: f64) {
        self.set_cursor([self.cursor[0] + d_lon, self.cursor[1] + d_lat]);
    }

    pub fn draft(&self) -> &[[f64; 2]] {
        &self.draft
    }

    /// Adds a vertex at the cursor. Only effective in polygon mode.
    pub fn place_vertex(&mut self) -> bool {
        if self.mode != ToolMode::DrawPolygon {
            return false;
        }
        self.draft.push(self.cursor);
        true
    }

    pub fn undo_vertex(&mut self) -> Option<[f64; 2]> {
        if self.mode != ToolMode::DrawPolygon {
            return None;
        }
        self.draft.pop()
    }

    /// Closes the draft into a polygon. The draft is kept until the
    /// controller asks for it to be discarded, so a rejected shape can still
    /// be extended.
    pub fn finish_shape(&self) -> Option<Geometry> {
        if self.mode != ToolMode::DrawPolygon || self.draft.is_empty() {
            return None;
        }
        let mut ring: Vec<Vec<f64>> = self.draft.iter().map(|p| p.to_vec()).collect();
        if self.draft.first() != self.draft.last() || self.draft.len() == 1 {
            ring.push(self.draft[0].to_vec());
        }
        Some(Geometry::new(Value::Polygon(vec![ring])))
    }
}

impl DrawingTool for CanvasDrawTool {
    fn mode(&self) -> ToolMode {
        self.mode
    }

    fn enter_polygon_mode(&mut self) {
        self.mode = ToolMode::DrawPolygon;
    }

    fn enter_neutral_mode(&mut self) {
        self.mode = ToolMode::SimpleSelect;
    }

    fn discard_draft(&mut self) {
        self.draft.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_only_placed_in_polygon_mode() {
        let mut tool = CanvasDrawTool::new([0.0, 0.0]);
        assert!(!tool.place_vertex());
        tool.enter_polygon_mode();
        assert!(tool.place_vertex());
        assert_eq!(tool.draft(), &[[0.0, 0.0]]);
    }

    #[test]
    fn test_finish_closes_ring() {
        let mut tool = CanvasDrawTool::new([0.0, 0.0]);
        tool.enter_polygon_mode();
        tool.place_vertex();
        tool.move_cursor(0.0, 0.001);
        tool.place_vertex();
        tool.move_cursor(0.001, 0.0);
        tool.place_vertex();

        let geometry = tool.finish_shape().unwrap();
        let Value::Polygon(rings) = geometry.value else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(tool.draft().len(), 3);
    }

    #[test]
    fn test_cursor_is_clamped_to_world() {
        let mut tool = CanvasDrawTool::new([179.0, 89.0]);
        tool.move_cursor(5.0, 5.0);
        assert_eq!(tool.cursor(), [180.0, 90.0]);
    }

    #[test]
    fn test_discard_and_undo() {
        let mut tool = CanvasDrawTool::new([1.0, 1.0]);
        tool.enter_polygon_mode();
        tool.place_vertex();
        tool.place_vertex();
        assert_eq!(tool.undo_vertex(), Some([1.0, 1.0]));
        tool.discard_draft();
        assert!(tool.draft().is_empty());
        assert!(tool.finish_shape().is_none());
    }
}
