// app.rs

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::path::{Path, PathBuf};

use crate::area::to_hectares;
use crate::canvas_tool::CanvasDrawTool;
use crate::drawing::{DrawingState, SessionOrigin};
use crate::error::PlotError;
use crate::export;
use crate::map_view::{MapLayer, Viewport};
use crate::plot::{CultureType, Plot, PlotFields};
use crate::render_sync::DisplayColor;
use crate::selection::CameraDirective;
use crate::store::JsonFileStore;
use crate::workspace::PlotWorkspace;

pub type Workspace = PlotWorkspace<JsonFileStore, CanvasDrawTool, MapLayer>;

/// File name of the PNG export inside the output directory.
pub const EXPORT_FILE_NAME: &str = "plots.png";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentScreen {
    PlotMap,
    Help,
}

/// Input mode of the list side of the screen. Drawing and confirming a
/// session are not listed here: they are read from the workspace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Navigation,
    Searching,
    EditingImportPath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Name,
    CultureType,
    Description,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Name => FormField::CultureType,
            FormField::CultureType => FormField::Description,
            FormField::Description => FormField::Name,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Name => FormField::Description,
            FormField::CultureType => FormField::Name,
            FormField::Description => FormField::CultureType,
        }
    }
}

/// Fields of the confirmation form shown while a session is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotForm {
    pub name: String,
    pub description: String,
    pub culture_type: CultureType,
    pub focus: FormField,
    pub cursor: usize,
    pub error: Option<String>,
}

impl Default for PlotForm {
    fn default() -> Self {
        PlotForm {
            name: String::new(),
            description: String::new(),
            culture_type: CultureType::Wheat,
            focus: FormField::Name,
            cursor: 0,
            error: None,
        }
    }
}

impl PlotForm {
    pub fn fields(&self) -> PlotFields {
        PlotFields {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            culture_type: self.culture_type.clone(),
        }
    }

    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Description => Some(&mut self.description),
            FormField::CultureType => None,
        }
    }

    fn focus(&mut self, field: FormField) {
        self.focus = field;
        self.cursor = match field {
            FormField::Name => self.name.chars().count(),
            FormField::Description => self.description.chars().count(),
            FormField::CultureType => 0,
        };
    }
}

pub struct App {
    pub current_screen: CurrentScreen,
    pub current_mode: AppMode,
    pub should_quit: bool,

    pub workspace: Workspace,
    pub viewport: Viewport,

    // Plot list
    pub selected_list_index: usize, // Index in `filtered_plot_indices`
    pub scroll_offset: usize,
    pub filtered_plot_indices: Vec<usize>, // Indices into `workspace.plots()`

    // Search
    pub search_query_buffer: String,
    pub search_query_cursor: usize,
    pub previous_search_query_buffer: String,

    // Import path editing
    pub import_path_buffer: String,
    pub import_path_cursor: usize,

    pub form: PlotForm,
    pub output_dir: PathBuf,

    // UI related
    pub notification: String,
    pub help_keybinds: Vec<String>,

    // Areas of the last frame, for mouse hit testing
    pub content_area: Rect, // Both panes
    pub map_area: Rect,     // Inside the map border
    pub list_area: Rect,    // Including the list border

    pub left_pane_width_percentage: u16,
    pub is_resizing: bool,
}

impl App {
    pub fn new(workspace: Workspace, viewport: Viewport, output_dir: PathBuf) -> App {
        let mut app = App {
            current_screen: CurrentScreen::PlotMap,
            current_mode: AppMode::Navigation,
            should_quit: false,

            workspace,
            viewport,

            selected_list_index: 0,
            scroll_offset: 0,
            filtered_plot_indices: Vec::new(),

            search_query_buffer: String::new(),
            search_query_cursor: 0,
            previous_search_query_buffer: String::new(),

            import_path_buffer: String::new(),
            import_path_cursor: 0,

            form: PlotForm::default(),
            output_dir,

            notification: String::from("Press D to draw a plot or I to import one"),
            help_keybinds: vec![
                "J/K or Arrow Keys: Navigate plot list".to_string(),
                "Enter: Fly to highlighted plot".to_string(),
                "Click: Select plot on map or in list".to_string(),
                "D: Draw a new plot".to_string(),
                "I: Import a GeoJSON file or pasted GeoJSON".to_string(),
                "/: Search by name or culture".to_string(),
                "+/-: Zoom, Shift+H/J/K/L: Pan".to_string(),
                "E: Export plots to PNG".to_string(),
                "R: Reload plots".to_string(),
                "Esc: Clear selection".to_string(),
                "Q: Quit the application".to_string(),
                "H: Show Help screen".to_string(),
            ],

            content_area: Rect::default(),
            map_area: Rect::default(),
            list_area: Rect::default(),

            left_pane_width_percentage: 35,
            is_resizing: false,
        };
        app.refresh_filter();
        app
    }

    /// Label of the effective input mode, for the footer.
    pub fn mode_name(&self) -> &'static str {
        match self.workspace.drawing_state() {
            DrawingState::Drawing => "Drawing",
            DrawingState::PendingConfirmation(_) => "Confirm plot",
            DrawingState::Idle => match self.current_mode {
                AppMode::Navigation => "Navigation",
                AppMode::Searching => "Searching",
                AppMode::EditingImportPath => "Import path",
            },
        }
    }

    pub fn filtered_plots(&self) -> impl Iterator<Item = &Plot> {
        let plots = self.workspace.plots();
        self.filtered_plot_indices
            .iter()
            .filter_map(move |&i| plots.get(i))
    }

    pub fn plot_color(&self, plot: &Plot) -> Option<DisplayColor> {
        self.workspace.color_of(plot.id)
    }

    /// Recomputes the filtered list after the search term or plot list changed.
    pub fn refresh_filter(&mut self) {
        let term = self.search_query_buffer.clone();
        self.filtered_plot_indices = self
            .workspace
            .plots()
            .iter()
            .enumerate()
            .filter(|(_, plot)| plot_matches(plot, &term))
            .map(|(i, _)| i)
            .collect();
        if self.filtered_plot_indices.is_empty() {
            self.selected_list_index = 0;
        } else if self.selected_list_index >= self.filtered_plot_indices.len() {
            self.selected_list_index = self.filtered_plot_indices.len() - 1;
        }
        self.scroll_offset = self.scroll_offset.min(self.selected_list_index);
    }

    /// Called after every frame. The first frame makes the map layer ready.
    pub fn on_frame_drawn(&mut self) {
        use crate::render_sync::RenderSurface;
        if !self.workspace.surface().is_ready() {
            self.workspace.surface_mut().mark_ready();
            self.workspace.surface_ready();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.current_screen == CurrentScreen::Help {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Esc) {
                self.current_screen = CurrentScreen::PlotMap;
            }
            return;
        }

        if self.workspace.current_session().is_some() {
            self.handle_form_key(key);
        } else if self.workspace.is_drawing() {
            self.handle_drawing_key(key);
        } else {
            match self.current_mode {
                AppMode::Navigation => self.handle_navigation_key(key),
                AppMode::Searching => self.handle_search_key(key),
                AppMode::EditingImportPath => self.handle_import_key(key),
            }
        }
        debug_assert!(self.workspace.tool_in_sync());
    }

    fn handle_navigation_key(&mut self, key: KeyEvent) {
        let step = self.viewport.lon_span() / 10.0;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') => self.current_screen = CurrentScreen::Help,
            KeyCode::Char('j') | KeyCode::Down => self.move_list_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list_selection(-1),
            KeyCode::Enter => self.select_list_item(self.selected_list_index),
            KeyCode::Char('d') => self.start_drawing(),
            KeyCode::Char('i') => {
                self.current_mode = AppMode::EditingImportPath;
                self.import_path_cursor = self.import_path_buffer.chars().count();
                self.notification = "Path of the GeoJSON file to import:".to_string();
            }
            KeyCode::Char('/') => {
                self.previous_search_query_buffer = self.search_query_buffer.clone();
                self.search_query_cursor = self.search_query_buffer.chars().count();
                self.current_mode = AppMode::Searching;
                self.notification = "Search by plot name or culture".to_string();
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_by(1.0),
            KeyCode::Char('-') => self.viewport.zoom_by(-1.0),
            KeyCode::Char('H') => self.viewport.pan(-step, 0.0),
            KeyCode::Char('L') => self.viewport.pan(step, 0.0),
            KeyCode::Char('K') => self.viewport.pan(0.0, step),
            KeyCode::Char('J') => self.viewport.pan(0.0, -step),
            KeyCode::Esc => {
                self.workspace.clear_selection();
                self.notification = "Selection cleared".to_string();
            }
            _ => {}
        }
    }

    fn handle_drawing_key(&mut self, key: KeyEvent) {
        let step = self.viewport.cursor_step();
        let tool = self.workspace.tool_mut();
        match key.code {
            KeyCode::Left => tool.move_cursor(-step, 0.0),
            KeyCode::Right => tool.move_cursor(step, 0.0),
            KeyCode::Up => tool.move_cursor(0.0, step),
            KeyCode::Down => tool.move_cursor(0.0, -step),
            KeyCode::Char(' ') => {
                tool.place_vertex();
            }
            KeyCode::Backspace => {
                tool.undo_vertex();
            }
            KeyCode::Enter => self.finish_shape(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_by(1.0),
            KeyCode::Char('-') => self.viewport.zoom_by(-1.0),
            KeyCode::Esc => {
                self.workspace.cancel();
                self.notification = "Drawing cancelled".to_string();
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.workspace.cancel();
                self.form = PlotForm::default();
                self.notification = "Plot discarded".to_string();
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.form.focus(self.form.focus.next()),
            KeyCode::BackTab | KeyCode::Up => self.form.focus(self.form.focus.previous()),
            code if self.form.focus == FormField::CultureType => {
                if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    self.form.culture_type = self.form.culture_type.next_choice();
                }
            }
            code => {
                let mut cursor = self.form.cursor;
                if let Some(buffer) = self.form.focused_buffer() {
                    edit_buffer(buffer, &mut cursor, code);
                }
                self.form.cursor = cursor;
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.current_mode = AppMode::Navigation;
                self.notification = format!("{} plots match", self.filtered_plot_indices.len());
            }
            KeyCode::Esc => {
                self.search_query_buffer = self.previous_search_query_buffer.clone();
                self.current_mode = AppMode::Navigation;
                self.refresh_filter();
                self.notification = "Search cancelled".to_string();
            }
            code => {
                if edit_buffer(
                    &mut self.search_query_buffer,
                    &mut self.search_query_cursor,
                    code,
                ) {
                    self.selected_list_index = 0;
                    self.scroll_offset = 0;
                    self.refresh_filter();
                }
            }
        }
    }

    fn handle_import_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.current_mode = AppMode::Navigation;
                let input = self.import_path_buffer.trim().to_string();
                self.import(&input);
            }
            KeyCode::Esc => {
                self.current_mode = AppMode::Navigation;
                self.notification = "Import cancelled".to_string();
            }
            code => {
                edit_buffer(
                    &mut self.import_path_buffer,
                    &mut self.import_path_cursor,
                    code,
                );
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.current_screen != CurrentScreen::PlotMap {
            return;
        }
        let divider_x = self.map_area.x.saturating_sub(1);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if mouse.column == divider_x && self.contains_row(mouse.row) {
                    self.is_resizing = true;
                } else if contains(self.map_area, mouse.column, mouse.row) {
                    self.click_map(mouse.column, mouse.row);
                } else if !self.workspace.is_drawing()
                    && self.workspace.current_session().is_none()
                {
                    if let Some(row) = self.list_row_at(mouse.column, mouse.row) {
                        self.select_list_item(self.scroll_offset + row);
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.is_resizing => {
                let total = self.content_area.width;
                if total > 0 {
                    let pct = (mouse.column.saturating_sub(self.content_area.x) as u32 * 100
                        / total as u32) as u16;
                    self.left_pane_width_percentage = pct.clamp(20, 80);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.is_resizing = false,
            MouseEventKind::ScrollUp if contains(self.map_area, mouse.column, mouse.row) => {
                self.viewport.zoom_by(1.0)
            }
            MouseEventKind::ScrollDown if contains(self.map_area, mouse.column, mouse.row) => {
                self.viewport.zoom_by(-1.0)
            }
            _ => {}
        }
    }

    /// Visible list row under a click, ignoring the border cells.
    fn list_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.list_area;
        if !contains(area, column, row) {
            return None;
        }
        let (x, y) = (column - area.x, row - area.y);
        if x == 0 || x + 1 >= area.width || y == 0 || y + 1 >= area.height {
            return None;
        }
        Some(y as usize - 1)
    }

    fn contains_row(&self, row: u16) -> bool {
        row >= self.map_area.y && row < self.map_area.y + self.map_area.height
    }

    fn click_map(&mut self, column: u16, row: u16) {
        let Some(position) = self.viewport.cell_to_lon_lat(self.map_area, column, row) else {
            return;
        };
        if self.workspace.current_session().is_some() {
            return;
        }
        if self.workspace.is_drawing() {
            let tool = self.workspace.tool_mut();
            tool.set_cursor(position);
            tool.place_vertex();
            return;
        }
        match self.workspace.pick(position[0], position[1]) {
            Some(directive) => self.follow(directive),
            None => {
                if self.workspace.selected().is_none() {
                    self.notification = format!("{:.5}, {:.5}", position[1], position[0]);
                }
            }
        }
    }

    fn move_list_selection(&mut self, delta: isize) {
        let len = self.filtered_plot_indices.len();
        if len == 0 {
            return;
        }
        let next = (self.selected_list_index as isize + delta).clamp(0, len as isize - 1);
        self.selected_list_index = next as usize;
        self.select_list_item(self.selected_list_index);
    }

    fn select_list_item(&mut self, list_index: usize) {
        let Some(&plot_index) = self.filtered_plot_indices.get(list_index) else {
            return;
        };
        let Some(id) = self.workspace.plots().get(plot_index).map(|p| p.id) else {
            return;
        };
        self.selected_list_index = list_index;
        if let Some(directive) = self.workspace.select(id) {
            self.follow(directive);
        }
    }

    fn follow(&mut self, directive: CameraDirective) {
        self.viewport.apply(directive);
        if let Some(plot) = self.workspace.selected() {
            self.notification = format!(
                "{} | {} | {:.2} ha ({:.0} m²)",
                plot.name,
                plot.culture_type,
                to_hectares(plot.surface),
                plot.surface
            );
        }
    }

    fn start_drawing(&mut self) {
        if self.workspace.start_drawing() {
            self.workspace.tool_mut().set_cursor(self.viewport.center);
            self.notification =
                "Arrows move, Space adds a vertex, Enter closes the polygon, Esc cancels"
                    .to_string();
        }
    }

    fn finish_shape(&mut self) {
        let Some(geometry) = self.workspace.tool().finish_shape() else {
            return;
        };
        match self.workspace.on_shape_completed(geometry) {
            Ok(()) => self.open_form(),
            Err(e) if e.is_reported() => self.notification = e.to_string(),
            Err(e) => log::debug!("{}", e),
        }
    }

    /// Imports from a file path, or from GeoJSON pasted into the import bar.
    fn import(&mut self, input: &str) {
        let imported = if input.starts_with('{') {
            self.workspace.import_geojson(input)
        } else {
            self.workspace.import_file(Path::new(input))
        };
        match imported {
            Ok(()) => self.open_form(),
            Err(e) => {
                log::warn!("Import failed: {}", e);
                self.notification = e.to_string();
            }
        }
    }

    fn open_form(&mut self) {
        self.form = PlotForm::default();
        if let Some(session) = self.workspace.current_session() {
            let method = match session.origin {
                SessionOrigin::Drawn => "geodesic",
                SessionOrigin::Imported => "planar estimate",
            };
            self.notification = format!(
                "New plot: {:.2} ha ({})",
                to_hectares(session.area),
                method
            );
        }
    }

    fn submit_form(&mut self) {
        match self.workspace.submit(self.form.fields()) {
            Ok(plot) => {
                self.notification = format!(
                    "Saved {} ({:.2} ha)",
                    plot.name,
                    to_hectares(plot.surface)
                );
                self.form = PlotForm::default();
                self.refresh_filter();
            }
            Err(e @ PlotError::PersistenceFailure(_)) => {
                self.form.error = Some(format!("{} (Enter to retry, Esc to cancel)", e));
            }
            Err(e) => self.form.error = Some(e.to_string()),
        }
    }

    fn reload(&mut self) {
        match self.workspace.refresh() {
            Ok(()) => {
                self.refresh_filter();
                self.notification = format!("Loaded {} plots", self.workspace.plots().len());
            }
            Err(e) => {
                log::error!("Reloading plots failed: {}", e);
                self.notification = format!("Reload failed: {}", e);
            }
        }
    }

    fn export(&mut self) {
        let path = self.output_dir.join(EXPORT_FILE_NAME);
        let selected = self.workspace.selected().map(|p| p.id);
        let result = std::fs::create_dir_all(&self.output_dir)
            .map_err(Box::<dyn std::error::Error>::from)
            .and_then(|_| export::export_png(self.workspace.surface(), selected, &path));
        self.notification = match result {
            Ok(count) => format!("Exported {} plots to {}", count, path.display()),
            Err(e) => {
                log::error!("Export failed: {}", e);
                format!("Export failed: {}", e)
            }
        };
    }
}

/// Case-insensitive substring match on the plot name or culture label.
pub fn plot_matches(plot: &Plot, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || plot.name.to_lowercase().contains(&term)
        || plot.culture_type.label().to_lowercase().contains(&term)
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// Applies an editing key to a text buffer. `cursor` counts characters.
/// Returns whether the buffer changed.
pub fn edit_buffer(buffer: &mut String, cursor: &mut usize, code: KeyCode) -> bool {
    let len = buffer.chars().count();
    if *cursor > len {
        *cursor = len;
    }
    let byte_index = |s: &str, char_index: usize| {
        s.char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    };

    match code {
        KeyCode::Char(c) => {
            let at = byte_index(buffer, *cursor);
            buffer.insert(at, c);
            *cursor += 1;
            true
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
            false
        }
        KeyCode::Right => {
            if *cursor < len {
                *cursor += 1;
            }
            false
        }
        KeyCode::Home => {
            *cursor = 0;
            false
        }
        KeyCode::End => {
            *cursor = len;
            false
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let at = byte_index(buffer, *cursor);
                buffer.remove(at);
                true
            } else {
                false
            }
        }
        KeyCode::Delete => {
            if *cursor < len {
                let at = byte_index(buffer, *cursor);
                buffer.remove(at);
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::tests::square;
    use crate::plot::{PlotDraft, PlotId};
    use crate::render_sync::PlotRenderSync;
    use crate::render_sync::tests::plot;
    use crate::selection::SelectionController;
    use crate::store::PlotStore;

    fn app_with_plots(tag: &str, count: usize) -> App {
        let path = std::env::temp_dir()
            .join(format!("parcel-mapper-app-{}-{}", tag, std::process::id()))
            .join("plots.json");
        let _ = std::fs::remove_file(&path);
        let mut store = JsonFileStore::open(&path).unwrap();
        for i in 0..count {
            let fields = PlotFields {
                name: format!("Field {}", i),
                description: None,
                culture_type: CultureType::Wheat,
            };
            store
                .create_plot(PlotDraft::new(fields, 100.0, square(0.01)))
                .unwrap();
        }
        let workspace = PlotWorkspace::new(
            store,
            CanvasDrawTool::new([0.0, 0.0]),
            MapLayer::new(),
            SelectionController::default(),
            PlotRenderSync::with_seed(7),
        );
        let mut app = App::new(workspace, Viewport::new([0.005, 0.005], 12.0), std::env::temp_dir());
        app.workspace.refresh().unwrap();
        app.refresh_filter();

        // List pane with two visible rows, map pane to its right.
        app.content_area = Rect::new(0, 0, 62, 10);
        app.list_area = Rect::new(0, 0, 20, 4);
        app.map_area = Rect::new(22, 0, 40, 10);
        app
    }

    fn mouse(app: &mut App, kind: MouseEventKind, column: u16, row: u16) {
        app.handle_mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    fn click(app: &mut App, column: u16, row: u16) {
        mouse(app, MouseEventKind::Down(MouseButton::Left), column, row);
    }

    fn selected_id(app: &App) -> Option<PlotId> {
        app.workspace.selected().map(|p| p.id)
    }

    #[test]
    fn test_list_click_selects_visible_row() {
        let mut app = app_with_plots("list-rows", 5);
        let ids: Vec<PlotId> = app.workspace.plots().iter().map(|p| p.id).collect();
        app.scroll_offset = 1;

        click(&mut app, 5, 1);
        assert_eq!(selected_id(&app), Some(ids[1]));
        assert_eq!(app.selected_list_index, 1);

        click(&mut app, 5, 2);
        assert_eq!(selected_id(&app), Some(ids[2]));
    }

    #[test]
    fn test_list_border_clicks_select_nothing() {
        let mut app = app_with_plots("list-border", 5);
        app.scroll_offset = 1;

        // Bottom border, top border, left border, right border.
        for (column, row) in [(5, 3), (5, 0), (0, 1), (19, 2)] {
            click(&mut app, column, row);
            assert_eq!(selected_id(&app), None, "click at ({}, {})", column, row);
        }
    }

    #[test]
    fn test_map_click_picks_topmost_plot_and_empty_map_clears() {
        let mut app = app_with_plots("map-click", 3);
        let topmost = app.workspace.plots().last().map(|p| p.id);

        click(&mut app, 42, 5);
        assert_eq!(selected_id(&app), topmost);

        app.viewport = Viewport::new([0.005, 0.005], 12.0);
        click(&mut app, 23, 0);
        assert_eq!(selected_id(&app), None);
    }

    #[test]
    fn test_map_click_while_drawing_places_vertex() {
        let mut app = app_with_plots("map-draw", 1);
        app.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
        assert!(app.workspace.is_drawing());

        click(&mut app, 42, 5);
        assert_eq!(app.workspace.tool().draft().len(), 1);
        assert_eq!(selected_id(&app), None);
    }

    #[test]
    fn test_divider_drag_uses_full_content_width() {
        let mut app = app_with_plots("resize", 0);
        click(&mut app, 21, 2);
        assert!(app.is_resizing);

        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), 31, 2);
        assert_eq!(app.left_pane_width_percentage, 50);

        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), 31, 2);
        assert!(!app.is_resizing);
    }

    #[test]
    fn test_import_bar_accepts_pasted_geojson() {
        let mut app = app_with_plots("import-inline", 0);
        app.current_mode = AppMode::EditingImportPath;
        app.import_path_buffer =
            r#"{"type":"Polygon","coordinates":[[[0,0],[0,1],[1,1],[0,0]]]}"#.to_string();
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        let session = app.workspace.current_session().unwrap();
        assert_eq!(session.origin, SessionOrigin::Imported);
        assert_eq!(app.current_mode, AppMode::Navigation);
    }

    #[test]
    fn test_edit_buffer_inserts_and_deletes_multibyte() {
        let mut buffer = String::from("Ble");
        let mut cursor = 2;
        assert!(edit_buffer(&mut buffer, &mut cursor, KeyCode::Char('é')));
        assert_eq!(buffer, "Blée");
        assert_eq!(cursor, 3);
        assert!(edit_buffer(&mut buffer, &mut cursor, KeyCode::Delete));
        assert_eq!(buffer, "Blé");
        assert!(edit_buffer(&mut buffer, &mut cursor, KeyCode::Backspace));
        assert_eq!(buffer, "Bl");
        assert!(!edit_buffer(&mut buffer, &mut cursor, KeyCode::Right));
        assert_eq!(cursor, 2);
        assert!(!edit_buffer(&mut buffer, &mut cursor, KeyCode::Enter));
    }

    #[test]
    fn test_plot_matches_name_or_culture() {
        let mut p = plot(3, CultureType::Olives);
        p.name = "North Field".to_string();
        assert!(plot_matches(&p, ""));
        assert!(plot_matches(&p, "north"));
        assert!(plot_matches(&p, "OLIV"));
        assert!(!plot_matches(&p, "maize"));
        assert_eq!(p.id, PlotId(3));
    }

    #[test]
    fn test_form_field_cycle() {
        let mut form = PlotForm::default();
        form.name = "Orchard".to_string();
        form.focus(form.focus.previous());
        assert_eq!(form.focus, FormField::Description);
        form.focus(form.focus.next());
        assert_eq!(form.focus, FormField::Name);
        assert_eq!(form.cursor, 7);
        assert_eq!(form.fields().culture_type, CultureType::Wheat);
    }
}
