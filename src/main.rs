// main.rs

mod app;
mod area;
mod canvas_tool;
mod config;
mod drawing;
mod error;
mod event;
mod export;
mod import;
mod map_view;
mod plot;
mod render_sync;
mod selection;
mod store;
mod ui;
mod workspace;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::time::Duration;

use crate::app::App;
use crate::canvas_tool::CanvasDrawTool;
use crate::config::AppConfig;
use crate::event::{Event, EventHandler};
use crate::map_view::{MapLayer, Viewport};
use crate::render_sync::PlotRenderSync;
use crate::selection::SelectionController;
use crate::store::JsonFileStore;
use crate::workspace::PlotWorkspace;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Logs go to a file: stderr belongs to the terminal UI.
fn init_logging(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .target(env_logger::Target::Pipe(Box::new(file)))
    .init();
    Ok(())
}

fn build_app(config: &AppConfig) -> Result<App, Box<dyn Error>> {
    let store = JsonFileStore::open(&config.store_path)?;
    log::info!("Using plot store {}", store.path().display());

    let render = match config.color_seed {
        Some(seed) => PlotRenderSync::with_seed(seed),
        None => PlotRenderSync::new(),
    };
    let workspace = PlotWorkspace::new(
        store,
        CanvasDrawTool::new(config.map_center),
        MapLayer::new(),
        SelectionController::new(config.follow_zoom),
        render,
    );
    let viewport = Viewport::new(config.map_center, config.map_zoom);
    let mut app = App::new(workspace, viewport, config.output_dir.clone());

    // A failed initial load leaves an empty list; `r` retries.
    match app.workspace.refresh() {
        Ok(()) => {
            app.refresh_filter();
            if !app.workspace.plots().is_empty() {
                app.notification = format!("Loaded {} plots", app.workspace.plots().len());
            }
        }
        Err(e) => {
            log::error!("Loading plots failed: {}", e);
            app.notification = format!("Loading plots failed: {}", e);
        }
    }
    Ok(app)
}

fn setup_terminal() -> Result<Tui, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(terminal: &mut Tui, app: &mut App, tick_rate: Duration) -> Result<(), Box<dyn Error>> {
    let events = EventHandler::new(tick_rate);
    let mut needs_redraw = true;

    while !app.should_quit {
        if needs_redraw {
            terminal.draw(|frame| ui::render(frame, app))?;
            app.on_frame_drawn();
            needs_redraw = false;
        }

        match events.next(tick_rate)? {
            Some(Event::Input(key)) => {
                app.handle_key(key);
                needs_redraw = true;
            }
            Some(Event::Mouse(mouse)) => {
                app.handle_mouse(mouse);
                needs_redraw = true;
            }
            Some(Event::Resize) => needs_redraw = true,
            Some(Event::Tick) | None => {}
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path)?;
    init_logging(&config)?;
    log::info!("Starting with config {}", config_path.display());

    let mut app = build_app(&config)?;

    let mut terminal = setup_terminal()?;
    let result = run(
        &mut terminal,
        &mut app,
        Duration::from_millis(config.tick_rate_ms),
    );
    restore_terminal(&mut terminal)?;

    if let Err(e) = &result {
        log::error!("Exiting after error: {}", e);
    }
    log::info!("Exiting with {} plots", app.workspace.plots().len());
    result
}
