// ui.rs

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Wrap,
        canvas::{Canvas, Line as CanvasLine, Points},
    },
};

use crate::app::{App, AppMode, CurrentScreen, FormField};
use crate::area::to_hectares;
use crate::drawing::SessionOrigin;
use crate::render_sync::DisplayColor;

pub fn render(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)]) // Main content, then footer
        .split(frame.size());

    match app.current_screen {
        CurrentScreen::PlotMap => render_plot_map_ui(frame, app, main_layout[0]),
        CurrentScreen::Help => render_help_screen(frame, app, main_layout[0]),
    }

    // Render the footer, common across all screens
    render_footer(frame, app, main_layout[1]);
}

fn to_color(color: DisplayColor) -> Color {
    let (r, g, b) = color.to_rgb();
    Color::Rgb(r, g, b)
}

/// Renders the help screen.
fn render_help_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(" Help Screen ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut lines: Vec<Line> = vec![Line::from("Keybinds:".bold())];
    lines.extend(app.help_keybinds.iter().map(|s| Line::from(format!("  {}", s))));
    lines.push(Line::from(""));
    lines.push(Line::from("While drawing:".bold()));
    lines.push(Line::from("  Arrow Keys or Click: Move cursor / place vertex"));
    lines.push(Line::from("  Space: Place vertex, Backspace: Undo vertex"));
    lines.push(Line::from("  Enter: Close the polygon, Esc: Cancel"));
    lines.push(Line::from(""));
    lines.push(Line::from("Click & Drag Divider: Resize panels."));

    let help_text = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::LightGreen));

    frame.render_widget(help_text, area);
}

fn render_plot_map_ui(frame: &mut Frame, app: &mut App, area: Rect) {
    let text_bar = matches!(
        app.current_mode,
        AppMode::Searching | AppMode::EditingImportPath
    ) && !app.workspace.is_drawing()
        && app.workspace.current_session().is_none();

    let mut constraints = vec![
        Constraint::Length(1), // Notification
        Constraint::Length(1), // Spacer
    ];
    if text_bar {
        constraints.push(Constraint::Length(1)); // Search or import path
    }
    constraints.push(Constraint::Min(0)); // Main content area

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut current_chunk_idx = 0;

    // Notification Area
    let notification_paragraph = Paragraph::new(app.notification.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(notification_paragraph, chunks[current_chunk_idx]);
    current_chunk_idx += 2;

    if text_bar {
        let (label, buffer, cursor) = match app.current_mode {
            AppMode::EditingImportPath => (
                "Import:",
                &app.import_path_buffer,
                app.import_path_cursor,
            ),
            _ => ("Search:", &app.search_query_buffer, app.search_query_cursor),
        };
        let bar_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(chunks[current_chunk_idx]);

        frame.render_widget(
            Paragraph::new(label).style(Style::default().fg(Color::LightCyan)),
            bar_layout[0],
        );
        frame.render_widget(
            Paragraph::new(buffer.clone()).style(Style::default().fg(Color::Yellow)),
            bar_layout[1],
        );
        frame.set_cursor(bar_layout[1].x + cursor as u16, bar_layout[1].y);
        current_chunk_idx += 1;
    }

    app.content_area = chunks[current_chunk_idx];
    let main_content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(app.left_pane_width_percentage),
            Constraint::Percentage(100 - app.left_pane_width_percentage),
        ])
        .split(chunks[current_chunk_idx]);

    render_plot_panel(frame, app, main_content_layout[0]);
    render_map(frame, app, main_content_layout[1]);

    if app.workspace.current_session().is_some() {
        render_plot_form(frame, app, main_content_layout[1]);
    }

    // divider for resizing the main panels
    let divider_x_pos = main_content_layout[0].x + main_content_layout[0].width;
    for y in main_content_layout[0].y..(main_content_layout[0].y + main_content_layout[0].height) {
        let style = if app.is_resizing {
            Style::default().bg(Color::LightRed)
        } else {
            Style::default().bg(Color::DarkGray)
        };
        frame
            .buffer_mut()
            .get_mut(divider_x_pos, y)
            .set_symbol("│")
            .set_style(style);
    }
}

/// Plot list on top, details of the selected plot below.
fn render_plot_panel(frame: &mut Frame, app: &mut App, area: Rect) {
    let panel_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Title
            Constraint::Min(0),     // Plot list
            Constraint::Length(8),  // Details
        ])
        .split(area);

    let total_surface: f64 = app.workspace.plots().iter().map(|p| p.surface).sum();
    let title = Paragraph::new(format!(
        " {} plots, {:.2} ha ",
        app.workspace.plots().len(),
        to_hectares(total_surface)
    ))
    .style(Style::default().fg(Color::LightGreen).bold());
    frame.render_widget(title, panel_chunks[0]);

    let list_area = panel_chunks[1];
    app.list_area = list_area;

    // Keep the highlighted row visible.
    let max_visible_items_in_list = list_area.height.saturating_sub(2) as usize;
    if app.selected_list_index < app.scroll_offset {
        app.scroll_offset = app.selected_list_index;
    } else if max_visible_items_in_list > 0
        && app.selected_list_index >= app.scroll_offset + max_visible_items_in_list
    {
        app.scroll_offset = app.selected_list_index + 1 - max_visible_items_in_list;
    }

    let selected_id = app.workspace.selected().map(|p| p.id);
    let mut list_items: Vec<Line> = Vec::new();
    for (i, plot) in app
        .filtered_plots()
        .enumerate()
        .skip(app.scroll_offset)
        .take(max_visible_items_in_list)
    {
        let swatch_style = match app.plot_color(plot) {
            Some(color) => Style::default().fg(to_color(color)),
            None => Style::default().fg(Color::Gray),
        };
        let mut style = Style::default().fg(Color::White);
        if i == app.selected_list_index {
            style = style.bg(Color::DarkGray);
        }
        if Some(plot.id) == selected_id {
            style = style.add_modifier(Modifier::BOLD).fg(Color::Yellow);
        }
        list_items.push(Line::from(vec![
            Span::styled("■ ", swatch_style),
            Span::styled(
                format!("{} ({:.2} ha)", plot.name, to_hectares(plot.surface)),
                style,
            ),
        ]));
    }
    if list_items.is_empty() {
        list_items.push(Line::from("No plots yet").fg(Color::Gray));
    }

    let list_paragraph =
        Paragraph::new(list_items).block(Block::default().borders(Borders::ALL).title("Plots"));
    frame.render_widget(list_paragraph, list_area);

    let details_block = Block::default()
        .title(" Plot Information ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));

    let details: Vec<Line> = match app.workspace.selected() {
        Some(plot) => vec![
            Line::from(format!("{} {}", plot.id, plot.name)).bold(),
            Line::from(format!("Culture: {}", plot.culture_type)),
            Line::from(format!(
                "Surface: {:.2} ha ({:.0} m²)",
                to_hectares(plot.surface),
                plot.surface
            )),
            Line::from(format!("Created: {}", plot.created_at.format("%Y-%m-%d %H:%M"))),
            Line::from(plot.description.clone()).fg(Color::Gray),
        ],
        None => vec![Line::from("No plot selected").fg(Color::Gray)],
    };
    let details_paragraph = Paragraph::new(details)
        .block(details_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(details_paragraph, panel_chunks[2]);
}

fn render_map(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.workspace.current_session() {
        Some(_) => " Map (confirm plot) ",
        None if app.workspace.is_drawing() => " Map (drawing) ",
        None => " Map ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightCyan));
    let inner = block.inner(area);
    app.map_area = inner;

    let (x_bounds, y_bounds) = app.viewport.bounds(inner.width, inner.height);
    let selected_id = app.workspace.selected().map(|p| p.id);
    let layer = app.workspace.surface();
    let session_ring: Vec<(f64, f64)> = app
        .workspace
        .current_session()
        .and_then(|session| crate::area::outer_ring(&session.geometry))
        .map(|ring| {
            ring.iter()
                .filter_map(|p| match p.as_slice() {
                    [x, y, ..] => Some((*x, *y)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let (draft, cursor) = if app.workspace.is_drawing() {
        let tool = app.workspace.tool();
        (tool.draft().to_vec(), Some(tool.cursor()))
    } else {
        (Vec::new(), None)
    };

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for plot in layer.plots() {
                let color = if Some(plot.id) == selected_id {
                    Color::Yellow
                } else {
                    to_color(plot.color)
                };
                for ring in &plot.rings {
                    draw_path(ctx, ring.iter().copied(), color);
                }
                if let Some(&(x, y)) = plot.rings.first().and_then(|r| r.first()) {
                    ctx.print(x, y, Span::styled(plot.name.clone(), Style::default().fg(color)));
                }
            }
            ctx.layer();

            if !session_ring.is_empty() {
                draw_path(ctx, session_ring.iter().copied(), Color::LightGreen);
            }

            if !draft.is_empty() {
                draw_path(ctx, draft.iter().map(|p| (p[0], p[1])), Color::LightMagenta);
                if let (Some(last), Some(cursor)) = (draft.last(), cursor) {
                    ctx.draw(&CanvasLine {
                        x1: last[0],
                        y1: last[1],
                        x2: cursor[0],
                        y2: cursor[1],
                        color: Color::DarkGray,
                    });
                }
                let coords: Vec<(f64, f64)> = draft.iter().map(|p| (p[0], p[1])).collect();
                ctx.draw(&Points {
                    coords: &coords,
                    color: Color::White,
                });
            }
            if let Some(cursor) = cursor {
                ctx.print(cursor[0], cursor[1], Span::styled("+", Style::default().fg(Color::Red)));
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_path(
    ctx: &mut ratatui::widgets::canvas::Context,
    points: impl Iterator<Item = (f64, f64)>,
    color: Color,
) {
    let points: Vec<(f64, f64)> = points.collect();
    for pair in points.windows(2) {
        ctx.draw(&CanvasLine {
            x1: pair[0].0,
            y1: pair[0].1,
            x2: pair[1].0,
            y2: pair[1].1,
            color,
        });
    }
}

/// Confirmation form shown over the map while a session is pending.
fn render_plot_form(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(session) = app.workspace.current_session() else {
        return;
    };
    let width = area.width.min(50);
    let height = area.height.min(10);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .title(" New Plot ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let field_style = |field: FormField| {
        if app.form.focus == field {
            Style::default().fg(Color::White).bg(Color::Blue)
        } else {
            Style::default().fg(Color::White)
        }
    };
    let method = match session.origin {
        SessionOrigin::Drawn => "geodesic",
        SessionOrigin::Imported => "planar estimate",
    };

    let mut lines = vec![
        Line::from(format!(
            "Surface: {:.2} ha ({:.0} m², {})",
            to_hectares(session.area),
            session.area,
            method
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Name:        "),
            Span::styled(app.form.name.clone(), field_style(FormField::Name)),
        ]),
        Line::from(vec![
            Span::raw("Culture:     "),
            Span::styled(
                format!("< {} >", app.form.culture_type),
                field_style(FormField::CultureType),
            ),
        ]),
        Line::from(vec![
            Span::raw("Description: "),
            Span::styled(app.form.description.clone(), field_style(FormField::Description)),
        ]),
        Line::from(""),
    ];
    match &app.form.error {
        Some(error) => lines.push(Line::from(error.clone()).fg(Color::Red)),
        None => lines.push(Line::from("Enter: save, Tab: next field, Esc: discard").fg(Color::Gray)),
    }

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );

    let cursor_row = match app.form.focus {
        FormField::Name => Some(3),
        FormField::Description => Some(5),
        FormField::CultureType => None,
    };
    if let Some(row) = cursor_row {
        frame.set_cursor(popup.x + 14 + app.form.cursor as u16, popup.y + row);
    }
}

/// Renders a common footer area.
fn render_footer(frame: &mut Frame, app: &mut App, area: Rect) {
    let current_screen_name = match app.current_screen {
        CurrentScreen::PlotMap => "Plot Map",
        CurrentScreen::Help => "Help",
    };

    let footer_text = Line::from(vec![
        Span::raw("Screen: "),
        Span::styled(
            current_screen_name,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Mode: "),
        Span::styled(
            app.mode_name(),
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | Zoom {:.0} ", app.viewport.zoom)),
        Span::raw(" | Press "),
        Span::styled(
            "q",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        Span::raw(" to quit "),
        Span::raw(" | Press "),
        Span::styled(
            "h",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Green),
        ),
        Span::raw(" for Help "),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}
