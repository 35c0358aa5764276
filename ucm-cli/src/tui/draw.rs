//! Frame painting
//!
//! [`draw_frame`] lays a session [`Frame`] out with ratatui widgets: a tab
//! bar, the active list as a table (or an open panel), then the filter,
//! status and key hint lines. [`TerminalRenderer`] owns the ratatui terminal
//! and the table scroll state. Any backend works, so the layout is tested
//! against `TestBackend`.

use std::io::{self, stdout, Stdout};

use chrono::{DateTime, Utc};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Paragraph, Row as TableRow, Table, TableState, Tabs, Wrap,
};
use ratatui::{Frame as Canvas, Terminal};
use tracing::warn;
use ucm_core::{
    Container, FocusTarget, Frame, FrameRows, Panel, Renderer, Row, SortPolicy, StatusLevel, View,
};

/// Lays out one session frame on a ratatui canvas
///
/// `table` keeps the scroll offset between frames so the selection moves
/// inside the visible window before the window itself scrolls.
pub fn draw_frame(
    canvas: &mut Canvas<'_>,
    frame: &Frame<'_>,
    table: &mut TableState,
    now: DateTime<Utc>,
) {
    let [tabs_area, body_area, filter_area, status_area, hints_area] = split(canvas.size());

    draw_tabs(canvas, frame, tabs_area);
    match frame.panel {
        Some(panel) => draw_panel(canvas, panel, body_area),
        None => draw_list(canvas, frame, table, body_area, now),
    }
    draw_filter(canvas, frame, filter_area);
    draw_status(canvas, frame, status_area);
    canvas.render_widget(Paragraph::new(hint_line(frame)), hints_area);
}

fn split(area: Rect) -> [Rect; 5] {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3], chunks[4]]
}

fn draw_tabs(canvas: &mut Canvas<'_>, frame: &Frame<'_>, area: Rect) {
    let flags = view_flags(frame);
    let [tabs_area, flags_area] = {
        let chunks = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(display_width(&flags)),
        ])
        .split(area);
        [chunks[0], chunks[1]]
    };

    let highlight = if frame.focus == Some(FocusTarget::Tabs) {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let selected = View::ALL
        .iter()
        .position(|view| *view == frame.view)
        .unwrap_or(0);
    let tabs = Tabs::new(View::ALL.iter().map(|view| view.label()))
        .select(selected)
        .highlight_style(highlight);

    canvas.render_widget(tabs, tabs_area);
    canvas.render_widget(
        Paragraph::new(flags).style(Style::default().fg(Color::DarkGray)),
        flags_area,
    );
}

fn view_flags(frame: &Frame<'_>) -> String {
    let mut flags = Vec::new();
    match frame.view {
        View::Ssh => {
            if frame.sort == SortPolicy::Recent {
                flags.push("sorted by recent");
            }
            if frame.favorites_only {
                flags.push("favorites only");
            }
        }
        View::Docker => {
            if frame.show_all {
                flags.push("all containers");
            }
        }
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!("({})", flags.join(", "))
    }
}

fn draw_list(
    canvas: &mut Canvas<'_>,
    frame: &Frame<'_>,
    state: &mut TableState,
    area: Rect,
    now: DateTime<Utc>,
) {
    let (header, rows, widths) = match frame.rows {
        FrameRows::Connections(rows) if rows.is_empty() => {
            canvas.render_widget(Paragraph::new("No connections found."), area);
            return;
        }
        FrameRows::Containers(rows) if rows.is_empty() => {
            canvas.render_widget(Paragraph::new("No containers found."), area);
            return;
        }
        FrameRows::Connections(rows) => connection_table(rows, now),
        FrameRows::Containers(rows) => container_table(rows),
    };

    let header = TableRow::new(header).style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(rows, widths)
        .header(header)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    state.select(frame.selected);
    canvas.render_stateful_widget(table, area, state);
}

type TableParts = (Vec<&'static str>, Vec<TableRow<'static>>, Vec<Constraint>);

fn connection_table(rows: &[Row], now: DateTime<Utc>) -> TableParts {
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.connection.name.clone(),
                row.connection.destination(),
                row.connection.category.clone().unwrap_or_default(),
                row.history
                    .as_ref()
                    .map_or_else(|| "never".to_string(), |h| h.format_age(now)),
            ]
        })
        .collect();
    let favorites = rows.iter().map(|row| row.favorite);

    let header = vec!["", "NAME", "DESTINATION", "CATEGORY", "LAST USED"];
    let widths = column_widths(&header, &cells);
    let table_rows = favorites
        .zip(cells)
        .map(|(favorite, cells)| {
            let marker = if favorite {
                Cell::from("*").style(Style::default().fg(Color::Yellow))
            } else {
                Cell::from(" ")
            };
            TableRow::new(std::iter::once(marker).chain(cells.into_iter().map(Cell::from)))
        })
        .collect();
    (header, table_rows, widths)
}

fn container_table(rows: &[Container]) -> TableParts {
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|c| [c.id.clone(), c.name.clone(), c.image.clone(), c.status.clone()])
        .collect();
    let running = rows.iter().map(Container::is_running);

    let header = vec!["", "ID", "NAME", "IMAGE", "STATUS"];
    let widths = column_widths(&header, &cells);
    let table_rows = running
        .zip(cells)
        .map(|(running, cells)| {
            let marker = if running {
                Cell::from("+").style(Style::default().fg(Color::Green))
            } else {
                Cell::from(" ")
            };
            TableRow::new(std::iter::once(marker).chain(cells.into_iter().map(Cell::from)))
        })
        .collect();
    (header, table_rows, widths)
}

/// One marker column, then columns as wide as their widest cell; the last
/// column takes what is left
fn column_widths(header: &[&str], cells: &[[String; 4]]) -> Vec<Constraint> {
    let mut widths = vec![Constraint::Length(1)];
    for column in 0..4 {
        let widest = cells
            .iter()
            .map(|row| display_width(&row[column]))
            .chain(std::iter::once(display_width(header[column + 1])))
            .max()
            .unwrap_or(0);
        widths.push(if column == 3 {
            Constraint::Min(widest)
        } else {
            Constraint::Length(widest)
        });
    }
    widths
}

fn display_width(text: &str) -> u16 {
    u16::try_from(Span::raw(text).width()).unwrap_or(u16::MAX)
}

fn draw_panel(canvas: &mut Canvas<'_>, panel: Panel<'_>, area: Rect) {
    let block = |title: String| Block::default().borders(Borders::ALL).title(title);

    let widget = match panel {
        Panel::Text { title, body } => Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(block(title.to_string())),
        Panel::Logs {
            title,
            lines,
            paused,
        } => {
            // Follow the tail
            let height = usize::from(area.height.saturating_sub(2));
            let tail: Vec<Line<'_>> = lines
                .iter()
                .skip(lines.len().saturating_sub(height))
                .map(|line| Line::raw(line.as_str()))
                .collect();
            let title = if paused {
                format!("{title} [paused]")
            } else {
                title.to_string()
            };
            Paragraph::new(tail).block(block(title))
        }
        Panel::Confirm { prompt } => Paragraph::new(format!("{prompt} (y/N)"))
            .style(Style::default().add_modifier(Modifier::BOLD))
            .wrap(Wrap { trim: false })
            .block(block("Confirm".to_string())),
    };
    canvas.render_widget(widget, area);
}

fn draw_filter(canvas: &mut Canvas<'_>, frame: &Frame<'_>, area: Rect) {
    let line = if frame.filter_active {
        let prompt = "Filter: ";
        let cursor_x = area
            .x
            .saturating_add(display_width(prompt))
            .saturating_add(display_width(frame.filter_buffer));
        canvas.set_cursor(cursor_x.min(area.right().saturating_sub(1)), area.y);
        Line::from(vec![
            Span::styled(prompt, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(frame.filter_buffer, Style::default().fg(Color::Cyan)),
        ])
    } else if frame.filter_buffer.is_empty() {
        Line::styled("Press / to filter", Style::default().fg(Color::DarkGray))
    } else {
        Line::raw(format!("Filter: {}", frame.filter_buffer))
    };
    canvas.render_widget(Paragraph::new(line), area);
}

fn draw_status(canvas: &mut Canvas<'_>, frame: &Frame<'_>, area: Rect) {
    let Some(status) = frame.status else {
        return;
    };
    let style = match status.level {
        StatusLevel::Error => Style::default().fg(Color::Red),
        StatusLevel::Info => Style::default(),
    };
    canvas.render_widget(Paragraph::new(status.text.as_str()).style(style), area);
}

fn hint_line(frame: &Frame<'_>) -> Line<'static> {
    let mut spans = Vec::new();
    for (position, mnemonic) in frame.mnemonics.iter().enumerate() {
        if position > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if frame.action_cursor == Some(position) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(
            mnemonic.key,
            style.add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {}", mnemonic.label), style));
    }
    Line::from(spans)
}

/// Paints frames through a ratatui terminal
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    table: TableState,
}

impl TerminalRenderer<CrosstermBackend<Stdout>> {
    /// Creates a renderer drawing to stdout
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal size cannot be read.
    pub fn stdout() -> io::Result<Self> {
        Self::new(CrosstermBackend::new(stdout()))
    }
}

impl<B: Backend> TerminalRenderer<B> {
    /// Creates a renderer over `backend`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be read.
    pub fn new(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            table: TableState::default(),
        })
    }

    /// Forgets what is on screen so the next frame is painted in full
    ///
    /// # Errors
    ///
    /// Returns an error if the screen cannot be cleared.
    pub fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let table = &mut self.table;
        let now = Utc::now();
        self.terminal
            .draw(|canvas| draw_frame(canvas, frame, table, now))?;
        Ok(())
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, frame: &Frame<'_>) {
        if let Err(e) = self.draw(frame) {
            warn!(error = %e, "Failed to draw frame");
        }
    }
}
