use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::remote::RecordService;

use super::app::{App, Mode};
use super::edit::FormField;
use super::panes::Column;

const BROWSE_HELP: &str =
    "/: search  1-4: sort  h/l: page  a: add  Enter: edit  d: delete  r: reload  q: quit";
const SEARCH_HELP: &str = "Type to filter  Enter/Esc: back to table";
const DIALOG_HELP: &str = "Tab/Shift+Tab: field  Enter: save  Esc: cancel";
const CONFIRM_HELP: &str = "y/Enter: delete  n/Esc: cancel";
const LABEL_WIDTH: u16 = 14;

pub fn render<B: Backend, S: RecordService>(terminal: &mut Terminal<B>, app: &mut App<'_, S>) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame<S: RecordService>(frame: &mut Frame<'_>, app: &mut App<'_, S>) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_search(frame, layout[1], app);
    draw_table(frame, layout[2], app);
    draw_pagination(frame, layout[3], app);
    draw_footer(frame, layout[4], app);
    draw_dialog(frame, size, app);
    draw_confirm_modal(frame, size, app);
}

fn draw_header<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &App<'_, S>) {
    let state = app.store.state();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(area);

    let title = Line::from(vec![
        Span::styled("ORGDESK", header_text_style(app).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("organizations", header_text_style(app)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let count = format!("{} of {} records", state.filtered_len(), state.records().len());
    frame.render_widget(
        Paragraph::new(count)
            .style(header_text_style(app))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_search<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &App<'_, S>) {
    let active = app.mode == Mode::Search;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("SEARCH DIRECTOR", header_text_style(app)))
        .border_style(border_style(app, active));
    let inner = block.inner(area);

    frame.render_widget(
        Paragraph::new(app.search_input.value().to_string()).block(block),
        area,
    );

    if active && inner.width > 0 {
        let x = inner
            .x
            .saturating_add(app.search_input.visual_cursor() as u16)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
}

fn draw_table<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &App<'_, S>) {
    let state = app.store.state();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, app.mode == Mode::Browse));

    let rows_on_page = state.page_slice();
    if rows_on_page.is_empty() {
        let message = match state.load_error() {
            Some(err) if state.records().is_empty() => format!("Could not load records: {err}"),
            _ if state.records().is_empty() => "No records".to_string(),
            _ if state.filtered_len() == 0 => "No matching records".to_string(),
            _ => "Page is empty".to_string(),
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_centered_words(frame, inner, &message);
        return;
    }

    let sort = state.sort();
    let header = Row::new(Column::ALL.iter().map(|column| {
        let mut title = format!("{} {}", column.digit(), column.title());
        if let Some(sort) = sort.filter(|sort| sort.key == column.sort_key()) {
            title.push(' ');
            title.push_str(sort.direction.arrow());
        }
        Cell::from(title)
    }))
    .style(header_text_style(app).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = rows_on_page
        .iter()
        .map(|record| Row::new(Column::ALL.iter().map(|column| Cell::from(column.cell(record)))))
        .collect();

    let widths: Vec<Constraint> = Column::ALL
        .iter()
        .map(|column| Constraint::Percentage(column.width_percent()))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(selection_style(app));

    let mut table_state = TableState::default();
    table_state.select(Some(app.selected.min(rows_on_page.len() - 1)));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn draw_pagination<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &App<'_, S>) {
    let state = app.store.state();
    let total = state.page_count();
    let current = state.current_page();

    let mut spans: Vec<Span> = Vec::new();
    for page in 1..=total {
        let style = if page == current {
            selection_style(app)
        } else {
            header_text_style(app)
        };
        spans.push(Span::styled(format!(" {} ", page), style));
        spans.push(Span::raw(" "));
    }
    if total > 0 {
        spans.push(Span::styled(
            format!(" page {}/{}, {} per page", current, total, state.page_size()),
            separator_style(app),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_footer<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &App<'_, S>) {
    let help = if app.store.state().dialog().open {
        DIALOG_HELP
    } else {
        match app.mode {
            Mode::Browse => BROWSE_HELP,
            Mode::Search => SEARCH_HELP,
            Mode::ConfirmDelete(_) => CONFIRM_HELP,
        }
    };

    let mut spans = Vec::new();
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {} ", status), status_style(app)));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(help, separator_style(app)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_dialog<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &App<'_, S>) {
    let dialog = app.store.state().dialog();
    if !dialog.open {
        return;
    }

    let width = area.width.saturating_mul(2).saturating_div(3).max(40).min(area.width);
    let height = (FormField::ALL.len() as u16 * 2 + 3).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let title = if dialog.edit_mode {
        "EDIT ORGANIZATION"
    } else {
        "ADD ORGANIZATION"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, header_text_style(app)))
        .border_style(border_style(app, true));
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let focused = app.form.focused();
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor = None;
    for (idx, field) in FormField::ALL.iter().enumerate() {
        let label_style = if *field == focused {
            selection_style(app)
        } else {
            header_text_style(app)
        };
        let label = format!("{:<width$}", field.label(), width = LABEL_WIDTH as usize);
        lines.push(Line::from(vec![
            Span::styled(label, label_style),
            Span::raw(" "),
            Span::raw(app.form.value(*field).to_string()),
        ]));
        lines.push(Line::from(""));
        if *field == focused {
            cursor = Some(idx * 2);
        }
    }
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some(line_idx) = cursor {
        let x = inner
            .x
            .saturating_add(LABEL_WIDTH + 1)
            .saturating_add(app.form.visual_cursor() as u16)
            .min(inner.right().saturating_sub(1));
        let y = inner.y.saturating_add(line_idx as u16);
        if y < inner.bottom() {
            frame.set_cursor_position((x, y));
        }
    }
}

fn draw_confirm_modal<S: RecordService>(frame: &mut Frame<'_>, area: Rect, app: &mut App<'_, S>) {
    let Mode::ConfirmDelete(id) = app.mode else {
        return;
    };

    let name = app
        .store
        .state()
        .find(id)
        .map(|record| record.company.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "this record".to_string());

    let lines = vec![
        Line::from(format!("Delete {} (#{})?", name, id)),
        Line::from("".to_string()),
        Line::from(CONFIRM_HELP.to_string()),
    ];
    let body_text = ratatui::text::Text::from(lines);

    let title_line = Line::from(Span::styled("DELETE", header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.confirm_popup);
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn selection_style<S: RecordService>(app: &App<'_, S>) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style<S: RecordService>(app: &App<'_, S>, active: bool) -> Style {
    let colors = app.ui_colors();
    let style = Style::default().fg(color(colors.border));
    if active {
        style
    } else {
        style.add_modifier(Modifier::DIM)
    }
}

fn header_text_style<S: RecordService>(app: &App<'_, S>) -> Style {
    let colors = app.ui_colors();
    Style::default().fg(color(colors.header))
}

fn separator_style<S: RecordService>(app: &App<'_, S>) -> Style {
    header_text_style(app).add_modifier(Modifier::DIM)
}

fn status_style<S: RecordService>(app: &App<'_, S>) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg))
}

fn render_centered_words(frame: &mut Frame<'_>, area: Rect, text: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y, area.width, 1);
    frame.render_widget(Paragraph::new(text.to_string()).alignment(Alignment::Center), line_area);
}
