use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table,
};
use ratatui::Frame;

use super::app::{App, Focus, Screen, StatusKind};
use super::chart::ChartView;

pub(crate) fn draw(frame: &mut Frame, app: &mut App) {
    if let Screen::Chart(view) = &app.screen {
        let area = frame.area();
        draw_chart(frame, view, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0]);
    draw_entry_form(frame, app, chunks[1]);
    draw_ticket_table(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new("Match Ticketing Analysis")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_entry_form(frame: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let event_id = Paragraph::new(app.event_id_input.as_str())
        .block(input_block(" Event ID ", app.focus == Focus::EventId));
    frame.render_widget(event_id, halves[0]);

    let price = Paragraph::new(app.price_input.as_str())
        .block(input_block(" Ticket Price ", app.focus == Focus::Price));
    frame.render_widget(price, halves[1]);
}

fn input_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

fn draw_ticket_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let header = Row::new(vec!["ID", "Event ID", "Sale Date", "Price"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .tickets
        .iter()
        .map(|ticket| {
            Row::new(vec![
                Cell::from(ticket.id.to_string()),
                Cell::from(ticket.event_id.to_string()),
                Cell::from(ticket.sale_date.to_string()),
                Cell::from(format!("{:.2}", ticket.price)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(input_block(" Tickets ", app.focus == Focus::Table))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol(">> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let style = match app.status.kind {
        StatusKind::Info => Style::default().fg(Color::Gray),
        StatusKind::Success => Style::default().fg(Color::Green),
        StatusKind::Error => Style::default().fg(Color::Red),
    };
    let bar = Paragraph::new(app.status.message.as_str()).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" a add | s analyze | p predict | d delete | r refresh | tab focus | q quit "),
    );
    frame.render_widget(bar, area);
}

pub(crate) fn draw_chart(frame: &mut Frame, view: &ChartView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let dataset = Dataset::default()
        .name(view.y_title.clone())
        .marker(Marker::Dot)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&view.points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", view.title)),
        )
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds(view.x_bounds)
                .labels(view.x_labels.clone()),
        )
        .y_axis(
            Axis::default()
                .title(view.y_title.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds(view.y_bounds)
                .labels(view.y_labels.clone()),
        );
    frame.render_widget(chart, chunks[0]);

    let hint = Paragraph::new("press any key to return")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, chunks[1]);
}
