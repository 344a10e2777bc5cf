use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use match_ticketing_core::{
    forecast_sales, parse_event_id, parse_price, today_utc, Ticket, TicketDraft,
};
use match_ticketing_store_sqlite::SqliteTicketStore;
use ratatui::widgets::TableState;

use super::chart::{sales_forecast_chart, sales_history_chart, ChartView};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Focus {
    EventId,
    Price,
    Table,
}

#[derive(Debug)]
pub(crate) enum Screen {
    Entry,
    Chart(ChartView),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug)]
pub(crate) struct StatusLine {
    pub(crate) kind: StatusKind,
    pub(crate) message: String,
}

/// State behind the interactive screen. All persistence and math goes
/// through the same store and core calls the CLI subcommands use.
pub(crate) struct App {
    pub(crate) store: SqliteTicketStore,
    pub(crate) tickets: Vec<Ticket>,
    pub(crate) table_state: TableState,
    pub(crate) focus: Focus,
    pub(crate) event_id_input: String,
    pub(crate) price_input: String,
    pub(crate) status: StatusLine,
    pub(crate) screen: Screen,
    pub(crate) should_quit: bool,
}

impl App {
    pub(crate) fn new(store: SqliteTicketStore) -> Result<Self> {
        let mut app = Self {
            store,
            tickets: Vec::new(),
            table_state: TableState::default(),
            focus: Focus::EventId,
            event_id_input: String::new(),
            price_input: String::new(),
            status: StatusLine {
                kind: StatusKind::Info,
                message: "ready".to_string(),
            },
            screen: Screen::Entry,
            should_quit: false,
        };
        app.refresh_tickets()?;
        Ok(app)
    }

    /// Routes one key press. Storage and validation failures land in the
    /// status line; only terminal failures abort the event loop.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if matches!(self.screen, Screen::Chart(_)) {
            self.screen = Screen::Entry;
            self.set_status(StatusKind::Info, "ready");
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_previous(),
            KeyCode::Up => self.select_previous(),
            KeyCode::Down => self.select_next(),
            KeyCode::Backspace => self.pop_input(),
            KeyCode::Char('a') => self.add_ticket(),
            KeyCode::Char('s') => self.show_analysis(),
            KeyCode::Char('p') => self.show_forecast(),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('r') => self.refresh_with_status(),
            KeyCode::Char(ch) => self.push_input(ch),
            _ => {}
        }
    }

    fn refresh_tickets(&mut self) -> Result<()> {
        self.tickets = self.store.list_tickets()?;
        let selected = self.table_state.selected().and_then(|index| {
            if self.tickets.is_empty() {
                None
            } else {
                Some(index.min(self.tickets.len() - 1))
            }
        });
        self.table_state.select(selected);
        Ok(())
    }

    fn refresh_with_status(&mut self) {
        match self.refresh_tickets() {
            Ok(()) => {
                let count = self.tickets.len();
                self.set_status(StatusKind::Info, format!("{count} tickets on record"));
            }
            Err(err) => self.set_status(StatusKind::Error, format!("{err:#}")),
        }
    }

    fn refresh_after(&mut self, message: String) {
        match self.refresh_tickets() {
            Ok(()) => self.set_status(StatusKind::Success, message),
            Err(err) => self.set_status(StatusKind::Error, format!("{err:#}")),
        }
    }

    fn add_ticket(&mut self) {
        let Some(event_id) = self.parsed_event_id() else {
            return;
        };
        let price = match parse_price(&self.price_input) {
            Ok(value) => value,
            Err(err) => {
                self.set_status(StatusKind::Error, err.to_string());
                return;
            }
        };

        let draft = TicketDraft { event_id, price };
        match self.store.add_ticket(&draft) {
            Ok(ticket) => self.refresh_after(format!("ticket {} added", ticket.id)),
            Err(err) => self.set_status(StatusKind::Error, format!("{err:#}")),
        }
    }

    fn delete_selected(&mut self) {
        let selected_id = self
            .table_state
            .selected()
            .and_then(|index| self.tickets.get(index))
            .map(|ticket| ticket.id);
        let Some(ticket_id) = selected_id else {
            self.set_status(StatusKind::Error, "select a ticket in the table first");
            return;
        };

        match self.store.delete_ticket(ticket_id) {
            Ok(_) => self.refresh_after(format!("ticket {ticket_id} deleted")),
            Err(err) => self.set_status(StatusKind::Error, format!("{err:#}")),
        }
    }

    fn show_analysis(&mut self) {
        let Some(event_id) = self.parsed_event_id() else {
            return;
        };
        match self.store.daily_sales(event_id) {
            Ok(series) if series.is_empty() => self.set_status(
                StatusKind::Info,
                format!("no sales data recorded for event {event_id}"),
            ),
            Ok(series) => self.open_chart(sales_history_chart(event_id, &series)),
            Err(err) => self.set_status(StatusKind::Error, format!("{err:#}")),
        }
    }

    fn show_forecast(&mut self) {
        let Some(event_id) = self.parsed_event_id() else {
            return;
        };
        let series = match self.store.daily_sales(event_id) {
            Ok(value) => value,
            Err(err) => {
                self.set_status(StatusKind::Error, format!("{err:#}"));
                return;
            }
        };
        match forecast_sales(&series, today_utc()) {
            Ok(None) => self.set_status(
                StatusKind::Info,
                format!("no sales data to predict from for event {event_id}"),
            ),
            Ok(Some(points)) => self.open_chart(sales_forecast_chart(event_id, &points)),
            Err(err) => self.set_status(StatusKind::Error, err.to_string()),
        }
    }

    fn open_chart(&mut self, view: ChartView) {
        self.screen = Screen::Chart(view);
        self.set_status(StatusKind::Info, "press any key to close the chart");
    }

    fn parsed_event_id(&mut self) -> Option<i64> {
        match parse_event_id(&self.event_id_input) {
            Ok(value) => Some(value),
            Err(err) => {
                self.set_status(StatusKind::Error, err.to_string());
                None
            }
        }
    }

    fn push_input(&mut self, ch: char) {
        if !ch.is_ascii_digit() && ch != '.' && ch != '-' {
            return;
        }
        match self.focus {
            Focus::EventId => self.event_id_input.push(ch),
            Focus::Price => self.price_input.push(ch),
            Focus::Table => {}
        }
    }

    fn pop_input(&mut self) {
        match self.focus {
            Focus::EventId => {
                self.event_id_input.pop();
            }
            Focus::Price => {
                self.price_input.pop();
            }
            Focus::Table => {}
        }
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::EventId => Focus::Price,
            Focus::Price => Focus::Table,
            Focus::Table => Focus::EventId,
        };
    }

    fn focus_previous(&mut self) {
        self.focus = match self.focus {
            Focus::EventId => Focus::Table,
            Focus::Price => Focus::EventId,
            Focus::Table => Focus::Price,
        };
    }

    fn select_next(&mut self) {
        if self.tickets.is_empty() {
            return;
        }
        let next = match self.table_state.selected() {
            Some(index) => (index + 1).min(self.tickets.len() - 1),
            None => 0,
        };
        self.table_state.select(Some(next));
        self.focus = Focus::Table;
    }

    fn select_previous(&mut self) {
        if self.tickets.is_empty() {
            return;
        }
        let previous = self
            .table_state
            .selected()
            .map_or(0, |index| index.saturating_sub(1));
        self.table_state.select(Some(previous));
        self.focus = Focus::Table;
    }

    fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = StatusLine {
            kind,
            message: message.into(),
        };
    }
}
