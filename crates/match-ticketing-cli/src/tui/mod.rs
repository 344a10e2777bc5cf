use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use match_ticketing_store_sqlite::SqliteTicketStore;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::debug;

mod app;
mod chart;
mod view;

pub(crate) use chart::{sales_forecast_chart, sales_history_chart, ChartView};

use app::App;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs the interactive ticket entry screen until the user quits.
pub(crate) fn run_app(store: SqliteTicketStore) -> Result<()> {
    let mut app = App::new(store)?;
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal);
    result
}

/// Renders a single chart full-screen and returns on the next key press.
pub(crate) fn show_chart(view: &ChartView) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = chart_loop(&mut terminal, view);
    restore_terminal(&mut terminal);
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to initialize terminal")
}

// Best-effort teardown; a failed step must not skip the rest.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    debug!("ticket entry screen opened");
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }
    debug!("ticket entry screen closed");
    Ok(())
}

fn chart_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, view: &ChartView) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            view::draw_chart(frame, view, area);
        })?;
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }
}
