//! Command surface for match ticket sales recording and analysis.
//!
//! Running `mta` without a subcommand opens the interactive terminal UI.
//! Subcommands expose the same operations for scripting:
//! - [`run_cli`] for full parsed CLI execution.
//! - [`run_command_with_db`] for direct [`Command`] execution against a DB path.
//! - [`run_command`] for execution against an existing [`SqliteTicketStore`].

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use match_ticketing_core::{
    fit_sales_trend, forecast_sales, format_rfc3339, now_utc, today_utc, DailySales, SalesForecast,
    SalesTrend, Ticket, TicketDraft, FORECAST_HORIZON_DAYS,
};
use match_ticketing_store_sqlite::SqliteTicketStore;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, registry, util::SubscriberInitExt, EnvFilter};

mod tui;

#[derive(Debug, Parser)]
#[command(name = "mta")]
#[command(about = "Match ticket sales recording and analysis")]
pub struct Cli {
    #[arg(long, default_value = "./ticketing.db")]
    db: PathBuf,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Add(AddArgs),
    List(ListArgs),
    Delete(DeleteArgs),
    Analyze(AnalyzeArgs),
    Predict(PredictArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    event_id: i64,
    #[arg(long)]
    price: f64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(long)]
    id: i64,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long)]
    event_id: i64,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    chart: bool,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[arg(long)]
    event_id: i64,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    chart: bool,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    let fmt_layer = fmt::layer().with_writer(std::io::stderr);
    let _ = registry().with(env_filter()).with(fmt_layer).try_init();
}

fn init_file_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(log_dir, "mta.log");
    let fmt_layer = fmt::layer().with_writer(appender).with_ansi(false);
    let _ = registry().with(env_filter()).with(fmt_layer).try_init();
    Ok(())
}

/// Executes a fully parsed invocation.
///
/// Without a subcommand this opens the interactive terminal UI. The UI owns
/// the terminal, so UI runs log to a rolling file only when `--log-dir` is
/// given; subcommands log to stderr (or the file when `--log-dir` is set).
///
/// # Errors
/// Returns an error when logging setup, store open/migrate, or the requested
/// command fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Some(command) => {
            match cli.log_dir.as_deref() {
                Some(dir) => init_file_logging(dir)?,
                None => init_stderr_logging(),
            }
            run_command_with_db(&cli.db, command)
        }
        None => {
            if let Some(dir) = cli.log_dir.as_deref() {
                init_file_logging(dir)?;
            }
            let store = SqliteTicketStore::open(&cli.db)?;
            store.migrate()?;
            tui::run_app(store)
        }
    }
}

/// Executes a parsed command using the ticket database at `db_path`.
///
/// # Errors
/// Returns an error when store open/migrate fails or the requested command
/// fails.
pub fn run_command_with_db(db_path: &Path, command: Command) -> Result<()> {
    let mut store = SqliteTicketStore::open(db_path)?;
    store.migrate()?;
    run_command(command, &mut store)
}

/// Executes a parsed command against an existing store handle.
///
/// # Errors
/// Returns an error when validation, persistence, or aggregation fails.
pub fn run_command(command: Command, store: &mut SqliteTicketStore) -> Result<()> {
    match command {
        Command::Add(args) => {
            let draft = TicketDraft {
                event_id: args.event_id,
                price: args.price,
            };
            let ticket = store.add_ticket(&draft)?;
            info!(ticket_id = ticket.id, event_id = ticket.event_id, "ticket recorded");
            println!("{}", serde_json::to_string_pretty(&ticket)?);
            Ok(())
        }
        Command::List(args) => {
            let tickets = store.list_tickets()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&tickets)?);
            } else {
                print_ticket_table(&tickets);
            }
            Ok(())
        }
        Command::Delete(args) => {
            let deleted = store.delete_ticket(args.id)?;
            info!(ticket_id = args.id, deleted, "ticket delete processed");
            let report = DeleteTicketReport {
                ticket_id: args.id,
                deleted,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Analyze(args) => run_analyze(args, store),
        Command::Predict(args) => run_predict(args, store),
    }
}

fn run_analyze(args: AnalyzeArgs, store: &mut SqliteTicketStore) -> Result<()> {
    let series = store.daily_sales(args.event_id)?;
    if args.json {
        let report = build_sales_trend_report(args.event_id, &series, now_utc())?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if series.is_empty() {
        println!("no sales data recorded for event {}", args.event_id);
    } else {
        print_sales_table(args.event_id, &series);
    }

    if args.chart && !series.is_empty() {
        let view = tui::sales_history_chart(args.event_id, &series);
        tui::show_chart(&view)?;
    }
    Ok(())
}

fn run_predict(args: PredictArgs, store: &mut SqliteTicketStore) -> Result<()> {
    let series = store.daily_sales(args.event_id)?;
    let trend = fit_sales_trend(&series);
    let forecast = forecast_sales(&series, today_utc()).map_err(|err| anyhow!(err.to_string()))?;

    if args.json {
        let report = build_sales_forecast_report(
            args.event_id,
            trend,
            forecast.as_deref().unwrap_or_default(),
            now_utc(),
        )?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match (&forecast, trend) {
            (Some(points), Some(trend)) => print_forecast_table(args.event_id, trend, points),
            _ => println!("no sales data to predict from for event {}", args.event_id),
        }
    }

    if args.chart {
        if let Some(points) = &forecast {
            let view = tui::sales_forecast_chart(args.event_id, points);
            tui::show_chart(&view)?;
        }
    }
    Ok(())
}

fn print_ticket_table(tickets: &[Ticket]) {
    println!("{:<6} {:<10} {:<12} price", "id", "event_id", "sale_date");
    println!("{}", "-".repeat(40));
    for ticket in tickets {
        let sale_date = ticket.sale_date.to_string();
        println!(
            "{:<6} {:<10} {sale_date:<12} {:.2}",
            ticket.id, ticket.event_id, ticket.price
        );
    }
}

fn print_sales_table(event_id: i64, series: &[DailySales]) {
    println!("event={event_id} days={}", series.len());
    println!("{:<12} tickets_sold", "sale_date");
    println!("{}", "-".repeat(25));
    for point in series {
        let sale_date = point.sale_date.to_string();
        println!("{sale_date:<12} {}", point.tickets_sold);
    }
}

fn print_forecast_table(event_id: i64, trend: SalesTrend, points: &[SalesForecast]) {
    println!(
        "event={event_id} horizon_days={} slope_per_day={:.4}",
        points.len(),
        trend.slope
    );
    println!("{:<12} predicted", "sale_date");
    println!("{}", "-".repeat(22));
    for point in points {
        let sale_date = point.sale_date.to_string();
        println!("{sale_date:<12} {:.2}", point.predicted);
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct DeleteTicketReport {
    ticket_id: i64,
    deleted: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct SalesTrendReport {
    contract_version: String,
    generated_at: String,
    event_id: i64,
    points: Vec<DailySales>,
}

fn build_sales_trend_report(
    event_id: i64,
    points: &[DailySales],
    generated_at: time::OffsetDateTime,
) -> Result<SalesTrendReport> {
    Ok(SalesTrendReport {
        contract_version: "sales_trend.v1".to_string(),
        generated_at: format_rfc3339(generated_at).map_err(|err| anyhow!(err.to_string()))?,
        event_id,
        points: points.to_vec(),
    })
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct SalesForecastReport {
    contract_version: String,
    generated_at: String,
    event_id: i64,
    horizon_days: u8,
    trend: Option<SalesTrend>,
    points: Vec<SalesForecast>,
}

fn build_sales_forecast_report(
    event_id: i64,
    trend: Option<SalesTrend>,
    points: &[SalesForecast],
    generated_at: time::OffsetDateTime,
) -> Result<SalesForecastReport> {
    Ok(SalesForecastReport {
        contract_version: "sales_forecast.v1".to_string(),
        generated_at: format_rfc3339(generated_at).map_err(|err| anyhow!(err.to_string()))?,
        event_id,
        horizon_days: FORECAST_HORIZON_DAYS,
        trend,
        points: points.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::too_many_lines, clippy::manual_let_else)]

    use super::*;
    use match_ticketing_core::parse_iso_date;
    use serde_json::json;
    use std::fs;
    use time::macros::datetime;
    use time::Date;
    use ulid::Ulid;

    fn must<T>(result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("test failure: {err}"),
        }
    }

    fn must_date(value: &str) -> Date {
        match parse_iso_date(value) {
            Ok(value) => value,
            Err(err) => panic!("invalid fixture date: {err}"),
        }
    }

    fn execute_cli(args: Vec<String>) -> Result<()> {
        let cli = Cli::try_parse_from(args)?;
        run_cli(cli)
    }

    fn temp_db_path(tag: &str) -> (PathBuf, String) {
        let path = std::env::temp_dir().join(format!("ticketing-{tag}-{}.db", Ulid::new()));
        let as_string = match path.to_str() {
            Some(value) => value.to_string(),
            None => panic!("temp db path must be valid UTF-8"),
        };
        (path, as_string)
    }

    #[test]
    fn delete_report_shape_is_stable() {
        let report = DeleteTicketReport {
            ticket_id: 9,
            deleted: false,
        };
        let value = must(serde_json::to_value(report).map_err(Into::into));
        assert_eq!(
            value,
            json!({
                "ticket_id": 9,
                "deleted": false
            })
        );
    }

    #[test]
    fn sales_trend_json_contract_is_stable_v1() {
        let points = vec![
            DailySales {
                sale_date: must_date("2026-03-01"),
                tickets_sold: 2,
            },
            DailySales {
                sale_date: must_date("2026-03-02"),
                tickets_sold: 1,
            },
            DailySales {
                sale_date: must_date("2026-03-03"),
                tickets_sold: 3,
            },
        ];

        let report = must(build_sales_trend_report(
            7,
            &points,
            datetime!(2026-03-05 12:00:00 UTC),
        ));

        let value = must(serde_json::to_value(report).map_err(Into::into));
        assert_eq!(
            value,
            json!({
                "contract_version": "sales_trend.v1",
                "generated_at": "2026-03-05T12:00:00Z",
                "event_id": 7,
                "points": [
                    {"sale_date": "2026-03-01", "tickets_sold": 2},
                    {"sale_date": "2026-03-02", "tickets_sold": 1},
                    {"sale_date": "2026-03-03", "tickets_sold": 3}
                ]
            })
        );
    }

    #[test]
    fn sales_forecast_json_contract_is_stable_v1() {
        let trend = SalesTrend {
            slope: 0.5,
            intercept: -3.25,
        };
        let points = vec![
            SalesForecast {
                sale_date: must_date("2026-03-04"),
                predicted: 2.5,
            },
            SalesForecast {
                sale_date: must_date("2026-03-05"),
                predicted: 3.0,
            },
        ];

        let report = must(build_sales_forecast_report(
            7,
            Some(trend),
            &points,
            datetime!(2026-03-03 08:30:00 UTC),
        ));

        let value = must(serde_json::to_value(report).map_err(Into::into));
        assert_eq!(
            value,
            json!({
                "contract_version": "sales_forecast.v1",
                "generated_at": "2026-03-03T08:30:00Z",
                "event_id": 7,
                "horizon_days": 7,
                "trend": {"slope": 0.5, "intercept": -3.25},
                "points": [
                    {"sale_date": "2026-03-04", "predicted": 2.5},
                    {"sale_date": "2026-03-05", "predicted": 3.0}
                ]
            })
        );
    }

    #[test]
    fn forecast_report_without_history_keeps_empty_shape() {
        let report = must(build_sales_forecast_report(
            4,
            None,
            &[],
            datetime!(2026-03-03 08:30:00 UTC),
        ));

        let value = must(serde_json::to_value(report).map_err(Into::into));
        assert_eq!(
            value,
            json!({
                "contract_version": "sales_forecast.v1",
                "generated_at": "2026-03-03T08:30:00Z",
                "event_id": 4,
                "horizon_days": 7,
                "trend": null,
                "points": []
            })
        );
    }

    #[test]
    fn embed_api_layers_stay_operational() {
        let (db_path, db_path_str) = temp_db_path("embed-host");

        must(run_command_with_db(
            &db_path,
            Command::Add(AddArgs {
                event_id: 7,
                price: 12.5,
            }),
        ));

        let mut store = must(SqliteTicketStore::open(&db_path));
        must(store.migrate());
        must(run_command(Command::List(ListArgs { json: true }), &mut store));
        let tickets = must(store.list_tickets());
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].event_id, 7);

        must(execute_cli(vec![
            "mta".to_string(),
            "--db".to_string(),
            db_path_str,
            "delete".to_string(),
            "--id".to_string(),
            tickets[0].id.to_string(),
        ]));
        assert!(must(store.list_tickets()).is_empty());

        let _ = fs::remove_file(&db_path);
    }

    #[test]
    fn cli_end_to_end_add_list_analyze_predict() {
        let (db_path, db_path_str) = temp_db_path("cli-e2e");

        for _ in 0..3 {
            must(execute_cli(vec![
                "mta".to_string(),
                "--db".to_string(),
                db_path_str.clone(),
                "add".to_string(),
                "--event-id".to_string(),
                "7".to_string(),
                "--price".to_string(),
                "19.99".to_string(),
            ]));
        }

        must(execute_cli(vec![
            "mta".to_string(),
            "--db".to_string(),
            db_path_str.clone(),
            "list".to_string(),
        ]));
        must(execute_cli(vec![
            "mta".to_string(),
            "--db".to_string(),
            db_path_str.clone(),
            "analyze".to_string(),
            "--event-id".to_string(),
            "7".to_string(),
            "--json".to_string(),
        ]));
        must(execute_cli(vec![
            "mta".to_string(),
            "--db".to_string(),
            db_path_str.clone(),
            "predict".to_string(),
            "--event-id".to_string(),
            "7".to_string(),
            "--json".to_string(),
        ]));
        must(execute_cli(vec![
            "mta".to_string(),
            "--db".to_string(),
            db_path_str,
            "analyze".to_string(),
            "--event-id".to_string(),
            "99".to_string(),
        ]));

        let store = must(SqliteTicketStore::open(&db_path));
        must(store.migrate());
        let series = must(store.daily_sales(7));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].tickets_sold, 3);
        assert_eq!(series[0].sale_date, today_utc());
        assert!(must(store.daily_sales(99)).is_empty());

        let _ = fs::remove_file(&db_path);
    }
}
