use match_ticketing_core::{date_to_ordinal, DailySales, SalesForecast};
use time::Date;

/// Everything the renderer needs to draw one line chart. Points are kept as
/// day offsets from the first date so the axis stays in small f64 range.
#[derive(Debug)]
pub(crate) struct ChartView {
    pub(crate) title: String,
    pub(crate) y_title: String,
    pub(crate) points: Vec<(f64, f64)>,
    pub(crate) x_bounds: [f64; 2],
    pub(crate) x_labels: Vec<String>,
    pub(crate) y_bounds: [f64; 2],
    pub(crate) y_labels: Vec<String>,
}

pub(crate) fn sales_history_chart(event_id: i64, series: &[DailySales]) -> ChartView {
    let dated: Vec<(Date, f64)> = series
        .iter()
        .map(|point| (point.sale_date, f64::from(point.tickets_sold)))
        .collect();
    build_view(
        format!("Ticket Sales Trend (event {event_id})"),
        "Tickets Sold",
        &dated,
    )
}

pub(crate) fn sales_forecast_chart(event_id: i64, points: &[SalesForecast]) -> ChartView {
    let dated: Vec<(Date, f64)> = points
        .iter()
        .map(|point| (point.sale_date, point.predicted))
        .collect();
    build_view(
        format!("Predicted Ticket Sales Trend (event {event_id})"),
        "Predicted Tickets Sold",
        &dated,
    )
}

#[allow(clippy::cast_precision_loss)]
fn build_view(title: String, y_title: &str, dated: &[(Date, f64)]) -> ChartView {
    let origin = dated.first().map_or(0, |(date, _)| date_to_ordinal(*date));
    let points: Vec<(f64, f64)> = dated
        .iter()
        .map(|(date, value)| ((date_to_ordinal(*date) - origin) as f64, *value))
        .collect();

    let max_x = points.last().map_or(0.0, |(x, _)| *x).max(1.0);
    let (y_bounds, y_labels) = y_axis(&points);

    ChartView {
        title,
        y_title: y_title.to_string(),
        points,
        x_bounds: [0.0, max_x],
        x_labels: axis_date_labels(dated),
        y_bounds,
        y_labels,
    }
}

fn axis_date_labels(dated: &[(Date, f64)]) -> Vec<String> {
    let mut labels = Vec::new();
    if let Some((first, _)) = dated.first() {
        labels.push(first.to_string());
    }
    if dated.len() > 2 {
        let (mid, _) = dated[dated.len() / 2];
        labels.push(mid.to_string());
    }
    if dated.len() > 1 {
        if let Some((last, _)) = dated.last() {
            labels.push(last.to_string());
        }
    }
    labels
}

fn y_axis(points: &[(f64, f64)]) -> ([f64; 2], Vec<String>) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (_, y) in points {
        min_y = min_y.min(*y);
        max_y = max_y.max(*y);
    }
    if points.is_empty() {
        min_y = 0.0;
        max_y = 1.0;
    }

    let lower = min_y.floor().min(0.0);
    let upper = max_y.ceil().max(lower + 1.0);
    let mid = (lower + upper) / 2.0;
    let labels = vec![
        format!("{lower:.0}"),
        format!("{mid:.0}"),
        format!("{upper:.0}"),
    ];
    ([lower, upper], labels)
}
