use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Number of future days covered by every forecast.
pub const FORECAST_HORIZON_DAYS: u8 = 7;

const ISO_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum TicketingError {
    #[error("validation error: {0}")]
    Validation(String),
}

/// A stored ticket sale: one event, one sale date, one price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub event_id: i64,
    #[serde(with = "iso_date")]
    pub sale_date: Date,
    pub price: f64,
}

/// Caller-supplied fields of a ticket; the store assigns `id` and stamps
/// `sale_date` with the current date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TicketDraft {
    pub event_id: i64,
    pub price: f64,
}

impl TicketDraft {
    /// Validates a draft before insertion.
    ///
    /// # Errors
    /// Returns [`TicketingError::Validation`] when the price is not a finite
    /// number (NaN and infinities do not survive a SQLite REAL column).
    pub fn validate(&self) -> Result<(), TicketingError> {
        validate_price(self.price)
    }
}

/// One aggregated point of a per-event sales history: how many tickets were
/// sold on a given date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct DailySales {
    #[serde(with = "iso_date")]
    pub sale_date: Date,
    pub tickets_sold: u32,
}

/// A least-squares line fitted to (ordinal day, tickets sold) pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SalesTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl SalesTrend {
    /// Evaluates the fitted line at an ordinal day.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn predict_at(&self, ordinal_day: i64) -> f64 {
        self.slope * ordinal_day as f64 + self.intercept
    }
}

/// One predicted point of a sales forecast. Predictions are raw fitted
/// values: fractional and negative counts are preserved, not clamped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SalesForecast {
    #[serde(with = "iso_date")]
    pub sale_date: Date,
    pub predicted: f64,
}

/// Fits an ordinary least-squares line to a daily sales series.
///
/// Returns `None` for an empty series. A single point, or a series whose
/// dates all coincide, pins a flat line through the mean count so the
/// forecast stays defined for degenerate histories.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit_sales_trend(series: &[DailySales]) -> Option<SalesTrend> {
    if series.is_empty() {
        return None;
    }

    let n = series.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for point in series {
        sum_x += date_to_ordinal(point.sale_date) as f64;
        sum_y += f64::from(point.tickets_sold);
    }
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    // Centered sums keep the arithmetic stable; ordinal days are ~2.4e6.
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for point in series {
        let dx = date_to_ordinal(point.sale_date) as f64 - mean_x;
        let dy = f64::from(point.tickets_sold) - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
    }

    #[allow(clippy::float_cmp)]
    if sxx == 0.0 {
        return Some(SalesTrend {
            slope: 0.0,
            intercept: mean_y,
        });
    }

    let slope = sxy / sxx;
    Some(SalesTrend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Produces the fixed seven-day forecast for a daily sales series.
///
/// Returns `Ok(None)` when the series is empty, the "no data" case. The
/// forecast dates run from the day after `today` through `today` plus
/// [`FORECAST_HORIZON_DAYS`], one point per day.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when a forecast date would fall
/// outside the supported calendar range.
pub fn forecast_sales(
    series: &[DailySales],
    today: Date,
) -> Result<Option<Vec<SalesForecast>>, TicketingError> {
    let Some(trend) = fit_sales_trend(series) else {
        return Ok(None);
    };

    let today_ordinal = date_to_ordinal(today);
    let mut points = Vec::with_capacity(usize::from(FORECAST_HORIZON_DAYS));
    for day in 1..=i64::from(FORECAST_HORIZON_DAYS) {
        let ordinal = today_ordinal + day;
        points.push(SalesForecast {
            sale_date: ordinal_to_date(ordinal)?,
            predicted: trend.predict_at(ordinal),
        });
    }

    Ok(Some(points))
}

/// Parses a raw event id typed by the user.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when the text is empty or not a
/// whole number.
pub fn parse_event_id(raw: &str) -> Result<i64, TicketingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TicketingError::Validation(
            "event id MUST be provided".to_string(),
        ));
    }

    trimmed.parse::<i64>().map_err(|_| {
        TicketingError::Validation(format!("event id MUST be a whole number, got {trimmed:?}"))
    })
}

/// Parses a raw price typed by the user.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when the text is empty, not a
/// number, or not finite.
pub fn parse_price(raw: &str) -> Result<f64, TicketingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TicketingError::Validation(
            "price MUST be provided".to_string(),
        ));
    }

    let price = trimmed.parse::<f64>().map_err(|_| {
        TicketingError::Validation(format!("price MUST be a number, got {trimmed:?}"))
    })?;
    validate_price(price)?;
    Ok(price)
}

fn validate_price(price: f64) -> Result<(), TicketingError> {
    if !price.is_finite() {
        return Err(TicketingError::Validation(
            "price MUST be a finite number".to_string(),
        ));
    }

    Ok(())
}

/// Parses an ISO `YYYY-MM-DD` calendar date, the on-disk representation.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when the text is not a valid date.
pub fn parse_iso_date(value: &str) -> Result<Date, TicketingError> {
    Date::parse(value, ISO_DATE_FORMAT)
        .map_err(|err| TicketingError::Validation(format!("invalid date {value:?}: {err}")))
}

/// Formats a calendar date as ISO `YYYY-MM-DD`.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when formatting fails.
pub fn format_iso_date(value: Date) -> Result<String, TicketingError> {
    value
        .format(ISO_DATE_FORMAT)
        .map_err(|err| TicketingError::Validation(format!("failed to format date: {err}")))
}

/// Converts a calendar date to its ordinal day number (Julian day), the
/// numeric feature the regression runs over.
#[must_use]
pub fn date_to_ordinal(date: Date) -> i64 {
    i64::from(date.to_julian_day())
}

/// Converts an ordinal day number back to a calendar date.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when the ordinal falls outside the
/// supported calendar range.
pub fn ordinal_to_date(ordinal: i64) -> Result<Date, TicketingError> {
    let julian = i32::try_from(ordinal).map_err(|_| {
        TicketingError::Validation(format!("ordinal day {ordinal} is out of range"))
    })?;

    Date::from_julian_day(julian).map_err(|err| {
        TicketingError::Validation(format!("ordinal day {ordinal} is out of range: {err}"))
    })
}

#[must_use]
pub fn today_utc() -> Date {
    now_utc().date()
}

#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp as RFC3339, used for report generation stamps.
///
/// # Errors
/// Returns [`TicketingError::Validation`] when formatting fails.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, TicketingError> {
    value
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|err| {
            TicketingError::Validation(format!("failed to format RFC3339 timestamp: {err}"))
        })
}

/// Serde adapter serializing `time::Date` fields as ISO `YYYY-MM-DD`
/// strings, matching the stored representation.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    /// # Errors
    /// Fails when the date cannot be formatted.
    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        match super::format_iso_date(*date) {
            Ok(text) => serializer.serialize_str(&text),
            Err(err) => Err(serde::ser::Error::custom(err)),
        }
    }

    /// # Errors
    /// Fails when the text is not a valid ISO date.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_iso_date(&text).map_err(serde::de::Error::custom)
    }
}
