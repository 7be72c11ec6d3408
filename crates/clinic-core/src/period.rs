//! # Period Utilities
//!
//! Pure date arithmetic for month buckets, receivable projection and
//! competency labels.
//!
//! ## Month Buckets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  month_bounds(2024, 2)                                                  │
//! │                                                                         │
//! │    start = "2024-02-01"                                                 │
//! │    end   = "2024-02-31"   ← textual bound, NOT the true last day        │
//! │                                                                         │
//! │  Storage compares dates as ISO text, so "2024-02-29" <= "2024-02-31"    │
//! │  holds and no March date can sneak in ("2024-03-.." > "2024-02-31").    │
//! │  The true last day is still available through DateRange::last_day().    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Canonical date representation used everywhere: `YYYY-MM-DD`.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Portuguese month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

// =============================================================================
// Today
// =============================================================================

/// Returns the current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Returns the current local date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    to_iso(today())
}

/// Formats a date as `YYYY-MM-DD`.
pub fn to_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_iso(value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: format!("'{}' is not a YYYY-MM-DD date", value),
        }
    })
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive date range with textual ISO bounds, as sent to storage filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub start: String,
    /// Inclusive upper bound, `YYYY-MM-DD`. For month ranges the day is
    /// always `31`.
    pub end: String,
}

impl DateRange {
    /// Builds a range between two real dates.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: to_iso(start),
            end: to_iso(end),
        }
    }

    /// Builds the month bucket for `year`/`month` (1-indexed).
    pub fn month(year: i32, month: u32) -> ValidationResult<Self> {
        month_bounds(year, month)
    }

    /// Checks whether `date` falls inside the range by comparing ISO text.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use clinic_core::period::month_bounds;
    ///
    /// let feb = month_bounds(2024, 2).unwrap();
    /// assert!(feb.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    /// assert!(!feb.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    /// ```
    pub fn contains(&self, date: NaiveDate) -> bool {
        let iso = to_iso(date);
        iso.as_str() >= self.start.as_str() && iso.as_str() <= self.end.as_str()
    }

    /// Returns the true last calendar day covered by the range.
    ///
    /// For month ranges this resolves the textual day-31 bound to the real
    /// month end. Returns `None` if the start bound is not a valid date.
    pub fn last_day(&self) -> Option<NaiveDate> {
        if let Ok(end) = NaiveDate::parse_from_str(&self.end, ISO_DATE_FORMAT) {
            return Some(end);
        }
        let start = NaiveDate::parse_from_str(&self.start, ISO_DATE_FORMAT).ok()?;
        last_day_of_month(start.year(), start.month())
    }
}

/// Returns the month bucket: start `YYYY-MM-01`, end `YYYY-MM-31`.
///
/// The end bound is deliberately not clamped to the month's real length; see
/// the module docs. Months outside 1..=12 are rejected.
///
/// ## Example
/// ```rust
/// use clinic_core::period::month_bounds;
///
/// let range = month_bounds(2024, 4).unwrap();
/// assert_eq!(range.start, "2024-04-01");
/// assert_eq!(range.end, "2024-04-31");
/// ```
pub fn month_bounds(year: i32, month: u32) -> ValidationResult<DateRange> {
    check_month(month)?;
    Ok(DateRange {
        start: format!("{:04}-{:02}-01", year, month),
        end: format!("{:04}-{:02}-31", year, month),
    })
}

/// First day of the given month.
pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// True last day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn check_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Date Projection
// =============================================================================

/// Projects the expected collection date: `service_date + days`.
///
/// Calendar arithmetic, so month and year boundaries roll over correctly.
/// Saturates at the calendar limit instead of overflowing.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use clinic_core::period::project_collection_date;
///
/// let service = NaiveDate::from_ymd_opt(2024, 1, 28).unwrap();
/// assert_eq!(
///     project_collection_date(service, 5),
///     NaiveDate::from_ymd_opt(2024, 2, 2).unwrap()
/// );
/// ```
pub fn project_collection_date(service_date: NaiveDate, days: u32) -> NaiveDate {
    service_date
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// String form of [`project_collection_date`]: `YYYY-MM-DD` in and out.
pub fn project_collection_date_str(service_date: &str, days: u32) -> ValidationResult<String> {
    let date = parse_iso(service_date)?;
    Ok(to_iso(project_collection_date(date, days)))
}

// =============================================================================
// Competency Periods
// =============================================================================

/// A year-month competency period (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Creates a competency period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> ValidationResult<Self> {
        check_month(month)?;
        Ok(YearMonth { year, month })
    }

    /// Competency period containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Competency period of today.
    pub fn current() -> Self {
        YearMonth::of(today())
    }

    /// Month bucket covering this competency.
    pub fn bounds(&self) -> DateRange {
        DateRange {
            start: format!("{:04}-{:02}-01", self.year, self.month),
            end: format!("{:04}-{:02}-31", self.year, self.month),
        }
    }

    /// Moves by a number of months, negative values going back.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::period::YearMonth;
    ///
    /// let march = YearMonth::new(2024, 3).unwrap();
    /// assert_eq!(march.offset(-11).to_string(), "2023-04");
    /// assert_eq!(march.offset(10).to_string(), "2025-01");
    /// ```
    pub fn offset(&self, months: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + months;
        YearMonth {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Display label, e.g. `Março/2024`.
    pub fn label(&self) -> String {
        format!("{}/{}", month_name(i64::from(self.month)), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "competency".to_string(),
            reason: format!("'{}' is not a YYYY-MM period", s),
        };

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        YearMonth::new(year, month)
    }
}

/// Competency bounds for a whole year: `YYYY-01` through `YYYY-12`.
pub fn year_bounds(year: i32) -> (YearMonth, YearMonth) {
    (
        YearMonth { year, month: 1 },
        YearMonth { year, month: 12 },
    )
}

/// Portuguese month name for a 1-indexed month; empty outside 1..=12.
pub fn month_name(month: i64) -> &'static str {
    match usize::try_from(month) {
        Ok(m) if (1..=12).contains(&m) => MONTH_NAMES[m - 1],
        _ => "",
    }
}

/// Renders a `YYYY-MM` competency as `<MonthName>/<YYYY>`.
///
/// The month segment is parsed leniently; a missing or out-of-range month
/// yields an empty name segment rather than an error.
///
/// ## Example
/// ```rust
/// use clinic_core::period::format_competency;
///
/// assert_eq!(format_competency("2024-03"), "Março/2024");
/// assert_eq!(format_competency("2024-13"), "/2024");
/// ```
pub fn format_competency(competency: &str) -> String {
    let mut parts = competency.split('-');
    let year = parts.next().unwrap_or_default();
    let month = parts
        .next()
        .and_then(|m| m.trim().parse::<i64>().ok())
        .unwrap_or(0);

    format!("{}/{}", month_name(month), year)
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Renders `YYYY-MM-DD` as `dd/MM/yyyy`; empty input renders as `-`.
///
/// Input that is not an ISO date is returned unchanged.
pub fn format_date_br(value: &str) -> String {
    if value.trim().is_empty() {
        return "-".to_string();
    }
    match parse_iso(value) {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => value.to_string(),
    }
}

/// Chart axis label: three-letter month plus two-digit year, e.g. `Mar/24`.
pub fn chart_month_label(period: YearMonth) -> String {
    let abbrev: String = month_name(i64::from(period.month)).chars().take(3).collect();
    format!("{}/{:02}", abbrev, period.year.rem_euclid(100))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds_always_end_on_31() {
        for month in 1..=12 {
            let range = month_bounds(2023, month).unwrap();
            assert!(range.start.ends_with("-01"));
            assert!(range.end.ends_with("-31"));
        }
        assert_eq!(month_bounds(2024, 2).unwrap().end, "2024-02-31");
    }

    #[test]
    fn test_month_bounds_rejects_invalid_month() {
        assert!(month_bounds(2024, 0).is_err());
        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn test_month_range_contains() {
        let feb = month_bounds(2023, 2).unwrap();
        assert!(feb.contains(date(2023, 2, 1)));
        assert!(feb.contains(date(2023, 2, 28)));
        assert!(!feb.contains(date(2023, 1, 31)));
        assert!(!feb.contains(date(2023, 3, 1)));
    }

    #[test]
    fn test_last_day_resolves_textual_bound() {
        assert_eq!(month_bounds(2024, 2).unwrap().last_day(), Some(date(2024, 2, 29)));
        assert_eq!(month_bounds(2023, 2).unwrap().last_day(), Some(date(2023, 2, 28)));
        assert_eq!(month_bounds(2023, 4).unwrap().last_day(), Some(date(2023, 4, 30)));
        assert_eq!(month_bounds(2023, 12).unwrap().last_day(), Some(date(2023, 12, 31)));
        assert_eq!(last_day_of_month(2023, 12), Some(date(2023, 12, 31)));
        assert_eq!(first_day_of_month(2023, 12), Some(date(2023, 12, 1)));
    }

    #[test]
    fn test_projection_rolls_over_month_and_year() {
        assert_eq!(project_collection_date(date(2024, 1, 28), 5), date(2024, 2, 2));
        assert_eq!(project_collection_date(date(2024, 12, 30), 10), date(2025, 1, 9));
        assert_eq!(project_collection_date(date(2024, 2, 28), 1), date(2024, 2, 29));
    }

    #[test]
    fn test_projection_with_zero_days_is_noop() {
        assert_eq!(project_collection_date(date(2024, 5, 17), 0), date(2024, 5, 17));
        assert_eq!(
            project_collection_date_str("2024-05-17", 0).unwrap(),
            "2024-05-17"
        );
    }

    #[test]
    fn test_projection_str() {
        assert_eq!(
            project_collection_date_str("2024-12-30", 10).unwrap(),
            "2025-01-09"
        );
        assert!(project_collection_date_str("30/12/2024", 10).is_err());
    }

    #[test]
    fn test_projection_saturates() {
        assert_eq!(project_collection_date(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn test_format_competency() {
        assert_eq!(format_competency("2024-01"), "Janeiro/2024");
        assert_eq!(format_competency("2024-12"), "Dezembro/2024");
        assert_eq!(format_competency("2024-00"), "/2024");
        assert_eq!(format_competency("2024-13"), "/2024");
        assert_eq!(format_competency("2024"), "/2024");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(3), "Março");
        assert_eq!(month_name(0), "");
        assert_eq!(month_name(-1), "");
        assert_eq!(month_name(13), "");
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2024-07".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2024, month: 7 });
        assert_eq!(ym.to_string(), "2024-07");
        assert_eq!(ym.label(), "Julho/2024");
        assert_eq!(ym.bounds(), month_bounds(2024, 7).unwrap());

        assert!("2024-7".parse::<YearMonth>().is_err());
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("abcd-01".parse::<YearMonth>().is_err());
        assert!("202407".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_ordering() {
        let dec: YearMonth = "2023-12".parse().unwrap();
        let jan: YearMonth = "2024-01".parse().unwrap();
        assert!(dec < jan);

        let (first, last) = year_bounds(2024);
        assert_eq!(first.to_string(), "2024-01");
        assert_eq!(last.to_string(), "2024-12");
    }

    #[test]
    fn test_year_month_offset() {
        let jan = YearMonth::new(2024, 1).unwrap();
        assert_eq!(jan.offset(-1), YearMonth::new(2023, 12).unwrap());
        assert_eq!(jan.offset(0), jan);
        assert_eq!(jan.offset(12), YearMonth::new(2025, 1).unwrap());
        assert_eq!(jan.offset(-25), YearMonth::new(2021, 12).unwrap());
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(format_date_br("2024-03-09"), "09/03/2024");
        assert_eq!(format_date_br(""), "-");
        assert_eq!(format_date_br("ontem"), "ontem");
        assert_eq!(chart_month_label(YearMonth { year: 2024, month: 3 }), "Mar/24");
        assert_eq!(chart_month_label(YearMonth { year: 2009, month: 11 }), "Nov/09");
    }

    #[test]
    fn test_today_iso_round_trips() {
        let iso = today_iso();
        assert_eq!(parse_iso(&iso).unwrap(), today());
    }
}
