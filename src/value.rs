use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// A single cell as read from a sheet, CSV file or query result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Runtime category of a value. Resolution order is Number, then Date, then Text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Date,
    Text,
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn kind(&self) -> ValueKind {
        classify(self)
    }

    /// Numeric reading of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Date reading of the value. Values that read as numbers are never dates.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) if parse_number(s).is_none() => parse_date(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

pub fn classify(value: &CellValue) -> ValueKind {
    match value {
        CellValue::Empty => ValueKind::Empty,
        CellValue::Number(_) => ValueKind::Number,
        CellValue::DateTime(_) => ValueKind::Date,
        CellValue::Bool(_) => ValueKind::Text,
        CellValue::Text(s) => {
            if parse_number(s).is_some() {
                ValueKind::Number
            } else if parse_date(s).is_some() {
                ValueKind::Date
            } else {
                ValueKind::Text
            }
        }
    }
}

pub fn is_number(value: &CellValue) -> bool {
    classify(value) == ValueKind::Number
}

pub fn is_date(value: &CellValue) -> bool {
    classify(value) == ValueKind::Date
}

/// Integral values print without a fractional part, so `1.0` reads as `1`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

// Two-digit year forms come before four-digit ones: chrono's %Y would read "19" as year 19.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%y",
    "%m-%d-%Y",
    "%m.%d.%y",
    "%m.%d.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

fn starts_with_year(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 5 && b[..4].iter().all(u8::is_ascii_digit) && !b[4].is_ascii_digit()
}

/// Permissive date parsing with month-before-day ordering for ambiguous forms.
/// Time-only strings land on 1970-01-01 so two of them still compare by time.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    // %Y also accepts one to three digits, so "1/2/19" would read as year 1.
    let year_first = starts_with_year(s);
    let usable = |fmt: &&&str| year_first || !fmt.starts_with("%Y");

    for fmt in DATETIME_FORMATS.iter().filter(usable) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS.iter().filter(usable) {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(NaiveDate::default().and_time(t));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn numbers_win_over_dates() {
        assert_eq!(classify(&"1".into()), ValueKind::Number);
        assert_eq!(classify(&" 2.5 ".into()), ValueKind::Number);
        assert_eq!(classify(&"1e3".into()), ValueKind::Number);
        assert_eq!(classify(&CellValue::Number(4.0)), ValueKind::Number);
        assert!(is_number(&"20190101".into()));
        assert!(!is_date(&"20190101".into()));
    }

    #[test]
    fn date_strings_classify_as_dates() {
        assert_eq!(classify(&"1/1/2019".into()), ValueKind::Date);
        assert_eq!(classify(&"2019-01-01".into()), ValueKind::Date);
        assert_eq!(classify(&"2019-01-01 13:45:00".into()), ValueKind::Date);
        assert_eq!(classify(&"January 5, 2019".into()), ValueKind::Date);
        assert_eq!(classify(&CellValue::DateTime(ymd(2019, 1, 1))), ValueKind::Date);
    }

    #[test]
    fn everything_else_is_text_or_empty() {
        assert_eq!(classify(&"Row 1".into()), ValueKind::Text);
        assert_eq!(classify(&"Q".into()), ValueKind::Text);
        assert_eq!(classify(&CellValue::Bool(true)), ValueKind::Text);
        assert_eq!(classify(&CellValue::Empty), ValueKind::Empty);
        assert_eq!(classify(&"".into()), ValueKind::Empty);
    }

    #[test]
    fn month_comes_before_day() {
        assert_eq!(parse_date("2/3/2012"), Some(ymd(2012, 2, 3)));
        assert_eq!(parse_date("2/3/12"), Some(ymd(2012, 2, 3)));
        assert_eq!(parse_date("1/1/2019"), parse_date("2019-01-01 00:00:00"));
    }

    #[test]
    fn short_years_are_not_read_as_year_first() {
        assert_eq!(parse_date("1/2/19"), Some(ymd(2019, 1, 2)));
        assert_eq!(parse_date("2-3-12"), Some(ymd(2012, 2, 3)));
        assert_eq!(parse_date("2019/01/02"), Some(ymd(2019, 1, 2)));
        assert_eq!(
            crate::cell_diff::value_difference(&"1/2/19".into(), &"2019-01-02".into()),
            crate::cell_diff::Difference::Same
        );
    }

    #[test]
    fn rfc3339_is_normalized_to_utc() {
        let a = parse_date("2019-01-01T02:00:00+02:00").unwrap();
        assert_eq!(a, ymd(2019, 1, 1));
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(CellValue::Number(1.0).to_string(), "1");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(
            CellValue::DateTime(ymd(2019, 1, 1)).to_string(),
            "2019-01-01 00:00:00"
        );
    }
}
