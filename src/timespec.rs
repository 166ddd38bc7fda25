use crate::error::Error;

use chrono::NaiveDate;

/// A calendar date given either as a native value or as text in
/// `%Y-%m-%d` or `%Y%j` (year + 3-digit day-of-year) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSpec {
    Date(NaiveDate),
    Text(String),
}

impl TimeSpec {
    pub fn resolve(&self) -> Result<NaiveDate, Error> {
        match self {
            TimeSpec::Date(date) => Ok(*date),
            TimeSpec::Text(text) => parse_date_token(text)
                .ok_or_else(|| Error::InvalidTimestamp(text.clone())),
        }
    }
}

/// ISO form is tried first, then the ordinal-day form.
pub(crate) fn parse_date_token(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(token, "%Y%j"))
        .ok()
}

impl From<NaiveDate> for TimeSpec {
    fn from(date: NaiveDate) -> TimeSpec {
        TimeSpec::Date(date)
    }
}

impl From<&str> for TimeSpec {
    fn from(text: &str) -> TimeSpec {
        TimeSpec::Text(text.to_string())
    }
}

impl From<String> for TimeSpec {
    fn from(text: String) -> TimeSpec {
        TimeSpec::Text(text)
    }
}
