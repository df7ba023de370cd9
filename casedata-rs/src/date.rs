use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::{Error, Result};

/// A calendar day. Ordering is chronological, and the text form
/// (`YYYY/MM/DD`, zero-padded) sorts the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(CalendarDate)
            .ok_or_else(|| Error::InvalidDate(format!("{year}/{month}/{day}")))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The date `days` after this one. Saturates at the end of chrono's range.
    pub fn plus_days(&self, days: u64) -> Self {
        CalendarDate(self.0.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX))
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year(), self.month(), self.day())
    }
}

impl FromStr for CalendarDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let [y, m, d] = parts.as_slice() else {
            return Err(Error::InvalidDate(s.to_string()));
        };
        let parse_err = |_| Error::InvalidDate(s.to_string());
        CalendarDate::from_ymd(
            y.parse().map_err(parse_err)?,
            m.parse().map_err(parse_err)?,
            d.parse().map_err(parse_err)?,
        )
    }
}

#[cfg(test)]
mod test {
    use super::CalendarDate;

    #[test]
    fn test_zero_padding() {
        let date = CalendarDate::from_ymd(2020, 3, 1).unwrap();
        assert_eq!(date.to_string(), "2020/03/01");
        let date = CalendarDate::from_ymd(2020, 12, 31).unwrap();
        assert_eq!(date.to_string(), "2020/12/31");
    }

    #[test]
    fn test_parse() {
        let date: CalendarDate = "2020/03/01".parse().unwrap();
        assert_eq!(date, CalendarDate::from_ymd(2020, 3, 1).unwrap());
        // Unpadded input is accepted and normalized
        let date: CalendarDate = "2020/3/1".parse().unwrap();
        assert_eq!(date.to_string(), "2020/03/01");
    }

    #[test]
    fn test_invalid() {
        assert!(CalendarDate::from_ymd(2020, 2, 30).is_err());
        assert!("2020/13/01".parse::<CalendarDate>().is_err());
        assert!("2020-03-01".parse::<CalendarDate>().is_err());
        assert!("2020/03/".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn test_ordering_matches_text() {
        let dates = [
            CalendarDate::from_ymd(2019, 12, 31).unwrap(),
            CalendarDate::from_ymd(2020, 1, 9).unwrap(),
            CalendarDate::from_ymd(2020, 1, 10).unwrap(),
            CalendarDate::from_ymd(2020, 10, 2).unwrap(),
        ];
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn test_plus_days() {
        let date = CalendarDate::from_ymd(2020, 2, 28).unwrap();
        assert_eq!(date.plus_days(0), date);
        assert_eq!(date.plus_days(1).to_string(), "2020/02/29");
        assert_eq!(date.plus_days(2).to_string(), "2020/03/01");
        assert_eq!(date.plus_days(366).to_string(), "2021/02/28");
    }
}
