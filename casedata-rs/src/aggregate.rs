use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::StringRecord;
use log::{debug, trace};

use crate::date::CalendarDate;
use crate::error::{Error, Result};
use crate::series::CaseSeries;

// Column layout of the raw event log: id, day, month, year, cases, ...
const DAY_FIELD: usize = 1;
const MONTH_FIELD: usize = 2;
const YEAR_FIELD: usize = 3;
const CASES_FIELD: usize = 4;
const MIN_FIELDS: usize = CASES_FIELD + 1;

/// One row of the raw event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    /// Change in confirmed cases; negative values are corrections.
    pub cases: i64,
}

impl RawRecord {
    pub fn new(day: u32, month: u32, year: i32, cases: i64) -> Self {
        RawRecord {
            day,
            month,
            year,
            cases,
        }
    }

    /// Reads the day, month, year and case columns of a raw row. Columns past
    /// the case count are ignored. A row naming an impossible date is
    /// malformed.
    pub fn from_csv_record(record: &StringRecord, line: u64) -> Result<Self> {
        if record.len() < MIN_FIELDS {
            return Err(Error::MalformedRecord {
                line,
                reason: format!("expected at least {MIN_FIELDS} fields, found {}", record.len()),
            });
        }
        let raw = RawRecord::new(
            parse_field(record, DAY_FIELD, "day", line)?,
            parse_field(record, MONTH_FIELD, "month", line)?,
            parse_field(record, YEAR_FIELD, "year", line)?,
            parse_field(record, CASES_FIELD, "cases", line)?,
        );
        raw.date().map_err(|_| Error::MalformedRecord {
            line,
            reason: format!("{}/{}/{} is not a calendar date", raw.year, raw.month, raw.day),
        })?;
        Ok(raw)
    }

    pub fn date(&self) -> Result<CalendarDate> {
        CalendarDate::from_ymd(self.year, self.month, self.day)
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<T> {
    let raw = record.get(index).unwrap_or_default().trim();
    raw.parse().map_err(|_| Error::MalformedRecord {
        line,
        reason: format!("{name} field {raw:?} is not an integer"),
    })
}

/// Running per-date totals. Built in one pass, then turned into a
/// [`CaseSeries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyAggregate {
    totals: BTreeMap<CalendarDate, i64>,
}

impl DailyAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, date: CalendarDate, cases: i64) {
        *self.totals.entry(date).or_insert(0) += cases;
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn into_series(self) -> CaseSeries {
        CaseSeries::from_sorted_unchecked(self.totals.into_iter().collect())
    }
}

/// Folds `records` into `context`, in input order.
pub fn aggregate<I>(mut context: DailyAggregate, records: I) -> Result<DailyAggregate>
where
    I: IntoIterator<Item = RawRecord>,
{
    for record in records {
        context.add(record.date()?, record.cases);
    }
    Ok(context)
}

/// Aggregates a raw event log. The first line is a header and is skipped.
/// Every row is parsed before any is folded, so a malformed row aborts the
/// run with nothing added to `context`.
pub fn aggregate_reader<R: Read>(reader: R, context: DailyAggregate) -> Result<DailyAggregate> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let records = csv_reader
        .records()
        .map(|result| -> Result<RawRecord> {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let raw = RawRecord::from_csv_record(&record, line)?;
            trace!("line {line}: {}/{}/{} {:+}", raw.year, raw.month, raw.day, raw.cases);
            Ok(raw)
        })
        .collect::<Result<Vec<_>>>()?;

    let n_records = records.len();
    let context = aggregate(context, records)?;
    debug!(
        "aggregated {n_records} records into {} daily totals",
        context.len()
    );
    Ok(context)
}

pub fn aggregate_file(path: &Path) -> Result<DailyAggregate> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::MissingFile(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    aggregate_reader(io::BufReader::new(file), DailyAggregate::new())
}

#[cfg(test)]
mod test {
    use super::{DailyAggregate, RawRecord, aggregate, aggregate_reader};
    use crate::error::Error;

    const HEADER: &str = "dateRep,day,month,year,cases,deaths,countriesAndTerritories\n";

    fn scenario_records() -> Vec<RawRecord> {
        vec![
            RawRecord::new(1, 3, 2020, 10),
            RawRecord::new(1, 3, 2020, 5),
            RawRecord::new(2, 3, 2020, 7),
        ]
    }

    #[test]
    fn test_scenario() {
        let context = aggregate(DailyAggregate::new(), scenario_records()).unwrap();
        assert_eq!(context.into_series().to_text(), "2020/03/01,15\n2020/03/02,7");
    }

    #[test]
    fn test_order_independent() {
        let records = vec![
            RawRecord::new(31, 12, 2019, 27),
            RawRecord::new(1, 3, 2020, 10),
            RawRecord::new(2, 3, 2020, 7),
            RawRecord::new(1, 3, 2020, -4),
            RawRecord::new(1, 3, 2020, 5),
            RawRecord::new(10, 1, 2020, 1),
        ];
        let expected = aggregate(DailyAggregate::new(), records.clone()).unwrap();

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(aggregate(DailyAggregate::new(), reversed).unwrap(), expected);

        for shift in 1..records.len() {
            let mut rotated = records.clone();
            rotated.rotate_left(shift);
            assert_eq!(aggregate(DailyAggregate::new(), rotated).unwrap(), expected);
        }

        assert_eq!(
            expected.into_series().to_text(),
            "2019/12/31,27\n2020/01/10,1\n2020/03/01,11\n2020/03/02,7"
        );
    }

    #[test]
    fn test_context_is_extended() {
        let first = aggregate(DailyAggregate::new(), vec![RawRecord::new(1, 3, 2020, 10)]).unwrap();
        let both = aggregate(first, vec![RawRecord::new(1, 3, 2020, 5)]).unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both.into_series().to_text(), "2020/03/01,15");
    }

    #[test]
    fn test_negative_totals_pass_through() {
        let records = vec![
            RawRecord::new(5, 4, 2020, -3),
            RawRecord::new(6, 4, 2020, 2),
            RawRecord::new(6, 4, 2020, -2),
        ];
        let series = aggregate(DailyAggregate::new(), records).unwrap().into_series();
        assert_eq!(series.to_text(), "2020/04/05,-3\n2020/04/06,0");
    }

    #[test]
    fn test_empty() {
        let context = aggregate_reader(HEADER.as_bytes(), DailyAggregate::new()).unwrap();
        assert!(context.is_empty());
        assert_eq!(context.into_series().to_text(), "");

        let context = aggregate_reader("".as_bytes(), DailyAggregate::new()).unwrap();
        assert!(context.is_empty());
    }

    #[test]
    fn test_reader() {
        let input = format!(
            "{HEADER}01/03/2020,1,3,2020,10,0,Italy\n\
             01/03/2020,1,3,2020,5,1,\"Bonaire, Saint Eustatius and Saba\"\n\
             02/03/2020,2,3,2020,7,0,Spain\n"
        );
        let series = aggregate_reader(input.as_bytes(), DailyAggregate::new())
            .unwrap()
            .into_series();
        assert_eq!(series.to_text(), "2020/03/01,15\n2020/03/02,7");
    }

    #[test]
    fn test_reader_sorts_out_of_order_rows() {
        let input = format!(
            "{HEADER}02/03/2020,2,3,2020,7,0,Spain\n\
             10/01/2020,10,1,2020,1,0,Japan\n\
             01/03/2020,1,3,2020,10,0,Italy\n\
             31/12/2019,31,12,2019,27,0,China\n\
             01/03/2020,1,3,2020,5,0,France\n"
        );
        let series = aggregate_reader(input.as_bytes(), DailyAggregate::new())
            .unwrap()
            .into_series();
        assert_eq!(
            series.to_text(),
            "2019/12/31,27\n2020/01/10,1\n2020/03/01,15\n2020/03/02,7"
        );
    }

    #[test]
    fn test_reader_extends_context() {
        let first = aggregate(DailyAggregate::new(), vec![RawRecord::new(1, 3, 2020, 10)]).unwrap();
        let input = format!("{HEADER}01/03/2020,1,3,2020,5,0,Italy\n");
        let both = aggregate_reader(input.as_bytes(), first).unwrap();
        assert_eq!(both.into_series().to_text(), "2020/03/01,15");
    }

    #[test]
    fn test_too_few_fields() {
        let input = format!("{HEADER}01/03/2020,1,3,2020,10\n02/03/2020,2,3\n");
        let err = aggregate_reader(input.as_bytes(), DailyAggregate::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn test_non_integer_cases() {
        let input = format!("{HEADER}01/03/2020,1,3,2020,ten\n");
        let err = aggregate_reader(input.as_bytes(), DailyAggregate::new()).unwrap_err();
        match err {
            Error::MalformedRecord { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("cases"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_impossible_date() {
        let input = format!("{HEADER}31/02/2020,31,2,2020,4\n");
        let err = aggregate_reader(input.as_bytes(), DailyAggregate::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, .. }));
    }
}
