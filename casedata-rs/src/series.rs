use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::date::CalendarDate;
use crate::error::{Error, Result};

/// Daily case totals in strictly increasing date order.
///
/// The text form is one `YYYY/MM/DD,<total>` pair per line with no header and
/// no line break after the final pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseSeries {
    entries: Vec<(CalendarDate, i64)>,
}

impl CaseSeries {
    // Callers guarantee ascending, unique dates (e.g. keys of a BTreeMap).
    pub(crate) fn from_sorted_unchecked(entries: Vec<(CalendarDate, i64)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        CaseSeries { entries }
    }

    pub fn entries(&self) -> &[(CalendarDate, i64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<CalendarDate> {
        self.entries.first().map(|(date, _)| *date)
    }

    pub fn last_date(&self) -> Option<CalendarDate> {
        self.entries.last().map(|(date, _)| *date)
    }

    /// Drops the first `n` entries.
    pub fn skip(&self, n: usize) -> CaseSeries {
        CaseSeries {
            entries: self.entries.iter().skip(n).copied().collect(),
        }
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(date, count)| format!("{date},{count}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Hex SHA-256 of [`CaseSeries::to_text`].
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.to_text().as_bytes()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut entries: Vec<(CalendarDate, i64)> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            if record.len() != 2 {
                return Err(Error::MalformedRecord {
                    line,
                    reason: format!("expected 2 fields, found {}", record.len()),
                });
            }
            let date: CalendarDate = record[0].parse().map_err(|_| Error::MalformedRecord {
                line,
                reason: format!("{:?} is not a YYYY/MM/DD date", &record[0]),
            })?;
            let count = record[1].trim().parse().map_err(|_| Error::MalformedRecord {
                line,
                reason: format!("total {:?} is not an integer", &record[1]),
            })?;
            if let Some((previous, _)) = entries.last()
                && *previous >= date
            {
                return Err(Error::Unordered {
                    line,
                    date: date.to_string(),
                    previous: previous.to_string(),
                });
            }
            entries.push((date, count));
        }
        Ok(CaseSeries { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingFile(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::parse(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_text())?;
        Ok(())
    }
}
