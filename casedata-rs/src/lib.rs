pub mod aggregate;
pub mod date;
pub mod error;
pub mod log;
pub mod series;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use aggregate::{DailyAggregate, RawRecord, aggregate, aggregate_file, aggregate_reader};
pub use date::CalendarDate;
pub use error::{Error, Result};
pub use series::CaseSeries;

pub const DEFAULT_DATA_DIR: &str = "Data Files";
pub const DEFAULT_OUTPUT_DIR: &str = "Figures";
/// Name of the raw event log in [`Environment::files`].
pub const RAW_FILE: &str = "raw";
/// Name of the condensed daily series in [`Environment::files`].
pub const CONDENSED_FILE: &str = "condensed";

/// Where a run reads its data, where it writes, and the `input` parameters
/// for the model.
///
/// A config document (TOML or JSON) looks like:
///
/// ```toml
/// data_dir = "Data Files"
/// output_dir = "Figures"
///
/// [files]
/// raw = "covid19_data"
/// condensed = "covid19_condensed_data"
///
/// [input]
/// r0 = 3.09
/// duration = 14.0
/// ```
///
/// Every key is optional.
pub struct Environment<I = ()> {
    input_json: serde_json::Map<String, Value>,
    pub input: Option<I>,
    pub data_dir: PathBuf,
    pub files: HashMap<String, PathBuf>,
    output_dir: Option<PathBuf>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_json(Value::Null)
    }
}

impl Environment {
    pub fn from_json(data: Value) -> Self {
        let input_json = data
            .get("input")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let data_dir = data
            .get("data_dir")
            .and_then(|v| v.as_str())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        let mut files: HashMap<String, PathBuf> = HashMap::from([
            (RAW_FILE.to_string(), PathBuf::from("covid19_data")),
            (CONDENSED_FILE.to_string(), PathBuf::from("covid19_condensed_data")),
        ]);
        if let Some(obj) = data.get("files").and_then(|f| f.as_object()) {
            files.extend(
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), PathBuf::from(s)))),
            );
        }

        // An explicit empty string sends output to stdout
        let output_dir = match data.get("output_dir").and_then(|v| v.as_str()) {
            Some("") => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
        };

        Self {
            input_json,
            input: None,
            data_dir,
            files,
            output_dir,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let data: Value = toml::from_str(text)?;
        Ok(Self::from_json(data))
    }

    /// Reads a config file; `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingFile(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(Self::from_json(serde_json::from_str(&text)?))
        } else {
            Self::from_toml_str(&text)
        }
    }

    pub fn with_input_type<I: DeserializeOwned>(self) -> Result<Environment<I>> {
        let input_value = Value::Object(self.input_json.clone());
        let input = serde_json::from_value(input_value)?;
        Ok(Environment {
            input_json: self.input_json,
            input: Some(input),
            data_dir: self.data_dir,
            files: self.files,
            output_dir: self.output_dir,
        })
    }
}

impl<I> Environment<I> {
    pub fn set_data_dir(&mut self, dir: impl Into<PathBuf>) {
        self.data_dir = dir.into();
    }

    pub fn set_output_dir(&mut self, dir: Option<PathBuf>) {
        self.output_dir = dir;
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Path of a named data file, relative to the data directory unless the
    /// configured path is absolute.
    pub fn file(&self, name: &str) -> Result<PathBuf> {
        let path = self
            .files
            .get(name)
            .ok_or_else(|| Error::UnknownFile(name.to_string()))?;
        Ok(self.data_dir.join(path))
    }

    /// Like [`Environment::file`], but the file must already exist.
    pub fn require_file(&self, name: &str) -> Result<PathBuf> {
        let path = self.file(name)?;
        if !path.is_file() {
            return Err(Error::MissingFile(path));
        }
        Ok(path)
    }

    /// Path for `filename` in the output directory, which is created if
    /// needed. `None` when output goes to stdout.
    pub fn output_path(&self, filename: &str) -> Result<Option<PathBuf>> {
        match self.output_dir() {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(Some(dir.join(filename)))
            }
            None => Ok(None),
        }
    }

    pub fn write_csv(&self, filename: &str, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
        match self.output_path(filename)? {
            Some(path) => write_rows(csv::Writer::from_path(path)?, headers, rows),
            None => write_rows(csv::Writer::from_writer(io::stdout()), headers, rows),
        }
    }
}

fn write_rows<W: Write>(mut wtr: csv::Writer<W>, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
