//! Output formatting for command results.
//!
//! Every command renders its result through [`OutputFormat`]: JSON documents,
//! CSV rows, or bare whitespace separated values that are convenient in shell
//! pipelines.

use csv::Writer;
use serde::Serialize;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

pub const JSON: &str = "json";
pub const CSV: &str = "csv";
pub const VALUE: &str = "value";

/// Error types that can occur during formatting operations
#[derive(Debug, thiserror::Error)]
pub enum FormattingError {
    /// Error when an unsupported output format is requested
    #[error("invalid output format {0}")]
    UnsupportedOutputFormat(String),
    /// Error specific to CSV operations
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    /// Error when converting bytes to UTF-8 string
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    #[error("JSON serialization error: {0}")]
    JsonSerializationError(#[from] serde_json::Error),
    #[error("CSV writer into inner error: {0}")]
    CsvIntoInnerError(#[from] csv::IntoInnerError<csv::Writer<Vec<u8>>>),
}

#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub struct OutputFormatOptions {
    pub with_headers: bool,
    pub pretty: bool,
}

/// Enum representing the supported output formats
#[derive(Debug, Clone, PartialEq, PartialOrd, EnumIter)]
pub enum OutputFormat {
    /// JSON (JavaScript Object Notation) format
    Json(OutputFormatOptions),
    /// CSV (Comma-Separated Values) format
    Csv(OutputFormatOptions),
    /// One line per record, values separated by a single space
    Value(OutputFormatOptions),
}

impl OutputFormat {
    /// Returns a vector of all supported format names as strings
    pub fn names() -> Vec<&'static str> {
        OutputFormat::iter().map(|f| f.name()).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Json(_) => JSON,
            OutputFormat::Csv(_) => CSV,
            OutputFormat::Value(_) => VALUE,
        }
    }

    pub fn options(&self) -> &OutputFormatOptions {
        match self {
            OutputFormat::Json(options)
            | OutputFormat::Csv(options)
            | OutputFormat::Value(options) => options,
        }
    }

    pub fn from_string_with_options(
        format_str: &str,
        options: OutputFormatOptions,
    ) -> Result<OutputFormat, FormattingError> {
        match format_str.to_lowercase().as_str() {
            JSON => Ok(OutputFormat::Json(options)),
            CSV => Ok(OutputFormat::Csv(options)),
            VALUE => Ok(OutputFormat::Value(options)),
            other => Err(FormattingError::UnsupportedOutputFormat(other.to_string())),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Json(OutputFormatOptions::default())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = FormattingError;

    fn from_str(format_str: &str) -> Result<OutputFormat, FormattingError> {
        Self::from_string_with_options(format_str, OutputFormatOptions::default())
    }
}

/// A row of tabular output.
///
/// `columns` names the fields in the order `values` returns them. JSON output
/// uses the `Serialize` implementation instead, so nested fields survive.
pub trait Record: Serialize {
    fn columns() -> Vec<&'static str>;

    fn values(&self) -> Vec<String>;
}

pub trait Formattable {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError>;
}

impl<T: Record> Formattable for [T] {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        match f {
            OutputFormat::Json(options) => to_json(self, options.pretty),
            OutputFormat::Csv(options) => {
                let mut wtr = Writer::from_writer(vec![]);
                if options.with_headers {
                    wtr.write_record(T::columns())?;
                }
                for record in self {
                    wtr.write_record(record.values())?;
                }
                let csv = String::from_utf8(wtr.into_inner()?)?;
                Ok(csv.trim_end().to_string())
            }
            OutputFormat::Value(_) => Ok(self
                .iter()
                .map(|record| record.values().join(" "))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}

impl<T: Record> Formattable for Vec<T> {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        self.as_slice().format(f)
    }
}

/// Render a JSON object as `key,value` pairs (CSV) or bare values.
pub fn format_properties(
    properties: &serde_json::Map<String, serde_json::Value>,
    f: &OutputFormat,
) -> Result<String, FormattingError> {
    match f {
        OutputFormat::Json(options) => to_json(properties, options.pretty),
        OutputFormat::Csv(options) => {
            let mut wtr = Writer::from_writer(vec![]);
            if options.with_headers {
                wtr.write_record(["FIELD", "VALUE"])?;
            }
            for (key, value) in properties {
                wtr.write_record([key.as_str(), display_value(value).as_str()])?;
            }
            let csv = String::from_utf8(wtr.into_inner()?)?;
            Ok(csv.trim_end().to_string())
        }
        OutputFormat::Value(_) => Ok(properties
            .values()
            .map(display_value)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, FormattingError> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

/// Strings print without quotes, `null` prints empty, the rest as JSON.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
