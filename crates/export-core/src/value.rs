//! Driver-neutral value representation.
//!
//! `RawValue` is what a driver crate produces for one column of one record.
//! It is deliberately close to what database drivers hand back: no JSON
//! decisions have been made yet.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// One column value as returned by the database, before JSON coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL NULL
    Null,

    /// Signed integer
    Int(i64),

    /// Unsigned integer (e.g. `BIGINT UNSIGNED`, `BIT`)
    UInt(u64),

    /// Single precision float
    Float(f32),

    /// Double precision float
    Double(f64),

    /// Boolean
    Bool(bool),

    /// Character data
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// Calendar date without time
    Date(NaiveDate),

    /// Date and time without timezone
    DateTime(NaiveDateTime),

    /// Anything the JSON scalar model has no direct slot for
    Opaque(OpaqueValue),
}

/// A value the JSON scalar model has no direct representation for.
///
/// Each variant advertises what it can offer: either a lossless textual form
/// or only a generic text rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum OpaqueValue {
    /// Exact decimal in its canonical text form, e.g. `"123.4500"`
    Decimal(String),

    /// Time of day or signed duration, `[-]HH:MM:SS[.ffffff]`
    Time(String),

    /// Value of a type nobody understood; `text` is a best-effort rendering
    Unknown {
        /// Source type name, used in warnings
        type_name: String,
        /// Generic text conversion of the value
        text: String,
    },
}

impl OpaqueValue {
    /// Create an unknown value from its type name and a text rendering.
    pub fn unknown(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Unknown {
            type_name: type_name.into(),
            text: text.into(),
        }
    }

    /// Lossless text form, if this value has one.
    pub fn lossless_text(&self) -> Option<&str> {
        match self {
            Self::Decimal(s) | Self::Time(s) => Some(s),
            Self::Unknown { .. } => None,
        }
    }

    /// Generic text conversion; always available.
    pub fn generic_text(&self) -> &str {
        match self {
            Self::Decimal(s) | Self::Time(s) => s,
            Self::Unknown { text, .. } => text,
        }
    }

    /// Name of the source type.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Decimal(_) => "DECIMAL",
            Self::Time(_) => "TIME",
            Self::Unknown { type_name, .. } => type_name,
        }
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// ISO-8601 calendar date: `YYYY-MM-DD`.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO-8601 date-time with a `T` separator and no offset.
///
/// Microseconds are appended only when non-zero.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Current local time in the same format as [`format_datetime`].
pub fn capture_timestamp() -> String {
    format_datetime(&Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime_without_fraction() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01T10:00:00");
    }

    #[test]
    fn test_format_datetime_with_micros() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(10, 0, 0, 1_500)
            .unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01T10:00:00.001500");
    }

    #[test]
    fn test_option_into_raw_value() {
        let none: Option<i64> = None;
        assert_eq!(RawValue::from(none), RawValue::Null);
        assert_eq!(RawValue::from(Some("x")), RawValue::Text("x".into()));
    }

    #[test]
    fn test_opaque_capabilities() {
        let dec = OpaqueValue::Decimal("1.50".into());
        assert_eq!(dec.lossless_text(), Some("1.50"));

        let other = OpaqueValue::unknown("GEOMETRY", "POINT(1 2)");
        assert_eq!(other.lossless_text(), None);
        assert_eq!(other.generic_text(), "POINT(1 2)");
        assert_eq!(other.type_name(), "GEOMETRY");
    }
}
