//! Reverse conversion: MySQL values → RawValue
//!
//! This module maps `mysql_async` values, together with the column type and
//! flags they were read from, onto export-core's `RawValue`. The mapping is
//! total: a value that does not fit its column type (or a column type this
//! module does not know) becomes an opaque value carrying a generic text
//! rendering, so reading a table never fails because of its contents.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use export_core::{OpaqueValue, RawValue};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::{Row, Value};

/// Character set id MySQL reports for binary strings and blobs.
const BINARY_CHARSET: u16 = 63;

/// MySQL value with schema information for type-aware conversion.
#[derive(Debug, Clone)]
pub struct MySQLValueWithSchema {
    /// The raw MySQL value.
    pub value: Value,
    /// The MySQL column type.
    pub column_type: ColumnType,
    /// Column flags (e.g., UNSIGNED, BINARY).
    pub column_flags: ColumnFlags,
    /// Column character set id, when known.
    pub character_set: Option<u16>,
}

impl MySQLValueWithSchema {
    /// Create a new MySQLValueWithSchema.
    pub fn new(value: Value, column_type: ColumnType, column_flags: ColumnFlags) -> Self {
        Self {
            value,
            column_type,
            column_flags,
            character_set: None,
        }
    }

    /// Set the column character set.
    pub fn with_character_set(mut self, character_set: u16) -> Self {
        self.character_set = Some(character_set);
        self
    }

    /// Convert to RawValue.
    pub fn to_raw_value(self) -> RawValue {
        RawValue::from(self)
    }

    // BINARY_FLAG is also set for text columns with a binary collation, so
    // the character set is the better signal when present.
    fn is_binary(&self) -> bool {
        match self.character_set {
            Some(cs) => cs == BINARY_CHARSET,
            None => self.column_flags.contains(ColumnFlags::BINARY_FLAG),
        }
    }
}

impl From<MySQLValueWithSchema> for RawValue {
    fn from(mv: MySQLValueWithSchema) -> Self {
        use ColumnType::*;

        // Handle NULL first
        if matches!(mv.value, Value::NULL) {
            return RawValue::Null;
        }

        let binary = mv.is_binary();
        let column_type = mv.column_type;
        let unsigned = mv.column_flags.contains(ColumnFlags::UNSIGNED_FLAG);
        let value = mv.value;

        let converted = match column_type {
            // Integer types
            MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_INT24 | MYSQL_TYPE_LONG
            | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => extract_int(value, unsigned),

            // Floating point
            MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => extract_float(value),

            // Decimal keeps its exact text
            MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => {
                extract_text(value).map(|s| RawValue::Opaque(OpaqueValue::Decimal(s)))
            }

            // Date/time types
            MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => extract_date(value),
            MYSQL_TYPE_DATETIME
            | MYSQL_TYPE_DATETIME2
            | MYSQL_TYPE_TIMESTAMP
            | MYSQL_TYPE_TIMESTAMP2 => extract_datetime(value),
            MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2 => extract_time(value),

            // Bit
            MYSQL_TYPE_BIT => extract_bit(value),

            // JSON reports the binary character set but always holds UTF-8 text
            MYSQL_TYPE_JSON => extract_string(value),

            // Geometry is a binary WKB payload
            MYSQL_TYPE_GEOMETRY => extract_bytes(value),

            // String and blob types, ENUM and SET included
            MYSQL_TYPE_STRING
            | MYSQL_TYPE_VAR_STRING
            | MYSQL_TYPE_VARCHAR
            | MYSQL_TYPE_ENUM
            | MYSQL_TYPE_SET
            | MYSQL_TYPE_TINY_BLOB
            | MYSQL_TYPE_MEDIUM_BLOB
            | MYSQL_TYPE_BLOB
            | MYSQL_TYPE_LONG_BLOB => {
                if binary {
                    extract_bytes(value)
                } else {
                    extract_string(value)
                }
            }

            _ => Err(value),
        };

        converted.unwrap_or_else(|value| {
            RawValue::Opaque(OpaqueValue::unknown(
                type_name(column_type),
                value_to_text(&value),
            ))
        })
    }
}

/// Convert a full row, using the row's own column metadata.
pub fn row_to_raw_values(row: Row) -> Vec<RawValue> {
    let columns = row.columns();
    let values = row.unwrap();

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            MySQLValueWithSchema::new(value, column.column_type(), column.flags())
                .with_character_set(column.character_set())
                .to_raw_value()
        })
        .collect()
}

/// MySQL's own text form of a TIME value: `[-]HH:MM:SS[.ffffff]`.
///
/// TIME is a signed duration, so hours may exceed 24.
pub fn format_mysql_time(
    negative: bool,
    days: u32,
    hours: u8,
    minutes: u8,
    seconds: u8,
    micros: u32,
) -> String {
    let total_hours = u64::from(days) * 24 + u64::from(hours);
    let sign = if negative { "-" } else { "" };
    let mut out = format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}");
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

// Each extractor hands the value back when it does not fit, so the caller
// can fall back to a generic text rendering without cloning.

/// Extract integer from MySQL Value.
fn extract_int(value: Value, unsigned: bool) -> Result<RawValue, Value> {
    match value {
        Value::Int(i) => Ok(RawValue::Int(i)),
        Value::UInt(u) => Ok(RawValue::UInt(u)),
        Value::Bytes(ref b) => {
            let parsed = std::str::from_utf8(b).ok().and_then(|s| {
                if unsigned {
                    s.parse::<u64>().ok().map(RawValue::UInt)
                } else {
                    s.parse::<i64>().ok().map(RawValue::Int)
                }
            });
            parsed.ok_or(value)
        }
        other => Err(other),
    }
}

/// Extract float from MySQL Value.
fn extract_float(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Float(f) => Ok(RawValue::Float(f)),
        Value::Double(d) => Ok(RawValue::Double(d)),
        Value::Bytes(ref b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .map(RawValue::Double)
            .ok_or(value),
        other => Err(other),
    }
}

/// Extract UTF-8 text; non-UTF-8 bytes are rejected.
fn extract_text(value: Value) -> Result<String, Value> {
    match value {
        Value::Bytes(b) => String::from_utf8(b).map_err(|e| Value::Bytes(e.into_bytes())),
        other => Err(other),
    }
}

/// Extract character data. Bytes that are not valid UTF-8 stay binary.
fn extract_string(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Bytes(b) => Ok(match String::from_utf8(b) {
            Ok(s) => RawValue::Text(s),
            Err(e) => RawValue::Bytes(e.into_bytes()),
        }),
        other => Err(other),
    }
}

/// Extract bytes from MySQL Value.
fn extract_bytes(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Bytes(b) => Ok(RawValue::Bytes(b)),
        other => Err(other),
    }
}

/// Extract date from MySQL Value.
fn extract_date(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Date(0, 0, 0, _, _, _, _) => Ok(RawValue::Null),
        Value::Date(year, month, day, _, _, _, _) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .map(RawValue::Date)
                .ok_or(value)
        }
        Value::Bytes(ref b) => {
            let parsed = std::str::from_utf8(b).ok().and_then(|s| {
                if is_zero_date(s) {
                    return Some(RawValue::Null);
                }
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .map(RawValue::Date)
            });
            parsed.ok_or(value)
        }
        other => Err(other),
    }
}

/// Extract datetime from MySQL Value.
fn extract_datetime(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Date(0, 0, 0, _, _, _, _) => Ok(RawValue::Null),
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
            let time = NaiveTime::from_hms_micro_opt(
                u32::from(hour),
                u32::from(min),
                u32::from(sec),
                micro,
            );
            match (date, time) {
                (Some(d), Some(t)) => Ok(RawValue::DateTime(NaiveDateTime::new(d, t))),
                _ => Err(value),
            }
        }
        Value::Bytes(ref b) => {
            let parsed = std::str::from_utf8(b).ok().and_then(|s| {
                if is_zero_date(s) {
                    return Some(RawValue::Null);
                }
                // Try various formats
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                    .ok()
                    .map(RawValue::DateTime)
            });
            parsed.ok_or(value)
        }
        other => Err(other),
    }
}

/// Extract time from MySQL Value.
fn extract_time(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            Ok(RawValue::Opaque(OpaqueValue::Time(format_mysql_time(
                negative, days, hours, minutes, seconds, micros,
            ))))
        }
        // The text protocol already sends MySQL's own time format
        other => extract_text(other).map(|s| RawValue::Opaque(OpaqueValue::Time(s))),
    }
}

/// Extract BIT(n) as an unsigned integer.
fn extract_bit(value: Value) -> Result<RawValue, Value> {
    match value {
        Value::Bytes(ref b) if b.len() <= 8 => Ok(RawValue::UInt(
            b.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)),
        )),
        Value::Int(i) => Ok(RawValue::Int(i)),
        Value::UInt(u) => Ok(RawValue::UInt(u)),
        other => Err(other),
    }
}

fn is_zero_date(s: &str) -> bool {
    s.starts_with("0000-00-00")
}

/// `MYSQL_TYPE_GEOMETRY` → `GEOMETRY`
fn type_name(column_type: ColumnType) -> String {
    let name = format!("{column_type:?}");
    name.trim_start_matches("MYSQL_TYPE_").to_string()
}

/// Generic text rendering of any MySQL value.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let mut out =
                format!("{year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}");
            if *micro > 0 {
                out.push_str(&format!(".{micro:06}"));
            }
            out
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            format_mysql_time(*negative, *days, *hours, *minutes, *seconds, *micros)
        }
    }
}
