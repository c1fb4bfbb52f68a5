//! Row normalization: raw driver values → JSON-safe values.
//!
//! The coercion policy is an ordered decision list, first match wins:
//!
//! 1. null → JSON null
//! 2. date / date-time → ISO-8601 text, no timezone attached
//! 3. binary → UTF-8 text, invalid byte sequences dropped
//! 4. integer / float / text / boolean → passed through
//! 5. opaque → lossless text if available, otherwise generic text plus a
//!    warning
//!
//! Binary decoding is lossy on purpose: blobs that are not text come out
//! corrupted. That is a known limitation of the JSON output, not an error.

use crate::error::RowShapeError;
use crate::value::{format_date, format_datetime, OpaqueValue, RawValue};
use serde::Serialize;
use serde_json::{Number, Value};

/// Column-name-keyed JSON object for one record, keys in column order.
pub type NormalizedRow = serde_json::Map<String, Value>;

/// Result of normalizing one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// JSON-safe value
    pub value: Value,
    /// Source type name when the generic text fallback was used
    pub fallback: Option<String>,
}

impl Normalized {
    fn exact(value: Value) -> Self {
        Self {
            value,
            fallback: None,
        }
    }
}

/// Values of one column that could only be rendered through generic text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportWarning {
    pub table: String,
    pub column: String,
    pub source_type: String,
    pub occurrences: usize,
}

impl std::fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}: {} value(s) of type {} exported as generic text",
            self.table, self.column, self.occurrences, self.source_type
        )
    }
}

/// Normalize a single raw value.
pub fn normalize_value(value: RawValue) -> Normalized {
    match value {
        RawValue::Null => Normalized::exact(Value::Null),

        RawValue::Date(d) => Normalized::exact(Value::String(format_date(&d))),
        RawValue::DateTime(dt) => Normalized::exact(Value::String(format_datetime(&dt))),

        RawValue::Bytes(b) => Normalized::exact(Value::String(decode_utf8_dropping_invalid(&b))),

        RawValue::Int(i) => Normalized::exact(Value::from(i)),
        RawValue::UInt(u) => Normalized::exact(Value::from(u)),
        RawValue::Float(f) => Normalized::exact(float_to_json(widen_f32(f))),
        RawValue::Double(d) => Normalized::exact(float_to_json(d)),
        RawValue::Text(s) => Normalized::exact(Value::String(s)),
        RawValue::Bool(b) => Normalized::exact(Value::Bool(b)),

        RawValue::Opaque(opaque) => normalize_opaque(opaque),
    }
}

fn normalize_opaque(opaque: OpaqueValue) -> Normalized {
    if let Some(text) = opaque.lossless_text() {
        return Normalized::exact(Value::String(text.to_string()));
    }
    Normalized {
        value: Value::String(opaque.generic_text().to_string()),
        fallback: Some(opaque.type_name().to_string()),
    }
}

/// Normalize one raw row against its ordered column names.
pub fn normalize(columns: &[String], row: Vec<RawValue>) -> Result<NormalizedRow, RowShapeError> {
    normalize_tracked(columns, row, |_, _| {})
}

/// Like [`normalize`], reporting every generic-text fallback as
/// `(column, source_type)`.
pub(crate) fn normalize_tracked(
    columns: &[String],
    row: Vec<RawValue>,
    mut on_fallback: impl FnMut(&str, &str),
) -> Result<NormalizedRow, RowShapeError> {
    if columns.len() != row.len() {
        return Err(RowShapeError {
            expected: columns.len(),
            actual: row.len(),
        });
    }

    let mut out = NormalizedRow::with_capacity(columns.len());
    for (column, raw) in columns.iter().zip(row) {
        let normalized = normalize_value(raw);
        if let Some(source_type) = &normalized.fallback {
            on_fallback(column, source_type);
        }
        out.insert(column.clone(), normalized.value);
    }
    Ok(out)
}

/// Decode bytes as UTF-8, silently dropping invalid sequences.
fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

// Goes through the shortest decimal form so 0.1f32 becomes 0.1, not
// 0.10000000149011612.
fn widen_f32(f: f32) -> f64 {
    f.to_string().parse().unwrap_or(f64::from(f))
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
