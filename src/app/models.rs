//! Data models for ATEL processing
//!
//! This module contains the core data structures for representing bulletins, the
//! per-object records extracted from them, and the outcome of coordinate classification.

use crate::constants::{BULLETIN_LABEL_PREFIX, fields};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::LazyLock;
use tracing::error;

static BULLETIN_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("bulletin number pattern is valid"));

// =============================================================================
// Bulletin
// =============================================================================

/// A single Astronomer's Telegram bulletin
///
/// Bulletins are read once from the corpus CSV and held unchanged while their
/// extracted entries are classified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bulletin {
    /// Alert identifier as it appears in the corpus (e.g. "ATel #12345")
    pub id: String,

    /// Raw free-text body of the bulletin
    pub body: String,
}

impl Bulletin {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }

    /// Bulletin number parsed from the identifier
    pub fn number(&self) -> Result<u32> {
        bulletin_number(&self.id)
    }

    /// Zero-padded bulletin label used as the partition key (e.g. "ATEL00123")
    pub fn label(&self) -> Result<String> {
        bulletin_label(&self.id)
    }

    /// File stem of this bulletin's extraction document
    pub fn file_stem(&self) -> String {
        self.id.replace(' ', "-")
    }
}

/// Parse the bulletin number out of an identifier such as "ATel #12345"
///
/// The last run of digits is taken so that prefixes containing digits do not
/// shadow the bulletin number.
pub fn bulletin_number(id: &str) -> Result<u32> {
    BULLETIN_NUMBER_RE
        .find_iter(id)
        .last()
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Error::invalid_bulletin_id(id))
}

/// Build the zero-padded label for a bulletin identifier
pub fn bulletin_label(id: &str) -> Result<String> {
    Ok(format!("{}{:05}", BULLETIN_LABEL_PREFIX, bulletin_number(id)?))
}

/// Recover a bulletin identifier from an extraction document's file stem
pub fn bulletin_id_from_file_stem(stem: &str) -> String {
    stem.replace('-', " ")
}

// =============================================================================
// Coordinate Values
// =============================================================================

/// A numeric coordinate value as it appeared in the extraction document
///
/// Integers and floats render differently when searched for in bulletin text
/// (`42` versus `42.0`), so the distinction is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i128),
    Float(f64),
}

impl Number {
    /// Integers that fit in `i64` or `u64` stay integral
    ///
    /// serde_json parses larger integer literals as `f64` before they reach this
    /// point, so `100000000000000000000` becomes `Float(1e20)` and is searched
    /// for as `1e+20`. Such values do not occur as coordinates.
    pub fn from_json(number: &serde_json::Number) -> Self {
        if let Some(value) = number.as_i64() {
            Number::Integer(value as i128)
        } else if let Some(value) = number.as_u64() {
            Number::Integer(value as i128)
        } else {
            Number::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(value) => *value as f64,
            Number::Float(value) => *value,
        }
    }

    /// Textual form used when searching bulletin text for this value
    ///
    /// Integers print plainly. Floats use the shortest round-trip digits, keep a
    /// trailing `.0` when integral, and switch to a two-digit exponent outside
    /// `[1e-4, 1e16)`, matching how the extraction corpus was rendered.
    pub fn to_source_string(&self) -> String {
        match self {
            Number::Integer(value) => value.to_string(),
            Number::Float(value) => float_source_repr(*value),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source_string())
    }
}

fn float_source_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    if (1e-4..1e16).contains(&value.abs()) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let scientific = format!("{value:e}");
        match scientific.split_once('e') {
            Some((mantissa, exponent)) => match exponent.parse::<i32>() {
                Ok(exp) => {
                    let sign = if exp < 0 { '-' } else { '+' };
                    format!("{mantissa}e{sign}{:02}", exp.abs())
                }
                Err(_) => scientific,
            },
            None => scientific,
        }
    }
}

/// Name of a JSON value's structural shape, used in error reports
pub fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Typed view of an entry's RA/Dec pair, decided once at ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatePair {
    /// RA or Dec is missing or null
    Absent,
    /// RA is a list or mapping (several candidate positions or a structured record)
    Structured,
    /// Both RA and Dec are JSON numbers
    Numeric { ra: Number, dec: Number },
    /// Both RA and Dec are strings in some textual coordinate format
    Textual { ra: String, dec: String },
}

impl CoordinatePair {
    /// Decide the shape of an RA/Dec pair
    ///
    /// Absence is checked first, then a composite RA, then the scalar pairs.
    /// Anything else (booleans, a number paired with a string, a string RA with a
    /// composite Dec) is rejected rather than classified.
    pub fn from_values(ra: Option<&Value>, dec: Option<&Value>) -> Result<Self> {
        let (ra, dec) = match (ra, dec) {
            (Some(ra), Some(dec)) if !ra.is_null() && !dec.is_null() => (ra, dec),
            _ => return Ok(CoordinatePair::Absent),
        };

        if ra.is_array() || ra.is_object() {
            return Ok(CoordinatePair::Structured);
        }

        match (ra, dec) {
            (Value::Number(ra), Value::Number(dec)) => Ok(CoordinatePair::Numeric {
                ra: Number::from_json(ra),
                dec: Number::from_json(dec),
            }),
            (Value::String(ra), Value::String(dec)) => Ok(CoordinatePair::Textual {
                ra: ra.clone(),
                dec: dec.clone(),
            }),
            _ => Err(Error::unsupported_shape(shape_name(ra), shape_name(dec))),
        }
    }

    /// Short name of the variant for logging
    pub fn kind(&self) -> &'static str {
        match self {
            CoordinatePair::Absent => "absent",
            CoordinatePair::Structured => "structured",
            CoordinatePair::Numeric { .. } => "numeric",
            CoordinatePair::Textual { .. } => "textual",
        }
    }
}

// =============================================================================
// Candidate Entry
// =============================================================================

/// One object record extracted from a bulletin
///
/// The original JSON object is kept untouched so that classified entries are
/// written out exactly as they were read. The coordinate shape is decided when the
/// entry is constructed, so an unsupported shape fails at ingestion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct CandidateEntry {
    record: Map<String, Value>,
    coordinates: CoordinatePair,
}

impl CandidateEntry {
    pub fn from_record(record: Map<String, Value>) -> Result<Self> {
        let coordinates =
            CoordinatePair::from_values(record.get(fields::RA), record.get(fields::DEC))?;
        Ok(Self {
            record,
            coordinates,
        })
    }

    /// Object name, if the extractor found one
    pub fn name(&self) -> Option<&str> {
        self.record.get(fields::NAME).and_then(Value::as_str)
    }

    pub fn ra(&self) -> Option<&Value> {
        self.record.get(fields::RA)
    }

    pub fn dec(&self) -> Option<&Value> {
        self.record.get(fields::DEC)
    }

    pub fn coordinates(&self) -> &CoordinatePair {
        &self.coordinates
    }

    /// Look up any passthrough field (redshift, Telescope, ...)
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn into_record(self) -> Map<String, Value> {
        self.record
    }
}

impl TryFrom<Map<String, Value>> for CandidateEntry {
    type Error = Error;

    fn try_from(record: Map<String, Value>) -> Result<Self> {
        Self::from_record(record)
    }
}

impl Serialize for CandidateEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

// =============================================================================
// Classification Outcome
// =============================================================================

/// Trust label assigned to an entry's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassificationLabel {
    /// Evidence check passed, or the coordinate shape is trusted as-is
    Good,
    /// Evidence check failed, or a structural heuristic flagged the extraction
    Bad,
    /// RA or Dec is absent
    Null,
}

impl ClassificationLabel {
    pub const ALL: [ClassificationLabel; 3] = [
        ClassificationLabel::Good,
        ClassificationLabel::Bad,
        ClassificationLabel::Null,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::Good => "GOOD",
            ClassificationLabel::Bad => "BAD",
            ClassificationLabel::Null => "NULL",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count vector `[total, good, bad, null]`
///
/// Serialized as a four-element array. Addition is element-wise, so partial
/// counts from independently processed bulletins can be combined in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "[usize; 4]", into = "[usize; 4]")]
pub struct ClassificationCounts {
    pub total: usize,
    pub good: usize,
    pub bad: usize,
    pub null: usize,
}

impl ClassificationCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one entry under `label`
    pub fn record(&mut self, label: ClassificationLabel) {
        self.total += 1;
        match label {
            ClassificationLabel::Good => self.good += 1,
            ClassificationLabel::Bad => self.bad += 1,
            ClassificationLabel::Null => self.null += 1,
        }
    }

    pub fn get(&self, label: ClassificationLabel) -> usize {
        match label {
            ClassificationLabel::Good => self.good,
            ClassificationLabel::Bad => self.bad,
            ClassificationLabel::Null => self.null,
        }
    }

    pub fn to_array(&self) -> [usize; 4] {
        [self.total, self.good, self.bad, self.null]
    }

    /// `total == good + bad + null`
    pub fn is_consistent(&self) -> bool {
        self.total == self.good + self.bad + self.null
    }

    /// Share of entries labelled GOOD as a percentage
    pub fn good_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.good as f64 / self.total as f64) * 100.0
        }
    }
}

impl From<[usize; 4]> for ClassificationCounts {
    fn from([total, good, bad, null]: [usize; 4]) -> Self {
        Self {
            total,
            good,
            bad,
            null,
        }
    }
}

impl From<ClassificationCounts> for [usize; 4] {
    fn from(counts: ClassificationCounts) -> Self {
        counts.to_array()
    }
}

impl Add for ClassificationCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            good: self.good + other.good,
            bad: self.bad + other.bad,
            null: self.null + other.null,
        }
    }
}

impl AddAssign for ClassificationCounts {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for ClassificationCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for ClassificationCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.total, self.good, self.bad, self.null
        )
    }
}

// =============================================================================
// Extraction Document
// =============================================================================

/// Structured extraction produced for one bulletin
///
/// Holds the per-object records under "Celestial Object" and every other
/// top-level field as bulletin-level metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionDocument {
    pub objects: Vec<Map<String, Value>>,
    pub bulletin_fields: Map<String, Value>,
}

impl ExtractionDocument {
    /// Split a decoded extraction JSON value into objects and bulletin-level fields
    ///
    /// A null object list is treated as empty. A missing list, or a list holding
    /// anything other than JSON objects, is an error.
    pub fn from_value(value: Value, context: &str) -> Result<Self> {
        Self::from_value_with_key(value, fields::CELESTIAL_OBJECTS, context)
    }

    /// Same as [`from_value`](Self::from_value) with a custom object list key
    pub fn from_value_with_key(value: Value, objects_key: &str, context: &str) -> Result<Self> {
        let mut document = match value {
            Value::Object(document) => document,
            other => {
                return Err(Error::json_parsing(
                    context,
                    format!("expected a JSON object, found {}", shape_name(&other)),
                    None,
                ));
            }
        };

        let objects = match document.shift_remove(objects_key) {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(Error::json_parsing(
                        context,
                        format!(
                            "object record {} is a {}, expected a mapping",
                            i,
                            shape_name(&other)
                        ),
                        None,
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(Error::json_parsing(
                    context,
                    format!(
                        "'{}' is a {}, expected a list",
                        objects_key,
                        shape_name(&other)
                    ),
                    None,
                ));
            }
            None => {
                return Err(Error::json_parsing(
                    context,
                    format!("missing '{}' key", objects_key),
                    None,
                ));
            }
        };

        Ok(Self {
            objects,
            bulletin_fields: document,
        })
    }

    /// Reassemble the document in its on-disk layout
    pub fn to_value(&self) -> Value {
        let mut document = Map::new();
        document.insert(
            fields::CELESTIAL_OBJECTS.to_string(),
            Value::Array(self.objects.iter().cloned().map(Value::Object).collect()),
        );
        for (key, value) in &self.bulletin_fields {
            document.insert(key.clone(), value.clone());
        }
        Value::Object(document)
    }

    /// Merge bulletin-level fields into every object record and build entries
    ///
    /// Bulletin-level values overwrite object fields of the same name.
    pub fn into_entries(self) -> Result<Vec<CandidateEntry>> {
        let bulletin_fields = self.bulletin_fields;
        self.objects
            .into_iter()
            .enumerate()
            .map(|(i, mut record)| {
                for (key, value) in &bulletin_fields {
                    record.insert(key.clone(), value.clone());
                }
                let name = record
                    .get(fields::NAME)
                    .and_then(Value::as_str)
                    .unwrap_or("-")
                    .to_string();
                CandidateEntry::from_record(record).inspect_err(|e| {
                    error!("Object record {} ({}) rejected: {}", i, name, e);
                })
            })
            .collect()
    }
}
