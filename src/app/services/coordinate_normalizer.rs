//! Coordinate normalization to decimal degrees
//!
//! Converts the RA/Dec representations found in extraction documents into a single
//! numeric unit. Three families are recognised, decided by the RA string alone:
//!
//! - `22h02m43.291s` / `+42d16m39.63s` (unit-marked sexagesimal)
//! - `22:02:43.291` / `+42:16:39.63` (colon sexagesimal, RA in hours, Dec in degrees)
//! - `330.68` / `42.28` (already decimal degrees)
//!
//! List- and mapping-shaped coordinates are never passed here; callers filter them
//! through [`CoordinatePair`] first.

use crate::app::models::{CandidateEntry, CoordinatePair, shape_name};
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d*)?|\.\d+").expect("sexagesimal component pattern is valid")
});

const SEPARATORS: &[char] = &[
    'h', 'd', 'm', 's', ':', ' ', '\t', '°', '\'', '"', '′', '″',
];

/// Representation family a coordinate pair was recognised as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFormat {
    /// Hour/degree unit markers (`h`, `m`, `s`, `d`)
    Hms,
    /// Colon-separated sexagesimal
    Colon,
    /// Plain decimal degrees
    Decimal,
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinateFormat::Hms => "hms",
            CoordinateFormat::Colon => "colon",
            CoordinateFormat::Decimal => "decimal",
        };
        f.write_str(name)
    }
}

/// RA/Dec in decimal degrees (ICRS)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedCoordinates {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub format: CoordinateFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AngleUnit {
    Hours,
    Degrees,
}

/// Normalize a textual RA/Dec pair to decimal degrees
///
/// # Errors
///
/// Returns `Error::CoordinateParse` when either string does not fit the family
/// selected by the RA string, or when the resulting declination is out of range.
pub fn normalize(ra_text: &str, dec_text: &str) -> Result<NormalizedCoordinates> {
    let format = detect_format(ra_text);

    let (ra_deg, dec_deg) = match format {
        CoordinateFormat::Hms | CoordinateFormat::Colon => (
            parse_sexagesimal(ra_text, AngleUnit::Hours)?,
            parse_sexagesimal(dec_text, AngleUnit::Degrees)?,
        ),
        CoordinateFormat::Decimal => (parse_decimal(ra_text)?, parse_decimal(dec_text)?),
    };

    debug!(
        "Normalized ({}, {}) as {} -> ({:.6}, {:.6})",
        ra_text, dec_text, format, ra_deg, dec_deg
    );

    Ok(NormalizedCoordinates {
        ra_deg,
        dec_deg,
        format,
    })
}

/// Normalize an entry's coordinates
///
/// Numeric pairs are taken as decimal degrees, textual pairs go through
/// [`normalize`]. Absent and structured pairs are rejected.
pub fn normalize_entry(entry: &CandidateEntry) -> Result<NormalizedCoordinates> {
    match entry.coordinates() {
        CoordinatePair::Numeric { ra, dec } => Ok(NormalizedCoordinates {
            ra_deg: ra.as_f64(),
            dec_deg: dec.as_f64(),
            format: CoordinateFormat::Decimal,
        }),
        CoordinatePair::Textual { ra, dec } => normalize(ra, dec),
        CoordinatePair::Absent | CoordinatePair::Structured => Err(Error::unsupported_shape(
            entry.ra().map(shape_name).unwrap_or("absent"),
            entry.dec().map(shape_name).unwrap_or("absent"),
        )),
    }
}

/// Decide the representation family from the RA string
pub fn detect_format(ra_text: &str) -> CoordinateFormat {
    if ra_text.contains('h') {
        CoordinateFormat::Hms
    } else if ra_text.contains(':') {
        CoordinateFormat::Colon
    } else {
        CoordinateFormat::Decimal
    }
}

fn parse_decimal(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|e| Error::coordinate_parse(text, format!("not a decimal number: {e}")))
}

/// Parse a sexagesimal angle with one to three components
fn parse_sexagesimal(text: &str, unit: AngleUnit) -> Result<f64> {
    let trimmed = text.trim();
    let (negative, body) = if let Some(rest) = trimmed.strip_prefix(['-', '\u{2212}']) {
        (true, rest)
    } else if let Some(rest) = trimmed.strip_prefix('+') {
        (false, rest)
    } else {
        (false, trimmed)
    };

    let leftover = COMPONENT_RE.replace_all(body, "");
    if let Some(bad) = leftover.chars().find(|c| !SEPARATORS.contains(c)) {
        return Err(Error::coordinate_parse(
            text,
            format!("unexpected character '{bad}' in sexagesimal value"),
        ));
    }

    let components = COMPONENT_RE
        .find_iter(body)
        .map(|m| {
            m.as_str()
                .parse::<f64>()
                .map_err(|e| Error::coordinate_parse(text, e.to_string()))
        })
        .collect::<Result<Vec<f64>>>()?;

    if components.is_empty() || components.len() > 3 {
        return Err(Error::coordinate_parse(
            text,
            format!(
                "expected 1 to 3 sexagesimal components, found {}",
                components.len()
            ),
        ));
    }

    if components.iter().skip(1).any(|c| *c >= 60.0) {
        return Err(Error::coordinate_parse(
            text,
            "minutes and seconds must be below 60",
        ));
    }

    let magnitude = components
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(value, divisor)| value / divisor)
        .sum::<f64>();
    let signed = if negative { -magnitude } else { magnitude };

    match unit {
        AngleUnit::Hours => Ok((signed * 15.0).rem_euclid(360.0)),
        AngleUnit::Degrees => {
            if !(-90.0..=90.0).contains(&signed) {
                return Err(Error::coordinate_parse(
                    text,
                    "declination must be between -90 and 90 degrees",
                ));
            }
            Ok(signed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_normalize_hms() {
        let result = normalize("22h02m43.291s", "+42d16m39.63s").unwrap();
        assert_eq!(result.format, CoordinateFormat::Hms);
        assert_close(result.ra_deg, 330.680379166666);
        assert_close(result.dec_deg, 42.277675);
    }

    #[test]
    fn test_normalize_colon() {
        let result = normalize("22:02:43.291", "+42:16:39.63").unwrap();
        assert_eq!(result.format, CoordinateFormat::Colon);
        assert_close(result.ra_deg, 330.680379166666);
        assert_close(result.dec_deg, 42.277675);
    }

    #[test]
    fn test_normalize_negative_zero_degrees() {
        let result = normalize("05:35:17.3", "-00:30:00").unwrap();
        assert_close(result.dec_deg, -0.5);
        assert_close(result.ra_deg, (5.0 + 35.0 / 60.0 + 17.3 / 3600.0) * 15.0);
    }

    #[test]
    fn test_normalize_decimal() {
        let result = normalize("330.68", " 42.28 ").unwrap();
        assert_eq!(result.format, CoordinateFormat::Decimal);
        assert_close(result.ra_deg, 330.68);
        assert_close(result.dec_deg, 42.28);
    }

    #[test]
    fn test_normalize_decimal_parse_error() {
        let result = normalize("abc", "42.28");
        assert!(matches!(result, Err(Error::CoordinateParse { .. })));
    }

    #[test]
    fn test_format_detected_from_ra_only() {
        // A colon in Dec does not make a decimal RA sexagesimal
        assert_eq!(detect_format("330.68"), CoordinateFormat::Decimal);
        assert!(normalize("330.68", "+42:16:39").is_err());
    }

    #[test]
    fn test_sexagesimal_rejects_out_of_range_parts() {
        assert!(normalize("12h75m00s", "+10d00m00s").is_err());
        assert!(normalize("12:00:00", "+95:00:00").is_err());
        assert!(normalize("12:00:00:00", "+10:00:00").is_err());
        assert!(normalize("12h00mJ", "+10d").is_err());
    }

    #[test]
    fn test_ra_wraps_at_24_hours() {
        let result = normalize("24:00:00", "+00:00:00").unwrap();
        assert_close(result.ra_deg, 0.0);
    }

    #[test]
    fn test_normalize_entry_variants() {
        let entry = CandidateEntry::from_record(
            json!({"RA": 10, "Dec": -5.5}).as_object().cloned().unwrap(),
        )
        .unwrap();
        let result = normalize_entry(&entry).unwrap();
        assert_close(result.ra_deg, 10.0);
        assert_close(result.dec_deg, -5.5);

        let entry = CandidateEntry::from_record(
            json!({"RA": ["1", "2"], "Dec": "x"}).as_object().cloned().unwrap(),
        )
        .unwrap();
        assert!(matches!(
            normalize_entry(&entry),
            Err(Error::UnsupportedShape { .. })
        ));
    }
}
