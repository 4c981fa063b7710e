//! Evidence matching of extracted coordinates against bulletin text
//!
//! Decides whether the free text of a bulletin supports an extracted RA/Dec pair.
//! The rules are evaluated in a fixed order and the first applicable one decides:
//!
//! 1. Absent coordinates are not applicable (callers route them to NULL first)
//! 2. Structured (list/mapping) RA is trusted without looking at the text
//! 3. Numeric pairs must both appear verbatim in the text
//! 4. Textual pairs go through the prefix heuristics:
//!    a. RA starting with `J` (compact J2000 designation) is rejected
//!    b. RA and Dec sharing their first 5 characters is rejected as a mis-parse
//!    c. The first 3 characters of RA and of Dec must both appear in the text
//!
//! Rules 4b and 4c are heuristics tuned to how bulletins are typeset, not
//! physically principled checks. Structured coordinates are trusted unconditionally,
//! which means a hallucinated list of positions passes.

use crate::app::models::CoordinatePair;
use crate::constants::evidence::{J2000_PREFIX, MIRRORED_PREFIX_LEN, TEXT_PREFIX_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which rule decided an evidence check, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// RA or Dec absent (rule 1)
    NotApplicable,
    /// List or mapping RA trusted as-is (rule 2)
    StructuredTrusted,
    /// Both numeric values found verbatim (rule 3)
    NumericFound,
    /// At least one numeric value missing from the text (rule 3)
    NumericMissing,
    /// RA is a compact J2000 designation (rule 4a)
    J2000Designation,
    /// RA and Dec share their leading characters (rule 4b)
    MirroredPrefix,
    /// Both textual prefixes found in the text (rule 4c)
    PrefixFound,
    /// A textual prefix is missing from the text (rule 4d)
    PrefixMissing,
}

impl MatchOutcome {
    /// Whether the text supports the coordinates
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            MatchOutcome::StructuredTrusted | MatchOutcome::NumericFound | MatchOutcome::PrefixFound
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::NotApplicable => "not_applicable",
            MatchOutcome::StructuredTrusted => "structured_trusted",
            MatchOutcome::NumericFound => "numeric_found",
            MatchOutcome::NumericMissing => "numeric_missing",
            MatchOutcome::J2000Designation => "j2000_designation",
            MatchOutcome::MirroredPrefix => "mirrored_prefix",
            MatchOutcome::PrefixFound => "prefix_found",
            MatchOutcome::PrefixMissing => "prefix_missing",
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether `bulletin_text` supports the coordinates
pub fn matches(bulletin_text: &str, coordinates: &CoordinatePair) -> bool {
    explain(bulletin_text, coordinates).is_match()
}

/// Evaluate the evidence rules and report which one decided
pub fn explain(bulletin_text: &str, coordinates: &CoordinatePair) -> MatchOutcome {
    match coordinates {
        CoordinatePair::Absent => MatchOutcome::NotApplicable,
        CoordinatePair::Structured => MatchOutcome::StructuredTrusted,
        CoordinatePair::Numeric { ra, dec } => {
            if bulletin_text.contains(&ra.to_source_string())
                && bulletin_text.contains(&dec.to_source_string())
            {
                MatchOutcome::NumericFound
            } else {
                MatchOutcome::NumericMissing
            }
        }
        CoordinatePair::Textual { ra, dec } => explain_textual(bulletin_text, ra, dec),
    }
}

fn explain_textual(bulletin_text: &str, ra: &str, dec: &str) -> MatchOutcome {
    if ra.starts_with(J2000_PREFIX) {
        return MatchOutcome::J2000Designation;
    }

    if char_prefix(ra, MIRRORED_PREFIX_LEN) == char_prefix(dec, MIRRORED_PREFIX_LEN) {
        return MatchOutcome::MirroredPrefix;
    }

    if bulletin_text.contains(char_prefix(ra, TEXT_PREFIX_LEN))
        && bulletin_text.contains(char_prefix(dec, TEXT_PREFIX_LEN))
    {
        MatchOutcome::PrefixFound
    } else {
        MatchOutcome::PrefixMissing
    }
}

/// First `n` characters of `s`, or all of `s` when it is shorter
fn char_prefix(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(index, _)| &s[..index])
}
