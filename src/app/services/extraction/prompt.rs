//! Prompt construction and response decoding for LLM extraction

use crate::app::models::ExtractionDocument;
use crate::{Error, Result};

/// Instruction placed before the bulletin body
pub const EXTRACTION_INSTRUCTION: &str = r#"Extract information from the text and provide the output in JSON format as: {"Celestial Object": [{"Name": , "RA":, "Dec":, "redshift":, "Type":, "Time":, "Date": }], "References": , "Event Type":, "Time":, "Date":, "Telescope": ,"Instrument":, "Observatory":} for all astronomical object names and put Null when there is no information."#;

const CODE_FENCE: &str = "```";
const JSON_TAG: &str = "json";

/// Build the user prompt for one bulletin
pub fn build_prompt(bulletin_body: &str) -> String {
    format!("{}\n{}", EXTRACTION_INSTRUCTION, bulletin_body)
}

/// Strip markdown code fences and a leading `json` language tag
pub fn clean_response(response: &str) -> String {
    let without_fences = response.replace(CODE_FENCE, "");
    let trimmed = without_fences.trim();
    trimmed
        .strip_prefix(JSON_TAG)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Decode a model response into an extraction document
///
/// # Errors
///
/// Returns `Error::Extraction` if the cleaned response is not a JSON object with a
/// "Celestial Object" list.
pub fn parse_response(bulletin_id: &str, response: &str) -> Result<ExtractionDocument> {
    let cleaned = clean_response(response);
    let value: serde_json::Value = serde_json::from_str(&cleaned).map_err(|e| {
        Error::extraction(bulletin_id, format!("response is not valid JSON: {}", e))
    })?;

    ExtractionDocument::from_value(value, bulletin_id)
        .map_err(|e| Error::extraction(bulletin_id, e.to_string()))
}
