//! Turn the model's "should be JSON" text into a section list.
//!
//! Code fences are dropped, the outermost `{ ... }` span is kept and the
//! result is parsed once.

use serde_json::Value;

use crate::error::{GenError, Result};
use crate::section::{ensure_unique_ids, GeneratedSection};

const FENCE_TOKENS: [&str; 2] = ["```json", "```"];

/// The candidate JSON text: fences removed, sliced to the outermost braces.
pub fn extract_json_slice(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenError::EmptyResponse);
    }

    let mut clean = trimmed.to_string();
    for token in FENCE_TOKENS {
        clean = clean.replace(token, "");
    }

    match (clean.find('{'), clean.rfind('}')) {
        (Some(first), Some(last)) if first <= last => Ok(clean[first..=last].to_string()),
        _ => Ok(clean.trim().to_string()),
    }
}

/// Strict parse of the repaired slice.
pub fn parse_json(text: &str) -> Result<Value> {
    let slice = extract_json_slice(text)?;
    serde_json::from_str(&slice).map_err(|e| {
        log::debug!("unparseable model output:\n{slice}");
        GenError::MalformedResponse(e.to_string())
    })
}

/// Full pipeline: repair, parse, pull out `sections`, validate every entry.
pub fn parse_sections(text: &str) -> Result<Vec<GeneratedSection>> {
    let value = parse_json(text)?;
    let sections = match value.get("sections") {
        Some(Value::Array(items)) => items,
        _ => return Err(GenError::MissingSections),
    };

    let mut out = Vec::with_capacity(sections.len());
    for (i, item) in sections.iter().enumerate() {
        let section: GeneratedSection = serde_json::from_value(item.clone()).map_err(|e| {
            GenError::MalformedResponse(format!("section {i}: {e}"))
        })?;
        out.push(section);
    }

    let renamed = ensure_unique_ids(&mut out);
    if renamed > 0 {
        log::warn!("{renamed} duplicate section id(s) renamed");
    }
    Ok(out)
}
