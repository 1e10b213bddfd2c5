use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::ENTRY_DOCUMENT;

/// Generated files, keyed by their path relative to the repository root.
pub type FileSet = BTreeMap<String, String>;

const FENCE: &str = "```";

/// Remove a Markdown code fence around the model's answer, if there is one.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` openers, as well as
/// chatter before the opening fence. Text without a fence is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    // A bare object may itself contain fences, e.g. in README content.
    if text.starts_with('{') {
        return text;
    }
    let Some(start) = text.find(FENCE) else {
        return text;
    };
    let after_fence = &text[start + FENCE.len()..];
    // Skip the info string ("json", "JSON", ...), which may share a line with the object.
    let body = after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    match body.rfind(FENCE) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse the model's answer into a [`FileSet`].
pub fn parse_file_set(raw: &str) -> Result<FileSet, GenerationError> {
    let files: FileSet = serde_json::from_str(strip_code_fence(raw))?;

    if let Some(name) = files.keys().find(|name| !is_flat_file_name(name)) {
        return Err(GenerationError::InvalidFileName(name.clone()));
    }
    if !files.contains_key(ENTRY_DOCUMENT) {
        return Err(GenerationError::MissingEntryDocument(ENTRY_DOCUMENT));
    }

    Ok(files)
}

/// Files are committed to the repository root, so names may not nest.
fn is_flat_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}
