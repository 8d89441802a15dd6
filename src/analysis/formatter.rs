use log::debug;

use crate::configuration::types::OutputFormat;

pub const JSON_CEILING: usize = 500_000;
pub const FIELDS_CEILING: usize = 800_000;
pub const TEXT_CEILING: usize = 720_000;

/// Room left under the ceiling for the truncation marker.
const MARKER_ALLOWANCE: usize = 500;

/// Maximum number of characters returned for `format`.
pub fn ceiling(format: OutputFormat) -> usize {
    match format {
        OutputFormat::Json => JSON_CEILING,
        OutputFormat::Fields => FIELDS_CEILING,
        OutputFormat::Text => TEXT_CEILING,
    }
}

/// Bounds `output` to the ceiling of `format`.
///
/// Output at or under the ceiling is returned unchanged. Longer output keeps
/// its first `ceiling - 500` characters followed by a marker naming the format.
pub fn trim(output: String, format: OutputFormat) -> String {
    let limit = ceiling(format);
    if output.chars().nth(limit).is_none() {
        return output;
    }

    let keep = limit - MARKER_ALLOWANCE;
    let end = output
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(output.len());

    let mut trimmed = String::with_capacity(end + 96);
    trimmed.push_str(&output[..end]);
    trimmed.push_str(&format!(
        "\n\n[... {} output truncated: exceeded {} characters ...]",
        format, limit
    ));
    debug!(
        "Trimmed {} output from {} to {} bytes",
        format,
        output.len(),
        trimmed.len()
    );
    trimmed
}
