use crate::audio::error::AudioError;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use tracing::trace;

const LOG_TARGET: &str = "dharma_daily::audio::payload";

const DATA_URI_MARKER: &str = ";base64,";

/// Standard alphabet, padding optional, stray trailing bits ignored.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Strips a `data:audio/<subtype>;base64,` header if the payload carries one.
fn strip_data_uri_prefix(payload: &str) -> &str {
    let trimmed = payload.trim_start();
    let has_scheme = trimmed
        .get(..5)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("data:"));
    if !has_scheme {
        return trimmed;
    }
    // ASCII lowercasing keeps byte offsets aligned with `trimmed`.
    let lowered = trimmed.to_ascii_lowercase();
    match lowered.find(DATA_URI_MARKER) {
        Some(idx) if lowered[5..idx].starts_with("audio/") => &trimmed[idx + DATA_URI_MARKER.len()..],
        _ => trimmed,
    }
}

/// Decodes a transport-encoded audio payload into raw bytes.
///
/// Accepts an optional data-URI header, arbitrary embedded whitespace and
/// missing `=` padding.
pub fn decode(payload: &str) -> Result<Vec<u8>, AudioError> {
    let body = strip_data_uri_prefix(payload);
    let cleaned: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = FORGIVING.decode(cleaned.as_bytes())?;
    trace!(target: LOG_TARGET, "Decoded {} payload chars into {} bytes", cleaned.len(), bytes.len());
    Ok(bytes)
}
