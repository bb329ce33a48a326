use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine as _};

/// Gmail pads some parts and not others.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 body part into text, replacing invalid UTF-8.
///
/// The URL-safe alphabet is tried first; the standard alphabet is accepted
/// as a fallback for senders that ignore the API contract.
pub fn decode_body_data(data: &str) -> Result<String, DecodeError> {
    let trimmed = data.trim();
    let bytes = match URL_SAFE_LENIENT.decode(trimmed) {
        Ok(b) => b,
        Err(url_err) => STANDARD_LENIENT.decode(trimmed).map_err(|_| url_err)?,
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Encode a serialized message the way the send endpoint expects it.
pub fn encode_raw_message(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(bytes)
}
