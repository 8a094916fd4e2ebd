//! Native side of the materializer contract: the encoded payload.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Accepts bodies with or without trailing `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64 body plus the name the page picked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub mime_type: String,
    pub filename: String,
    body: String,
}

impl EncodedPayload {
    /// Splits `data:<mime>;base64,<body>`. Everything through the first comma is
    /// dropped; a string without a `data:` preamble is taken as the bare body.
    pub fn from_data_uri(data_uri: &str, filename: &str, default_mime: &str) -> Self {
        let trimmed = data_uri.trim();
        let has_preamble = trimmed
            .get(..5)
            .map(|p| p.eq_ignore_ascii_case("data:"))
            .unwrap_or(false);

        let (mime_type, body) = if has_preamble {
            match trimmed.split_once(',') {
                Some((header, body)) => {
                    let mime = header[5..].split(';').next().unwrap_or("").trim();
                    let mime = if mime.is_empty() { default_mime } else { mime };
                    (mime.to_string(), body)
                }
                None => (default_mime.to_string(), trimmed),
            }
        } else {
            (default_mime.to_string(), trimmed)
        };

        Self {
            mime_type,
            filename: filename.to_string(),
            body: body.to_string(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decodes the body. ASCII whitespace (line-wrapped payloads) is skipped.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let compact: String = self
            .body
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        LENIENT.decode(compact.as_bytes())
    }
}

/// `data:<mime>;base64,<body>`, the form the page hands over.
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
