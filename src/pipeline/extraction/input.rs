//! Upload decoding: `data:image/png;base64,...` strings from the browser, or bare base64.

use base64::Engine;

use super::types::{RecognitionInput, DEFAULT_IMAGE_MIME};
use super::ExtractionError;

/// Decode a data URI (or bare base64) into image bytes plus MIME type.
///
/// The MIME type comes from the URI header when present, otherwise `image/jpeg`.
pub fn parse_data_uri(payload: &str) -> Result<RecognitionInput, ExtractionError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::InvalidInput("Empty image payload".into()));
    }

    let mime_type = declared_mime_type(trimmed).unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
    let base64_data = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ExtractionError::InvalidInput("Data URI has no ',' separator".into()))?,
        None => trimmed,
    };

    let compact: String = base64_data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ExtractionError::InvalidInput(format!("Base64 decode failed: {e}")))?;

    if bytes.is_empty() {
        return Err(ExtractionError::InvalidInput("Decoded image is empty".into()));
    }

    Ok(RecognitionInput { bytes, mime_type })
}

/// MIME type declared in a `data:` header, lowercased. `None` for bare base64.
pub fn declared_mime_type(payload: &str) -> Option<String> {
    let rest = payload.trim().strip_prefix("data:")?;
    let header = rest.split_once(',').map(|(h, _)| h).unwrap_or(rest);
    let mime = header.split(';').next()?.trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime.to_ascii_lowercase())
    }
}

/// Image types the enhancer can decode.
const SUPPORTED_IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/tiff",
    "image/webp",
    "image/gif",
    "image/bmp",
    "image/x-ms-bmp",
];

/// Whether a declared MIME type (lowercase) is one the enhancer decodes.
pub fn is_supported_image_mime(mime: &str) -> bool {
    SUPPORTED_IMAGE_MIME_TYPES.contains(&mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_mime_types() {
        assert!(is_supported_image_mime("image/webp"));
        assert!(is_supported_image_mime("image/bmp"));
        assert!(!is_supported_image_mime("image/heic"));
        assert!(!is_supported_image_mime("application/pdf"));
    }

    #[test]
    fn parses_png_data_uri() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG fake");
        let input = parse_data_uri(&format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!(input.mime_type, "image/png");
        assert_eq!(input.bytes, b"\x89PNG fake");
    }

    #[test]
    fn bare_base64_defaults_to_jpeg() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"\xFF\xD8\xFF");
        let input = parse_data_uri(&encoded).unwrap();
        assert_eq!(input.mime_type, "image/jpeg");
        assert_eq!(input.bytes[0], 0xFF);
    }

    #[test]
    fn tolerates_line_wrapped_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"hello handwriting");
        let (a, b) = encoded.split_at(8);
        let input = parse_data_uri(&format!("data:image/webp;base64,{a}\n{b}")).unwrap();
        assert_eq!(input.bytes, b"hello handwriting");
        assert_eq!(input.mime_type, "image/webp");
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            parse_data_uri("   "),
            Err(ExtractionError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(parse_data_uri("data:image/png;base64,not-valid-base64!!!").is_err());
    }

    #[test]
    fn rejects_data_uri_without_separator() {
        assert!(parse_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn declared_mime_type_variants() {
        assert_eq!(
            declared_mime_type("data:IMAGE/PNG;base64,AAAA").as_deref(),
            Some("image/png")
        );
        assert_eq!(
            declared_mime_type("data:application/pdf;base64,AAAA").as_deref(),
            Some("application/pdf")
        );
        assert_eq!(declared_mime_type("AAAA"), None);
        assert_eq!(declared_mime_type("data:;base64,AAAA"), None);
    }
}
