//! Decoding of uploaded image content.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, SagaError};

/// Decodes image content as uploaded by clients.
///
/// Accepts either a data URL (`data:image/png;base64,iVBOR...`) or bare
/// base64. Everything up to and including the first comma is dropped.
pub fn decode(content: &str) -> Result<Vec<u8>> {
    let data = match content.find(',') {
        Some(index) => &content[index + 1..],
        None => content,
    };
    let data = data.trim();

    if data.is_empty() {
        return Err(SagaError::InvalidInput(
            "image content is empty".to_string(),
        ));
    }

    STANDARD
        .decode(data)
        .map_err(|e| SagaError::InvalidInput(format!("image content is not valid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url() {
        let bytes = decode("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_bare_base64() {
        assert_eq!(decode("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_empty_content_is_invalid() {
        assert!(matches!(decode(""), Err(SagaError::InvalidInput(_))));
        assert!(matches!(
            decode("data:image/png;base64,"),
            Err(SagaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            decode("data:image/png;base64,not base64!"),
            Err(SagaError::InvalidInput(_))
        ));
    }
}
