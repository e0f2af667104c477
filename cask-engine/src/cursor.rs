//! Opaque continuation tokens for paginated listings
//!
//! A cursor is the base64 encoding of the composite-key prefix of the first
//! row belonging to the next, not-yet-listed object. It is stateless; the
//! server keeps no session.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use cask_core::{CaskError, Result};

/// Encode a composite-key prefix as an opaque token.
pub fn encode(prefix: &[u8]) -> String {
    BASE64.encode(prefix)
}

/// Decode a continuation token back into a composite-key prefix.
pub fn decode(token: &str) -> Result<Vec<u8>> {
    BASE64.decode(token).map_err(|_| CaskError::InvalidCursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let prefix = b"photos:cat.jpg:";
        let token = encode(prefix);
        assert_eq!(decode(&token).unwrap(), prefix);
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert!(matches!(decode("not base64!!"), Err(CaskError::InvalidCursor)));
    }
}
