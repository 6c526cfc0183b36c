//! Multibase handling, restricted to base58-btc.

use base58::{FromBase58, ToBase58};
use multibase::Base;

use crate::error::EncodingError;

/// Multibase prefix character for base58-btc.
pub const BASE58BTC_PREFIX: char = 'z';

/// Encodes bytes as plain base58-btc, without a multibase prefix.
pub fn encode_base58(bytes: &[u8]) -> String {
    bytes.to_base58()
}

/// Decodes a plain base58-btc string.
pub fn decode_base58(value: &str) -> Result<Vec<u8>, EncodingError> {
    if value.is_empty() {
        return Err(EncodingError::InvalidBase58("empty input".to_string()));
    }
    value
        .from_base58()
        .map_err(|e| EncodingError::InvalidBase58(format!("{:?}", e)))
}

/// Encodes bytes as a `z`-prefixed multibase string.
pub fn encode(bytes: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, bytes)
}

/// Decodes a multibase string. Only the base58-btc alphabet is accepted.
pub fn decode(value: &str) -> Result<Vec<u8>, EncodingError> {
    let prefix = value.chars().next().ok_or(EncodingError::EmptyMultibase)?;
    match Base::from_code(prefix) {
        Ok(Base::Base58Btc) => {}
        _ => return Err(EncodingError::UnsupportedMultibase(prefix)),
    }

    let (_, bytes) =
        multibase::decode(value).map_err(|e| EncodingError::InvalidBase58(e.to_string()))?;
    if bytes.is_empty() {
        return Err(EncodingError::InvalidBase58("empty input".to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_value() {
        let bytes = hex::decode(
            "ed013b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29",
        )
        .unwrap();
        assert_eq!(
            encode(&bytes),
            "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp"
        );
    }

    #[test]
    fn test_agrees_with_plain_base58() {
        let bytes = hex::decode("e7010203").unwrap();
        assert_eq!(encode(&bytes), format!("{}{}", BASE58BTC_PREFIX, encode_base58(&bytes)));
        assert_eq!(decode(&encode(&bytes)).unwrap(), decode_base58(&encode_base58(&bytes)).unwrap());
    }

    #[test]
    fn test_leading_zero_bytes_survive() {
        let bytes = [0u8, 0, 1, 2, 3];
        let encoded = encode(&bytes);
        assert!(encoded.starts_with("z11"));
        assert_eq!(decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(decode(""), Err(EncodingError::EmptyMultibase));
        assert_eq!(
            decode("mAQID"),
            Err(EncodingError::UnsupportedMultibase('m'))
        );
        assert_eq!(decode("!abc"), Err(EncodingError::UnsupportedMultibase('!')));
        assert!(matches!(decode("z"), Err(EncodingError::InvalidBase58(_))));
        // '0', 'O', 'I' and 'l' are outside the bitcoin alphabet
        assert!(matches!(decode("z0OIl"), Err(EncodingError::InvalidBase58(_))));
    }
}
