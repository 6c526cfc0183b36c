//! Multicodec prefixes for public keys.
//!
//! A multicodec code is written as an unsigned LEB128 varint in front of the
//! raw key bytes. Every public-key code in the table encodes to two bytes.

use crate::error::EncodingError;

pub const ED25519_PUB: u64 = 0xed;
pub const SECP256K1_PUB: u64 = 0xe7;
pub const X25519_PUB: u64 = 0xec;
pub const BLS12_381_G2_PUB: u64 = 0xeb;
pub const P256_PUB: u64 = 0x1200;
pub const P384_PUB: u64 = 0x1201;

const TABLE: &[(u64, &str)] = &[
    (ED25519_PUB, "ed25519-pub"),
    (SECP256K1_PUB, "secp256k1-pub"),
    (X25519_PUB, "x25519-pub"),
    (BLS12_381_G2_PUB, "bls12_381-g2-pub"),
    (P256_PUB, "p256-pub"),
    (P384_PUB, "p384-pub"),
];

/// Looks up the registered name of a multicodec code.
pub fn name(code: u64) -> Option<&'static str> {
    TABLE.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

/// Encodes a code as an unsigned varint.
pub fn encode_varint(mut code: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(2);
    loop {
        let byte = (code & 0x7f) as u8;
        code >>= 7;
        if code == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Decodes a leading unsigned varint, returning the code and bytes consumed.
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize), EncodingError> {
    let mut code: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if i >= 9 {
            return Err(EncodingError::VarintOverflow);
        }
        code |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((code, i + 1));
        }
    }
    Err(EncodingError::TruncatedVarint)
}

/// Splits multicodec-prefixed bytes into the code and the payload.
pub fn split(bytes: &[u8]) -> Result<(u64, &[u8]), EncodingError> {
    let (code, read) = decode_varint(bytes)?;
    Ok((code, &bytes[read..]))
}

/// Prepends the varint form of `code` to `payload`.
pub fn prefixed(code: u64, payload: &[u8]) -> Vec<u8> {
    [encode_varint(code).as_slice(), payload].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_byte_prefixes() {
        assert_eq!(encode_varint(ED25519_PUB), vec![0xed, 0x01]);
        assert_eq!(encode_varint(SECP256K1_PUB), vec![0xe7, 0x01]);
        assert_eq!(encode_varint(P256_PUB), vec![0x80, 0x24]);
    }

    #[test]
    fn test_split() {
        let bytes = prefixed(X25519_PUB, &[1, 2, 3]);
        let (code, payload) = split(&bytes).unwrap();
        assert_eq!(code, X25519_PUB);
        assert_eq!(payload, &[1, 2, 3]);
        assert_eq!(name(code), Some("x25519-pub"));
    }

    #[test]
    fn test_invalid_varints() {
        assert_eq!(split(&[]), Err(EncodingError::TruncatedVarint));
        assert_eq!(split(&[0xed]), Err(EncodingError::TruncatedVarint));
        assert_eq!(split(&[0xff; 12]), Err(EncodingError::VarintOverflow));
        assert_eq!(name(0x99), None);
    }
}
