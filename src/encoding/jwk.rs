use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json_canonicalizer::to_string as jcs_canonicalize;
use sha2::{Digest, Sha256};

use crate::error::EncodingError;

/// A public JSON Web Key (RFC 7517) for the curves this crate supports.
///
/// Only public members are modelled: this crate never exports private keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, `OKP` or `EC`
    pub kty: String,

    /// Curve name
    pub crv: String,

    /// Base64url-encoded x coordinate (the whole key for `OKP`)
    pub x: String,

    /// Base64url-encoded y coordinate, `EC` keys only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Jwk {
    /// Builds an octet key pair JWK (RFC 8037).
    pub fn okp(crv: &str, x: &[u8]) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: crv.to_string(),
            x: encode_coordinate(x),
            y: None,
            kid: None,
        }
    }

    /// Builds an elliptic curve JWK from affine coordinates.
    pub fn ec(crv: &str, x: &[u8], y: &[u8]) -> Self {
        Self {
            kty: "EC".to_string(),
            crv: crv.to_string(),
            x: encode_coordinate(x),
            y: Some(encode_coordinate(y)),
            kid: None,
        }
    }

    /// Sets `kid` to the RFC 7638 thumbprint.
    pub fn with_thumbprint_kid(mut self) -> Result<Self, EncodingError> {
        self.kid = Some(self.thumbprint()?);
        Ok(self)
    }

    pub fn x_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        decode_coordinate(&self.x)
    }

    pub fn y_bytes(&self) -> Result<Option<Vec<u8>>, EncodingError> {
        self.y.as_deref().map(decode_coordinate).transpose()
    }

    /// Computes the RFC 7638 thumbprint: SHA-256 over the canonical JSON of
    /// the required members, base64url-encoded.
    pub fn thumbprint(&self) -> Result<String, EncodingError> {
        let members = match &self.y {
            Some(y) => json!({"crv": self.crv, "kty": self.kty, "x": self.x, "y": y}),
            None => json!({"crv": self.crv, "kty": self.kty, "x": self.x}),
        };
        let canonical_json = jcs_canonicalize(&members)
            .map_err(|e| EncodingError::Canonicalize(e.to_string()))?;
        let hash = Sha256::digest(canonical_json.as_bytes());
        Ok(Base64UrlUnpadded::encode_string(&hash))
    }
}

/// Base64url (unpadded) encoding used for JWK coordinates.
pub fn encode_coordinate(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

pub fn decode_coordinate(value: &str) -> Result<Vec<u8>, EncodingError> {
    Base64UrlUnpadded::decode_vec(value).map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}
