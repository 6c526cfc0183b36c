//! Error types for DID resolution operations.
//!
//! Each layer has its own error enum built with `thiserror`. Everything that
//! can reach a caller of the resolver is folded into [`ResolutionError`],
//! whose [`ErrorKind`] is the closed taxonomy callers pattern-match on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of failure kinds a resolution can end in.
///
/// Wire names follow the W3C DID specification registries.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidDid,
    MethodNotSupported,
    UnsupportedKeyType,
    UnknownMulticodec,
    DomainNotAuthorized,
    NotFound,
    NetworkError,
    ValidationFailed,
    #[serde(rename = "internalError")]
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidDid => "invalidDid",
            Self::MethodNotSupported => "methodNotSupported",
            Self::UnsupportedKeyType => "unsupportedKeyType",
            Self::UnknownMulticodec => "unknownMulticodec",
            Self::DomainNotAuthorized => "domainNotAuthorized",
            Self::NotFound => "notFound",
            Self::NetworkError => "networkError",
            Self::ValidationFailed => "validationFailed",
            Self::Internal => "internalError",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while resolving or dereferencing a DID
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// The input is not a well-formed DID or DID URL
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// No handler is registered for the DID method
    #[error("DID method not supported: {0}")]
    MethodNotSupported(String),

    /// The key type has no registered crypto provider
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The multicodec prefix is not recognised
    #[error("unknown multicodec 0x{0:x}")]
    UnknownMulticodec(u64),

    /// The domain policy rejects the host
    #[error("domain not authorized: {0}")]
    DomainNotAuthorized(String),

    /// The DID or the addressed resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure while fetching a document
    #[error("network error: {0}")]
    Network(String),

    /// The document failed validation
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A fault no handler anticipated
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResolutionError {
    /// The taxonomy entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDid(_) => ErrorKind::InvalidDid,
            Self::MethodNotSupported(_) => ErrorKind::MethodNotSupported,
            Self::UnsupportedKeyType(_) => ErrorKind::UnsupportedKeyType,
            Self::UnknownMulticodec(_) => ErrorKind::UnknownMulticodec,
            Self::DomainNotAuthorized(_) => ErrorKind::DomainNotAuthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<ParseError> for ResolutionError {
    fn from(err: ParseError) -> Self {
        Self::InvalidDid(err.to_string())
    }
}

/// Errors produced by the DID / DID URL parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing 'did:' prefix")]
    MissingPrefix,

    #[error("empty method name")]
    EmptyMethod,

    #[error("method name '{0}' must be lowercase")]
    UppercaseMethod(String),

    #[error("invalid character in method name '{0}'")]
    InvalidMethod(String),

    #[error("empty method-specific identifier")]
    EmptyMethodSpecificId,

    #[error("invalid method-specific identifier '{0}'")]
    InvalidMethodSpecificId(String),

    #[error("'{0}' is a DID URL, not a bare DID")]
    UnexpectedUrlComponents(String),

    #[error("empty component after '{0}'")]
    EmptyComponent(char),
}

/// Errors produced by the byte-level encoders
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("empty multibase value")]
    EmptyMultibase,

    #[error("unsupported multibase prefix '{0}'")]
    UnsupportedMultibase(char),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("invalid base64url: {0}")]
    InvalidBase64(String),

    #[error("truncated multicodec varint")]
    TruncatedVarint,

    #[error("multicodec varint overflows u64")]
    VarintOverflow,

    #[error("canonicalization error: {0}")]
    Canonicalize(String),
}

/// Errors produced by crypto providers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("JWK is not a {expected} key (kty={kty}, crv={crv})")]
    JwkMismatch {
        expected: String,
        kty: String,
        crv: String,
    },

    #[error("multicodec 0x{found:x} does not belong to key type {key_type}")]
    MulticodecMismatch { key_type: String, found: u64 },

    #[error("key representations of {0} disagree")]
    KeyMismatch(String),

    #[error("verification method {0} carries no public key material")]
    MissingKeyMaterial(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Errors returned by a [`Fetcher`](crate::Fetcher)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("resource not found")]
    NotFound,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err.status() {
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Transport(err.to_string()),
        }
    }
}

/// Errors raised while loading resolver configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let cases = [
            (ResolutionError::InvalidDid(String::new()), ErrorKind::InvalidDid),
            (ResolutionError::UnknownMulticodec(0x99), ErrorKind::UnknownMulticodec),
            (ResolutionError::Network(String::new()), ErrorKind::NetworkError),
            (ResolutionError::Internal(String::new()), ErrorKind::Internal),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_parse_error_becomes_invalid_did() {
        let err: ResolutionError = ParseError::MissingPrefix.into();
        assert_eq!(err.kind(), ErrorKind::InvalidDid);
        assert!(err.to_string().contains("did:"));
    }

    #[test]
    fn test_error_kind_wire_names() {
        let json = serde_json::to_string(&ErrorKind::MethodNotSupported).unwrap();
        assert_eq!(json, "\"methodNotSupported\"");
        assert_eq!(ErrorKind::NotFound.to_string(), "notFound");
    }
}
