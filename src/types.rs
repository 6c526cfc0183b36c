//! Core types for DID resolution.
//!
//! This module provides the DID Document model as published on the wire
//! (W3C DID Core JSON), together with the result types returned by the
//! resolver.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::CryptoProvider;
use crate::encoding::Jwk;
use crate::error::{CryptoError, ErrorKind, ResolutionError};

/// The base context every DID Document starts with
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

/// A DID Document as defined in the DID Core specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The JSON-LD contexts, in order
    #[serde(rename = "@context", deserialize_with = "one_or_many::deserialize")]
    pub context: Vec<String>,

    /// The DID itself
    pub id: String,

    /// DIDs authorised to make changes to this document
    #[serde(
        default,
        deserialize_with = "one_or_many::deserialize",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub controller: Vec<String>,

    /// Other identifiers for the same subject
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<String>,

    /// Service endpoints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

impl DidDocument {
    /// An empty document for `id` carrying only the base context.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![DID_CONTEXT_V1.to_string()],
            id: id.into(),
            controller: Vec::new(),
            also_known_as: Vec::new(),
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            key_agreement: Vec::new(),
            capability_invocation: Vec::new(),
            capability_delegation: Vec::new(),
            service: Vec::new(),
        }
    }

    /// Whether `candidate` names the resource `{self.id}#{fragment}`, either
    /// absolutely or as a relative `#fragment` reference.
    fn refers_to(&self, candidate: &str, fragment: &str) -> bool {
        match candidate.split_once('#') {
            Some((base, frag)) => frag == fragment && (base.is_empty() || base == self.id),
            None => false,
        }
    }

    /// Finds a verification method by fragment.
    pub fn verification_method_by_fragment(&self, fragment: &str) -> Option<&VerificationMethod> {
        self.verification_method
            .iter()
            .find(|vm| self.refers_to(&vm.id, fragment))
    }

    /// Finds a service by fragment.
    pub fn service_by_fragment(&self, fragment: &str) -> Option<&Service> {
        self.service.iter().find(|s| self.refers_to(&s.id, fragment))
    }

    /// Finds a verification method by its id, absolute or relative.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let fragment = id.split_once('#').map(|(_, f)| f)?;
        self.verification_method_by_fragment(fragment)
            .filter(|_| id.starts_with('#') || id.starts_with(&format!("{}#", self.id)))
    }

    /// Iterates every verification relationship with its JSON name.
    pub fn relationships(&self) -> impl Iterator<Item = (&'static str, &Vec<String>)> + '_ {
        [
            ("authentication", &self.authentication),
            ("assertionMethod", &self.assertion_method),
            ("keyAgreement", &self.key_agreement),
            ("capabilityInvocation", &self.capability_invocation),
            ("capabilityDelegation", &self.capability_delegation),
        ]
        .into_iter()
    }
}

/// Additional public key representations to publish alongside the
/// canonical `publicKeyMultibase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Jwk,
    Base58,
}

/// A verification method in a DID Document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// The unique identifier for this verification method
    pub id: String,

    /// The type of the verification method
    #[serde(rename = "type")]
    pub method_type: String,

    /// The controller of this verification method
    pub controller: String,

    /// The public key in multibase format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,

    /// The raw public key in base58-btc
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    /// The public key as a JWK
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

impl VerificationMethod {
    /// Builds a verification method whose canonical representation is the
    /// multibase key, plus any requested derived representations.
    ///
    /// The result is reconciled before it is returned, so every
    /// representation is known to decode to `public_key`.
    pub fn from_public_key(
        provider: &dyn CryptoProvider,
        id: impl Into<String>,
        controller: impl Into<String>,
        public_key: &[u8],
        derived: &[KeyFormat],
    ) -> Result<Self, CryptoError> {
        let mut vm = Self {
            id: id.into(),
            method_type: provider.verification_method_type().to_string(),
            controller: controller.into(),
            public_key_multibase: Some(provider.export_multibase(public_key)?),
            public_key_base58: None,
            public_key_jwk: None,
        };
        for format in derived {
            match format {
                KeyFormat::Jwk => vm.public_key_jwk = Some(provider.export_jwk(public_key)?),
                KeyFormat::Base58 => {
                    vm.public_key_base58 = Some(provider.export_base58(public_key)?)
                }
            }
        }

        if vm.public_key_bytes(provider)? != public_key {
            return Err(CryptoError::KeyMismatch(vm.id));
        }
        Ok(vm)
    }

    /// Decodes every present key representation and returns the raw key
    /// bytes only if they all agree.
    pub fn public_key_bytes(&self, provider: &dyn CryptoProvider) -> Result<Vec<u8>, CryptoError> {
        let mut decoded = Vec::with_capacity(3);
        if let Some(value) = &self.public_key_multibase {
            decoded.push(provider.import_multibase(value)?);
        }
        if let Some(value) = &self.public_key_base58 {
            decoded.push(provider.import_base58(value)?);
        }
        if let Some(jwk) = &self.public_key_jwk {
            decoded.push(provider.import_jwk(jwk)?);
        }

        let mut decoded = decoded.into_iter();
        let first = decoded
            .next()
            .ok_or_else(|| CryptoError::MissingKeyMaterial(self.id.clone()))?;
        if decoded.any(|other| other != first) {
            return Err(CryptoError::KeyMismatch(self.id.clone()));
        }
        Ok(first)
    }

    pub fn has_key_material(&self) -> bool {
        self.public_key_multibase.is_some()
            || self.public_key_base58.is_some()
            || self.public_key_jwk.is_some()
    }
}

/// A service endpoint in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// The unique identifier for this service
    pub id: String,

    /// The type of the service
    #[serde(rename = "type")]
    pub service_type: String,

    /// The endpoint URL or object
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: serde_json::Value,
}

/// Metadata about a successful resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Whether the document was served from the cache
    pub cached: bool,

    /// When the resolution completed
    pub resolved_at: DateTime<Utc>,

    /// Where the document came from: the method name for generative
    /// methods, the fetched URL for web-hosted ones
    pub source: String,
}

/// A resolved document with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: DidDocument,
    pub metadata: DocumentMetadata,
}

/// The outcome of resolving a DID: a document or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    Document {
        document: DidDocument,
        metadata: DocumentMetadata,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl ResolutionResult {
    pub fn document(&self) -> Option<&DidDocument> {
        match self {
            Self::Document { document, .. } => Some(document),
            Self::Error { .. } => None,
        }
    }

    pub fn metadata(&self) -> Option<&DocumentMetadata> {
        match self {
            Self::Document { metadata, .. } => Some(metadata),
            Self::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Document { .. } => None,
            Self::Error { kind, .. } => Some(*kind),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Document { .. })
    }
}

impl From<Result<Resolved, ResolutionError>> for ResolutionResult {
    fn from(result: Result<Resolved, ResolutionError>) -> Self {
        match result {
            Ok(Resolved { document, metadata }) => Self::Document { document, metadata },
            Err(err) => Self::Error {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// The resource a DID URL dereferences to
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Document(DidDocument),
    VerificationMethod(VerificationMethod),
    Service(Service),
}

/// Dereferenced content with the metadata of the underlying resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Dereferenced {
    pub content: Content,
    pub metadata: DocumentMetadata,
}

/// The outcome of dereferencing a DID URL
#[derive(Debug, Clone, PartialEq)]
pub enum DereferencingResult {
    Content {
        content: Content,
        metadata: DocumentMetadata,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl DereferencingResult {
    pub fn content(&self) -> Option<&Content> {
        match self {
            Self::Content { content, .. } => Some(content),
            Self::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Content { .. } => None,
            Self::Error { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<Dereferenced, ResolutionError>> for DereferencingResult {
    fn from(result: Result<Dereferenced, ResolutionError>) -> Self {
        match result {
            Ok(Dereferenced { content, metadata }) => Self::Content { content, metadata },
            Err(err) => Self::Error {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Per-call options for DID resolution
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    /// Overrides the configured fetch timeout for this call
    pub timeout: Option<Duration>,

    /// Skip the cache lookup; the fresh document is still cached
    pub no_cache: bool,
}

/// Accepts either a single string or an array of strings.
mod one_or_many {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CryptoProvider, Ed25519Provider};

    const DOC: &str = r##"{
        "@context": "https://www.w3.org/ns/did/v1",
        "id": "did:web:example.com",
        "controller": "did:web:example.com",
        "verificationMethod": [{
            "id": "did:web:example.com#key-1",
            "type": "Ed25519VerificationKey2020",
            "controller": "did:web:example.com",
            "publicKeyMultibase": "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp"
        }, {
            "id": "#key-2",
            "type": "JsonWebKey2020",
            "controller": "did:web:example.com",
            "publicKeyJwk": {"kty": "OKP", "crv": "Ed25519", "x": "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik"}
        }],
        "authentication": ["did:web:example.com#key-1", "#key-2"],
        "service": [{
            "id": "did:web:example.com#hub",
            "type": "LinkedDomains",
            "serviceEndpoint": "https://hub.example.com"
        }]
    }"##;

    #[test]
    fn test_document_deserialization() {
        let doc: DidDocument = serde_json::from_str(DOC).unwrap();
        assert_eq!(doc.context, vec![DID_CONTEXT_V1.to_string()]);
        assert_eq!(doc.controller, vec!["did:web:example.com".to_string()]);
        assert_eq!(doc.verification_method.len(), 2);
        assert_eq!(doc.authentication.len(), 2);
        assert!(doc.assertion_method.is_empty());
        assert_eq!(doc.service[0].service_type, "LinkedDomains");
    }

    #[test]
    fn test_serialization_omits_empty_lists() {
        let doc = DidDocument::new("did:example:123");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["@context"][0], DID_CONTEXT_V1);
        assert!(json.get("verificationMethod").is_none());
        assert!(json.get("service").is_none());
    }

    #[test]
    fn test_fragment_lookup() {
        let doc: DidDocument = serde_json::from_str(DOC).unwrap();
        assert_eq!(
            doc.verification_method_by_fragment("key-1").unwrap().id,
            "did:web:example.com#key-1"
        );
        assert_eq!(doc.verification_method_by_fragment("key-2").unwrap().id, "#key-2");
        assert!(doc.verification_method_by_fragment("key-3").is_none());
        assert!(doc.service_by_fragment("hub").is_some());

        assert!(doc.verification_method("did:web:example.com#key-2").is_some());
        assert!(doc.verification_method("did:web:other.com#key-1").is_none());
        assert!(doc.verification_method("key-1").is_none());
    }

    #[test]
    fn test_public_key_bytes_reconciles_representations() {
        let provider = Ed25519Provider;
        let pair = provider.generate_key_pair().unwrap();
        let vm = VerificationMethod::from_public_key(
            &provider,
            "did:example:123#key-1",
            "did:example:123",
            &pair.public_key,
            &[KeyFormat::Jwk, KeyFormat::Base58],
        )
        .unwrap();
        assert_eq!(vm.public_key_bytes(&provider).unwrap(), pair.public_key);

        let other = provider.generate_key_pair().unwrap();
        let mut tampered = vm.clone();
        tampered.public_key_base58 = Some(provider.export_base58(&other.public_key).unwrap());
        assert!(matches!(
            tampered.public_key_bytes(&provider),
            Err(CryptoError::KeyMismatch(_))
        ));

        let mut bare = vm;
        bare.public_key_multibase = None;
        bare.public_key_base58 = None;
        bare.public_key_jwk = None;
        assert!(!bare.has_key_material());
        assert!(matches!(
            bare.public_key_bytes(&provider),
            Err(CryptoError::MissingKeyMaterial(_))
        ));
    }

    #[test]
    fn test_result_is_exactly_one_of() {
        let err: ResolutionResult =
            Err(ResolutionError::NotFound("did:web:example.com".to_string())).into();
        assert_eq!(err.error_kind(), Some(ErrorKind::NotFound));
        assert!(err.document().is_none());
        assert!(err.metadata().is_none());
        assert!(!err.is_ok());
    }
}
