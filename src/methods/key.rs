//! The `did:key` method.
//!
//! The method-specific id is the multibase (base58-btc) encoding of a
//! multicodec-prefixed public key, so the whole document is derived from
//! the DID itself. Resolution is pure and never cached.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::DidMethod;
use crate::clock::Clock;
use crate::crypto::{CryptoRegistry, KeyPair, KeyType};
use crate::did::Did;
use crate::encoding::{multibase, multicodec};
use crate::error::ResolutionError;
use crate::types::{
    DidDocument, DocumentMetadata, KeyFormat, ResolutionOptions, Resolved, VerificationMethod,
};

const METHOD: &str = "key";
const DID_KEY_PREFIX: &str = "did:key:";
const KEY_FRAGMENT: &str = "key-1";

/// Resolver and generator for `did:key` identifiers
pub struct DidKey {
    crypto: Arc<CryptoRegistry>,
    clock: Arc<dyn Clock>,
    key_formats: Vec<KeyFormat>,
}

impl DidKey {
    pub fn new(crypto: Arc<CryptoRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            crypto,
            clock,
            key_formats: Vec::new(),
        }
    }

    /// Publishes the listed representations next to `publicKeyMultibase`
    /// in resolved documents.
    pub fn with_key_formats(mut self, formats: &[KeyFormat]) -> Self {
        self.key_formats = formats.to_vec();
        self
    }

    /// Computes the `did:key` for a raw public key.
    pub fn create(&self, key_type: &KeyType, public_key: &[u8]) -> Result<String, ResolutionError> {
        let provider = self
            .crypto
            .get(key_type)
            .ok_or_else(|| ResolutionError::UnsupportedKeyType(key_type.to_string()))?;
        let encoded = provider
            .export_multibase(public_key)
            .map_err(|e| ResolutionError::ValidationFailed(e.to_string()))?;
        Ok(format!("{}{}", DID_KEY_PREFIX, encoded))
    }

    /// Generates a fresh key pair of `key_type` and returns its DID with it.
    pub fn generate(&self, key_type: &KeyType) -> Result<(String, KeyPair), ResolutionError> {
        let provider = self
            .crypto
            .get(key_type)
            .ok_or_else(|| ResolutionError::UnsupportedKeyType(key_type.to_string()))?;
        let pair = provider
            .generate_key_pair()
            .map_err(|e| ResolutionError::Internal(e.to_string()))?;
        let did = self.create(key_type, &pair.public_key)?;
        Ok((did, pair))
    }

    /// Expands a `did:key` into its document.
    pub fn resolve_document(&self, did: &Did) -> Result<DidDocument, ResolutionError> {
        let invalid = |reason: String| ResolutionError::InvalidDid(format!("{}: {}", did, reason));

        let bytes = multibase::decode(did.method_specific_id()).map_err(|e| invalid(e.to_string()))?;
        let (code, public_key) = multicodec::split(&bytes).map_err(|e| invalid(e.to_string()))?;

        let Some(codec) = multicodec::name(code) else {
            return Err(ResolutionError::UnknownMulticodec(code));
        };
        let provider = self
            .crypto
            .by_multicodec(code)
            .ok_or_else(|| ResolutionError::UnsupportedKeyType(codec.to_string()))?;
        trace!(%did, key_type = %provider.key_type(), "expanding did:key");

        let did_string = did.to_string();
        let vm = VerificationMethod::from_public_key(
            provider.as_ref(),
            format!("{}#{}", did_string, KEY_FRAGMENT),
            did_string.clone(),
            public_key,
            &self.key_formats,
        )
        .map_err(|e| invalid(e.to_string()))?;

        let mut document = DidDocument::new(did_string);
        document.authentication.push(vm.id.clone());
        document.assertion_method.push(vm.id.clone());
        document.capability_invocation.push(vm.id.clone());
        document.capability_delegation.push(vm.id.clone());
        document.verification_method.push(vm);
        Ok(document)
    }
}

#[async_trait]
impl DidMethod for DidKey {
    fn name(&self) -> &str {
        METHOD
    }

    async fn resolve(
        &self,
        did: &Did,
        _options: &ResolutionOptions,
    ) -> Result<Resolved, ResolutionError> {
        let document = self.resolve_document(did)?;
        Ok(Resolved {
            document,
            metadata: DocumentMetadata {
                cached: false,
                resolved_at: self.clock.now(),
                source: format!("did:{}", METHOD),
            },
        })
    }
}

impl std::fmt::Debug for DidKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DidKey")
            .field("key_formats", &self.key_formats)
            .finish_non_exhaustive()
    }
}
