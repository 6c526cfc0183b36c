//! Pluggable cryptographic key handling.
//!
//! Every supported key type is one [`CryptoProvider`]. Adding a key type
//! means writing a provider and registering it in a [`CryptoRegistry`];
//! nothing in the method handlers or the resolver changes.

mod ed25519;
mod secp256k1;

pub use ed25519::Ed25519Provider;
pub use secp256k1::Secp256k1Provider;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::encoding::{multibase, multicodec, Jwk};
use crate::error::CryptoError;
use crate::types::VerificationMethod;

/// Identifies a key type, e.g. `Ed25519` or `secp256k1`.
///
/// The set is open: providers for other curves can introduce their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyType(Cow<'static, str>);

impl KeyType {
    pub const ED25519: KeyType = KeyType(Cow::Borrowed("Ed25519"));
    pub const SECP256K1: KeyType = KeyType(Cow::Borrowed("secp256k1"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A freshly generated key pair. The private half is wiped on drop.
pub struct KeyPair {
    pub key_type: KeyType,
    pub public_key: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    pub fn new(key_type: KeyType, public_key: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            key_type,
            public_key,
            private_key: Zeroizing::new(private_key),
        }
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_type", &self.key_type)
            .field("public_key", &multibase::encode_base58(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Operations for one key type.
///
/// All exports are pure functions of the raw public key bytes.
pub trait CryptoProvider: Send + Sync {
    fn key_type(&self) -> KeyType;

    /// The verification method `type` this key type is published under.
    fn verification_method_type(&self) -> &'static str;

    /// The multicodec code identifying public keys of this type.
    fn multicodec(&self) -> u64;

    /// Checks that the bytes are a well-formed public key for this curve.
    fn validate_public_key(&self, public_key: &[u8]) -> Result<(), CryptoError>;

    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError>;

    fn sign(&self, private_key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Returns `false` for malformed keys or signatures as well as for
    /// signatures that do not verify.
    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> bool;

    fn export_jwk(&self, public_key: &[u8]) -> Result<Jwk, CryptoError>;

    fn import_jwk(&self, jwk: &Jwk) -> Result<Vec<u8>, CryptoError>;

    fn multicodec_prefix(&self) -> Vec<u8> {
        multicodec::encode_varint(self.multicodec())
    }

    fn export_base58(&self, public_key: &[u8]) -> Result<String, CryptoError> {
        self.validate_public_key(public_key)?;
        Ok(multibase::encode_base58(public_key))
    }

    fn import_base58(&self, value: &str) -> Result<Vec<u8>, CryptoError> {
        let public_key = multibase::decode_base58(value)?;
        self.validate_public_key(&public_key)?;
        Ok(public_key)
    }

    /// `z` + base58-btc of the multicodec-prefixed key, the form `did:key`
    /// uses as its method-specific identifier.
    fn export_multibase(&self, public_key: &[u8]) -> Result<String, CryptoError> {
        self.validate_public_key(public_key)?;
        Ok(multibase::encode(&multicodec::prefixed(
            self.multicodec(),
            public_key,
        )))
    }

    fn import_multibase(&self, value: &str) -> Result<Vec<u8>, CryptoError> {
        let bytes = multibase::decode(value)?;
        let (code, public_key) = multicodec::split(&bytes)?;
        if code != self.multicodec() {
            return Err(CryptoError::MulticodecMismatch {
                key_type: self.key_type().to_string(),
                found: code,
            });
        }
        self.validate_public_key(public_key)?;
        Ok(public_key.to_vec())
    }
}

/// The set of crypto providers known to a resolver, keyed by [`KeyType`].
///
/// Built once and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct CryptoRegistry {
    providers: HashMap<KeyType, Arc<dyn CryptoProvider>>,
}

impl CryptoRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the Ed25519 and secp256k1 providers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Ed25519Provider));
        registry.register(Arc::new(Secp256k1Provider));
        registry
    }

    /// Adds a provider, replacing any previous provider for the same key type.
    pub fn register(
        &mut self,
        provider: Arc<dyn CryptoProvider>,
    ) -> Option<Arc<dyn CryptoProvider>> {
        self.providers.insert(provider.key_type(), provider)
    }

    pub fn get(&self, key_type: &KeyType) -> Option<Arc<dyn CryptoProvider>> {
        self.providers.get(key_type).cloned()
    }

    pub fn by_multicodec(&self, code: u64) -> Option<Arc<dyn CryptoProvider>> {
        self.providers
            .values()
            .find(|p| p.multicodec() == code)
            .cloned()
    }

    pub fn by_verification_method_type(&self, vm_type: &str) -> Option<Arc<dyn CryptoProvider>> {
        self.providers
            .values()
            .find(|p| p.verification_method_type() == vm_type)
            .cloned()
    }

    /// Picks the provider for a verification method: by its `type` first,
    /// then by the JWK curve, then by the multicodec of its multibase key.
    pub fn provider_for(&self, vm: &VerificationMethod) -> Option<Arc<dyn CryptoProvider>> {
        if let Some(provider) = self.by_verification_method_type(&vm.method_type) {
            return Some(provider);
        }
        if let Some(jwk) = &vm.public_key_jwk {
            if let Some(provider) = self.get(&KeyType::new(jwk.crv.clone())) {
                return Some(provider);
            }
        }
        let bytes = multibase::decode(vm.public_key_multibase.as_deref()?).ok()?;
        let (code, _) = multicodec::split(&bytes).ok()?;
        self.by_multicodec(code)
    }

    pub fn key_types(&self) -> Vec<KeyType> {
        let mut types: Vec<KeyType> = self.providers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Verifies `signature` over `data` with the key published in `vm`.
    ///
    /// Fails when no provider handles the method or its key representations
    /// disagree; otherwise returns whether the signature is valid.
    pub fn verify_with_method(
        &self,
        vm: &VerificationMethod,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let provider = self
            .provider_for(vm)
            .ok_or_else(|| CryptoError::UnsupportedKeyType(vm.method_type.clone()))?;
        let public_key = vm.public_key_bytes(provider.as_ref())?;
        Ok(provider.verify(&public_key, data, signature))
    }
}

impl fmt::Debug for CryptoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoRegistry")
            .field("key_types", &self.key_types())
            .finish()
    }
}
