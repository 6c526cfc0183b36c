//! A universal resolver for Decentralized Identifiers.
//!
//! This library resolves DIDs to DID Documents and dereferences DID URLs to
//! the verification methods and services inside them. It ships two methods:
//! `did:key`, derived purely from the identifier, and `did:web`, fetched over
//! HTTPS and cached. Further methods plug in through [`DidMethod`] and further
//! key types through [`CryptoProvider`].
//!
//! Resolution never panics or returns `Err` to the caller: failures are
//! reported as a [`ResolutionResult::Error`] carrying an [`ErrorKind`].

mod cache;
mod clock;
mod config;
mod did;
mod error;
mod fetch;
mod registry;
mod resolver;
mod types;
mod validation;

pub mod crypto;
pub mod encoding;
pub mod methods;

pub use cache::{CacheEntry, DocumentCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ResolverConfig, WebConfig};
pub use crypto::{CryptoProvider, CryptoRegistry, KeyPair, KeyType};
pub use did::{Did, DidUrl};
pub use error::{
    ConfigError, CryptoError, EncodingError, ErrorKind, ParseError, ResolutionError,
    TransportError,
};
pub use fetch::{Fetcher, HttpFetcher};
pub use methods::{DidKey, DidMethod, DidWeb, WebLocation};
pub use registry::MethodRegistry;
pub use resolver::{resolve_did, Resolver, ResolverBuilder};
pub use types::{
    Content, DereferencingResult, Dereferenced, DidDocument, DocumentMetadata, KeyFormat,
    ResolutionOptions, ResolutionResult, Resolved, Service, VerificationMethod, DID_CONTEXT_V1,
};
pub use validation::DocumentValidator;

/// Resolves a DID with a default-configured [`Resolver`].
///
/// # Example
/// ```no_run
/// use did_resolver::resolve;
///
/// #[tokio::main]
/// async fn main() {
///     let result = resolve(
///         "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp",
///         None
///     ).await;
///
///     println!("Resolved DID Document: {:?}", result.document());
/// }
/// ```
pub async fn resolve(did: &str, options: Option<ResolutionOptions>) -> ResolutionResult {
    resolve_did(did, options).await
}
