//! Universal DID resolution.
//!
//! The [`Resolver`] parses the input, picks the handler registered for the
//! DID method and runs it. It never fails with an `Err` or a panic: every
//! outcome is a [`ResolutionResult`] or [`DereferencingResult`]. A panic
//! inside a handler is caught here and reported as `internalError`.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, warn};

use crate::cache::DocumentCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ResolverConfig;
use crate::crypto::{CryptoRegistry, KeyPair, KeyType};
use crate::did::{Did, DidUrl};
use crate::error::ResolutionError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::methods::{DidKey, DidMethod, DidWeb};
use crate::registry::MethodRegistry;
use crate::types::{
    DereferencingResult, Dereferenced, KeyFormat, ResolutionOptions, ResolutionResult, Resolved,
};

/// Resolves DIDs and dereferences DID URLs across all registered methods
pub struct Resolver {
    /// Method handlers by name
    registry: MethodRegistry,
    /// Key types known to the built-in handlers
    crypto: Arc<CryptoRegistry>,
    /// The built-in `did:key` handler
    key: Arc<DidKey>,
    /// The built-in `did:web` handler
    web: Arc<DidWeb>,
}

impl Resolver {
    /// Creates a resolver with `did:key` and `did:web` registered, fetching
    /// over HTTPS and using the system clock.
    pub fn new(config: ResolverConfig) -> Self {
        Self::builder(config).build()
    }

    /// Starts a builder for injecting the fetcher, clock or key types.
    pub fn builder(config: ResolverConfig) -> ResolverBuilder {
        ResolverBuilder {
            config,
            fetcher: None,
            clock: None,
            crypto: None,
            key_formats: Vec::new(),
        }
    }

    /// Resolves a bare DID to its document.
    ///
    /// # Example
    /// ```no_run
    /// use did_resolver::{Resolver, ResolverConfig, ResolutionOptions};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let resolver = Resolver::new(ResolverConfig::default());
    ///     let result = resolver
    ///         .resolve("did:web:example.com", &ResolutionOptions::default())
    ///         .await;
    ///     println!("Resolved DID Document: {:?}", result.document());
    /// }
    /// ```
    pub async fn resolve(&self, did: &str, options: &ResolutionOptions) -> ResolutionResult {
        let start = Instant::now();
        let result = self.try_resolve(did, options).await;
        log_outcome(
            "resolve",
            did,
            start.elapsed(),
            result.as_ref().map(|r| r.metadata.cached),
        );
        result.into()
    }

    /// Dereferences a DID URL to the document, a verification method or a
    /// service.
    pub async fn dereference(&self, did_url: &str, options: &ResolutionOptions) -> DereferencingResult {
        let start = Instant::now();
        let result = self.try_dereference(did_url, options).await;
        log_outcome(
            "dereference",
            did_url,
            start.elapsed(),
            result.as_ref().map(|r| r.metadata.cached),
        );
        result.into()
    }

    async fn try_resolve(&self, did: &str, options: &ResolutionOptions) -> Result<Resolved, ResolutionError> {
        let did = Did::parse(did)?;
        let handler = self.handler_for(&did)?;
        contain(handler.resolve(&did, options)).await
    }

    async fn try_dereference(
        &self,
        did_url: &str,
        options: &ResolutionOptions,
    ) -> Result<Dereferenced, ResolutionError> {
        let url = DidUrl::parse(did_url)?;
        let handler = self.handler_for(url.did())?;
        contain(handler.dereference(&url, options)).await
    }

    fn handler_for(&self, did: &Did) -> Result<Arc<dyn DidMethod>, ResolutionError> {
        self.registry
            .lookup(did.method())
            .filter(|handler| handler.supports(did))
            .ok_or_else(|| ResolutionError::MethodNotSupported(did.method().to_string()))
    }

    /// Names of all registered methods, sorted.
    pub fn supported_methods(&self) -> Vec<String> {
        self.registry.list_names().into_iter().collect()
    }

    pub fn is_method_supported(&self, method: &str) -> bool {
        self.registry.contains(method)
    }

    /// The method registry, for adding or replacing handlers at runtime.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn crypto(&self) -> &CryptoRegistry {
        &self.crypto
    }

    /// Computes the `did:key` for a raw public key.
    pub fn create_did_key(&self, key_type: &KeyType, public_key: &[u8]) -> Result<String, ResolutionError> {
        self.key.create(key_type, public_key)
    }

    /// Generates a key pair and returns its `did:key`.
    pub fn generate_did_key(&self, key_type: &KeyType) -> Result<(String, KeyPair), ResolutionError> {
        self.key.generate(key_type)
    }

    /// The `did:web` document cache.
    pub fn web_cache(&self) -> &DocumentCache {
        self.web.cache()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Resolver`] with injected capabilities
pub struct ResolverBuilder {
    config: ResolverConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    clock: Option<Arc<dyn Clock>>,
    crypto: Option<CryptoRegistry>,
    key_formats: Vec<KeyFormat>,
}

impl ResolverBuilder {
    /// Replaces the HTTPS fetcher used by `did:web`.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the default Ed25519 + secp256k1 providers.
    pub fn crypto(mut self, crypto: CryptoRegistry) -> Self {
        self.crypto = Some(crypto);
        self
    }

    /// Extra key representations published in `did:key` documents.
    pub fn key_formats(mut self, formats: &[KeyFormat]) -> Self {
        self.key_formats = formats.to_vec();
        self
    }

    pub fn build(self) -> Resolver {
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let fetcher: Arc<dyn Fetcher> = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher::new()));
        let crypto = Arc::new(self.crypto.unwrap_or_else(CryptoRegistry::with_defaults));

        let key = Arc::new(
            DidKey::new(crypto.clone(), clock.clone()).with_key_formats(&self.key_formats),
        );
        let web = Arc::new(DidWeb::new(self.config.web, fetcher, clock, crypto.clone()));

        let registry = MethodRegistry::new();
        registry.register(key.name(), key.clone());
        registry.register(web.name(), web.clone());

        Resolver {
            registry,
            crypto,
            key,
            web,
        }
    }
}

/// Runs a handler future, turning a panic into `Internal`.
async fn contain<T, F>(future: F) -> Result<T, ResolutionError>
where
    F: Future<Output = Result<T, ResolutionError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ResolutionError::Internal(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "DID method handler panicked".to_string()
    }
}

fn log_outcome(operation: &str, input: &str, elapsed: Duration, outcome: Result<bool, &ResolutionError>) {
    match outcome {
        Ok(cached) => debug!(operation, did = input, cached, ?elapsed, "DID resolved"),
        Err(err @ ResolutionError::Internal(_)) => {
            warn!(operation, did = input, error = %err, ?elapsed, "DID resolution failed unexpectedly")
        }
        Err(err) => debug!(operation, did = input, kind = %err.kind(), error = %err, ?elapsed, "DID resolution failed"),
    }
}

/// Convenience function for resolving a DID without creating a Resolver instance
pub async fn resolve_did(did: &str, options: Option<ResolutionOptions>) -> ResolutionResult {
    Resolver::default()
        .resolve(did, &options.unwrap_or_default())
        .await
}
