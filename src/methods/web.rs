//! The `did:web` method.
//!
//! `did:web:<host>[%3A<port>][:<segment>...]` maps to
//! `https://<host>[:<port>]/<segment>/.../did.json`, or to
//! `https://<host>[:<port>]/.well-known/did.json` when there are no
//! segments. Fetched documents are validated and cached per DID.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::DidMethod;
use crate::cache::DocumentCache;
use crate::clock::Clock;
use crate::config::WebConfig;
use crate::crypto::CryptoRegistry;
use crate::did::Did;
use crate::error::{ResolutionError, TransportError};
use crate::fetch::Fetcher;
use crate::types::{DidDocument, DocumentMetadata, ResolutionOptions, Resolved};
use crate::validation::DocumentValidator;

const METHOD: &str = "web";
const WELL_KNOWN_PATH: &str = ".well-known";
const DOCUMENT_NAME: &str = "did.json";

/// Where a `did:web` document is hosted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebLocation {
    /// Canonical host name: escapes decoded, lowercased, no trailing dot
    pub host: String,
    pub port: Option<u16>,
    /// Path segments, empty for the well-known location
    pub path: Vec<String>,
}

impl WebLocation {
    /// Parses a `did:web` method-specific id.
    pub fn parse(method_specific_id: &str) -> Result<Self, ResolutionError> {
        let invalid = |reason: &str| {
            ResolutionError::InvalidDid(format!("did:web:{}: {}", method_specific_id, reason))
        };

        let mut segments = method_specific_id.split(':');
        let authority = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing host"))?;
        let authority = authority.replace("%3A", ":").replace("%3a", ":");

        // canonical form, as the fetch will see it
        let base = Url::parse(&format!("https://{}/", authority))
            .map_err(|e| invalid(&format!("invalid host: {}", e)))?;
        let host = base
            .host_str()
            .map(|host| host.trim_end_matches('.'))
            .filter(|host| !host.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .to_ascii_lowercase();
        let port = base.port();

        let path = segments.map(str::to_string).collect::<Vec<_>>();
        if path.iter().any(|s| s.is_empty() || s == "." || s == "..") {
            return Err(invalid("invalid path segment"));
        }

        Ok(Self { host, port, path })
    }

    /// The HTTPS URL of the DID document.
    pub fn to_url(&self) -> Result<Url, ResolutionError> {
        let mut url = format!("https://{}", self.host);
        if let Some(port) = self.port {
            url.push_str(&format!(":{}", port));
        }

        if self.path.is_empty() {
            url.push_str(&format!("/{}", WELL_KNOWN_PATH));
        } else {
            for segment in &self.path {
                url.push('/');
                url.push_str(segment);
            }
        }
        url.push_str(&format!("/{}", DOCUMENT_NAME));

        Url::parse(&url).map_err(|e| ResolutionError::InvalidDid(format!("{}: {}", url, e)))
    }
}

/// Resolver for `did:web` identifiers
pub struct DidWeb {
    fetcher: Arc<dyn Fetcher>,
    cache: DocumentCache,
    clock: Arc<dyn Clock>,
    crypto: Arc<CryptoRegistry>,
    config: WebConfig,
}

impl DidWeb {
    pub fn new(
        config: WebConfig,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
        crypto: Arc<CryptoRegistry>,
    ) -> Self {
        Self {
            fetcher,
            cache: DocumentCache::new(clock.clone()),
            clock,
            crypto,
            config,
        }
    }

    /// The document cache, for maintenance such as eviction.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    async fn fetch(&self, did: &str, url: &Url, options: &ResolutionOptions) -> Result<Vec<u8>, ResolutionError> {
        let timeout = options.timeout.unwrap_or(self.config.fetch_timeout);
        debug!(%did, %url, ?timeout, "fetching DID document");

        match tokio::time::timeout(timeout, self.fetcher.fetch_bytes(url, timeout)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(TransportError::NotFound)) => Err(ResolutionError::NotFound(did.to_string())),
            Ok(Err(e)) => Err(ResolutionError::Network(format!("{}: {}", url, e))),
            Err(_) => Err(ResolutionError::Network(format!(
                "{}: no response within {:?}",
                url, timeout
            ))),
        }
    }
}

#[async_trait]
impl DidMethod for DidWeb {
    fn name(&self) -> &str {
        METHOD
    }

    async fn resolve(
        &self,
        did: &Did,
        options: &ResolutionOptions,
    ) -> Result<Resolved, ResolutionError> {
        let did_string = did.to_string();
        let location = WebLocation::parse(did.method_specific_id())?;

        if !self.config.is_domain_allowed(&location.host) {
            debug!(did = %did_string, host = %location.host, "domain rejected by policy");
            return Err(ResolutionError::DomainNotAuthorized(location.host));
        }

        let url = location.to_url()?;

        if !options.no_cache {
            if let Some(document) = self.cache.get(&did_string) {
                debug!(did = %did_string, cached = true, "cache hit");
                return Ok(Resolved {
                    document,
                    metadata: DocumentMetadata {
                        cached: true,
                        resolved_at: self.clock.now(),
                        source: url.to_string(),
                    },
                });
            }
        }

        let bytes = self.fetch(&did_string, &url, options).await?;
        let document: DidDocument = serde_json::from_slice(&bytes).map_err(|e| {
            ResolutionError::ValidationFailed(format!("malformed DID document: {}", e))
        })?;
        DocumentValidator::new(&self.crypto).validate(&document, &did_string)?;

        self.cache
            .insert(did_string.clone(), document.clone(), self.config.cache_ttl);
        debug!(did = %did_string, cached = false, "stored fetched document");

        Ok(Resolved {
            document,
            metadata: DocumentMetadata {
                cached: false,
                resolved_at: self.clock.now(),
                source: url.to_string(),
            },
        })
    }
}

impl std::fmt::Debug for DidWeb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DidWeb")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::clock::ManualClock;
    use crate::crypto::{CryptoProvider, Ed25519Provider};
    use crate::error::ErrorKind;
    use crate::types::{KeyFormat, VerificationMethod};

    const DID: &str = "did:web:example.com";

    #[derive(Default)]
    struct FixtureFetcher {
        responses: HashMap<String, Result<Vec<u8>, TransportError>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FixtureFetcher {
        fn with(mut self, url: &str, response: Result<Vec<u8>, TransportError>) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }
    }

    #[async_trait]
    impl Fetcher for FixtureFetcher {
        async fn fetch_bytes(&self, url: &Url, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .get(url.as_str())
                .cloned()
                .unwrap_or(Err(TransportError::NotFound))
        }
    }

    fn document_bytes(did: &str) -> Vec<u8> {
        let provider = Ed25519Provider;
        let pair = provider.generate_key_pair().unwrap();
        let mut doc = DidDocument::new(did);
        let vm = VerificationMethod::from_public_key(
            &provider,
            format!("{}#key-1", did),
            did,
            &pair.public_key,
            &[KeyFormat::Jwk],
        )
        .unwrap();
        doc.authentication.push(vm.id.clone());
        doc.verification_method.push(vm);
        serde_json::to_vec(&doc).unwrap()
    }

    fn did_web(config: WebConfig, fetcher: Arc<FixtureFetcher>) -> DidWeb {
        DidWeb::new(
            config,
            fetcher,
            Arc::new(ManualClock::default()),
            Arc::new(CryptoRegistry::with_defaults()),
        )
    }

    #[test]
    fn test_url_mapping() {
        let test_cases = vec![
            ("example.com", "https://example.com/.well-known/did.json"),
            ("example.com:user:alice", "https://example.com/user/alice/did.json"),
            ("localhost%3A8443", "https://localhost:8443/.well-known/did.json"),
            ("Example.COM%3a443:org", "https://example.com/org/did.json"),
            ("example%2Ecom", "https://example.com/.well-known/did.json"),
            ("example.com.:user", "https://example.com/user/did.json"),
        ];

        for (id, expected) in test_cases {
            let location = WebLocation::parse(id).unwrap();
            assert_eq!(location.to_url().unwrap().as_str(), expected, "id: {}", id);
        }
    }

    #[test]
    fn test_invalid_locations() {
        let test_cases = [
            "%3A8443",
            "example.com%3Ahttp",
            "example.com::alice",
            "example.com:..:did",
            "example.com%40attacker.org",
            "example.com%2Fpath",
            "%2E",
        ];
        for id in test_cases {
            assert_eq!(
                WebLocation::parse(id).unwrap_err().kind(),
                ErrorKind::InvalidDid,
                "id: {}",
                id
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_and_cache() {
        let fetcher = Arc::new(
            FixtureFetcher::default()
                .with("https://example.com/.well-known/did.json", Ok(document_bytes(DID))),
        );
        let method = did_web(WebConfig::default(), fetcher.clone());
        let did = Did::parse(DID).unwrap();

        let first = method.resolve(&did, &ResolutionOptions::default()).await.unwrap();
        assert!(!first.metadata.cached);
        assert_eq!(first.metadata.source, "https://example.com/.well-known/did.json");

        let second = method.resolve(&did, &ResolutionOptions::default()).await.unwrap();
        assert!(second.metadata.cached);
        assert_eq!(second.document, first.document);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let options = ResolutionOptions {
            no_cache: true,
            ..Default::default()
        };
        let third = method.resolve(&did, &options).await.unwrap();
        assert!(!third.metadata.cached);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let url = "https://example.com/.well-known/did.json";
        let test_cases = vec![
            (Err(TransportError::NotFound), ErrorKind::NotFound),
            (Err(TransportError::Status(503)), ErrorKind::NetworkError),
            (Err(TransportError::Transport("connection reset".to_string())), ErrorKind::NetworkError),
            (Ok(b"<html>".to_vec()), ErrorKind::ValidationFailed),
            (Ok(document_bytes("did:web:other.com")), ErrorKind::ValidationFailed),
        ];

        for (response, expected) in test_cases {
            let fetcher = Arc::new(FixtureFetcher::default().with(url, response));
            let method = did_web(WebConfig::default(), fetcher);
            let err = method
                .resolve(&Did::parse(DID).unwrap(), &ResolutionOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), expected);
            assert!(method.cache().is_empty());
        }
    }

    #[tokio::test]
    async fn test_policy_rejects_before_fetching() {
        let fetcher = Arc::new(FixtureFetcher::default());
        let config = WebConfig {
            blocked_domains: vec!["example.com".to_string()],
            ..WebConfig::default()
        };
        let method = did_web(config, fetcher.clone());

        // every spelling that reaches the blocked host
        let test_cases = [
            "did:web:example.com",
            "did:web:example.com%3A8443",
            "did:web:EXAMPLE.com",
            "did:web:example%2Ecom",
            "did:web:example%2ecom:user",
            "did:web:example.com.",
        ];

        for did in test_cases {
            let err = method
                .resolve(&Did::parse(did).unwrap(), &ResolutionOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DomainNotAuthorized, "did: {}", did);
            assert_eq!(err, ResolutionError::DomainNotAuthorized("example.com".to_string()));
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(method.cache().is_empty());
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let fetcher = Arc::new(FixtureFetcher {
            delay: Some(Duration::from_secs(30)),
            ..FixtureFetcher::default()
        });
        let method = did_web(WebConfig::default(), fetcher);
        let options = ResolutionOptions {
            timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };

        let err = method
            .resolve(&Did::parse(DID).unwrap(), &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }
}
