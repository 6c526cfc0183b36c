//! Structural validation of fetched DID Documents.
//!
//! Validation collects every problem it finds rather than stopping at the
//! first, so the resulting `ValidationFailed` message lists them all.

use std::collections::HashSet;

use url::Url;

use crate::crypto::CryptoRegistry;
use crate::did::Did;
use crate::error::ResolutionError;
use crate::types::{DidDocument, Service, VerificationMethod};

/// Upper bound on verification methods per document
pub const MAX_VERIFICATION_METHODS: usize = 100;

/// Upper bound on services per document
pub const MAX_SERVICES: usize = 100;

/// Checks a document against the DID it was resolved for.
#[derive(Debug, Clone, Copy)]
pub struct DocumentValidator<'a> {
    crypto: &'a CryptoRegistry,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(crypto: &'a CryptoRegistry) -> Self {
        Self { crypto }
    }

    /// Returns `ValidationFailed` listing every problem found.
    pub fn validate(&self, document: &DidDocument, expected_did: &str) -> Result<(), ResolutionError> {
        let errors = self.errors(document, expected_did);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResolutionError::ValidationFailed(errors.join("; ")))
        }
    }

    /// All problems with `document`, empty when it is valid.
    pub fn errors(&self, document: &DidDocument, expected_did: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if document.id != expected_did {
            errors.push(format!(
                "document id '{}' does not match '{}'",
                document.id, expected_did
            ));
        }

        if document.context.is_empty() {
            errors.push("document must have at least one context".to_string());
        }
        for context in &document.context {
            if Url::parse(context).is_err() {
                errors.push(format!("context '{}' is not an absolute URI", context));
            }
        }

        for controller in &document.controller {
            if Did::parse(controller).is_err() {
                errors.push(format!("invalid controller DID '{}'", controller));
            }
        }

        self.check_verification_methods(document, &mut errors);
        check_services(&document.service, &mut errors);

        for (name, entries) in document.relationships() {
            for entry in entries {
                if document.verification_method(entry).is_none() {
                    errors.push(format!(
                        "{} entry '{}' does not reference a verification method in this document",
                        name, entry
                    ));
                }
            }
        }

        errors
    }

    fn check_verification_methods(&self, document: &DidDocument, errors: &mut Vec<String>) {
        let methods = &document.verification_method;
        if methods.is_empty() {
            errors.push("document must have at least one verification method".to_string());
            return;
        }
        if methods.len() > MAX_VERIFICATION_METHODS {
            errors.push(format!(
                "too many verification methods (maximum {})",
                MAX_VERIFICATION_METHODS
            ));
            return;
        }

        let mut seen = HashSet::new();
        for vm in methods {
            if !seen.insert(vm.id.as_str()) {
                errors.push(format!("duplicate verification method id '{}'", vm.id));
            }
            if !is_local_id(&vm.id, &document.id) {
                errors.push(format!(
                    "verification method id '{}' is not a fragment of '{}'",
                    vm.id, document.id
                ));
            }
            if vm.method_type.is_empty() {
                errors.push(format!("verification method '{}' has no type", vm.id));
            }
            if Did::parse(&vm.controller).is_err() {
                errors.push(format!(
                    "verification method '{}' has invalid controller '{}'",
                    vm.id, vm.controller
                ));
            }
            self.check_key_material(vm, errors);
        }
    }

    fn check_key_material(&self, vm: &VerificationMethod, errors: &mut Vec<String>) {
        if !vm.has_key_material() {
            errors.push(format!("verification method '{}' has no public key", vm.id));
            return;
        }
        // key types without a provider are passed through unchecked
        let Some(provider) = self.crypto.provider_for(vm) else {
            return;
        };
        if let Err(e) = vm.public_key_bytes(provider.as_ref()) {
            errors.push(format!("verification method '{}': {}", vm.id, e));
        }
    }
}

fn check_services(services: &[Service], errors: &mut Vec<String>) {
    if services.len() > MAX_SERVICES {
        errors.push(format!("too many services (maximum {})", MAX_SERVICES));
        return;
    }

    let mut seen = HashSet::new();
    for service in services {
        if service.id.is_empty() {
            errors.push("service must have an id".to_string());
            continue;
        }
        if !seen.insert(service.id.as_str()) {
            errors.push(format!("duplicate service id '{}'", service.id));
        }
        if service.service_type.is_empty() {
            errors.push(format!("service '{}' has no type", service.id));
        }
        let empty_endpoint = match &service.service_endpoint {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty_endpoint {
            errors.push(format!("service '{}' has no endpoint", service.id));
        }
    }
}

/// `#frag` or `{did}#frag` with a non-empty fragment.
fn is_local_id(id: &str, did: &str) -> bool {
    match id.split_once('#') {
        Some((base, fragment)) => !fragment.is_empty() && (base.is_empty() || base == did),
        None => false,
    }
}
