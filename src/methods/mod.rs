//! DID method handlers.
//!
//! A handler turns a parsed DID of its method into a [`Resolved`] document.
//! Dereferencing has a default implementation in terms of `resolve`, which
//! handlers only override when their method defines path or query semantics.

mod key;
mod web;

pub use key::DidKey;
pub use web::{DidWeb, WebLocation};

use async_trait::async_trait;

use crate::did::{Did, DidUrl};
use crate::error::ResolutionError;
use crate::types::{Content, Dereferenced, ResolutionOptions, Resolved};

/// A resolver for one DID method.
#[async_trait]
pub trait DidMethod: Send + Sync {
    /// The method name as it appears in `did:<name>:...`
    fn name(&self) -> &str;

    fn supports(&self, did: &Did) -> bool {
        did.method() == self.name()
    }

    async fn resolve(
        &self,
        did: &Did,
        options: &ResolutionOptions,
    ) -> Result<Resolved, ResolutionError>;

    /// Resolves the base DID, then selects the resource named by the
    /// fragment: verification methods first, then services. Without a
    /// fragment the whole document is returned.
    async fn dereference(
        &self,
        url: &DidUrl,
        options: &ResolutionOptions,
    ) -> Result<Dereferenced, ResolutionError> {
        let Resolved { document, metadata } = self.resolve(url.did(), options).await?;

        let Some(fragment) = url.fragment() else {
            return Ok(Dereferenced {
                content: Content::Document(document),
                metadata,
            });
        };

        let content = if let Some(vm) = document.verification_method_by_fragment(fragment) {
            Content::VerificationMethod(vm.clone())
        } else if let Some(service) = document.service_by_fragment(fragment) {
            Content::Service(service.clone())
        } else {
            return Err(ResolutionError::NotFound(url.to_string()));
        };

        Ok(Dereferenced { content, metadata })
    }
}
