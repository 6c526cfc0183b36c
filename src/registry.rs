//! Registry of DID method handlers keyed by method name.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::methods::DidMethod;

/// Holds at most one handler per method name.
///
/// Lookups clone the handler's `Arc` under a read lock, so a concurrent
/// `register` swaps the slot as a whole: readers see either the old or the
/// new handler.
#[derive(Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, Arc<dyn DidMethod>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `did:<name>:...`, returning the handler it
    /// replaced. The last registration wins.
    ///
    /// The resolver still asks the handler whether it
    /// [`supports`](DidMethod::supports) each DID, so a handler registered
    /// under a name other than its own must override `supports`.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn DidMethod>,
    ) -> Option<Arc<dyn DidMethod>> {
        let name = name.into();
        let previous = self.methods.write().insert(name.clone(), handler);
        debug!(method = %name, replaced = previous.is_some(), "registered DID method");
        previous
    }

    /// Removes the handler for `name`; false if none was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.methods.write().remove(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn DidMethod>> {
        self.methods.read().get(name).cloned()
    }

    pub fn list_names(&self) -> BTreeSet<String> {
        self.methods.read().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.list_names())
            .finish()
    }
}
