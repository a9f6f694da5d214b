use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

/// Collection name used by checkers that keep a single collection.
pub const DEFAULT_COLLECTION: &str = "checker_storage";

/// In-memory document collection shared by all tasks of a process.
///
/// Clones refer to the same collection. Individual operations are atomic;
/// sequences of operations are not. Nothing is persisted: stored flags are
/// lost when the process exits, so a checker restarted between a put and its
/// get reports the get as `INTERNAL_ERROR`. Checkers that need to survive
/// restarts supply their own `Checker::Storage`, namespaced per checker.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: Arc<str>,
    docs: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryCollection {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            docs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace a document, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, doc: Value) -> Option<Value> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.insert(key.into(), doc)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION)
    }
}
