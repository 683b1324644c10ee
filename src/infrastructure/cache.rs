use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::core::FieldId;
use crate::fields::CustomField;

/// LRU of field definitions, read on every value write.
/// Writers must call `invalidate` after updating or deleting a field.
pub struct FieldCache {
    inner: Mutex<LruCache<FieldId, CustomField>>,
}

impl FieldCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, id: FieldId) -> Option<CustomField> {
        self.inner.lock().ok()?.get(&id).cloned()
    }

    pub fn insert(&self, field: CustomField) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(field.id, field);
        }
    }

    pub fn invalidate(&self, id: FieldId) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.pop(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
