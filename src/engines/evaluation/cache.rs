use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Content-hash keyed memo with in-flight coalescing.
///
/// Concurrent requests for the same key share one computation. A failed
/// computation leaves the slot empty, so a later identical request retries.
/// When full, every slot except those still being computed is dropped.
pub struct EvaluationCache<T> {
    slots: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
    capacity: usize,
}

impl<T: Clone> EvaluationCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    fn slot(&self, key: &str) -> Arc<OnceCell<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        if slots.len() >= self.capacity {
            // Evict settled and abandoned slots; in-flight ones are still shared
            slots.retain(|_, slot| !slot.initialized() && Arc::strong_count(slot) > 1);
        }
        let slot = Arc::new(OnceCell::new());
        slots.insert(key.to_string(), Arc::clone(&slot));
        slot
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    pub async fn get_or_try_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let slot = self.slot(key);
        slot.get_or_try_init(compute).await.cloned()
    }

    /// Number of keys holding a computed value
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
