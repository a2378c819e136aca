//! Serialized recalculation per class
//!
//! Two recalculations of the same class would both read the stored scores
//! and then both write, so the last writer wins with stale inputs. A
//! [`Recalculator`] holds one mutex per class for the whole
//! load/plan/persist run, while different classes proceed in parallel.

use crate::recalculation::{RecalculationEngine, RecalculationStats};
use crate::store::GradebookStore;
use crate::{ClassId, Error, Result};
use ahash::AHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// One mutex per class id, created on first use
#[derive(Debug, Default)]
pub struct ClassLocks {
    locks: Mutex<AHashMap<ClassId, Arc<Mutex<()>>>>,
}

impl ClassLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `class_id`
    pub fn lock_for(&self, class_id: ClassId) -> Arc<Mutex<()>> {
        // The map only ever gains entries, so a poisoned guard is still usable.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(class_id).or_default())
    }

    /// Number of classes that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs recalculations against a shared store
#[derive(Debug)]
pub struct Recalculator<S> {
    store: Arc<S>,
    engine: RecalculationEngine,
    locks: ClassLocks,
}

impl<S> Recalculator<S>
where
    S: GradebookStore + Send + Sync,
{
    pub fn new(store: Arc<S>, engine: RecalculationEngine) -> Self {
        Self {
            store,
            engine,
            locks: ClassLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn engine(&self) -> &RecalculationEngine {
        &self.engine
    }

    /// Recalculate one class, waiting for any run of the same class to finish
    pub fn recalculate(&self, class_id: ClassId) -> Result<RecalculationStats> {
        let lock = self.locks.lock_for(class_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(class = %class_id, "acquired class lock");
        self.engine.recalculate(self.store.as_ref(), class_id)
    }

    /// Recalculate several classes concurrently, one thread per entry.
    ///
    /// Results come back in the order of `classes`. Repeated ids are run
    /// one after the other.
    pub fn recalculate_all(
        &self,
        classes: &[ClassId],
    ) -> Vec<(ClassId, Result<RecalculationStats>)> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = classes
                .iter()
                .map(|&class_id| (class_id, scope.spawn(move || self.recalculate(class_id))))
                .collect();

            handles
                .into_iter()
                .map(|(class_id, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(Error::other(format!(
                            "recalculation of class {} panicked",
                            class_id
                        )))
                    });
                    (class_id, result)
                })
                .collect()
        })
    }
}
