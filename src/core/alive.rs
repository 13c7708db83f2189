//! # Alive set: names of loops that have not finished yet.
//!
//! Every spawned loop holds an [`AliveGuard`]; dropping the guard (normal exit,
//! cancellation or panic unwind) removes the name. After the shutdown grace
//! period the remaining names are reported as stuck.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Default)]
pub struct AliveSet {
    names: Arc<Mutex<BTreeSet<String>>>,
}

impl AliveSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        // Holders never panic while locked; recover the set if one ever did.
        self.names.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks `name` alive until the returned guard is dropped.
    pub fn track(&self, name: impl Into<String>) -> AliveGuard {
        let name = name.into();
        self.lock().insert(name.clone());
        AliveGuard {
            set: self.clone(),
            name,
        }
    }

    /// Sorted names of loops still running.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }
}

pub struct AliveGuard {
    set: AliveSet,
    name: String,
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.name);
    }
}
