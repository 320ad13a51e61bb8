//! At most one live cropper per container.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use super::{Cropper, Host};

/// Something that can be shut down when it is displaced.
pub trait Teardown {
    fn teardown(&self);
}

impl<H: Host> Teardown for Rc<RefCell<Cropper<H>>> {
    fn teardown(&self) {
        match self.try_borrow_mut() {
            Ok(mut cropper) => cropper.destroy(),
            Err(_) => tracing::warn!("displaced cropper is busy, teardown skipped"),
        }
    }
}

#[derive(Debug)]
struct Entry<T> {
    instance_id: u64,
    instance: T,
}

/// Instances keyed by container identity.
#[derive(Debug)]
pub struct InstanceRegistry<K, T> {
    entries: HashMap<K, Entry<T>>,
}

impl<K, T> Default for InstanceRegistry<K, T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, T: Teardown> InstanceRegistry<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instance` for `key`, tearing down whichever instance held it.
    ///
    /// The displaced instance is returned after teardown so the caller can
    /// drop it outside any borrow of the registry.
    pub fn claim(&mut self, key: K, instance_id: u64, instance: T) -> Option<T> {
        let previous = self.entries.insert(
            key,
            Entry {
                instance_id,
                instance,
            },
        )?;
        tracing::debug!(
            previous = previous.instance_id,
            next = instance_id,
            "replacing cropper on container"
        );
        previous.instance.teardown();
        Some(previous.instance)
    }

    /// Forget `key` if it still belongs to `instance_id`.
    pub fn release(&mut self, key: &K, instance_id: u64) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) if entry.instance_id == instance_id => {
                self.entries.remove(key).map(|entry| entry.instance)
            }
            _ => None,
        }
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.instance)
    }

    pub fn instance_id(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.instance_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
