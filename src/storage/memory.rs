use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{Retain, Storage};
use crate::models::Paste;

/// Process-local paste storage. Nothing survives a restart, and expired
/// pastes are only dropped when someone fetches them.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    pastes: Arc<DashMap<String, Paste>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pastes.len()
    }
}

impl Storage for MemoryStorage {
    fn insert_paste(&self, paste: Paste) -> Result<(), Paste> {
        match self.pastes.entry(paste.key.clone()) {
            Entry::Occupied(_) => Err(paste),
            Entry::Vacant(entry) => {
                entry.insert(paste);
                Ok(())
            }
        }
    }

    fn update_paste<T, F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Paste) -> (Retain, T),
    {
        // the entry guard holds the shard lock until we're done with the paste
        let Entry::Occupied(mut entry) = self.pastes.entry(key.to_owned()) else {
            return None;
        };

        let (retain, value) = f(entry.get_mut());
        if retain == Retain::Remove {
            entry.remove();
        }

        Some(value)
    }

    fn check_health(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
