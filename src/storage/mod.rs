use crate::models::Paste;

pub mod memory;

pub use memory::MemoryStorage;

/// What to do with a paste after [`Storage::update_paste`] has looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retain {
    Keep,
    Remove,
}

pub trait Storage {
    /// Insert a paste unless its key is already taken, in which case the
    /// paste is handed back.
    fn insert_paste(&self, paste: Paste) -> Result<(), Paste>;

    /// Run `f` on the paste stored under `key` while holding exclusive access
    /// to it, removing the paste afterwards if `f` says so. Returns `None` if
    /// there is no such paste.
    fn update_paste<T, F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Paste) -> (Retain, T);

    /// Check that the backend can serve requests.
    fn check_health(&self) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub enum AnyStorage {
    Memory(MemoryStorage),
}

impl Storage for AnyStorage {
    fn insert_paste(&self, paste: Paste) -> Result<(), Paste> {
        match self {
            AnyStorage::Memory(memory) => memory.insert_paste(paste),
        }
    }

    fn update_paste<T, F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Paste) -> (Retain, T),
    {
        match self {
            AnyStorage::Memory(memory) => memory.update_paste(key, f),
        }
    }

    fn check_health(&self) -> anyhow::Result<()> {
        match self {
            AnyStorage::Memory(memory) => memory.check_health(),
        }
    }
}

impl From<MemoryStorage> for AnyStorage {
    fn from(value: MemoryStorage) -> Self {
        AnyStorage::Memory(value)
    }
}
