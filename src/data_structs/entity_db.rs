use std::sync::{
    Arc,
    PoisonError,
    RwLock,
    RwLockReadGuard,
    RwLockWriteGuard,
};

use indexmap::IndexSet;
use log::trace;

use crate::error::{
    EnrichError,
    Result,
};

/// Shared ownership handle passed to every [`Category`] and [`Scores`] that
/// must interoperate.
///
/// [`Category`]: crate::data_structs::Category
/// [`Scores`]: crate::data_structs::Scores
pub type SharedDatabase = Arc<EntityDatabase>;

/// Append-only interning table mapping entity identifiers to dense indices.
///
/// Indices are assigned in insertion order and stay valid for the lifetime
/// of the database. The lock is only held while an identifier is looked up
/// or appended.
#[derive(Debug, Default)]
pub struct EntityDatabase {
    identifiers: RwLock<IndexSet<String>>,
}

impl EntityDatabase {
    /// Creates an empty database behind a shared handle.
    pub fn new() -> SharedDatabase {
        Arc::new(Self::default())
    }

    /// Creates a database pre-populated with `identifiers`.
    pub fn with_identifiers<I, S>(identifiers: I) -> SharedDatabase
    where
        I: IntoIterator<Item = S>,
        S: Into<String>, {
        let set: IndexSet<String> = identifiers.into_iter().map(Into::into).collect();
        Arc::new(Self {
            identifiers: RwLock::new(set),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexSet<String>> {
        self.identifiers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexSet<String>> {
        self.identifiers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the index of `identifier`, appending it if it is new.
    pub fn intern(
        &self,
        identifier: &str,
    ) -> usize {
        if let Some(index) = self.read().get_index_of(identifier) {
            return index;
        }
        // Another writer may have appended it between the two locks;
        // insert_full returns the existing index in that case.
        let (index, inserted) = self.write().insert_full(identifier.to_owned());
        if inserted {
            trace!("Interned '{}' as {}", identifier, index);
        }
        index
    }

    pub fn index_of(
        &self,
        identifier: &str,
    ) -> Result<usize> {
        self.read().get_index_of(identifier).ok_or_else(|| {
            EnrichError::Lookup(format!("unknown identifier '{identifier}'"))
        })
    }

    pub fn name_of(
        &self,
        index: usize,
    ) -> Result<String> {
        self.read()
            .get_index(index)
            .cloned()
            .ok_or_else(|| EnrichError::Lookup(format!("unknown index {index}")))
    }

    pub fn contains(
        &self,
        identifier: &str,
    ) -> bool {
        self.read().contains(identifier)
    }

    pub fn contains_index(
        &self,
        index: usize,
    ) -> bool {
        index < self.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Fails with [`EnrichError::Consistency`] unless `a` and `b` are the
    /// same database instance.
    pub fn ensure_same(
        a: &SharedDatabase,
        b: &SharedDatabase,
        context: &str,
    ) -> Result<()> {
        if Arc::ptr_eq(a, b) {
            Ok(())
        }
        else {
            Err(EnrichError::Consistency(format!(
                "{context}: structures are backed by different entity databases"
            )))
        }
    }
}
