use hashbrown::HashSet;
use itertools::Itertools;
use log::debug;

use super::entity_db::{
    EntityDatabase,
    SharedDatabase,
};
use super::scores::Scores;
use crate::error::{
    EnrichError,
    Result,
};
use crate::getter_fn;

/// A named set of entities tested for enrichment.
///
/// Members are unique indices into the associated [`EntityDatabase`]. A
/// category is read-only once built; set operations return new categories.
#[derive(Debug, Clone)]
pub struct Category {
    name:      String,
    reference: Option<String>,
    db:        SharedDatabase,
    members:   HashSet<usize>,
}

impl Category {
    /// Builds a category from identifiers, interning unknown ones.
    pub fn from_identifiers<I, S>(
        name: impl Into<String>,
        db: &SharedDatabase,
        identifiers: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>, {
        let members = identifiers
            .into_iter()
            .map(|id| db.intern(id.as_ref()))
            .collect();
        Self {
            name: name.into(),
            reference: None,
            db: db.clone(),
            members,
        }
    }

    /// Builds a category from indices that must already exist in `db`.
    pub fn from_indices<I>(
        name: impl Into<String>,
        db: &SharedDatabase,
        indices: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = usize>, {
        let name = name.into();
        let db_len = db.len();
        let members: HashSet<usize> = indices.into_iter().collect();
        if let Some(bad) = members.iter().find(|&&index| index >= db_len) {
            return Err(EnrichError::Input(format!(
                "category '{name}' contains index {bad} unknown to its database \
                 ({db_len} entries)"
            )));
        }
        Ok(Self {
            name,
            reference: None,
            db: db.clone(),
            members,
        })
    }

    /// Attaches a provenance string (source URL, database release, ...).
    pub fn with_reference(
        mut self,
        reference: impl Into<String>,
    ) -> Self {
        self.reference = Some(reference.into());
        self
    }

    getter_fn!(name, String);

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.db
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(
        &self,
        index: usize,
    ) -> bool {
        self.members.contains(&index)
    }

    pub fn contains_identifier(
        &self,
        identifier: &str,
    ) -> bool {
        self.db
            .index_of(identifier)
            .map(|index| self.contains(index))
            .unwrap_or(false)
    }

    /// Member indices in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }

    /// Member indices in ascending order.
    pub fn sorted_indices(&self) -> Vec<usize> {
        self.members.iter().copied().sorted_unstable().collect()
    }

    /// Member identifiers in ascending index order.
    pub fn identifiers(&self) -> Result<Vec<String>> {
        self.sorted_indices()
            .into_iter()
            .map(|index| self.db.name_of(index))
            .collect()
    }

    pub fn ensure_same_database(
        &self,
        db: &SharedDatabase,
    ) -> Result<()> {
        EntityDatabase::ensure_same(&self.db, db, &format!("category '{}'", self.name))
    }

    /// Number of entities contained in both categories.
    pub fn intersection_size(
        &self,
        other: &Category,
    ) -> Result<usize> {
        self.ensure_same_database(&other.db)?;
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        }
        else {
            (other, self)
        };
        Ok(small.iter().filter(|&index| large.contains(index)).count())
    }

    /// New category holding the members shared with `other`.
    pub fn intersect(
        &self,
        other: &Category,
        name: impl Into<String>,
    ) -> Result<Category> {
        self.ensure_same_database(&other.db)?;
        Ok(Category {
            name:      name.into(),
            reference: self.reference.clone(),
            db:        self.db.clone(),
            members:   self.members.intersection(&other.members).copied().collect(),
        })
    }

    pub fn is_subset_of(
        &self,
        other: &Category,
    ) -> Result<bool> {
        self.ensure_same_database(&other.db)?;
        Ok(self.members.is_subset(&other.members))
    }

    /// Same category restricted to the entities present in `scores`.
    pub fn restrict_to_scores(
        &self,
        scores: &Scores,
    ) -> Result<Category> {
        self.ensure_same_database(scores.database())?;
        let members: HashSet<usize> = scores
            .iter()
            .map(|s| s.index)
            .filter(|index| self.members.contains(index))
            .collect();
        debug!(
            "Category '{}' keeps {}/{} members present in scores",
            self.name,
            members.len(),
            self.len()
        );
        Ok(Category {
            name: self.name.clone(),
            reference: self.reference.clone(),
            db: self.db.clone(),
            members,
        })
    }
}
