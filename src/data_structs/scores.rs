use std::cmp::Ordering;

use hashbrown::HashMap;
use serde::{
    Deserialize,
    Serialize,
};

use super::category::Category;
use super::entity_db::SharedDatabase;
use super::enums::Order;
use crate::error::{
    EnrichError,
    Result,
};
use crate::utils::{
    apply_permutation,
    compare_scores,
    sort_permutation,
};

/// A single (entity, score) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub index: usize,
    pub score: f64,
}

impl Score {
    pub fn new(
        index: usize,
        score: f64,
    ) -> Self {
        Self { index, score }
    }
}

/// Ordered collection of entity scores over one [`EntityDatabase`].
///
/// Reordering and transforms either return a new collection ([`sorted`],
/// [`abs`]) or require exclusive access ([`sort`], [`abs_in_place`]), so a
/// collection that is being read elsewhere is never changed underneath.
///
/// [`EntityDatabase`]: crate::data_structs::EntityDatabase
/// [`sorted`]: Scores::sorted
/// [`abs`]: Scores::abs
/// [`sort`]: Scores::sort
/// [`abs_in_place`]: Scores::abs_in_place
#[derive(Debug, Clone)]
pub struct Scores {
    db:      SharedDatabase,
    entries: Vec<Score>,
}

impl Scores {
    /// Builds scores from `(identifier, score)` pairs, interning identifiers.
    pub fn from_identifiers<I, S>(
        db: &SharedDatabase,
        pairs: I,
    ) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>, {
        let entries = pairs
            .into_iter()
            .map(|(id, score)| Score::new(db.intern(id.as_ref()), score))
            .collect();
        Self {
            db: db.clone(),
            entries,
        }
    }

    /// Builds scores from entries whose indices must exist in `db`.
    pub fn from_entries(
        db: &SharedDatabase,
        entries: Vec<Score>,
    ) -> Result<Self> {
        let db_len = db.len();
        if let Some(bad) = entries.iter().find(|s| s.index >= db_len) {
            return Err(EnrichError::Input(format!(
                "score entry refers to index {} unknown to its database ({} \
                 entries)",
                bad.index, db_len
            )));
        }
        Ok(Self {
            db: db.clone(),
            entries,
        })
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.db
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(
        &self,
        position: usize,
    ) -> Option<&Score> {
        self.entries.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Score> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Score] {
        &self.entries
    }

    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|s| s.index).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|s| s.score).collect()
    }

    /// Maps entity index to its position. Duplicated entities map to their
    /// first occurrence.
    pub fn position_map(&self) -> HashMap<usize, usize> {
        let mut map = HashMap::with_capacity(self.entries.len());
        for (position, entry) in self.entries.iter().enumerate() {
            map.entry(entry.index).or_insert(position);
        }
        map
    }

    pub fn contains(
        &self,
        index: usize,
    ) -> bool {
        self.entries.iter().any(|s| s.index == index)
    }

    /// Score of the first entry for `index`.
    pub fn score_of(
        &self,
        index: usize,
    ) -> Option<f64> {
        self.entries
            .iter()
            .find(|s| s.index == index)
            .map(|s| s.score)
    }

    /// Permutation that would sort the entries by score.
    pub fn sort_permutation(
        &self,
        order: Order,
    ) -> Vec<usize> {
        sort_permutation(&self.values(), order)
    }

    /// Stable in-place sort by score.
    pub fn sort(
        &mut self,
        order: Order,
    ) {
        self.entries
            .sort_by(|a, b| compare_scores(a.score, b.score, order));
    }

    /// Stable in-place sort with a custom comparator.
    pub fn sort_by<F>(
        &mut self,
        compare: F,
    ) where
        F: FnMut(&Score, &Score) -> Ordering, {
        self.entries.sort_by(compare);
    }

    /// Sorted copy; `self` is left untouched.
    pub fn sorted(
        &self,
        order: Order,
    ) -> Scores {
        let perm = self.sort_permutation(order);
        Scores {
            db:      self.db.clone(),
            entries: apply_permutation(&self.entries, &perm),
        }
    }

    pub fn abs_in_place(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.score = entry.score.abs();
        }
    }

    /// Copy with absolute scores.
    pub fn abs(&self) -> Scores {
        let mut out = self.clone();
        out.abs_in_place();
        out
    }

    /// Entries whose entity belongs to `category`, in their current order.
    pub fn subset(
        &self,
        category: &Category,
    ) -> Result<Scores> {
        category.ensure_same_database(&self.db)?;
        Ok(Scores {
            db:      self.db.clone(),
            entries: self
                .entries
                .iter()
                .filter(|s| category.contains(s.index))
                .copied()
                .collect(),
        })
    }

    pub fn mean(&self) -> Option<f64> {
        if self.entries.is_empty() {
            None
        }
        else {
            Some(self.entries.iter().map(|s| s.score).sum::<f64>() / self.len() as f64)
        }
    }
}

impl<'a> IntoIterator for &'a Scores {
    type IntoIter = std::slice::Iter<'a, Score>;
    type Item = &'a Score;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
