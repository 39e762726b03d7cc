//! Collaborator traits the engine is generic over.
//!
//! A tree never looks inside a condition term: it only combines terms with
//! [`Condition`] and asks a [`Dataset`] how many records, and which, match
//! them. Leaf predicates are turned into terms by a [`ConditionEnv`].

use crate::types::{CondData, CondError, LeafCond};

/// Record number within a dataset.
pub type RecNo = usize;

/// Immutable boolean term over records.
pub trait Condition: Clone {
    #[must_use]
    fn and(&self, other: &Self) -> Self;

    #[must_use]
    fn or(&self, other: &Self) -> Self;

    #[must_use]
    fn negate(&self) -> Self;
}

/// Turns parsed condition data into terms.
pub trait ConditionEnv {
    type Cond: Condition;

    /// Build the term for a single leaf predicate.
    ///
    /// # Errors
    ///
    /// Returns [`CondError`] when the unit is unknown or does not support
    /// the predicate.
    fn leaf(&self, leaf: &LeafCond) -> Result<Self::Cond, CondError>;

    /// Term matching every record.
    fn cond_all(&self) -> Self::Cond;

    /// Fold a whole condition tree into one term. An empty `and` matches
    /// everything and an empty `or` matches nothing.
    ///
    /// # Errors
    ///
    /// Returns the first [`CondError`] raised by [`leaf`](Self::leaf).
    fn parse_cond_data(&self, data: &CondData) -> Result<Self::Cond, CondError> {
        match data {
            CondData::Leaf(leaf) => self.leaf(leaf),
            CondData::And(items) => match items.split_first() {
                None => Ok(self.cond_all()),
                Some((first, rest)) => {
                    rest.iter().try_fold(self.parse_cond_data(first)?, |acc, item| {
                        Ok(acc.and(&self.parse_cond_data(item)?))
                    })
                }
            },
            CondData::Or(items) => match items.split_first() {
                None => Ok(self.cond_all().negate()),
                Some((first, rest)) => {
                    rest.iter().try_fold(self.parse_cond_data(first)?, |acc, item| {
                        Ok(acc.or(&self.parse_cond_data(item)?))
                    })
                }
            },
            CondData::Not(inner) => Ok(self.parse_cond_data(inner)?.negate()),
        }
    }
}

/// Resolves `import` statements during activation.
///
/// Called once per imported unit with the import point's number, the unit
/// name, the condition reaching the import, and the tree's content hash.
/// Returning `false` aborts activation.
pub trait UnitImporter<C> {
    fn import_unit(&mut self, point_no: usize, unit: &str, cond: &C, hash: &str) -> bool;
}

impl<C, F> UnitImporter<C> for F
where
    F: FnMut(usize, &str, &C, &str) -> bool,
{
    fn import_unit(&mut self, point_no: usize, unit: &str, cond: &C, hash: &str) -> bool {
        self(point_no, unit, cond, hash)
    }
}

/// Importer for trees that are not expected to import anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectImports;

impl<C> UnitImporter<C> for RejectImports {
    fn import_unit(&mut self, _point_no: usize, _unit: &str, _cond: &C, _hash: &str) -> bool {
        false
    }
}

/// Record source a tree is evaluated against.
pub trait Dataset<C> {
    /// Number of records matching `cond`.
    fn total_count(&self, cond: &C) -> usize;

    /// Up to `limit` record numbers matching `cond`.
    fn rec_seq(&self, cond: &C, limit: usize) -> Vec<RecNo>;
}
