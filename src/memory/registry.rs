use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::env::UnitImporter;

use super::cond::Cond;

/// Importer backed by a fixed set of known units.
///
/// Each successful import is remembered together with the condition it was
/// imported under and the importing tree's hash. Importing the same unit
/// again from the same tree is a no-op.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    known: HashSet<String>,
    imported: HashMap<String, Import>,
}

/// A recorded import.
#[derive(Debug, Clone)]
pub struct Import {
    pub point_no: usize,
    pub cond: Cond,
    pub hash: String,
}

impl UnitRegistry {
    #[must_use]
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
            imported: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, unit: &str) -> Option<&Import> {
        self.imported.get(unit)
    }

    #[must_use]
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

impl UnitImporter<Cond> for UnitRegistry {
    fn import_unit(&mut self, point_no: usize, unit: &str, cond: &Cond, hash: &str) -> bool {
        if !self.known.contains(unit) {
            debug!(unit, "unknown unit");
            return false;
        }
        if self.imported.get(unit).is_some_and(|prev| prev.hash == hash) {
            return true;
        }
        self.imported.insert(
            unit.to_owned(),
            Import {
                point_no,
                cond: cond.clone(),
                hash: hash.to_owned(),
            },
        );
        true
    }
}
