use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::env::ConditionEnv;
use crate::types::{CondError, LeafCond, Value};

use super::cond::{Cond, FuncEval, Term};
use super::record::Record;

enum UnitKind {
    Enum,
    Numeric,
    Func(FuncEval),
}

impl UnitKind {
    fn describe(&self) -> &'static str {
        match self {
            UnitKind::Enum => "an enumerated unit",
            UnitKind::Numeric => "a numeric unit",
            UnitKind::Func(_) => "a function unit",
        }
    }
}

/// Condition environment over [`Record`]s.
///
/// Without declared units any enum or numeric leaf is accepted. Once a
/// unit is declared the schema is closed: every leaf must name a declared
/// unit of the matching kind. Function leaves always need a declared
/// evaluator.
#[derive(Default)]
pub struct MemoryEnv {
    units: HashMap<String, UnitKind>,
}

impl MemoryEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_enum_unit(mut self, name: &str) -> Self {
        self.units.insert(name.to_owned(), UnitKind::Enum);
        self
    }

    #[must_use]
    pub fn with_numeric_unit(mut self, name: &str) -> Self {
        self.units.insert(name.to_owned(), UnitKind::Numeric);
        self
    }

    /// Declare a function unit computing variants from a record and the
    /// arguments written in the condition.
    #[must_use]
    pub fn with_func_unit<F>(mut self, name: &str, eval: F) -> Self
    where
        F: Fn(&Record, &[Value]) -> Vec<String> + Send + Sync + 'static,
    {
        self.units
            .insert(name.to_owned(), UnitKind::Func(Arc::new(eval)));
        self
    }

    fn check(&self, leaf: &LeafCond) -> Result<Option<FuncEval>, CondError> {
        let unit = leaf.unit();
        let Some(kind) = self.units.get(unit) else {
            return match leaf {
                LeafCond::Func { .. } => Err(CondError::Unsupported {
                    unit: unit.to_owned(),
                    reason: "no evaluator declared for function unit".into(),
                }),
                _ if self.units.is_empty() => Ok(None),
                _ => Err(CondError::UnknownUnit {
                    unit: unit.to_owned(),
                }),
            };
        };
        match (kind, leaf) {
            (UnitKind::Enum, LeafCond::Enum { .. }) | (UnitKind::Numeric, LeafCond::Numeric { .. }) => {
                Ok(None)
            }
            (UnitKind::Func(eval), LeafCond::Func { .. }) => Ok(Some(Arc::clone(eval))),
            (kind, _) => Err(CondError::UnitKindMismatch {
                unit: unit.to_owned(),
                expected: kind.describe().to_owned(),
            }),
        }
    }
}

impl ConditionEnv for MemoryEnv {
    type Cond = Cond;

    fn leaf(&self, leaf: &LeafCond) -> Result<Cond, CondError> {
        let func = self.check(leaf)?;
        Ok(Cond::Leaf(Arc::new(Term::new(leaf.clone(), func))))
    }

    fn cond_all(&self) -> Cond {
        Cond::All
    }
}

impl fmt::Debug for MemoryEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut units: Vec<(&str, &str)> = self
            .units
            .iter()
            .map(|(name, kind)| (name.as_str(), kind.describe()))
            .collect();
        units.sort_unstable();
        f.debug_struct("MemoryEnv").field("units", &units).finish()
    }
}
