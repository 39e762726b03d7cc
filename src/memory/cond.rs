use std::fmt;
use std::sync::Arc;

use crate::env::Condition;
use crate::types::{JoinMode, LeafCond, Value};

use super::record::Record;

/// Computes the variants of a function unit for a record and call arguments.
pub type FuncEval = Arc<dyn Fn(&Record, &[Value]) -> Vec<String> + Send + Sync>;

/// A leaf predicate, with the evaluator of its unit when it is a function.
#[derive(Clone)]
pub struct Term {
    leaf: LeafCond,
    func: Option<FuncEval>,
}

impl Term {
    pub(crate) fn new(leaf: LeafCond, func: Option<FuncEval>) -> Self {
        Self { leaf, func }
    }

    #[must_use]
    pub fn leaf(&self) -> &LeafCond {
        &self.leaf
    }

    fn matches(&self, rec: &Record) -> bool {
        match &self.leaf {
            LeafCond::Enum {
                unit,
                mode,
                variants,
            } => {
                let values = rec.get(unit).map_or(&[][..], Value::variants);
                join_matches(*mode, variants, values)
            }
            LeafCond::Numeric { unit, bounds } => rec
                .get(unit)
                .and_then(Value::as_f64)
                .is_some_and(|v| bounds.contains(v)),
            LeafCond::Func {
                params,
                mode,
                variants,
                ..
            } => {
                let values = self.func.as_ref().map(|f| f(rec, params)).unwrap_or_default();
                join_matches(*mode, variants, &values)
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Term")
            .field("leaf", &self.leaf)
            .field("func", &self.func.is_some())
            .finish()
    }
}

fn join_matches(mode: JoinMode, variants: &[String], values: &[String]) -> bool {
    let present = |v: &String| values.contains(v);
    match mode {
        JoinMode::Or => variants.iter().any(present),
        JoinMode::And => variants.iter().all(present),
        JoinMode::Not => !variants.iter().any(present),
    }
}

/// Boolean term over in-memory records.
///
/// Composition simplifies against the constants and flattens nested
/// `and`/`or`, so repeated accumulation keeps terms shallow.
#[derive(Debug, Clone)]
pub enum Cond {
    All,
    Nothing,
    Leaf(Arc<Term>),
    And(Arc<[Cond]>),
    Or(Arc<[Cond]>),
    Not(Arc<Cond>),
}

impl Cond {
    #[must_use]
    pub fn matches(&self, rec: &Record) -> bool {
        match self {
            Cond::All => true,
            Cond::Nothing => false,
            Cond::Leaf(term) => term.matches(rec),
            Cond::And(items) => items.iter().all(|c| c.matches(rec)),
            Cond::Or(items) => items.iter().any(|c| c.matches(rec)),
            Cond::Not(inner) => !inner.matches(rec),
        }
    }

    fn and_parts(&self) -> &[Cond] {
        match self {
            Cond::And(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    fn or_parts(&self) -> &[Cond] {
        match self {
            Cond::Or(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl Condition for Cond {
    fn and(&self, other: &Self) -> Self {
        match (self, other) {
            (Cond::Nothing, _) | (_, Cond::Nothing) => Cond::Nothing,
            (Cond::All, c) | (c, Cond::All) => c.clone(),
            _ => Cond::And(
                self.and_parts()
                    .iter()
                    .chain(other.and_parts())
                    .cloned()
                    .collect(),
            ),
        }
    }

    fn or(&self, other: &Self) -> Self {
        match (self, other) {
            (Cond::All, _) | (_, Cond::All) => Cond::All,
            (Cond::Nothing, c) | (c, Cond::Nothing) => c.clone(),
            _ => Cond::Or(
                self.or_parts()
                    .iter()
                    .chain(other.or_parts())
                    .cloned()
                    .collect(),
            ),
        }
    }

    fn negate(&self) -> Self {
        match self {
            Cond::All => Cond::Nothing,
            Cond::Nothing => Cond::All,
            Cond::Not(inner) => (**inner).clone(),
            other => Cond::Not(Arc::new(other.clone())),
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::All => write!(f, "all"),
            Cond::Nothing => write!(f, "nothing"),
            Cond::Leaf(term) => write!(f, "{}", term.leaf),
            Cond::And(items) | Cond::Or(items) => {
                let sep = if matches!(self, Cond::And(_)) {
                    " and "
                } else {
                    " or "
                };
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{sep}")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Cond::Not(inner) => write!(f, "not {inner}"),
        }
    }
}
