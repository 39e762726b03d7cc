use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use super::Value;

/// Comparison operators accepted in numeric conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// The operator that gives the same result with operands swapped
    /// (`5 < x` is `x > 5`).
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Neq => CompareOp::Neq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Gte => CompareOp::Lte,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Lte => CompareOp::Gte,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

/// How the variants of an enumerated condition are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinMode {
    /// `in {..}`: at least one variant present.
    Or,
    /// `in all {..}`: every variant present.
    And,
    /// `not in {..}`: no variant present.
    Not,
}

/// Closed or open interval over a numeric attribute. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumBounds {
    pub min: Option<f64>,
    pub min_eq: bool,
    pub max: Option<f64>,
    pub max_eq: bool,
}

impl NumBounds {
    /// Bounds selecting `x <op> value`. `Neq` has no interval form and yields `None`.
    #[must_use]
    pub fn from_compare(op: CompareOp, value: f64) -> Option<Self> {
        let unbounded = Self {
            min: None,
            min_eq: false,
            max: None,
            max_eq: false,
        };
        Some(match op {
            CompareOp::Eq => Self {
                min: Some(value),
                min_eq: true,
                max: Some(value),
                max_eq: true,
            },
            CompareOp::Neq => return None,
            CompareOp::Gt => Self {
                min: Some(value),
                ..unbounded
            },
            CompareOp::Gte => Self {
                min: Some(value),
                min_eq: true,
                ..unbounded
            },
            CompareOp::Lt => Self {
                max: Some(value),
                ..unbounded
            },
            CompareOp::Lte => Self {
                max: Some(value),
                max_eq: true,
                ..unbounded
            },
        })
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            Some(min) if self.min_eq => value >= min,
            Some(min) => value > min,
            None => true,
        };
        let below_max = match self.max {
            Some(max) if self.max_eq => value <= max,
            Some(max) => value < max,
            None => true,
        };
        above_min && below_max
    }
}

/// A single predicate over one record attribute. Leaves are the only part of a
/// condition the condition environment has to understand; boolean structure
/// around them is folded by [`ConditionEnv::parse_cond_data`](crate::ConditionEnv::parse_cond_data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafCond {
    /// Membership of an enumerated attribute in a set of variants.
    Enum {
        unit: String,
        mode: JoinMode,
        variants: Vec<String>,
    },
    /// Numeric attribute inside an interval.
    Numeric { unit: String, bounds: NumBounds },
    /// Function attribute (e.g. inheritance mode) computed with arguments,
    /// matched against a set of variants.
    Func {
        unit: String,
        params: Vec<Value>,
        mode: JoinMode,
        variants: Vec<String>,
    },
}

impl LeafCond {
    /// Name of the attribute the condition reads.
    #[must_use]
    pub fn unit(&self) -> &str {
        match self {
            LeafCond::Enum { unit, .. }
            | LeafCond::Numeric { unit, .. }
            | LeafCond::Func { unit, .. } => unit,
        }
    }
}

/// Parsed condition of an `if` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CondData {
    Leaf(LeafCond),
    And(Vec<CondData>),
    Or(Vec<CondData>),
    Not(Box<CondData>),
}

impl CondData {
    #[must_use]
    pub fn and(self, other: CondData) -> CondData {
        match self {
            CondData::And(mut items) => {
                items.push(other);
                CondData::And(items)
            }
            first => CondData::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: CondData) -> CondData {
        match self {
            CondData::Or(mut items) => {
                items.push(other);
                CondData::Or(items)
            }
            first => CondData::Or(vec![first, other]),
        }
    }

    /// All leaf predicates, left to right.
    #[must_use]
    pub fn leaves(&self) -> Vec<&LeafCond> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }
}

fn collect_leaves<'a>(data: &'a CondData, out: &mut Vec<&'a LeafCond>) {
    match data {
        CondData::Leaf(leaf) => out.push(leaf),
        CondData::And(items) | CondData::Or(items) => {
            for item in items {
                collect_leaves(item, out);
            }
        }
        CondData::Not(inner) => collect_leaves(inner, out),
    }
}

impl Not for CondData {
    type Output = CondData;

    fn not(self) -> CondData {
        CondData::Not(Box::new(self))
    }
}

impl From<LeafCond> for CondData {
    fn from(leaf: LeafCond) -> Self {
        CondData::Leaf(leaf)
    }
}

fn write_variants(f: &mut fmt::Formatter<'_>, variants: &[String]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, v) in variants.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "\"{v}\"")?;
    }
    write!(f, "}}")
}

fn write_membership(
    f: &mut fmt::Formatter<'_>,
    mode: JoinMode,
    variants: &[String],
) -> fmt::Result {
    match mode {
        JoinMode::Or => write!(f, " in ")?,
        JoinMode::And => write!(f, " in all ")?,
        JoinMode::Not => write!(f, " not in ")?,
    }
    write_variants(f, variants)
}

impl fmt::Display for LeafCond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafCond::Enum {
                unit,
                mode,
                variants,
            } => {
                write!(f, "{unit}")?;
                write_membership(f, *mode, variants)
            }
            LeafCond::Numeric { unit, bounds } => {
                match (bounds.min, bounds.max) {
                    (Some(min), Some(max)) if bounds.min_eq && bounds.max_eq && min == max => {
                        return write!(f, "{unit} == {min}");
                    }
                    _ => {}
                }
                if let Some(min) = bounds.min {
                    write!(f, "{min} {} ", if bounds.min_eq { "<=" } else { "<" })?;
                }
                write!(f, "{unit}")?;
                if let Some(max) = bounds.max {
                    write!(f, " {} {max}", if bounds.max_eq { "<=" } else { "<" })?;
                }
                Ok(())
            }
            LeafCond::Func {
                unit,
                params,
                mode,
                variants,
            } => {
                write!(f, "{unit}(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")?;
                write_membership(f, *mode, variants)
            }
        }
    }
}

impl fmt::Display for CondData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CondData::Leaf(leaf) => write!(f, "{leaf}"),
            CondData::And(items) | CondData::Or(items) => {
                let sep = if matches!(self, CondData::And(_)) {
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
            CondData::Not(inner) => write!(f, "not {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(variants: &[&str]) -> CondData {
        CondData::Leaf(LeafCond::Enum {
            unit: "Gene".to_owned(),
            mode: JoinMode::Or,
            variants: variants.iter().map(|v| (*v).to_owned()).collect(),
        })
    }

    fn gq_at_least(v: f64) -> CondData {
        CondData::Leaf(LeafCond::Numeric {
            unit: "GQ".to_owned(),
            bounds: NumBounds::from_compare(CompareOp::Gte, v).unwrap(),
        })
    }

    #[test]
    fn bounds_from_compare() {
        let b = NumBounds::from_compare(CompareOp::Gt, 10.0).unwrap();
        assert!(!b.contains(10.0));
        assert!(b.contains(10.5));

        let b = NumBounds::from_compare(CompareOp::Lte, 10.0).unwrap();
        assert!(b.contains(10.0));
        assert!(!b.contains(10.1));

        let b = NumBounds::from_compare(CompareOp::Eq, 3.0).unwrap();
        assert!(b.contains(3.0));
        assert!(!b.contains(2.9));

        assert!(NumBounds::from_compare(CompareOp::Neq, 3.0).is_none());
    }

    #[test]
    fn flip_swaps_direction() {
        assert_eq!(CompareOp::Lt.flip(), CompareOp::Gt);
        assert_eq!(CompareOp::Gte.flip(), CompareOp::Lte);
        assert_eq!(CompareOp::Eq.flip(), CompareOp::Eq);
    }

    #[test]
    fn and_chaining_flattens() {
        let data = gene(&["BRCA1"]).and(gq_at_least(20.0)).and(gene(&["TP53"]));
        match &data {
            CondData::And(items) => assert_eq!(items.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn or_chaining_stops_at_and_boundary() {
        let data = gene(&["A"]).and(gene(&["B"])).or(gene(&["C"]));
        match &data {
            CondData::Or(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[0], CondData::And(_)));
            }
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn leaves_in_source_order() {
        let data = !(gene(&["A"]).or(gq_at_least(5.0)));
        let units: Vec<&str> = data.leaves().iter().map(|l| l.unit()).collect();
        assert_eq!(units, vec!["Gene", "GQ"]);
    }

    #[test]
    fn display_renders_dsl_text() {
        assert_eq!(gene(&["A", "B"]).to_string(), "Gene in {\"A\", \"B\"}");
        assert_eq!(gq_at_least(20.0).to_string(), "20 <= GQ");
        let range = LeafCond::Numeric {
            unit: "AF".to_owned(),
            bounds: NumBounds {
                min: Some(0.0),
                min_eq: true,
                max: Some(0.01),
                max_eq: false,
            },
        };
        assert_eq!(range.to_string(), "0 <= AF < 0.01");
        let not_in = LeafCond::Enum {
            unit: "FT".to_owned(),
            mode: JoinMode::Not,
            variants: vec!["PASS".to_owned()],
        };
        assert_eq!(not_in.to_string(), "FT not in {\"PASS\"}");
    }
}
