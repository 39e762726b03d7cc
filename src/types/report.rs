use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::env::RecNo;

use super::cond_data::{CondData, LeafCond};
use super::fragment::InstrKind;

/// Structural summary of a tree, returned by
/// [`DTree::report_info()`](super::tree::DTree::report_info).
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct TreeReport {
    pub points: Vec<PointInfo>,
    /// Leaf conditions of every `if` checkpoint, keyed by checkpoint number.
    pub markers: BTreeMap<usize, Vec<LeafCond>>,
    pub code: String,
    pub hash: String,
    pub error: bool,
    #[serde(rename = "dtree-name", skip_serializing_if = "Option::is_none")]
    pub dtree_name: Option<String>,
}

/// One row of [`TreeReport::points`].
#[derive(Debug, Clone, Serialize)]
pub struct PointInfo {
    pub kind: InstrKind,
    pub level: usize,
    pub decision: Option<bool>,
    pub cond_data: Option<CondData>,
    pub code_frag: String,
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.dtree_name {
            write!(f, "{name}: ")?;
        }
        write!(f, "{} points", self.points.len())?;
        write!(f, ", {} with markers", self.markers.len())?;
        if self.error {
            write!(f, ", has errors")?;
        }
        write!(f, ", hash: {}", &self.hash[..self.hash.len().min(12)])
    }
}

/// Per-checkpoint row of a collection trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointTrace {
    pub code_frag: String,
    /// Records reaching the checkpoint; `None` for inactive points.
    pub count: Option<usize>,
    /// Decision of a `return` checkpoint.
    pub decision: Option<bool>,
}

/// Result of [`DTree::collect_rec_seq()`](super::tree::DTree::collect_rec_seq).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Collected {
    /// Selected record numbers, ascending and deduplicated.
    pub rec_nos: Vec<RecNo>,
    pub trace: Vec<PointTrace>,
}

impl fmt::Display for Collected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "selected: {} records", self.rec_nos.len())?;
        let counts: Vec<String> = self
            .trace
            .iter()
            .map(|row| match (row.count, row.decision) {
                (Some(n), Some(d)) => format!("{n}/{d}"),
                (Some(n), None) => n.to_string(),
                (None, _) => "-".to_owned(),
            })
            .collect();
        write!(f, ", trace: [{}]", counts.join(", "))
    }
}
