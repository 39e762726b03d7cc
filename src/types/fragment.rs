use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parse::SyntaxError;

use super::cond_data::{CondData, LeafCond};

/// Half-open range of 1-based source lines covered by a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

/// Source location of a leaf condition inside an `if` statement.
/// Lines and columns are 1-based; `end_col` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerLoc {
    pub line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

/// A leaf condition annotated with where it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub cond: LeafCond,
    pub loc: MarkerLoc,
}

/// Parsed instruction. Each variant carries only its own payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instr {
    Import {
        entries: Vec<String>,
    },
    If {
        cond_text: String,
        cond_data: CondData,
        markers: Vec<Marker>,
    },
    Return {
        decision: bool,
    },
    Error(SyntaxError),
}

impl Instr {
    #[must_use]
    pub fn kind(&self) -> InstrKind {
        match self {
            Instr::Import { .. } => InstrKind::Import,
            Instr::If { .. } => InstrKind::If,
            Instr::Return { .. } => InstrKind::Return,
            Instr::Error(_) => InstrKind::Error,
        }
    }
}

/// Payload-free instruction tag, used in reports and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrKind {
    Import,
    If,
    Return,
    Error,
}

impl fmt::Display for InstrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrKind::Import => write!(f, "Import"),
            InstrKind::If => write!(f, "If"),
            InstrKind::Return => write!(f, "Return"),
            InstrKind::Error => write!(f, "Error"),
        }
    }
}

/// One statement of a decision tree, positioned in the normalized source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    instr: Instr,
    level: usize,
    lines: LineSpan,
}

impl Fragment {
    #[must_use]
    pub fn new(instr: Instr, level: usize, lines: LineSpan) -> Self {
        Self {
            instr,
            level,
            lines,
        }
    }

    #[must_use]
    pub fn instr(&self) -> &Instr {
        &self.instr
    }

    #[must_use]
    pub fn kind(&self) -> InstrKind {
        self.instr.kind()
    }

    /// Nesting depth: 0 at top level, 1 inside an `if` body.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    #[must_use]
    pub fn lines(&self) -> LineSpan {
        self.lines
    }

    #[must_use]
    pub fn decision(&self) -> Option<bool> {
        match self.instr {
            Instr::Return { decision } => Some(decision),
            _ => None,
        }
    }

    #[must_use]
    pub fn cond_data(&self) -> Option<&CondData> {
        match &self.instr {
            Instr::If { cond_data, .. } => Some(cond_data),
            _ => None,
        }
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        match &self.instr {
            Instr::If { markers, .. } => markers,
            _ => &[],
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&SyntaxError> {
        match &self.instr {
            Instr::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Source text of the fragment, taken from the given code lines.
    #[must_use]
    pub fn code_frag(&self, code_lines: &[&str]) -> String {
        let end = (self.lines.end - 1).min(code_lines.len());
        let start = (self.lines.start - 1).min(end);
        code_lines[start..end].join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_frag_slices_half_open_span() {
        let lines = ["import A", "if x > 1:", "    return True", "return False"];
        let frag = Fragment::new(
            Instr::Return { decision: true },
            1,
            LineSpan { start: 3, end: 4 },
        );
        assert_eq!(frag.code_frag(&lines), "    return True");

        let error = Fragment::new(
            Instr::Error(SyntaxError::new("bad", 2, 4)),
            0,
            LineSpan { start: 2, end: 5 },
        );
        assert_eq!(
            error.code_frag(&lines),
            "if x > 1:\n    return True\nreturn False"
        );
    }

    #[test]
    fn code_frag_clamps_past_end() {
        let lines = ["return True"];
        let frag = Fragment::new(
            Instr::Return { decision: true },
            0,
            LineSpan { start: 1, end: 9 },
        );
        assert_eq!(frag.code_frag(&lines), "return True");
    }

    #[test]
    fn payload_accessors_follow_kind() {
        let ret = Fragment::new(
            Instr::Return { decision: false },
            0,
            LineSpan { start: 1, end: 2 },
        );
        assert_eq!(ret.kind(), InstrKind::Return);
        assert_eq!(ret.decision(), Some(false));
        assert!(ret.cond_data().is_none());
        assert!(ret.markers().is_empty());
        assert!(ret.error().is_none());
    }

    #[test]
    fn kind_display() {
        assert_eq!(InstrKind::If.to_string(), "If");
        assert_eq!(InstrKind::Import.to_string(), "Import");
    }
}
