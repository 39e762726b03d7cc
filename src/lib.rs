//! Decision-tree filters over record collections.
//!
//! A tree is a flat script of `if` / `return` statements. Parsing turns the
//! source into [`Fragment`]s; activation turns fragments into
//! [`Checkpoint`]s whose conditions are combined lazily from the statements
//! before them. The engine is generic over the condition algebra and the
//! dataset: see [`Condition`], [`ConditionEnv`] and [`Dataset`]. The
//! [`memory`] module provides in-memory implementations.

mod build;
mod collect;
pub mod config;
mod env;
mod error;
mod evaluate;
pub mod memory;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use crate::config::EngineConfig;
pub use env::{Condition, ConditionEnv, Dataset, RecNo, RejectImports, UnitImporter};
pub use error::DTreeError;
pub use parse::{parse, ParsedTree, SyntaxError};
pub use types::{
    BuildError, Checkpoint, CollectError, Collected, CompareOp, CondData, CondError, DTree,
    EvalError, Fragment, Instr, InstrKind, JoinMode, LeafCond, LineSpan, Marker, MarkerLoc,
    NumBounds, PointInfo, PointTrace, Story, StoryId, TreeReport, Value,
};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
