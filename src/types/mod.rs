mod checkpoint;
mod cond_data;
mod error;
mod fragment;
mod graph;
mod report;
mod tree;
mod value;

pub use checkpoint::Checkpoint;
pub(crate) use checkpoint::PointBody;
pub use cond_data::{CompareOp, CondData, JoinMode, LeafCond, NumBounds};
pub use error::{BuildError, CollectError, CondError, EvalError};
pub use fragment::{Fragment, Instr, InstrKind, LineSpan, Marker, MarkerLoc};
pub(crate) use graph::PointGraph;
pub use graph::{Story, StoryId};
pub use report::{Collected, PointInfo, PointTrace, TreeReport};
pub use tree::DTree;
pub use value::Value;
