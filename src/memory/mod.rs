//! In-memory collaborators: a term algebra over [`Record`]s, a dataset,
//! a condition environment and an import registry.

mod cond;
mod env;
mod record;
mod registry;

pub use cond::{Cond, FuncEval, Term};
pub use env::MemoryEnv;
pub use record::{Record, RecordSet};
pub use registry::{Import, UnitRegistry};
