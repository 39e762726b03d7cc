use thiserror::Error;

use crate::config::ConfigError;
use crate::types::{BuildError, CollectError, EvalError};

/// Unified error type covering activation, evaluation, configuration, and I/O.
///
/// Returned by convenience methods like [`DTree::from_file()`](crate::DTree::from_file)
/// and [`EngineConfig::load()`](crate::EngineConfig::load) callers that want
/// a single error type.
#[derive(Debug, Error)]
pub enum DTreeError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
