use thiserror::Error;

/// Rejection of a leaf condition by the condition environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CondError {
    #[error("unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    #[error("unit '{unit}' is not {expected}")]
    UnitKindMismatch { unit: String, expected: String },

    #[error("unsupported condition on '{unit}': {reason}")]
    Unsupported { unit: String, reason: String },
}

/// Fatal problem found while activating a tree.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("point {point_no}: {message}")]
    Structure { point_no: usize, message: String },

    #[error("point {point_no}: bad condition: {source}")]
    Condition {
        point_no: usize,
        #[source]
        source: CondError,
    },

    #[error("point {point_no}: import of '{unit}' failed")]
    ImportFailed { point_no: usize, unit: String },
}

/// Evaluation requested on a tree that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("tree is not activated")]
    NotActive,

    #[error("tree has a syntax error")]
    HasErrors,

    #[error("no checkpoint {point_no} (tree has {len})")]
    NoSuchPoint { point_no: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("point {point_no}: working set of {size} records reaches limit {max}")]
    WorkingSetOverflow {
        point_no: usize,
        size: usize,
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_message() {
        let err = BuildError::Structure {
            point_no: 3,
            message: "return is nested too deep".into(),
        };
        assert_eq!(err.to_string(), "point 3: return is nested too deep");
    }

    #[test]
    fn condition_message_includes_source() {
        let err = BuildError::Condition {
            point_no: 1,
            source: CondError::UnknownUnit {
                unit: "Colour".into(),
            },
        };
        assert_eq!(err.to_string(), "point 1: bad condition: unknown unit 'Colour'");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn import_failed_message() {
        let err = BuildError::ImportFailed {
            point_no: 0,
            unit: "Compens".into(),
        };
        assert_eq!(err.to_string(), "point 0: import of 'Compens' failed");
    }

    #[test]
    fn overflow_message() {
        let err = CollectError::WorkingSetOverflow {
            point_no: 2,
            size: 6,
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "point 2: working set of 6 records reaches limit 5"
        );
    }

    #[test]
    fn eval_error_converts() {
        let err: CollectError = EvalError::HasErrors.into();
        assert_eq!(err.to_string(), "tree has a syntax error");
    }
}
