use crate::schema::CheckerKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StandardizeError {
    #[error("act has no checker name")]
    MissingChecker,

    #[error("checker '{0}' produced no native result")]
    MissingNativeResult(String),

    #[error("malformed {kind} result: {reason}")]
    Malformed { kind: CheckerKind, reason: String },
}

impl StandardizeError {
    pub(crate) fn malformed(kind: CheckerKind, err: impl std::fmt::Display) -> Self {
        StandardizeError::Malformed {
            kind,
            reason: err.to_string(),
        }
    }
}
