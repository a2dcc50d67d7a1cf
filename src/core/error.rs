//! Engine error type.

use thiserror::Error;

/// Errors surfaced by the interaction engine.
///
/// Out-of-range arguments are never errors: navigation operations clamp or
/// no-op instead. What remains are construction problems (bad bindings,
/// duplicate grid nodes), missing scopes, and internal invariant breaks.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{component}: invariant violated: {detail}")]
    InvariantViolation {
        component: &'static str,
        detail: String,
    },
    #[error("no active {0} in scope")]
    MissingContext(&'static str),
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
    #[error("invalid binding: {0}")]
    InvalidBinding(String),
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),
    #[error("duplicate navigator node: {0:?}")]
    DuplicateNode(String),
    #[error("unknown consumer id {0}")]
    UnknownConsumer(u64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invariant(component: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            component,
            detail: detail.into(),
        }
    }

    /// Whether this error is an internal defect rather than a usage problem.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
