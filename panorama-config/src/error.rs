use thiserror::Error;

use crate::variables::VariableType;

/// Local validation failures raised while building or mutating objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("description exceeds {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("invalid {field} structure")]
    InvalidStructure { field: &'static str },
    #[error("unknown variable type {0:?}")]
    UnknownVariableType(String),
    #[error("{tag} value must be {expected}")]
    ValueMismatch {
        tag: VariableType,
        expected: &'static str,
    },
    #[error(
        "variable definition {variable:?} not found for template stack {stack}; \
         define it at the stack level or ensure another device has it assigned"
    )]
    UndefinedVariable { variable: String, stack: String },
    #[error("the attribute settings must be a vsys, got {0:?}")]
    InvalidVsys(String),
    #[error("{field} must be of type {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("invalid serial {serial:?}: {reason}")]
    InvalidSerial { serial: String, reason: String },
    #[error("failed to decode {kind}: {message}")]
    Decode { kind: &'static str, message: String },
}

impl ModelError {
    pub(crate) fn decode(kind: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            kind,
            message: err.to_string(),
        }
    }
}
