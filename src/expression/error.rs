//! Error types for the scalar expression IR.
//!
//! Every variant is a contract violation by a producer, a rewrite rule or the
//! definition generator. None of them describe bad user data, so they all map
//! to the internal error class rather than to a user-facing SQL error.

use crate::expression::field::FieldType;
use crate::expression::operator::OperatorKind;
use thiserror::Error;

/// SQLSTATE reported for every IR error (`internal_error`).
pub const INTERNAL_ERROR_PGCODE: &str = "XX000";

/// Errors raised while building, querying or rewriting scalar expressions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    /// No operator kind has this name.
    #[error("unknown operator: {name}")]
    UnknownOperator { name: String },

    /// Generic construction got a different number of fields than the schema.
    #[error("{kind} expects {expected} fields, got {actual}")]
    FieldArityMismatch {
        kind: OperatorKind,
        expected: usize,
        actual: usize,
    },

    /// A field value does not have the type the schema declares.
    #[error("{kind} field '{field}' expects {expected}, got {actual}")]
    FieldTypeMismatch {
        kind: OperatorKind,
        field: &'static str,
        expected: FieldType,
        actual: FieldType,
    },

    /// Binary operands were requested from a node without the `Binary` tag.
    #[error("{kind} is not a binary operator")]
    NotBinary { kind: OperatorKind },

    /// The node does not carry the `Unary` tag.
    #[error("{kind} is not a unary operator")]
    NotUnary { kind: OperatorKind },

    /// The node does not carry the `Comparison` tag.
    #[error("{kind} is not a comparison operator")]
    NotComparison { kind: OperatorKind },

    /// A structural invariant of the node or tree does not hold.
    #[error("invalid {kind} structure: {reason}")]
    InvalidStructure { kind: OperatorKind, reason: String },

    /// Child replacement was given the wrong number of children.
    #[error("{kind} has {expected} children, got {actual} replacements")]
    ArityMismatch {
        kind: OperatorKind,
        expected: usize,
        actual: usize,
    },

    /// Encoded bytes could not be written or read back.
    #[error("expression codec error: {reason}")]
    Codec { reason: String },
}

impl IrError {
    pub(crate) fn invalid(kind: OperatorKind, reason: impl Into<String>) -> Self {
        IrError::InvalidStructure {
            kind,
            reason: reason.into(),
        }
    }

    /// SQLSTATE to report when an optimization is aborted by this error.
    pub fn pgcode(&self) -> &'static str {
        INTERNAL_ERROR_PGCODE
    }

    /// IR errors are always internal; user-facing SQL errors are raised by
    /// the producer before a tree reaches this layer.
    pub fn is_internal(&self) -> bool {
        true
    }
}

/// Result type for IR operations
pub type IrResult<T> = Result<T, IrError>;
