//! Scalar expression IR.
//!
//! This module provides:
//! - The operator table and taxonomy
//! - Typed field structures and the generic field boundary
//! - Tag queries and arity accessors
//! - Structural validation

pub mod error;
pub mod expr;
pub mod field;
pub mod operator;
pub mod tag;
pub mod taxonomy;
pub mod traits;
pub mod validate;
pub mod value;

pub use error::{IrError, IrResult, INTERNAL_ERROR_PGCODE};
pub use field::{FieldDef, FieldRef, FieldType, FieldValue};
pub use operator::{OperatorKind, ScalarExpr};
pub use tag::{Tag, TagSet};
pub use taxonomy::{OperatorDef, Taxonomy};
pub use traits::has_tag;
pub use validate::{validate, validate_node};
pub use value::{ColList, ColumnId, Datum, FunctionDef, RelationRef, ScalarType};
