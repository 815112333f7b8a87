//! Structural invariants of scalar expressions.
//!
//! `validate_node` checks a single node and runs on every construction path
//! that can break an invariant, including child replacement. `validate`
//! checks a whole tree. Both are pure functions of the tree, so they can run
//! concurrently on independent trees. NULL type monotonicity spans rewrite
//! steps and is checked by `RewriteSession` instead.

use crate::expression::error::{IrError, IrResult};
use crate::expression::field::{ColListFields, TypedListFields};
use crate::expression::operator::{OperatorKind, ScalarExpr};
use crate::expression::tag::Tag;
use crate::expression::value::ScalarType;

/// Validate every node of the tree rooted at `expr`.
pub fn validate(expr: &ScalarExpr) -> IrResult<()> {
    crate::rewrite::try_visit(expr, &mut |node| validate_node(node))
}

/// Validate the local invariants of one node.
pub fn validate_node(expr: &ScalarExpr) -> IrResult<()> {
    let kind = expr.kind();
    match expr {
        ScalarExpr::Filters(f) if f.conditions.is_empty() => {
            Err(IrError::invalid(kind, "filters must have at least one condition"))
        }
        ScalarExpr::Case(f) => {
            if f.branches.len() < 2 {
                return Err(IrError::invalid(
                    kind,
                    format!(
                        "expected at least one WHEN branch, got {} branch entries",
                        f.branches.len()
                    ),
                ));
            }
            Ok(())
        }
        ScalarExpr::Projections(f) => check_col_list(kind, f),
        ScalarExpr::Aggregations(f) => {
            check_col_list(kind, f)?;
            f.elems.iter().try_for_each(|elem| check_aggregation_item(kind, elem))
        }
        ScalarExpr::Tuple(f) => check_tuple_type(kind, f),
        ScalarExpr::Array(f) => check_array_type(kind, f),
        ScalarExpr::Any(f) => check_comparison_descriptor(kind, f.cmp),
        ScalarExpr::AnyScalar(f) => check_comparison_descriptor(kind, f.cmp),
        _ => Ok(()),
    }
}

fn check_col_list(kind: OperatorKind, f: &ColListFields) -> IrResult<()> {
    if f.elems.len() != f.cols.len() {
        return Err(IrError::invalid(
            kind,
            format!(
                "{} expressions but {} output columns",
                f.elems.len(),
                f.cols.len()
            ),
        ));
    }
    if let Some(dup) = f.cols.find_duplicate() {
        return Err(IrError::invalid(
            kind,
            format!("output column {} appears more than once", dup),
        ));
    }
    Ok(())
}

/// Aggregations only hold aggregate functions, a bare variable, or an
/// aggregate under the DISTINCT modifier.
fn check_aggregation_item(kind: OperatorKind, elem: &ScalarExpr) -> IrResult<()> {
    let allowed = match elem {
        ScalarExpr::Variable(_) => true,
        ScalarExpr::AggDistinct(f) => f.input.kind().has_tag(Tag::Aggregate),
        other => other.kind().has_tag(Tag::Aggregate),
    };
    if allowed {
        Ok(())
    } else {
        Err(IrError::invalid(
            kind,
            format!("{} is not an aggregate", elem.kind()),
        ))
    }
}

fn check_tuple_type(kind: OperatorKind, f: &TypedListFields) -> IrResult<()> {
    match &f.typ {
        ScalarType::Tuple(fields) if fields.len() == f.elems.len() => Ok(()),
        ScalarType::Tuple(fields) => Err(IrError::invalid(
            kind,
            format!(
                "type has {} fields but tuple has {} elements",
                fields.len(),
                f.elems.len()
            ),
        )),
        other => Err(IrError::invalid(
            kind,
            format!("expected a tuple type, got {}", other),
        )),
    }
}

fn check_array_type(kind: OperatorKind, f: &TypedListFields) -> IrResult<()> {
    let elem_type = match &f.typ {
        ScalarType::Array(elem) => elem,
        other => {
            return Err(IrError::invalid(
                kind,
                format!("expected an array type, got {}", other),
            ))
        }
    };
    for (i, elem) in f.elems.iter().enumerate() {
        let typ = elem.data_type();
        if !typ.is_unknown() && **elem_type != ScalarType::Any && typ != **elem_type {
            return Err(IrError::invalid(
                kind,
                format!("element {} has type {}, array holds {}", i, typ, elem_type),
            ));
        }
    }
    Ok(())
}

fn check_comparison_descriptor(kind: OperatorKind, cmp: OperatorKind) -> IrResult<()> {
    if cmp.has_tag(Tag::Comparison) {
        Ok(())
    } else {
        Err(IrError::invalid(
            kind,
            format!("{} is not a comparison operator", cmp),
        ))
    }
}
