//! Normalization helpers written against tags and comparison metadata.
//!
//! None of these match on individual comparison kinds. A new comparison that
//! declares its negated or commuted counterpart is picked up automatically.

use crate::expression::error::IrResult;
use crate::expression::operator::ScalarExpr;

/// Logical negation of a boolean expression, pushed down where possible.
///
/// Constants flip, double negation cancels, comparisons switch to their
/// negated kind and `And`/`Or` follow De Morgan. Anything else is wrapped
/// in `Not`.
pub fn negate(expr: ScalarExpr) -> IrResult<ScalarExpr> {
    if let Some(value) = expr.const_bool() {
        return Ok(ScalarExpr::bool(!value));
    }
    if let Some(negated) = expr.kind().negated_comparison() {
        let (left, right) = expr.comparison_operands()?;
        return ScalarExpr::binary(negated, left.clone(), right.clone());
    }
    match expr {
        ScalarExpr::Not(f) => Ok(*f.input),
        ScalarExpr::And(f) => Ok(ScalarExpr::or(negate_all(f.conditions)?)),
        ScalarExpr::Or(f) => Ok(ScalarExpr::and(negate_all(f.conditions)?)),
        other => Ok(ScalarExpr::not(other)),
    }
}

fn negate_all(conditions: Vec<ScalarExpr>) -> IrResult<Vec<ScalarExpr>> {
    conditions.into_iter().map(negate).collect()
}

/// Flatten nested `And` lists into one conjunction.
///
/// `True` conjuncts are dropped and any `False` conjunct collapses the whole
/// conjunction to `False`. An empty result is `True`; a single conjunct is
/// returned on its own. Non-`And` input is returned unchanged.
pub fn flatten_conjunctions(expr: ScalarExpr) -> ScalarExpr {
    let conditions = match expr {
        ScalarExpr::And(f) => f.conditions,
        other => return other,
    };
    let mut flat = Vec::with_capacity(conditions.len());
    if !collect_conjuncts(conditions, &mut flat) {
        return ScalarExpr::false_expr();
    }
    match flat.len() {
        0 => ScalarExpr::true_expr(),
        1 => flat.remove(0),
        _ => ScalarExpr::and(flat),
    }
}

/// Returns false as soon as a `False` conjunct is found.
fn collect_conjuncts(conditions: Vec<ScalarExpr>, out: &mut Vec<ScalarExpr>) -> bool {
    for condition in conditions {
        match condition {
            ScalarExpr::And(f) => {
                if !collect_conjuncts(f.conditions, out) {
                    return false;
                }
            }
            c if c.is_true() => {}
            c if c.is_false() => return false,
            c => out.push(c),
        }
    }
    true
}

/// Comparison with its operands swapped, when the comparison has a commuted
/// form. `None` for everything else.
pub fn commute(expr: &ScalarExpr) -> IrResult<Option<ScalarExpr>> {
    let commuted = match expr.kind().commuted_comparison() {
        Some(kind) => kind,
        None => return Ok(None),
    };
    let (left, right) = expr.comparison_operands()?;
    ScalarExpr::binary(commuted, right.clone(), left.clone()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::operator::OperatorKind;
    use crate::expression::value::ColumnId;

    fn var(id: u32) -> ScalarExpr {
        ScalarExpr::variable(ColumnId(id))
    }

    #[test]
    fn test_negate_constants_and_not() {
        assert_eq!(negate(ScalarExpr::true_expr()).unwrap(), ScalarExpr::false_expr());
        assert_eq!(negate(ScalarExpr::and(vec![])).unwrap(), ScalarExpr::false_expr());
        assert_eq!(negate(ScalarExpr::or(vec![])).unwrap(), ScalarExpr::true_expr());
        assert_eq!(negate(ScalarExpr::not(var(1))).unwrap(), var(1));
        assert_eq!(negate(var(1)).unwrap(), ScalarExpr::not(var(1)));
    }

    #[test]
    fn test_negate_comparisons() {
        assert_eq!(
            negate(ScalarExpr::lt(var(1), var(2))).unwrap(),
            ScalarExpr::ge(var(1), var(2))
        );
        let like = ScalarExpr::binary(OperatorKind::Like, var(1), ScalarExpr::string("a%")).unwrap();
        assert_eq!(negate(like).unwrap().kind(), OperatorKind::NotLike);

        // No negated counterpart: wrapped.
        let contains =
            ScalarExpr::binary(OperatorKind::Contains, var(1), var(2)).unwrap();
        assert_eq!(negate(contains.clone()).unwrap(), ScalarExpr::not(contains));
    }

    #[test]
    fn test_negate_de_morgan() {
        let expr = ScalarExpr::and(vec![
            ScalarExpr::eq(var(1), ScalarExpr::int(1)),
            ScalarExpr::or(vec![var(2), ScalarExpr::not(var(3))]),
        ]);
        assert_eq!(
            negate(expr).unwrap(),
            ScalarExpr::or(vec![
                ScalarExpr::ne(var(1), ScalarExpr::int(1)),
                ScalarExpr::and(vec![ScalarExpr::not(var(2)), var(3)]),
            ])
        );
    }

    #[test]
    fn test_flatten_conjunctions() {
        let expr = ScalarExpr::and(vec![
            var(1),
            ScalarExpr::and(vec![var(2), ScalarExpr::true_expr(), ScalarExpr::and(vec![var(3)])]),
            ScalarExpr::and(vec![]),
        ]);
        assert_eq!(
            flatten_conjunctions(expr),
            ScalarExpr::and(vec![var(1), var(2), var(3)])
        );

        let only_true = ScalarExpr::and(vec![ScalarExpr::true_expr(), ScalarExpr::and(vec![])]);
        assert_eq!(flatten_conjunctions(only_true), ScalarExpr::true_expr());

        let single = ScalarExpr::and(vec![ScalarExpr::and(vec![var(4)])]);
        assert_eq!(flatten_conjunctions(single), var(4));

        let with_false = ScalarExpr::and(vec![var(1), ScalarExpr::or(vec![])]);
        assert_eq!(flatten_conjunctions(with_false), ScalarExpr::false_expr());

        let or = ScalarExpr::or(vec![var(1), var(2)]);
        assert_eq!(flatten_conjunctions(or.clone()), or);
    }

    #[test]
    fn test_commute() {
        assert_eq!(
            commute(&ScalarExpr::lt(var(1), ScalarExpr::int(5))).unwrap(),
            Some(ScalarExpr::gt(ScalarExpr::int(5), var(1)))
        );
        assert_eq!(
            commute(&ScalarExpr::eq(var(1), var(2))).unwrap(),
            Some(ScalarExpr::eq(var(2), var(1)))
        );
        let like = ScalarExpr::binary(OperatorKind::Like, var(1), var(2)).unwrap();
        assert_eq!(commute(&like).unwrap(), None);
        assert_eq!(commute(&ScalarExpr::plus(var(1), var(2))).unwrap(), None);
    }
}
