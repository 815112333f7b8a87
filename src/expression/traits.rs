//! Tag and trait queries over expression nodes.
//!
//! Every predicate here depends only on the node's kind, except the boolean
//! constant queries, which also treat an empty `And` as `True` and an empty
//! `Or` as `False`. Generic rules (constant folding, De Morgan, predicate
//! pushdown) are written against these instead of lists of operator names.

use crate::expression::error::{IrError, IrResult};
use crate::expression::operator::ScalarExpr;
use crate::expression::tag::Tag;

/// O(1) tag membership test derived from the node's kind.
pub fn has_tag(expr: &ScalarExpr, tag: Tag) -> bool {
    expr.kind().has_tag(tag)
}

impl ScalarExpr {
    pub fn has_tag(&self, tag: Tag) -> bool {
        has_tag(self, tag)
    }

    pub fn is_boolean(&self) -> bool {
        self.has_tag(Tag::Boolean)
    }

    /// True for leaves that constant folding can consume directly. Empty
    /// `And`/`Or` count as the `True`/`False` they stand for.
    pub fn is_const_value(&self) -> bool {
        self.has_tag(Tag::ConstValue) || self.const_bool().is_some()
    }

    pub fn is_comparison(&self) -> bool {
        self.has_tag(Tag::Comparison)
    }

    pub fn is_binary(&self) -> bool {
        self.has_tag(Tag::Binary)
    }

    pub fn is_unary(&self) -> bool {
        self.has_tag(Tag::Unary)
    }

    pub fn is_aggregate(&self) -> bool {
        self.has_tag(Tag::Aggregate)
    }

    /// Boolean value of a constant boolean node.
    pub fn const_bool(&self) -> Option<bool> {
        match self {
            ScalarExpr::True(_) => Some(true),
            ScalarExpr::False(_) => Some(false),
            ScalarExpr::And(f) if f.conditions.is_empty() => Some(true),
            ScalarExpr::Or(f) if f.conditions.is_empty() => Some(false),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        self.const_bool() == Some(true)
    }

    pub fn is_false(&self) -> bool {
        self.const_bool() == Some(false)
    }

    /// Left and right operands of a binary-tagged node.
    pub fn binary_operands(&self) -> IrResult<(&ScalarExpr, &ScalarExpr)> {
        if !self.is_binary() {
            return Err(IrError::NotBinary { kind: self.kind() });
        }
        match self.children().as_slice() {
            [left, right] => Ok((*left, *right)),
            _ => Err(IrError::NotBinary { kind: self.kind() }),
        }
    }

    /// Left and right operands of a comparison-tagged node.
    pub fn comparison_operands(&self) -> IrResult<(&ScalarExpr, &ScalarExpr)> {
        if !self.is_comparison() {
            return Err(IrError::NotComparison { kind: self.kind() });
        }
        match self.children().as_slice() {
            [left, right] => Ok((*left, *right)),
            _ => Err(IrError::NotComparison { kind: self.kind() }),
        }
    }

    /// Operand of a unary-tagged node.
    pub fn unary_operand(&self) -> IrResult<&ScalarExpr> {
        if !self.is_unary() {
            return Err(IrError::NotUnary { kind: self.kind() });
        }
        match self.children().as_slice() {
            [input] => Ok(*input),
            _ => Err(IrError::NotUnary { kind: self.kind() }),
        }
    }
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
    fn test_binary_operands() {
        let expr = ScalarExpr::plus(var(1), ScalarExpr::int(2));
        let (left, right) = expr.binary_operands().unwrap();
        assert_eq!(left, &var(1));
        assert_eq!(right, &ScalarExpr::int(2));

        let cmp = ScalarExpr::eq(var(1), ScalarExpr::int(2));
        assert_eq!(
            cmp.binary_operands().unwrap_err(),
            IrError::NotBinary {
                kind: OperatorKind::Eq
            }
        );
    }

    #[test]
    fn test_binary_operands_cover_every_binary_kind() {
        for kind in OperatorKind::ALL.iter().copied() {
            if let Ok(expr) = ScalarExpr::binary(kind, var(1), var(2)) {
                assert_eq!(
                    expr.binary_operands().is_ok(),
                    kind.has_tag(Tag::Binary),
                    "{}",
                    kind
                );
                assert_eq!(
                    expr.comparison_operands().is_ok(),
                    kind.has_tag(Tag::Comparison),
                    "{}",
                    kind
                );
            }
        }
    }

    #[test]
    fn test_unary_operand() {
        let expr = ScalarExpr::unary_minus(var(1));
        assert_eq!(expr.unary_operand().unwrap(), &var(1));

        let not = ScalarExpr::not(var(1));
        assert!(matches!(not.unary_operand(), Err(IrError::NotUnary { .. })));
    }

    #[test]
    fn test_unary_operand_for_every_unary_kind() {
        use crate::expression::field::FieldValue;
        use crate::expression::taxonomy::Taxonomy;

        let mut seen = 0;
        for kind in Taxonomy::kinds_with_tag(Tag::Unary) {
            let expr = ScalarExpr::construct(kind, vec![FieldValue::Expr(var(4))]).unwrap();
            assert_eq!(expr.unary_operand().unwrap(), &var(4), "{}", kind);
            assert!(expr.binary_operands().is_err());
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_comparison_operands() {
        let expr = ScalarExpr::lt(var(1), var(2));
        let (left, right) = expr.comparison_operands().unwrap();
        assert_eq!(left, &var(1));
        assert_eq!(right, &var(2));
        assert!(matches!(
            ScalarExpr::plus(var(1), var(2)).comparison_operands(),
            Err(IrError::NotComparison { .. })
        ));
    }

    #[test]
    fn test_empty_and_or_behave_as_constants() {
        let empty_and = ScalarExpr::and(vec![]);
        let empty_or = ScalarExpr::or(vec![]);
        let t = ScalarExpr::true_expr();
        let f = ScalarExpr::false_expr();

        assert_eq!(empty_and.const_bool(), t.const_bool());
        assert_eq!(empty_and.is_true(), t.is_true());
        assert_eq!(empty_and.is_false(), t.is_false());
        assert_eq!(empty_and.is_const_value(), t.is_const_value());
        assert_eq!(empty_and.is_boolean(), t.is_boolean());

        assert_eq!(empty_or.const_bool(), f.const_bool());
        assert_eq!(empty_or.is_false(), f.is_false());
        assert_eq!(empty_or.is_const_value(), f.is_const_value());

        let nonempty = ScalarExpr::and(vec![var(1)]);
        assert_eq!(nonempty.const_bool(), None);
        assert!(!nonempty.is_const_value());
    }

    #[test]
    fn test_predicates() {
        assert!(ScalarExpr::null(crate::expression::value::ScalarType::Unknown).is_const_value());
        assert!(ScalarExpr::int(1).is_const_value());
        assert!(!var(1).is_const_value());
        assert!(ScalarExpr::count_rows().is_aggregate());
        assert!(ScalarExpr::unary_minus(var(1)).is_unary());
        assert!(ScalarExpr::eq(var(1), var(2)).is_comparison());
        assert!(!ScalarExpr::eq(var(1), var(2)).is_boolean());
        assert!(has_tag(&ScalarExpr::not(var(1)), Tag::Boolean));
    }
}
