//! The operator table.
//!
//! `scalar_operators!` is the declaration every operator kind comes from.
//! One line per kind gives its field structure and tag set. From it the macro
//! derives the closed `OperatorKind` enum, the `ScalarExpr` sum type with one
//! variant per kind, and the per-kind schema, tag, constructor and accessor
//! dispatch. Nothing else in the crate enumerates operator kinds.

use crate::expression::error::IrResult;
use crate::expression::field::{
    AnyFields, AnyScalarFields, ArgsFields, BinaryFields, CaseFields, CastFields, ChildFeed,
    ColListFields, ColumnAccessFields, ConditionsFields, ConstFields, FieldDef, FieldRef,
    FieldValue, FunctionFields, InputFields, NoFields, NullFields, OperatorFields,
    PlaceholderFields, SubqueryFields, TypedListFields, VariableFields,
};
use crate::expression::tag::{Tag, TagSet};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! scalar_operators {
    ($( $(#[$doc:meta])* $kind:ident($shape:ty) [$($tag:ident),+]; )+) => {
        /// Discriminant identifying which scalar operation a node performs.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum OperatorKind {
            $( $(#[$doc])* $kind, )+
        }

        impl OperatorKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [OperatorKind] = &[$(OperatorKind::$kind,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(OperatorKind::$kind => stringify!($kind),)+
                }
            }

            pub fn tags(self) -> TagSet {
                match self {
                    $(OperatorKind::$kind => TagSet::EMPTY$(.with(Tag::$tag))+,)+
                }
            }

            /// Ordered field schema.
            pub fn schema(self) -> &'static [FieldDef] {
                match self {
                    $(OperatorKind::$kind => <$shape as OperatorFields>::SCHEMA,)+
                }
            }
        }

        /// A scalar expression tree node.
        ///
        /// Each variant owns its fields outright; child slots are boxed or
        /// held in vectors, so a subtree has exactly one parent. Equality and
        /// hashing are structural.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ScalarExpr {
            $( $(#[$doc])* $kind($shape), )+
        }

        impl ScalarExpr {
            pub fn kind(&self) -> OperatorKind {
                match self {
                    $(ScalarExpr::$kind(_) => OperatorKind::$kind,)+
                }
            }

            /// Build a node of `kind` from field values given in schema order.
            /// Checks count and types only; `construct` adds validation.
            pub(crate) fn from_field_values(
                kind: OperatorKind,
                values: Vec<FieldValue>,
            ) -> IrResult<ScalarExpr> {
                Ok(match kind {
                    $(OperatorKind::$kind => ScalarExpr::$kind(<$shape>::from_fields(kind, values)?),)+
                })
            }

            /// Borrowed field values in schema order.
            pub fn fields(&self) -> Vec<FieldRef<'_>> {
                match self {
                    $(ScalarExpr::$kind(f) => f.fields(),)+
                }
            }

            /// Child expressions: every `Expr` and `ExprList` field flattened
            /// in schema order.
            pub fn children(&self) -> Vec<&ScalarExpr> {
                match self {
                    $(ScalarExpr::$kind(f) => f.children(),)+
                }
            }

            pub fn child_count(&self) -> usize {
                match self {
                    $(ScalarExpr::$kind(f) => f.child_count(),)+
                }
            }

            pub(crate) fn rebind_children(&self, feed: &mut ChildFeed) -> IrResult<ScalarExpr> {
                Ok(match self {
                    $(ScalarExpr::$kind(f) => ScalarExpr::$kind(f.rebind(feed)?),)+
                })
            }
        }
    };
}

scalar_operators! {
    /// Scalar subquery returning at most one row of one column.
    Subquery(SubqueryFields) [Scalar];
    /// True when the subquery returns any row.
    Exists(SubqueryFields) [Scalar];
    /// `scalar cmp ANY (subquery)`.
    Any(AnyFields) [Scalar];
    Variable(VariableFields) [Scalar];
    Const(ConstFields) [Scalar, ConstValue];
    /// SQL NULL. Created with the unknown type; normalization may refine it.
    Null(NullFields) [Scalar, ConstValue];
    True(NoFields) [Scalar, Boolean, ConstValue];
    False(NoFields) [Scalar, Boolean, ConstValue];
    Placeholder(PlaceholderFields) [Scalar];
    Tuple(TypedListFields) [Scalar];
    /// Projected expressions paired with their output columns.
    Projections(ColListFields) [Scalar];
    /// Aggregate expressions paired with their output columns.
    Aggregations(ColListFields) [Scalar];
    /// Conjunction of filter conditions; never empty.
    Filters(ConditionsFields) [Scalar, Boolean];
    /// Empty conditions mean `True`.
    And(ConditionsFields) [Scalar, Boolean];
    /// Empty conditions mean `False`.
    Or(ConditionsFields) [Scalar, Boolean];
    Not(InputFields) [Scalar, Boolean];

    Eq(BinaryFields) [Scalar, Comparison];
    Lt(BinaryFields) [Scalar, Comparison];
    Gt(BinaryFields) [Scalar, Comparison];
    Le(BinaryFields) [Scalar, Comparison];
    Ge(BinaryFields) [Scalar, Comparison];
    Ne(BinaryFields) [Scalar, Comparison];
    In(BinaryFields) [Scalar, Comparison];
    NotIn(BinaryFields) [Scalar, Comparison];
    Like(BinaryFields) [Scalar, Comparison];
    NotLike(BinaryFields) [Scalar, Comparison];
    ILike(BinaryFields) [Scalar, Comparison];
    NotILike(BinaryFields) [Scalar, Comparison];
    SimilarTo(BinaryFields) [Scalar, Comparison];
    NotSimilarTo(BinaryFields) [Scalar, Comparison];
    RegMatch(BinaryFields) [Scalar, Comparison];
    NotRegMatch(BinaryFields) [Scalar, Comparison];
    RegIMatch(BinaryFields) [Scalar, Comparison];
    NotRegIMatch(BinaryFields) [Scalar, Comparison];
    /// `IS NOT DISTINCT FROM`.
    Is(BinaryFields) [Scalar, Comparison];
    /// `IS DISTINCT FROM`.
    IsNot(BinaryFields) [Scalar, Comparison];
    /// JSON containment `@>`.
    Contains(BinaryFields) [Scalar, Comparison];
    JsonExists(BinaryFields) [Scalar, Comparison];
    JsonAllExists(BinaryFields) [Scalar, Comparison];
    JsonSomeExists(BinaryFields) [Scalar, Comparison];
    /// `left cmp ANY right` over a tuple or array.
    AnyScalar(AnyScalarFields) [Scalar];

    Bitand(BinaryFields) [Scalar, Binary];
    Bitor(BinaryFields) [Scalar, Binary];
    Bitxor(BinaryFields) [Scalar, Binary];
    Plus(BinaryFields) [Scalar, Binary];
    Minus(BinaryFields) [Scalar, Binary];
    Mult(BinaryFields) [Scalar, Binary];
    Div(BinaryFields) [Scalar, Binary];
    FloorDiv(BinaryFields) [Scalar, Binary];
    Mod(BinaryFields) [Scalar, Binary];
    Pow(BinaryFields) [Scalar, Binary];
    Concat(BinaryFields) [Scalar, Binary];
    LShift(BinaryFields) [Scalar, Binary];
    RShift(BinaryFields) [Scalar, Binary];
    FetchVal(BinaryFields) [Scalar, Binary];
    FetchText(BinaryFields) [Scalar, Binary];
    FetchValPath(BinaryFields) [Scalar, Binary];
    FetchTextPath(BinaryFields) [Scalar, Binary];
    UnaryMinus(InputFields) [Scalar, Unary];
    UnaryComplement(InputFields) [Scalar, Unary];

    Cast(CastFields) [Scalar];
    /// CASE with a flat (condition, value) branch list and optional ELSE.
    Case(CaseFields) [Scalar];
    Array(TypedListFields) [Scalar];
    Function(FunctionFields) [Scalar];
    Coalesce(ArgsFields) [Scalar];
    ColumnAccess(ColumnAccessFields) [Scalar];

    ArrayAgg(InputFields) [Scalar, Aggregate];
    Avg(InputFields) [Scalar, Aggregate];
    BoolAnd(InputFields) [Scalar, Aggregate];
    BoolOr(InputFields) [Scalar, Aggregate];
    ConcatAgg(InputFields) [Scalar, Aggregate];
    Count(InputFields) [Scalar, Aggregate];
    /// `COUNT(*)`; the only aggregate without an input.
    CountRows(NoFields) [Scalar, Aggregate];
    Max(InputFields) [Scalar, Aggregate];
    Min(InputFields) [Scalar, Aggregate];
    SumInt(InputFields) [Scalar, Aggregate];
    Sum(InputFields) [Scalar, Aggregate];
    SqrtDiff(InputFields) [Scalar, Aggregate];
    Variance(InputFields) [Scalar, Aggregate];
    StdDev(InputFields) [Scalar, Aggregate];
    XorAgg(InputFields) [Scalar, Aggregate];
    JsonAgg(InputFields) [Scalar, Aggregate];
    JsonbAgg(InputFields) [Scalar, Aggregate];
    AnyNotNull(InputFields) [Scalar, Aggregate];
    /// DISTINCT modifier wrapping an aggregate.
    AggDistinct(InputFields) [Scalar];
}

impl OperatorKind {
    pub fn has_tag(self, tag: Tag) -> bool {
        self.tags().contains(tag)
    }

    /// Comparison producing the logical negation of this one, if it exists.
    pub fn negated_comparison(self) -> Option<OperatorKind> {
        use OperatorKind::*;
        let negated = match self {
            Eq => Ne,
            Ne => Eq,
            Lt => Ge,
            Ge => Lt,
            Gt => Le,
            Le => Gt,
            In => NotIn,
            NotIn => In,
            Like => NotLike,
            NotLike => Like,
            ILike => NotILike,
            NotILike => ILike,
            SimilarTo => NotSimilarTo,
            NotSimilarTo => SimilarTo,
            RegMatch => NotRegMatch,
            NotRegMatch => RegMatch,
            RegIMatch => NotRegIMatch,
            NotRegIMatch => RegIMatch,
            Is => IsNot,
            IsNot => Is,
            _ => return None,
        };
        Some(negated)
    }

    /// Comparison that gives the same result with operands swapped.
    pub fn commuted_comparison(self) -> Option<OperatorKind> {
        use OperatorKind::*;
        let commuted = match self {
            Eq | Ne | Is | IsNot => self,
            Lt => Gt,
            Gt => Lt,
            Le => Ge,
            Ge => Le,
            _ => return None,
        };
        Some(commuted)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
