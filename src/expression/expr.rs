//! Constructors, field introspection and typing for `ScalarExpr`.

use crate::expression::error::IrResult;
use crate::expression::field::{
    AnyFields, AnyScalarFields, ArgsFields, BinaryFields, CaseFields, CastFields, ColListFields,
    ColumnAccessFields, ConditionsFields, ConstFields, FieldRef, FieldValue, FunctionFields,
    InputFields, NoFields, NullFields, PlaceholderFields, SubqueryFields, TypedListFields,
    VariableFields,
};
use crate::expression::operator::{OperatorKind, ScalarExpr};
use crate::expression::tag::Tag;
use crate::expression::validate::validate_node;
use crate::expression::value::{ColList, ColumnId, Datum, FunctionDef, RelationRef, ScalarType};
use std::fmt;

impl ScalarExpr {
    /// Build a node generically from field values in schema order.
    ///
    /// Fails with `FieldArityMismatch`/`FieldTypeMismatch` when the values do
    /// not match the schema, and with `InvalidStructure` when the node breaks
    /// one of its structural invariants.
    pub fn construct(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<ScalarExpr> {
        let expr = ScalarExpr::from_field_values(kind, values)?;
        validate_node(&expr)?;
        Ok(expr)
    }

    /// Look up a field by its schema name.
    pub fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        let pos = self.kind().schema().iter().position(|f| f.name == name)?;
        self.fields().into_iter().nth(pos)
    }

    /// True when the kind has no child fields (constants, variables,
    /// `CountRows`). An empty `And` is not a leaf.
    pub fn is_leaf(&self) -> bool {
        !self.kind().schema().iter().any(|f| f.typ.is_child())
    }

    // Leaves

    pub fn variable(col: ColumnId) -> Self {
        ScalarExpr::Variable(VariableFields { col })
    }

    pub fn constant(value: Datum) -> Self {
        ScalarExpr::Const(ConstFields { value })
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Datum::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(Datum::String(value.into()))
    }

    pub fn null(typ: ScalarType) -> Self {
        ScalarExpr::Null(NullFields { typ })
    }

    pub fn true_expr() -> Self {
        ScalarExpr::True(NoFields)
    }

    pub fn false_expr() -> Self {
        ScalarExpr::False(NoFields)
    }

    pub fn bool(value: bool) -> Self {
        if value {
            Self::true_expr()
        } else {
            Self::false_expr()
        }
    }

    pub fn placeholder(idx: u32, typ: ScalarType) -> Self {
        ScalarExpr::Placeholder(PlaceholderFields { idx, typ })
    }

    pub fn count_rows() -> Self {
        ScalarExpr::CountRows(NoFields)
    }

    // Subqueries

    pub fn subquery(input: RelationRef) -> Self {
        ScalarExpr::Subquery(SubqueryFields { input })
    }

    pub fn exists(input: RelationRef) -> Self {
        ScalarExpr::Exists(SubqueryFields { input })
    }

    pub fn any(input: RelationRef, scalar: ScalarExpr, cmp: OperatorKind) -> IrResult<Self> {
        let expr = ScalarExpr::Any(AnyFields {
            input,
            scalar: Box::new(scalar),
            cmp,
        });
        validate_node(&expr)?;
        Ok(expr)
    }

    // Boolean logic

    pub fn and(conditions: Vec<ScalarExpr>) -> Self {
        ScalarExpr::And(ConditionsFields { conditions })
    }

    pub fn or(conditions: Vec<ScalarExpr>) -> Self {
        ScalarExpr::Or(ConditionsFields { conditions })
    }

    pub fn filters(conditions: Vec<ScalarExpr>) -> IrResult<Self> {
        let expr = ScalarExpr::Filters(ConditionsFields { conditions });
        validate_node(&expr)?;
        Ok(expr)
    }

    pub fn not(input: ScalarExpr) -> Self {
        ScalarExpr::Not(InputFields {
            input: Box::new(input),
        })
    }

    /// Build any two-operand node: a comparison or a binary operator.
    ///
    /// Other kinds go through `construct` so that the schema is checked.
    pub fn binary(kind: OperatorKind, left: ScalarExpr, right: ScalarExpr) -> IrResult<Self> {
        Self::construct(kind, vec![FieldValue::Expr(left), FieldValue::Expr(right)])
    }

    pub fn eq(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Eq(BinaryFields::new(left, right))
    }

    pub fn ne(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Ne(BinaryFields::new(left, right))
    }

    pub fn lt(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Lt(BinaryFields::new(left, right))
    }

    pub fn le(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Le(BinaryFields::new(left, right))
    }

    pub fn gt(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Gt(BinaryFields::new(left, right))
    }

    pub fn ge(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Ge(BinaryFields::new(left, right))
    }

    pub fn any_scalar(left: ScalarExpr, right: ScalarExpr, cmp: OperatorKind) -> IrResult<Self> {
        let expr = ScalarExpr::AnyScalar(AnyScalarFields {
            left: Box::new(left),
            right: Box::new(right),
            cmp,
        });
        validate_node(&expr)?;
        Ok(expr)
    }

    // Arithmetic

    pub fn plus(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Plus(BinaryFields::new(left, right))
    }

    pub fn minus(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Minus(BinaryFields::new(left, right))
    }

    pub fn mult(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Mult(BinaryFields::new(left, right))
    }

    pub fn div(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Div(BinaryFields::new(left, right))
    }

    pub fn concat(left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Concat(BinaryFields::new(left, right))
    }

    pub fn unary_minus(input: ScalarExpr) -> Self {
        ScalarExpr::UnaryMinus(InputFields {
            input: Box::new(input),
        })
    }

    // Composite values

    pub fn tuple(elems: Vec<ScalarExpr>, typ: ScalarType) -> IrResult<Self> {
        let expr = ScalarExpr::Tuple(TypedListFields { elems, typ });
        validate_node(&expr)?;
        Ok(expr)
    }

    pub fn array(elems: Vec<ScalarExpr>, typ: ScalarType) -> IrResult<Self> {
        let expr = ScalarExpr::Array(TypedListFields { elems, typ });
        validate_node(&expr)?;
        Ok(expr)
    }

    pub fn projections(elems: Vec<ScalarExpr>, cols: ColList) -> IrResult<Self> {
        let expr = ScalarExpr::Projections(ColListFields { elems, cols });
        validate_node(&expr)?;
        Ok(expr)
    }

    pub fn aggregations(elems: Vec<ScalarExpr>, cols: ColList) -> IrResult<Self> {
        let expr = ScalarExpr::Aggregations(ColListFields { elems, cols });
        validate_node(&expr)?;
        Ok(expr)
    }

    // Conditionals, casts and calls

    /// CASE with an operand. `branches` alternates condition and value, with
    /// an optional trailing ELSE value.
    pub fn case(input: ScalarExpr, branches: Vec<ScalarExpr>) -> IrResult<Self> {
        let expr = ScalarExpr::Case(CaseFields {
            input: Box::new(input),
            branches,
        });
        validate_node(&expr)?;
        Ok(expr)
    }

    /// `CASE WHEN ... END`, i.e. CASE over a `True` operand.
    pub fn searched_case(branches: Vec<ScalarExpr>) -> IrResult<Self> {
        Self::case(Self::true_expr(), branches)
    }

    pub fn cast(input: ScalarExpr, typ: ScalarType) -> Self {
        ScalarExpr::Cast(CastFields {
            input: Box::new(input),
            typ,
        })
    }

    pub fn function(args: Vec<ScalarExpr>, def: FunctionDef) -> Self {
        ScalarExpr::Function(FunctionFields { args, def })
    }

    pub fn coalesce(args: Vec<ScalarExpr>) -> Self {
        ScalarExpr::Coalesce(ArgsFields { args })
    }

    pub fn column_access(input: ScalarExpr, idx: u32) -> Self {
        ScalarExpr::ColumnAccess(ColumnAccessFields {
            input: Box::new(input),
            idx,
        })
    }

    // Aggregates

    /// Wrap `input` in the single-input aggregate `kind`.
    pub fn aggregate(kind: OperatorKind, input: ScalarExpr) -> IrResult<Self> {
        Self::construct(kind, vec![FieldValue::Expr(input)])
    }

    pub fn agg_distinct(input: ScalarExpr) -> Self {
        ScalarExpr::AggDistinct(InputFields {
            input: Box::new(input),
        })
    }

    /// Statically known result type. `Unknown` when the type lives outside
    /// the tree (column metadata) or has not been refined yet.
    pub fn data_type(&self) -> ScalarType {
        use ScalarExpr::*;
        match self {
            Variable(_) => ScalarType::Unknown,
            Const(f) => f.value.data_type(),
            Null(f) => f.typ.clone(),
            Placeholder(f) => f.typ.clone(),
            Subquery(f) => f.input.typ.clone(),
            Tuple(f) | Array(f) => f.typ.clone(),
            Cast(f) => f.typ.clone(),
            Function(f) => f.def.return_type.clone(),

            True(_) | False(_) | Filters(_) | And(_) | Or(_) | Not(_) | Exists(_) | Any(_)
            | AnyScalar(_) => ScalarType::Bool,
            _ if self.kind().has_tag(Tag::Comparison) => ScalarType::Bool,

            Bitand(f) | Bitor(f) | Bitxor(f) | Plus(f) | Minus(f) | Mult(f) | Mod(f) | Pow(f)
            | LShift(f) | RShift(f) | FloorDiv(f) => first_known([&*f.left, &*f.right]),
            Div(f) => match first_known([&*f.left, &*f.right]) {
                ScalarType::Int => ScalarType::Decimal,
                other => other,
            },
            Concat(f) => first_known([&*f.left, &*f.right]),
            FetchVal(_) | FetchValPath(_) => ScalarType::Json,
            FetchText(_) | FetchTextPath(_) => ScalarType::String,
            UnaryMinus(f) | UnaryComplement(f) => f.input.data_type(),

            Case(f) => first_known(
                f.whens()
                    .map(|(_, value)| value)
                    .chain(f.else_value()),
            ),
            Coalesce(f) => first_known(f.args.iter()),
            ColumnAccess(f) => match f.input.data_type() {
                ScalarType::Tuple(mut fields) if (f.idx as usize) < fields.len() => {
                    fields.swap_remove(f.idx as usize)
                }
                _ => ScalarType::Unknown,
            },

            Count(_) | CountRows(_) => ScalarType::Int,
            Avg(_) | Variance(_) | StdDev(_) | SqrtDiff(_) => ScalarType::Decimal,
            BoolAnd(_) | BoolOr(_) => ScalarType::Bool,
            ConcatAgg(f) => f.input.data_type(),
            ArrayAgg(f) => match f.input.data_type() {
                ScalarType::Unknown => ScalarType::Unknown,
                elem => ScalarType::Array(Box::new(elem)),
            },
            JsonAgg(_) | JsonbAgg(_) => ScalarType::Json,
            Sum(f) => match f.input.data_type() {
                ScalarType::Int => ScalarType::Decimal,
                other => other,
            },
            SumInt(_) => ScalarType::Int,
            Max(f) | Min(f) | XorAgg(f) | AnyNotNull(f) | AggDistinct(f) => f.input.data_type(),

            // Projections and Aggregations are lists, not values.
            _ => ScalarType::Unknown,
        }
    }
}

fn first_known<'a>(exprs: impl IntoIterator<Item = &'a ScalarExpr>) -> ScalarType {
    exprs
        .into_iter()
        .map(ScalarExpr::data_type)
        .find(|typ| !typ.is_unknown())
        .unwrap_or(ScalarType::Unknown)
}

impl BinaryFields {
    pub fn new(left: ScalarExpr, right: ScalarExpr) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Renders the tree as an s-expression: `(Plus (Variable @1) (Const 1))`.
impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind())?;
        for field in self.fields() {
            match field {
                FieldRef::Expr(e) => write!(f, " {}", e)?,
                FieldRef::ExprList(list) => {
                    write!(f, " [")?;
                    for (i, e) in list.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        write!(f, "{}", e)?;
                    }
                    write!(f, "]")?;
                }
                FieldRef::ColumnId(col) => write!(f, " {}", col)?,
                FieldRef::Datum(d) => write!(f, " {}", d)?,
                FieldRef::Type(t) => write!(f, " {}", t)?,
                FieldRef::ColList(cols) => write!(f, " {}", cols)?,
                FieldRef::FuncDef(def) => write!(f, " {}", def.name)?,
                FieldRef::Operator(op) => write!(f, " {}", op)?,
                FieldRef::Relation(rel) => write!(f, " {}", rel)?,
                FieldRef::Ordinal(idx) => write!(f, " {}", idx)?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::error::IrError;
    use crate::expression::field::FieldType;

    #[test]
    fn test_construct_matches_builders() {
        let built = ScalarExpr::eq(ScalarExpr::variable(ColumnId(1)), ScalarExpr::int(5));
        let constructed = ScalarExpr::construct(
            OperatorKind::Eq,
            vec![
                FieldValue::Expr(ScalarExpr::variable(ColumnId(1))),
                FieldValue::Expr(ScalarExpr::int(5)),
            ],
        )
        .unwrap();
        assert_eq!(built, constructed);
    }

    #[test]
    fn test_construct_arity_mismatch() {
        let err = ScalarExpr::construct(OperatorKind::Cast, vec![FieldValue::Expr(ScalarExpr::int(1))])
            .unwrap_err();
        assert_eq!(
            err,
            IrError::FieldArityMismatch {
                kind: OperatorKind::Cast,
                expected: 2,
                actual: 1,
            }
        );

        let err = ScalarExpr::construct(OperatorKind::True, vec![FieldValue::Ordinal(0)]).unwrap_err();
        assert!(matches!(err, IrError::FieldArityMismatch { .. }));
    }

    #[test]
    fn test_construct_type_mismatch() {
        // Field order matters: Cast is (input, typ).
        let err = ScalarExpr::construct(
            OperatorKind::Cast,
            vec![
                FieldValue::Type(ScalarType::Int),
                FieldValue::Expr(ScalarExpr::int(1)),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            IrError::FieldTypeMismatch {
                kind: OperatorKind::Cast,
                field: "input",
                expected: FieldType::Expr,
                actual: FieldType::Type,
            }
        );
    }

    #[test]
    fn test_construct_validates() {
        let err = ScalarExpr::construct(OperatorKind::Filters, vec![FieldValue::ExprList(vec![])])
            .unwrap_err();
        assert!(matches!(err, IrError::InvalidStructure { .. }));
    }

    #[test]
    fn test_field_by_name() {
        let expr = ScalarExpr::cast(ScalarExpr::int(1), ScalarType::String);
        assert_eq!(
            expr.field("typ"),
            Some(FieldRef::Type(&ScalarType::String))
        );
        assert_eq!(expr.field("input"), Some(FieldRef::Expr(&ScalarExpr::int(1))));
        assert_eq!(expr.field("missing"), None);
    }

    #[test]
    fn test_children_in_schema_order() {
        let case = ScalarExpr::case(
            ScalarExpr::variable(ColumnId(1)),
            vec![ScalarExpr::int(1), ScalarExpr::string("one"), ScalarExpr::string("other")],
        )
        .unwrap();
        let children = case.children();
        assert_eq!(children.len(), 4);
        assert_eq!(children[0], &ScalarExpr::variable(ColumnId(1)));
        assert_eq!(children[3], &ScalarExpr::string("other"));
    }

    #[test]
    fn test_is_leaf() {
        assert!(ScalarExpr::int(1).is_leaf());
        assert!(ScalarExpr::count_rows().is_leaf());
        assert!(ScalarExpr::variable(ColumnId(3)).is_leaf());
        assert!(!ScalarExpr::not(ScalarExpr::true_expr()).is_leaf());
        assert!(!ScalarExpr::and(vec![]).is_leaf());
        assert!(!ScalarExpr::coalesce(vec![]).is_leaf());
        assert_eq!(ScalarExpr::and(vec![]).child_count(), 0);
    }

    #[test]
    fn test_data_type() {
        let f = FunctionDef::new("length", ScalarType::Int);
        let call = ScalarExpr::function(vec![ScalarExpr::string("abc")], f);
        assert_eq!(call.data_type(), ScalarType::Int);
        assert_eq!(
            ScalarExpr::plus(ScalarExpr::null(ScalarType::Unknown), ScalarExpr::int(1)).data_type(),
            ScalarType::Int
        );
        assert_eq!(
            ScalarExpr::lt(ScalarExpr::int(1), ScalarExpr::int(2)).data_type(),
            ScalarType::Bool
        );
        assert_eq!(
            ScalarExpr::aggregate(OperatorKind::Count, ScalarExpr::variable(ColumnId(1)))
                .unwrap()
                .data_type(),
            ScalarType::Int
        );
        assert_eq!(ScalarExpr::variable(ColumnId(1)).data_type(), ScalarType::Unknown);
    }

    #[test]
    fn test_display() {
        let expr = ScalarExpr::plus(ScalarExpr::variable(ColumnId(1)), ScalarExpr::int(1));
        assert_eq!(expr.to_string(), "(Plus (Variable @1) (Const 1))");

        let expr = ScalarExpr::and(vec![ScalarExpr::true_expr(), ScalarExpr::false_expr()]);
        assert_eq!(expr.to_string(), "(And [(True) (False)])");
    }
}
