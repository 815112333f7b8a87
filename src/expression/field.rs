//! Field schemas and the typed field structures held by each operator.
//!
//! Every operator variant owns one of the structures below. Operators with
//! the same layout share a structure, but each structure is strongly typed:
//! child slots are `Box<ScalarExpr>` or `Vec<ScalarExpr>` and leaf slots hold
//! their own value types. `FieldValue` and `FieldRef` only exist at the
//! generic construction and introspection boundary.

use crate::expression::error::{IrError, IrResult};
use crate::expression::operator::{OperatorKind, ScalarExpr};
use crate::expression::value::{ColList, ColumnId, Datum, FunctionDef, RelationRef, ScalarType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic type of a field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Single child expression.
    Expr,
    /// Ordered, possibly empty, sequence of child expressions.
    ExprList,
    ColumnId,
    Datum,
    Type,
    ColList,
    FuncDef,
    /// Comparison operator descriptor.
    Operator,
    /// Opaque relational input.
    Relation,
    Ordinal,
}

impl FieldType {
    pub const ALL: [FieldType; 10] = [
        FieldType::Expr,
        FieldType::ExprList,
        FieldType::ColumnId,
        FieldType::Datum,
        FieldType::Type,
        FieldType::ColList,
        FieldType::FuncDef,
        FieldType::Operator,
        FieldType::Relation,
        FieldType::Ordinal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Expr => "Expr",
            FieldType::ExprList => "ExprList",
            FieldType::ColumnId => "ColumnId",
            FieldType::Datum => "Datum",
            FieldType::Type => "Type",
            FieldType::ColList => "ColList",
            FieldType::FuncDef => "FuncDef",
            FieldType::Operator => "Operator",
            FieldType::Relation => "Relation",
            FieldType::Ordinal => "Ordinal",
        }
    }

    /// True for slots that hold child expressions.
    pub fn is_child(&self) -> bool {
        matches!(self, FieldType::Expr | FieldType::ExprList)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|typ| typ.as_str() == s)
            .ok_or_else(|| format!("unknown field type: {}", s))
    }
}

/// One entry of an operator's ordered field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: &'static str,
    pub typ: FieldType,
}

const fn field(name: &'static str, typ: FieldType) -> FieldDef {
    FieldDef { name, typ }
}

/// Owned field value, used to build a node generically.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Expr(ScalarExpr),
    ExprList(Vec<ScalarExpr>),
    ColumnId(ColumnId),
    Datum(Datum),
    Type(ScalarType),
    ColList(ColList),
    FuncDef(FunctionDef),
    Operator(OperatorKind),
    Relation(RelationRef),
    Ordinal(u32),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Expr(_) => FieldType::Expr,
            FieldValue::ExprList(_) => FieldType::ExprList,
            FieldValue::ColumnId(_) => FieldType::ColumnId,
            FieldValue::Datum(_) => FieldType::Datum,
            FieldValue::Type(_) => FieldType::Type,
            FieldValue::ColList(_) => FieldType::ColList,
            FieldValue::FuncDef(_) => FieldType::FuncDef,
            FieldValue::Operator(_) => FieldType::Operator,
            FieldValue::Relation(_) => FieldType::Relation,
            FieldValue::Ordinal(_) => FieldType::Ordinal,
        }
    }
}

/// Borrowed view of a node's field, returned by field introspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Expr(&'a ScalarExpr),
    ExprList(&'a [ScalarExpr]),
    ColumnId(ColumnId),
    Datum(&'a Datum),
    Type(&'a ScalarType),
    ColList(&'a ColList),
    FuncDef(&'a FunctionDef),
    Operator(OperatorKind),
    Relation(&'a RelationRef),
    Ordinal(u32),
}

impl<'a> FieldRef<'a> {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldRef::Expr(_) => FieldType::Expr,
            FieldRef::ExprList(_) => FieldType::ExprList,
            FieldRef::ColumnId(_) => FieldType::ColumnId,
            FieldRef::Datum(_) => FieldType::Datum,
            FieldRef::Type(_) => FieldType::Type,
            FieldRef::ColList(_) => FieldType::ColList,
            FieldRef::FuncDef(_) => FieldType::FuncDef,
            FieldRef::Operator(_) => FieldType::Operator,
            FieldRef::Relation(_) => FieldType::Relation,
            FieldRef::Ordinal(_) => FieldType::Ordinal,
        }
    }

    pub fn to_value(&self) -> FieldValue {
        match *self {
            FieldRef::Expr(e) => FieldValue::Expr(e.clone()),
            FieldRef::ExprList(list) => FieldValue::ExprList(list.to_vec()),
            FieldRef::ColumnId(col) => FieldValue::ColumnId(col),
            FieldRef::Datum(d) => FieldValue::Datum(d.clone()),
            FieldRef::Type(t) => FieldValue::Type(t.clone()),
            FieldRef::ColList(cols) => FieldValue::ColList(cols.clone()),
            FieldRef::FuncDef(def) => FieldValue::FuncDef(def.clone()),
            FieldRef::Operator(op) => FieldValue::Operator(op),
            FieldRef::Relation(rel) => FieldValue::Relation(rel.clone()),
            FieldRef::Ordinal(idx) => FieldValue::Ordinal(idx),
        }
    }
}

/// Consumes generic field values in schema order, checking each one.
pub struct FieldReader {
    kind: OperatorKind,
    schema: &'static [FieldDef],
    values: std::vec::IntoIter<FieldValue>,
    pos: usize,
}

impl FieldReader {
    pub fn new(
        kind: OperatorKind,
        schema: &'static [FieldDef],
        values: Vec<FieldValue>,
    ) -> IrResult<Self> {
        if values.len() != schema.len() {
            return Err(IrError::FieldArityMismatch {
                kind,
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            kind,
            schema,
            values: values.into_iter(),
            pos: 0,
        })
    }

    fn next(&mut self) -> IrResult<(FieldDef, FieldValue)> {
        let def = self.schema.get(self.pos).copied();
        let value = self.values.next();
        self.pos += 1;
        match (def, value) {
            (Some(def), Some(value)) => Ok((def, value)),
            _ => Err(IrError::FieldArityMismatch {
                kind: self.kind,
                expected: self.schema.len(),
                actual: self.pos - 1,
            }),
        }
    }

    fn mismatch(&self, def: FieldDef, value: &FieldValue) -> IrError {
        IrError::FieldTypeMismatch {
            kind: self.kind,
            field: def.name,
            expected: def.typ,
            actual: value.field_type(),
        }
    }
}

macro_rules! reader_method {
    ($method:ident, $variant:ident, $out:ty) => {
        pub fn $method(&mut self) -> IrResult<$out> {
            let (def, value) = self.next()?;
            match value {
                FieldValue::$variant(v) if def.typ == FieldType::$variant => Ok(v),
                other => Err(self.mismatch(def, &other)),
            }
        }
    };
}

impl FieldReader {
    reader_method!(expr_list, ExprList, Vec<ScalarExpr>);
    reader_method!(column, ColumnId, ColumnId);
    reader_method!(datum, Datum, Datum);
    reader_method!(typ, Type, ScalarType);
    reader_method!(col_list, ColList, ColList);
    reader_method!(func_def, FuncDef, FunctionDef);
    reader_method!(operator, Operator, OperatorKind);
    reader_method!(relation, Relation, RelationRef);
    reader_method!(ordinal, Ordinal, u32);

    pub fn expr(&mut self) -> IrResult<Box<ScalarExpr>> {
        let (def, value) = self.next()?;
        match value {
            FieldValue::Expr(e) if def.typ == FieldType::Expr => Ok(Box::new(e)),
            other => Err(self.mismatch(def, &other)),
        }
    }
}

/// Replacement children handed out in schema order.
pub struct ChildFeed {
    kind: OperatorKind,
    expected: usize,
    children: std::vec::IntoIter<ScalarExpr>,
}

impl ChildFeed {
    pub fn new(kind: OperatorKind, expected: usize, children: Vec<ScalarExpr>) -> IrResult<Self> {
        if children.len() != expected {
            return Err(IrError::ArityMismatch {
                kind,
                expected,
                actual: children.len(),
            });
        }
        Ok(Self {
            kind,
            expected,
            children: children.into_iter(),
        })
    }

    fn exhausted(&self) -> IrError {
        IrError::ArityMismatch {
            kind: self.kind,
            expected: self.expected,
            actual: self.expected - self.children.len(),
        }
    }

    pub fn next(&mut self) -> IrResult<Box<ScalarExpr>> {
        match self.children.next() {
            Some(child) => Ok(Box::new(child)),
            None => Err(self.exhausted()),
        }
    }

    pub fn take(&mut self, n: usize) -> IrResult<Vec<ScalarExpr>> {
        if self.children.len() < n {
            return Err(self.exhausted());
        }
        Ok(self.children.by_ref().take(n).collect())
    }
}

/// The contract every field structure fulfils. This is what the definition
/// generator emits per operator: a schema, a constructor from generic values,
/// and accessors that honor schema order.
pub trait OperatorFields: Sized {
    const SCHEMA: &'static [FieldDef];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self>;

    fn fields(&self) -> Vec<FieldRef<'_>>;

    /// Child expressions in schema order.
    fn children(&self) -> Vec<&ScalarExpr>;

    fn child_count(&self) -> usize;

    /// Copy of `self` with every child slot rebound from `feed`.
    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self>;
}

/// No fields: `True`, `False`, `CountRows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoFields;

impl OperatorFields for NoFields {
    const SCHEMA: &'static [FieldDef] = &[];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(NoFields)
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        Vec::new()
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        Vec::new()
    }

    fn child_count(&self) -> usize {
        0
    }

    fn rebind(&self, _feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(NoFields)
    }
}

/// Declares a field structure whose fields are all leaves.
macro_rules! leaf_fields {
    ($(#[$doc:meta])* $name:ident { $($field:ident: $ty:ty => $ftype:ident, $read:ident, $view:expr;)+ }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl OperatorFields for $name {
            const SCHEMA: &'static [FieldDef] = &[$(field(stringify!($field), FieldType::$ftype),)+];

            fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
                let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
                Ok(Self {
                    $($field: reader.$read()?,)+
                })
            }

            fn fields(&self) -> Vec<FieldRef<'_>> {
                let mut out = Vec::new();
                $(out.push(($view)(&self.$field));)+
                out
            }

            fn children(&self) -> Vec<&ScalarExpr> {
                Vec::new()
            }

            fn child_count(&self) -> usize {
                0
            }

            fn rebind(&self, _feed: &mut ChildFeed) -> IrResult<Self> {
                Ok(self.clone())
            }
        }
    };
}

leaf_fields!(
    /// `Variable`: reference to a column of the input.
    VariableFields {
        col: ColumnId => ColumnId, column, |c: &ColumnId| FieldRef::ColumnId(*c);
    }
);

leaf_fields!(
    /// `Const`: typed literal.
    ConstFields {
        value: Datum => Datum, datum, FieldRef::Datum;
    }
);

leaf_fields!(
    /// `Null`: SQL NULL of a (possibly still unknown) type.
    NullFields {
        typ: ScalarType => Type, typ, FieldRef::Type;
    }
);

leaf_fields!(
    /// `Placeholder`: prepared-statement parameter `$idx`.
    PlaceholderFields {
        idx: u32 => Ordinal, ordinal, |i: &u32| FieldRef::Ordinal(*i);
        typ: ScalarType => Type, typ, FieldRef::Type;
    }
);

leaf_fields!(
    /// `Subquery` and `Exists`: a relational input evaluated as a scalar.
    SubqueryFields {
        input: RelationRef => Relation, relation, FieldRef::Relation;
    }
);

/// `And`, `Or`, `Filters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionsFields {
    pub conditions: Vec<ScalarExpr>,
}

impl OperatorFields for ConditionsFields {
    const SCHEMA: &'static [FieldDef] = &[field("conditions", FieldType::ExprList)];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            conditions: reader.expr_list()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::ExprList(&self.conditions)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        self.conditions.iter().collect()
    }

    fn child_count(&self) -> usize {
        self.conditions.len()
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            conditions: feed.take(self.conditions.len())?,
        })
    }
}

/// `Coalesce`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgsFields {
    pub args: Vec<ScalarExpr>,
}

impl OperatorFields for ArgsFields {
    const SCHEMA: &'static [FieldDef] = &[field("args", FieldType::ExprList)];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            args: reader.expr_list()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::ExprList(&self.args)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        self.args.iter().collect()
    }

    fn child_count(&self) -> usize {
        self.args.len()
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            args: feed.take(self.args.len())?,
        })
    }
}

/// `Tuple` and `Array`: element list plus the composite type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedListFields {
    pub elems: Vec<ScalarExpr>,
    pub typ: ScalarType,
}

impl OperatorFields for TypedListFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("elems", FieldType::ExprList),
        field("typ", FieldType::Type),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            elems: reader.expr_list()?,
            typ: reader.typ()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::ExprList(&self.elems), FieldRef::Type(&self.typ)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        self.elems.iter().collect()
    }

    fn child_count(&self) -> usize {
        self.elems.len()
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            elems: feed.take(self.elems.len())?,
            typ: self.typ.clone(),
        })
    }
}

/// `Projections` and `Aggregations`: expressions paired with output columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColListFields {
    pub elems: Vec<ScalarExpr>,
    pub cols: ColList,
}

impl OperatorFields for ColListFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("elems", FieldType::ExprList),
        field("cols", FieldType::ColList),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            elems: reader.expr_list()?,
            cols: reader.col_list()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::ExprList(&self.elems), FieldRef::ColList(&self.cols)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        self.elems.iter().collect()
    }

    fn child_count(&self) -> usize {
        self.elems.len()
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            elems: feed.take(self.elems.len())?,
            cols: self.cols.clone(),
        })
    }
}

/// Single child: `Not`, unary arithmetic, aggregates, `AggDistinct`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFields {
    pub input: Box<ScalarExpr>,
}

impl OperatorFields for InputFields {
    const SCHEMA: &'static [FieldDef] = &[field("input", FieldType::Expr)];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            input: reader.expr()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::Expr(&self.input)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        vec![&*self.input]
    }

    fn child_count(&self) -> usize {
        1
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self { input: feed.next()? })
    }
}

/// Two operands: comparisons and binary arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryFields {
    pub left: Box<ScalarExpr>,
    pub right: Box<ScalarExpr>,
}

impl OperatorFields for BinaryFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("left", FieldType::Expr),
        field("right", FieldType::Expr),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            left: reader.expr()?,
            right: reader.expr()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::Expr(&self.left), FieldRef::Expr(&self.right)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        vec![&*self.left, &*self.right]
    }

    fn child_count(&self) -> usize {
        2
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            left: feed.next()?,
            right: feed.next()?,
        })
    }
}

/// `AnyScalar`: `left cmp ANY right` where `right` is a tuple or array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnyScalarFields {
    pub left: Box<ScalarExpr>,
    pub right: Box<ScalarExpr>,
    pub cmp: OperatorKind,
}

impl OperatorFields for AnyScalarFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("left", FieldType::Expr),
        field("right", FieldType::Expr),
        field("cmp", FieldType::Operator),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            left: reader.expr()?,
            right: reader.expr()?,
            cmp: reader.operator()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![
            FieldRef::Expr(&self.left),
            FieldRef::Expr(&self.right),
            FieldRef::Operator(self.cmp),
        ]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        vec![&*self.left, &*self.right]
    }

    fn child_count(&self) -> usize {
        2
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            left: feed.next()?,
            right: feed.next()?,
            cmp: self.cmp,
        })
    }
}

/// `Any`: `scalar cmp ANY (subquery)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnyFields {
    pub input: RelationRef,
    pub scalar: Box<ScalarExpr>,
    pub cmp: OperatorKind,
}

impl OperatorFields for AnyFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("input", FieldType::Relation),
        field("scalar", FieldType::Expr),
        field("cmp", FieldType::Operator),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            input: reader.relation()?,
            scalar: reader.expr()?,
            cmp: reader.operator()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![
            FieldRef::Relation(&self.input),
            FieldRef::Expr(&self.scalar),
            FieldRef::Operator(self.cmp),
        ]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        vec![&*self.scalar]
    }

    fn child_count(&self) -> usize {
        1
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            input: self.input.clone(),
            scalar: feed.next()?,
            cmp: self.cmp,
        })
    }
}

/// `Cast`: input converted to a target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastFields {
    pub input: Box<ScalarExpr>,
    pub typ: ScalarType,
}

impl OperatorFields for CastFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("input", FieldType::Expr),
        field("typ", FieldType::Type),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            input: reader.expr()?,
            typ: reader.typ()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::Expr(&self.input), FieldRef::Type(&self.typ)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        vec![&*self.input]
    }

    fn child_count(&self) -> usize {
        1
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            input: feed.next()?,
            typ: self.typ.clone(),
        })
    }
}

/// `Case`: operand plus a flat branch list.
///
/// `branches` alternates condition and value; a trailing unpaired entry is
/// the ELSE value. A searched CASE uses `True` as its operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseFields {
    pub input: Box<ScalarExpr>,
    pub branches: Vec<ScalarExpr>,
}

impl CaseFields {
    pub fn has_else(&self) -> bool {
        self.branches.len() % 2 == 1
    }

    /// (condition, value) pairs, excluding the ELSE value.
    pub fn whens(&self) -> impl Iterator<Item = (&ScalarExpr, &ScalarExpr)> + '_ {
        self.branches
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    pub fn else_value(&self) -> Option<&ScalarExpr> {
        if self.has_else() {
            self.branches.last()
        } else {
            None
        }
    }
}

impl OperatorFields for CaseFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("input", FieldType::Expr),
        field("branches", FieldType::ExprList),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            input: reader.expr()?,
            branches: reader.expr_list()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::Expr(&self.input), FieldRef::ExprList(&self.branches)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        std::iter::once(&*self.input)
            .chain(self.branches.iter())
            .collect()
    }

    fn child_count(&self) -> usize {
        1 + self.branches.len()
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            input: feed.next()?,
            branches: feed.take(self.branches.len())?,
        })
    }
}

/// `Function`: call of a resolved overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionFields {
    pub args: Vec<ScalarExpr>,
    pub def: FunctionDef,
}

impl OperatorFields for FunctionFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("args", FieldType::ExprList),
        field("def", FieldType::FuncDef),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            args: reader.expr_list()?,
            def: reader.func_def()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::ExprList(&self.args), FieldRef::FuncDef(&self.def)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        self.args.iter().collect()
    }

    fn child_count(&self) -> usize {
        self.args.len()
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            args: feed.take(self.args.len())?,
            def: self.def.clone(),
        })
    }
}

/// `ColumnAccess`: field `idx` of a tuple-valued input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnAccessFields {
    pub input: Box<ScalarExpr>,
    pub idx: u32,
}

impl OperatorFields for ColumnAccessFields {
    const SCHEMA: &'static [FieldDef] = &[
        field("input", FieldType::Expr),
        field("idx", FieldType::Ordinal),
    ];

    fn from_fields(kind: OperatorKind, values: Vec<FieldValue>) -> IrResult<Self> {
        let mut reader = FieldReader::new(kind, Self::SCHEMA, values)?;
        Ok(Self {
            input: reader.expr()?,
            idx: reader.ordinal()?,
        })
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::Expr(&self.input), FieldRef::Ordinal(self.idx)]
    }

    fn children(&self) -> Vec<&ScalarExpr> {
        vec![&*self.input]
    }

    fn child_count(&self) -> usize {
        1
    }

    fn rebind(&self, feed: &mut ChildFeed) -> IrResult<Self> {
        Ok(Self {
            input: feed.next()?,
            idx: self.idx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_names_round_trip() {
        for typ in FieldType::ALL {
            assert_eq!(typ.as_str().parse::<FieldType>(), Ok(typ));
        }
        assert!("Blob".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_reader_rejects_wrong_count() {
        let err = FieldReader::new(OperatorKind::Eq, BinaryFields::SCHEMA, vec![]).err();
        assert_eq!(
            err,
            Some(IrError::FieldArityMismatch {
                kind: OperatorKind::Eq,
                expected: 2,
                actual: 0,
            })
        );
    }

    #[test]
    fn test_reader_rejects_wrong_type() {
        let values = vec![
            FieldValue::Expr(ScalarExpr::true_expr()),
            FieldValue::Datum(Datum::Int(1)),
        ];
        let err = BinaryFields::from_fields(OperatorKind::Eq, values).unwrap_err();
        assert_eq!(
            err,
            IrError::FieldTypeMismatch {
                kind: OperatorKind::Eq,
                field: "right",
                expected: FieldType::Expr,
                actual: FieldType::Datum,
            }
        );
    }

    #[test]
    fn test_case_branches() {
        let case = CaseFields {
            input: Box::new(ScalarExpr::true_expr()),
            branches: vec![
                ScalarExpr::variable(ColumnId(1)),
                ScalarExpr::int(1),
                ScalarExpr::int(2),
            ],
        };
        assert!(case.has_else());
        assert_eq!(case.whens().count(), 1);
        assert_eq!(case.else_value(), Some(&ScalarExpr::int(2)));
        assert_eq!(case.children().len(), 4);
    }

    #[test]
    fn test_child_feed_arity() {
        let err = ChildFeed::new(OperatorKind::Plus, 2, vec![ScalarExpr::int(1)]).err();
        assert_eq!(
            err,
            Some(IrError::ArityMismatch {
                kind: OperatorKind::Plus,
                expected: 2,
                actual: 1,
            })
        );
    }
}
