//! Opaque leaf values carried by expression fields.
//!
//! These are produced by the catalog and type system before a tree reaches
//! the IR. The IR trusts them and only inspects what the structural checks
//! need (column-list lengths, composite type arity, result types).

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column identifier assigned by the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Ordered list of output columns paired with a projection or aggregation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColList(pub Vec<ColumnId>);

impl ColList {
    pub fn new(cols: impl IntoIterator<Item = ColumnId>) -> Self {
        Self(cols.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnId> + '_ {
        self.0.iter()
    }

    /// First column id that occurs more than once, if any.
    pub fn find_duplicate(&self) -> Option<ColumnId> {
        let mut seen = std::collections::HashSet::with_capacity(self.0.len());
        self.0.iter().copied().find(|col| !seen.insert(*col))
    }
}

impl From<Vec<u32>> for ColList {
    fn from(ids: Vec<u32>) -> Self {
        Self(ids.into_iter().map(ColumnId).collect())
    }
}

impl fmt::Display for ColList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, col) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", col)?;
        }
        write!(f, ")")
    }
}

/// Result type of a scalar expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Not yet known; only legal on `Null` before refinement and on
    /// expressions whose type lives in catalog metadata.
    Unknown,
    /// SQL boolean, three-valued with NULL.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// Double precision float.
    Float,
    /// Arbitrary precision numeric.
    Decimal,
    /// Text.
    String,
    /// Binary string.
    Bytes,
    /// Calendar date.
    Date,
    /// Timestamp without time zone.
    Timestamp,
    /// Time interval.
    Interval,
    /// JSON document.
    Json,
    /// Record type, one entry per field.
    Tuple(Vec<ScalarType>),
    /// Array of the element type. Length is not part of the type.
    Array(Box<ScalarType>),
    /// Matches any type, e.g. as an array element type.
    Any,
}

impl ScalarType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, ScalarType::Unknown)
    }

    /// Known type, or `None` while it is still unknown.
    pub fn known(self) -> Option<ScalarType> {
        if self.is_unknown() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Unknown => write!(f, "unknown"),
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int => write!(f, "int"),
            ScalarType::Float => write!(f, "float"),
            ScalarType::Decimal => write!(f, "decimal"),
            ScalarType::String => write!(f, "string"),
            ScalarType::Bytes => write!(f, "bytes"),
            ScalarType::Date => write!(f, "date"),
            ScalarType::Timestamp => write!(f, "timestamp"),
            ScalarType::Interval => write!(f, "interval"),
            ScalarType::Json => write!(f, "jsonb"),
            ScalarType::Tuple(fields) => {
                write!(f, "tuple{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
            ScalarType::Array(elem) => write!(f, "{}[]", elem),
            ScalarType::Any => write!(f, "anyelement"),
        }
    }
}

/// Literal datum of a `Const` operator. SQL NULL is the `Null` operator, not
/// a datum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datum {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Wrapped in `OrderedFloat` so datums take part in structural Eq/Hash.
    Float(OrderedFloat<f64>),
    /// Decimal kept in its canonical text form.
    Decimal(String),
    /// Text literal.
    String(String),
    /// Binary string literal.
    Bytes(Vec<u8>),
    /// Days since the Unix epoch.
    Date(i32),
    /// JSON literal in text form.
    Json(String),
}

impl Datum {
    pub fn float(value: f64) -> Self {
        Datum::Float(OrderedFloat(value))
    }

    /// Get the type of this datum
    pub fn data_type(&self) -> ScalarType {
        match self {
            Datum::Bool(_) => ScalarType::Bool,
            Datum::Int(_) => ScalarType::Int,
            Datum::Float(_) => ScalarType::Float,
            Datum::Decimal(_) => ScalarType::Decimal,
            Datum::String(_) => ScalarType::String,
            Datum::Bytes(_) => ScalarType::Bytes,
            Datum::Date(_) => ScalarType::Date,
            Datum::Json(_) => ScalarType::Json,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(i) => write!(f, "{}", i),
            Datum::Float(v) => write!(f, "{}", v),
            Datum::Decimal(d) => write!(f, "{}", d),
            Datum::String(s) => write!(f, "'{}'", s),
            Datum::Bytes(b) => write!(f, "b'{}'", String::from_utf8_lossy(b)),
            Datum::Date(d) => write!(f, "date({})", d),
            Datum::Json(j) => write!(f, "'{}'::jsonb", j),
        }
    }
}

/// Resolved function overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: ScalarType,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, return_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            return_type,
        }
    }
}

/// Opaque handle to the relational input of a subquery. The relational
/// operators themselves live outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: u32,
    /// Type of the single output column, when the subquery produces one.
    pub typ: ScalarType,
}

impl RelationRef {
    pub fn new(id: u32, typ: ScalarType) -> Self {
        Self { id, typ }
    }
}

impl fmt::Display for RelationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rel#{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_types() {
        assert_eq!(Datum::Bool(true).data_type(), ScalarType::Bool);
        assert_eq!(Datum::Int(42).data_type(), ScalarType::Int);
        assert_eq!(Datum::float(1.5).data_type(), ScalarType::Float);
        assert_eq!(
            Datum::String("hello".to_string()).data_type(),
            ScalarType::String
        );
        assert_eq!(Datum::Date(19000).data_type(), ScalarType::Date);
    }

    #[test]
    fn test_float_datums_hash_structurally() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Datum::float(0.5));
        assert!(set.contains(&Datum::float(0.5)));
        assert!(!set.contains(&Datum::float(0.25)));
    }

    #[test]
    fn test_col_list_duplicates() {
        assert_eq!(ColList::from(vec![1, 2, 3]).find_duplicate(), None);
        assert_eq!(
            ColList::from(vec![1, 2, 1]).find_duplicate(),
            Some(ColumnId(1))
        );
        assert_eq!(ColList::default().find_duplicate(), None);
    }

    #[test]
    fn test_type_display() {
        assert_eq!(ScalarType::Int.to_string(), "int");
        assert_eq!(
            ScalarType::Tuple(vec![ScalarType::Int, ScalarType::String]).to_string(),
            "tuple{int, string}"
        );
        assert_eq!(
            ScalarType::Array(Box::new(ScalarType::Bool)).to_string(),
            "bool[]"
        );
        assert_eq!(ColList::from(vec![1, 2]).to_string(), "(@1,@2)");
    }

    #[test]
    fn test_known() {
        assert_eq!(ScalarType::Unknown.known(), None);
        assert_eq!(ScalarType::Int.known(), Some(ScalarType::Int));
    }
}
