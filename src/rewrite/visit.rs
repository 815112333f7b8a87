use crate::expression::error::{IrError, IrResult};
use crate::expression::field::ChildFeed;
use crate::expression::operator::ScalarExpr;
use crate::expression::validate::validate_node;
use std::fmt;

/// Position of a node inside a tree: the child index taken at each level,
/// counting children in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprPath(Vec<usize>);

impl ExprPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut path = self.0.clone();
        path.push(idx);
        Self(path)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// Index of this node within its parent.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// True when `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &ExprPath) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Path of `self` relative to `prefix`, if it lies at or under it.
    pub fn strip_prefix(&self, prefix: &ExprPath) -> Option<ExprPath> {
        self.0.strip_prefix(prefix.0.as_slice()).map(|rest| Self(rest.to_vec()))
    }
}

impl From<Vec<usize>> for ExprPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for ExprPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for idx in &self.0 {
            write!(f, "/{}", idx)?;
        }
        Ok(())
    }
}

/// Depth-first pre-order walk.
pub fn visit<'a>(expr: &'a ScalarExpr, f: &mut impl FnMut(&'a ScalarExpr)) {
    f(expr);
    for child in expr.children() {
        visit(child, f);
    }
}

/// Pre-order walk that stops at the first error.
pub fn try_visit<'a, E>(
    expr: &'a ScalarExpr,
    f: &mut impl FnMut(&'a ScalarExpr) -> Result<(), E>,
) -> Result<(), E> {
    f(expr)?;
    for child in expr.children() {
        try_visit(child, f)?;
    }
    Ok(())
}

/// Pre-order walk that also reports each node's path.
pub fn visit_with_path<'a>(expr: &'a ScalarExpr, f: &mut impl FnMut(&ExprPath, &'a ScalarExpr)) {
    fn walk<'a>(
        expr: &'a ScalarExpr,
        path: &mut Vec<usize>,
        f: &mut impl FnMut(&ExprPath, &'a ScalarExpr),
    ) {
        f(&ExprPath(path.clone()), expr);
        for (i, child) in expr.children().into_iter().enumerate() {
            path.push(i);
            walk(child, path, f);
            path.pop();
        }
    }
    walk(expr, &mut Vec::new(), f);
}

pub fn node_at<'a>(root: &'a ScalarExpr, path: &ExprPath) -> Option<&'a ScalarExpr> {
    let mut node = root;
    for &idx in path.indices() {
        node = node.children().into_iter().nth(idx)?;
    }
    Some(node)
}

/// New node of the same kind as `expr`, with every child slot rebound from
/// `children` in schema order. `expr` itself is left untouched.
pub fn with_replaced_children(
    expr: &ScalarExpr,
    children: Vec<ScalarExpr>,
) -> IrResult<ScalarExpr> {
    let mut feed = ChildFeed::new(expr.kind(), expr.child_count(), children)?;
    let rebuilt = expr.rebind_children(&mut feed)?;
    validate_node(&rebuilt)?;
    Ok(rebuilt)
}

/// Copy of `root` with the node at `path` swapped for `replacement`. Every
/// ancestor on the path is rebuilt through `with_replaced_children`.
pub fn replace_at(
    root: &ScalarExpr,
    path: &ExprPath,
    replacement: ScalarExpr,
) -> IrResult<ScalarExpr> {
    replace_from(root, path.indices(), replacement)
}

fn replace_from(
    node: &ScalarExpr,
    indices: &[usize],
    replacement: ScalarExpr,
) -> IrResult<ScalarExpr> {
    let (&idx, rest) = match indices.split_first() {
        Some(split) => split,
        None => return Ok(replacement),
    };
    let mut children: Vec<ScalarExpr> = node.children().into_iter().cloned().collect();
    let count = children.len();
    let slot = children.get_mut(idx).ok_or_else(|| {
        IrError::invalid(
            node.kind(),
            format!("no child at index {} ({} children)", idx, count),
        )
    })?;
    *slot = replace_from(slot, rest, replacement)?;
    with_replaced_children(node, children)
}

/// Bottom-up rewrite: children are transformed first, then `f` sees the
/// rebuilt parent.
pub fn transform_up(
    expr: &ScalarExpr,
    f: &mut impl FnMut(ScalarExpr) -> IrResult<ScalarExpr>,
) -> IrResult<ScalarExpr> {
    if expr.child_count() == 0 {
        return f(expr.clone());
    }
    let mut children = Vec::with_capacity(expr.child_count());
    for child in expr.children() {
        children.push(transform_up(child, f)?);
    }
    f(with_replaced_children(expr, children)?)
}
