//! Side context of one rewrite pass.
//!
//! A `Null` created with the unknown type may later be refined to a concrete
//! type. Once refined, a NULL must not become unknown again for the rest of
//! the pass. The session tracks this per path, together with the type a
//! folded NULL is expected to take.

use crate::expression::error::{IrError, IrResult};
use crate::expression::operator::{OperatorKind, ScalarExpr};
use crate::expression::validate::validate;
use crate::expression::value::ScalarType;
use crate::rewrite::visit::{node_at, replace_at, visit_with_path, ExprPath};
use log::{debug, trace};
use std::collections::HashMap;

pub struct RewriteSession {
    validate_steps: bool,
    steps: usize,
    /// Type a `Null(Unknown)` at the path is expected to take, recorded when
    /// a typed node was folded away.
    expected: HashMap<ExprPath, ScalarType>,
    /// Paths whose NULL has been refined to a concrete type.
    refined: HashMap<ExprPath, ScalarType>,
}

impl Default for RewriteSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteSession {
    /// Session that validates every step in debug builds.
    pub fn new() -> Self {
        Self {
            validate_steps: cfg!(debug_assertions),
            steps: 0,
            expected: HashMap::new(),
            refined: HashMap::new(),
        }
    }

    pub fn with_step_validation(mut self, enabled: bool) -> Self {
        self.validate_steps = enabled;
        self
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Type the NULL at `path` was refined to during this session.
    pub fn refined_type(&self, path: &ExprPath) -> Option<&ScalarType> {
        self.refined.get(path)
    }

    /// Apply one rewrite step: replace the node at `path` in `root`.
    ///
    /// The session is left unchanged when the step is rejected.
    pub fn replace(
        &mut self,
        root: &ScalarExpr,
        path: &ExprPath,
        replacement: ScalarExpr,
    ) -> IrResult<ScalarExpr> {
        let current = node_at(root, path).ok_or_else(|| {
            IrError::invalid(root.kind(), format!("no node at path {}", path))
        })?;

        if let (ScalarExpr::Null(old), ScalarExpr::Null(new)) = (current, &replacement) {
            if !old.typ.is_unknown() && new.typ.is_unknown() {
                return Err(demotion_error(path, &old.typ));
            }
        }

        // Refined NULLs inside the replaced subtree keep their record while
        // the replacement still holds a typed NULL at the same position.
        let mut refined = HashMap::with_capacity(self.refined.len());
        for (p, typ) in &self.refined {
            let relative = match p.strip_prefix(path) {
                Some(relative) => relative,
                None => {
                    refined.insert(p.clone(), typ.clone());
                    continue;
                }
            };
            if let Some(ScalarExpr::Null(f)) = node_at(&replacement, &relative) {
                if f.typ.is_unknown() {
                    return Err(demotion_error(p, typ));
                }
                refined.insert(p.clone(), f.typ.clone());
            }
        }

        let mut expected: HashMap<ExprPath, ScalarType> = self
            .expected
            .iter()
            .filter(|(p, _)| !p.starts_with(path))
            .map(|(p, typ)| (p.clone(), typ.clone()))
            .collect();
        match &replacement {
            ScalarExpr::Null(f) if f.typ.is_unknown() => {
                if let Some(typ) = current.data_type().known() {
                    expected.insert(path.clone(), typ);
                }
            }
            ScalarExpr::Null(f) => {
                refined.insert(path.clone(), f.typ.clone());
            }
            _ => {}
        }

        let new_root = replace_at(root, path, replacement)?;
        if self.validate_steps {
            validate(&new_root)?;
            check_refined(&refined, &new_root)?;
        }

        self.refined = refined;
        self.expected = expected;
        self.steps += 1;
        trace!("rewrite step {} at {}: {}", self.steps, path, new_root);
        Ok(new_root)
    }

    /// Fold the node at `path` to an untyped NULL.
    pub fn fold_to_null(&mut self, root: &ScalarExpr, path: &ExprPath) -> IrResult<ScalarExpr> {
        self.replace(root, path, ScalarExpr::null(ScalarType::Unknown))
    }

    /// Give every untyped NULL a concrete type where one can be inferred:
    /// first from the type recorded when it was folded, then from the other
    /// operand of a binary or comparison parent.
    pub fn refine_nulls(&mut self, root: &ScalarExpr) -> IrResult<ScalarExpr> {
        let mut refinements = Vec::new();
        visit_with_path(root, &mut |path, node| {
            if let ScalarExpr::Null(f) = node {
                if f.typ.is_unknown() {
                    if let Some(typ) = self.inferred_type(root, path) {
                        refinements.push((path.clone(), typ));
                    }
                }
            }
        });

        let mut current = root.clone();
        for (path, typ) in refinements {
            debug!("refining NULL at {} to {}", path, typ);
            current = self.replace(&current, &path, ScalarExpr::null(typ))?;
        }
        Ok(current)
    }

    fn inferred_type(&self, root: &ScalarExpr, path: &ExprPath) -> Option<ScalarType> {
        if let Some(typ) = self.expected.get(path) {
            return Some(typ.clone());
        }
        let parent = node_at(root, &path.parent()?)?;
        if !parent.is_binary() && !parent.is_comparison() {
            return None;
        }
        let (left, right) = match parent.children().as_slice() {
            [left, right] => (*left, *right),
            _ => return None,
        };
        let sibling = if path.last()? == 0 { right } else { left };
        sibling.data_type().known()
    }

    /// Structural validation plus NULL type monotonicity for `root`.
    pub fn validate(&self, root: &ScalarExpr) -> IrResult<()> {
        validate(root)?;
        check_refined(&self.refined, root)
    }
}

fn demotion_error(path: &ExprPath, typ: &ScalarType) -> IrError {
    IrError::invalid(
        OperatorKind::Null,
        format!("NULL at {} was refined to {} and cannot become unknown", path, typ),
    )
}

fn check_refined(refined: &HashMap<ExprPath, ScalarType>, root: &ScalarExpr) -> IrResult<()> {
    for (path, typ) in refined {
        if let Some(ScalarExpr::Null(f)) = node_at(root, path) {
            if f.typ.is_unknown() {
                return Err(demotion_error(path, typ));
            }
        }
    }
    Ok(())
}
