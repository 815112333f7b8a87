//! Interning of structurally-equal subtrees.
//!
//! Trees are otherwise exclusively owned. The memo is the one place where a
//! subtree is shared: every structurally-equal tree interned here resolves to
//! the same `Arc`, and shared trees are read-only. Rewrites that need to
//! change a shared tree build a new one with `with_replaced_children`.

use crate::expression::operator::ScalarExpr;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::trace;
use std::sync::Arc;

#[derive(Default)]
pub struct ExprMemo {
    entries: DashMap<Arc<ScalarExpr>, ()>,
}

impl ExprMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared instance for `expr`, inserting it on first sight.
    pub fn intern(&self, expr: ScalarExpr) -> Arc<ScalarExpr> {
        if let Some(shared) = self.get(&expr) {
            return shared;
        }
        match self.entries.entry(Arc::new(expr)) {
            Entry::Occupied(entry) => Arc::clone(entry.key()),
            Entry::Vacant(entry) => {
                let shared = Arc::clone(entry.key());
                trace!("interned {}", shared);
                entry.insert(());
                shared
            }
        }
    }

    pub fn get(&self, expr: &ScalarExpr) -> Option<Arc<ScalarExpr>> {
        self.entries.get(expr).map(|entry| Arc::clone(entry.key()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::value::ColumnId;
    use std::thread;

    fn pred(id: u32) -> ScalarExpr {
        ScalarExpr::gt(ScalarExpr::variable(ColumnId(id)), ScalarExpr::int(10))
    }

    #[test]
    fn test_intern_shares_equal_trees() {
        let memo = ExprMemo::new();
        let a = memo.intern(pred(1));
        let b = memo.intern(pred(1));
        let c = memo.intern(pred(2));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(memo.len(), 2);
        assert!(memo.get(&pred(3)).is_none());
    }

    #[test]
    fn test_concurrent_intern() {
        let memo = Arc::new(ExprMemo::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let memo = Arc::clone(&memo);
                thread::spawn(move || (0..16).map(|i| memo.intern(pred(i))).collect::<Vec<_>>())
            })
            .collect();
        let results: Vec<Vec<Arc<ScalarExpr>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(memo.len(), 16);
        for other in &results[1..] {
            for (a, b) in results[0].iter().zip(other) {
                assert!(Arc::ptr_eq(a, b));
            }
        }
    }
}
