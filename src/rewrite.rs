//! Traversal and rewrite support for scalar expression trees.
//!
//! Rewrites never mutate a tree in place. Every step builds a new node from
//! an existing one with `with_replaced_children`, which keeps the kind and
//! the leaf fields, rebinds the child slots and re-validates the result.

pub mod memo;
pub mod normalize;
pub mod session;
pub mod visit;

pub use memo::ExprMemo;
pub use normalize::{commute, flatten_conjunctions, negate};
pub use session::RewriteSession;
pub use visit::{
    node_at, replace_at, transform_up, try_visit, visit, visit_with_path, with_replaced_children,
    ExprPath,
};
