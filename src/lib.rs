//! Scalar expression IR for a cost-based SQL optimizer.

pub mod codec;
pub mod definition;
pub mod expression;
pub mod rewrite;
