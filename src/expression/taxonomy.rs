//! Read-only registry of operator kinds.

use crate::expression::error::{IrError, IrResult};
use crate::expression::field::FieldDef;
use crate::expression::operator::OperatorKind;
use crate::expression::tag::{Tag, TagSet};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Static description of one operator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDef {
    pub kind: OperatorKind,
    pub name: &'static str,
    pub fields: &'static [FieldDef],
    pub tags: TagSet,
}

/// Name-indexed view of the operator table.
pub struct Taxonomy;

static NAME_INDEX: OnceLock<HashMap<&'static str, OperatorKind>> = OnceLock::new();

fn name_index() -> &'static HashMap<&'static str, OperatorKind> {
    NAME_INDEX.get_or_init(|| {
        OperatorKind::ALL
            .iter()
            .map(|kind| (kind.name(), *kind))
            .collect()
    })
}

impl Taxonomy {
    /// Resolve an operator kind by its name.
    pub fn lookup(name: &str) -> IrResult<OperatorKind> {
        name_index()
            .get(name)
            .copied()
            .ok_or_else(|| IrError::UnknownOperator {
                name: name.to_string(),
            })
    }

    /// Every kind, in declaration order.
    pub fn all() -> &'static [OperatorKind] {
        OperatorKind::ALL
    }

    pub fn operator(kind: OperatorKind) -> OperatorDef {
        OperatorDef {
            kind,
            name: kind.name(),
            fields: kind.schema(),
            tags: kind.tags(),
        }
    }

    pub fn kinds_with_tag(tag: Tag) -> impl Iterator<Item = OperatorKind> {
        OperatorKind::ALL
            .iter()
            .copied()
            .filter(move |kind| kind.has_tag(tag))
    }
}
