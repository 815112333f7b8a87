//! Operator classification tags.
//!
//! Rewrite rules test tags, not operator names, so an operator that carries
//! an existing tag joins every rule that tests it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data-free classification label attached to operator kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Scalar = 0,
    Boolean = 1,
    Comparison = 2,
    Binary = 3,
    Unary = 4,
    Aggregate = 5,
    ConstValue = 6,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Scalar,
        Tag::Boolean,
        Tag::Comparison,
        Tag::Binary,
        Tag::Unary,
        Tag::Aggregate,
        Tag::ConstValue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Scalar => "Scalar",
            Tag::Boolean => "Boolean",
            Tag::Comparison => "Comparison",
            Tag::Binary => "Binary",
            Tag::Unary => "Unary",
            Tag::Aggregate => "Aggregate",
            Tag::ConstValue => "ConstValue",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown tag: {}", s))
    }
}

/// Fixed-size set of tags, one bit per tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TagSet(u8);

impl TagSet {
    pub const EMPTY: TagSet = TagSet(0);

    pub const fn with(self, tag: Tag) -> TagSet {
        TagSet(self.0 | tag.bit())
    }

    pub const fn contains(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Tags in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Tag> {
        Tag::ALL.into_iter().filter(move |tag| self.contains(*tag))
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        iter.into_iter().fold(TagSet::EMPTY, TagSet::with)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tag)?;
        }
        write!(f, "]")
    }
}
