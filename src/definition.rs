//! Textual operator definitions.
//!
//! One declaration per line, `#` starts a comment:
//!
//! ```text
//! define Eq(left: Expr, right: Expr) [Scalar, Comparison]
//! define True [Scalar, Boolean, ConstValue]
//! ```
//!
//! `render_definitions` emits the operator table in this format and
//! `verify_definitions` checks a parsed file against it, so a definition
//! file and the compiled operator table can never drift apart silently.

use crate::expression::field::FieldType;
use crate::expression::operator::OperatorKind;
use crate::expression::tag::{Tag, TagSet};
use crate::expression::taxonomy::{OperatorDef, Taxonomy};
use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unknown operator declared: {name}")]
    Unknown { name: String },

    #[error("declaration of {name} does not match the operator table: {reason}")]
    Mismatch { name: String, reason: String },

    #[error("operators not declared: {}", .names.join(", "))]
    Missing { names: Vec<String> },

    #[error("{name} is declared more than once")]
    Duplicate { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclField {
    pub name: String,
    pub typ: FieldType,
}

/// One parsed `define` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorDecl {
    pub name: String,
    pub fields: Vec<DeclField>,
    pub tags: TagSet,
}

impl From<OperatorDef> for OperatorDecl {
    fn from(def: OperatorDef) -> Self {
        Self {
            name: def.name.to_string(),
            fields: def
                .fields
                .iter()
                .map(|f| DeclField {
                    name: f.name.to_string(),
                    typ: f.typ,
                })
                .collect(),
            tags: def.tags,
        }
    }
}

impl fmt::Display for OperatorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {}", self.name)?;
        if !self.fields.is_empty() {
            write!(f, "(")?;
            for (i, field) in self.fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", field.name, field.typ)?;
            }
            write!(f, ")")?;
        }
        write!(f, " {}", self.tags)
    }
}

/// The operator table in definition format.
pub fn render_definitions() -> String {
    let mut out = String::from("# Scalar operator definitions\n");
    for kind in Taxonomy::all() {
        out.push_str(&OperatorDecl::from(Taxonomy::operator(*kind)).to_string());
        out.push('\n');
    }
    out
}

pub fn parse_definitions(text: &str) -> Result<Vec<OperatorDecl>, DefinitionError> {
    let mut decls = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let decl = parse_line(line).map_err(|message| DefinitionError::Syntax {
            line: idx + 1,
            message,
        })?;
        decls.push(decl);
    }
    Ok(decls)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_ident(s: &str) -> Result<(&str, &str), String> {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    if end == 0 {
        return Err(format!("expected identifier at '{}'", s));
    }
    Ok(s.split_at(end))
}

fn parse_line(line: &str) -> Result<OperatorDecl, String> {
    let rest = line
        .strip_prefix("define")
        .filter(|r| r.starts_with(char::is_whitespace))
        .ok_or_else(|| "expected 'define'".to_string())?
        .trim_start();
    let (name, rest) = parse_ident(rest)?;
    let mut rest = rest.trim_start();

    let mut fields = Vec::new();
    if let Some(after) = rest.strip_prefix('(') {
        let close = after
            .find(')')
            .ok_or_else(|| "unclosed field list".to_string())?;
        fields = parse_fields(&after[..close])?;
        rest = after[close + 1..].trim_start();
    }

    let tag_list = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| format!("expected a bracketed tag list after {}", name))?;
    let tags = parse_tags(tag_list)?;

    Ok(OperatorDecl {
        name: name.to_string(),
        fields,
        tags,
    })
}

fn parse_fields(list: &str) -> Result<Vec<DeclField>, String> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut fields: Vec<DeclField> = Vec::new();
    for item in list.split(',') {
        let (name, typ) = item
            .split_once(':')
            .ok_or_else(|| format!("expected 'name: Type', got '{}'", item.trim()))?;
        let name = name.trim();
        let (ident, trailing) = parse_ident(name)?;
        if !trailing.is_empty() {
            return Err(format!("invalid field name '{}'", name));
        }
        if fields.iter().any(|f| f.name == ident) {
            return Err(format!("duplicate field '{}'", ident));
        }
        fields.push(DeclField {
            name: ident.to_string(),
            typ: typ.trim().parse()?,
        });
    }
    Ok(fields)
}

fn parse_tags(list: &str) -> Result<TagSet, String> {
    let mut tags = TagSet::EMPTY;
    for item in list.split(',') {
        let tag: Tag = item.trim().parse()?;
        if tags.contains(tag) {
            return Err(format!("duplicate tag {}", tag));
        }
        tags = tags.with(tag);
    }
    Ok(tags)
}

/// Check that `decls` declares every operator exactly once, with the field
/// order, field types and tags of the operator table.
pub fn verify_definitions(decls: &[OperatorDecl]) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for decl in decls {
        let kind = Taxonomy::lookup(&decl.name).map_err(|_| DefinitionError::Unknown {
            name: decl.name.clone(),
        })?;
        if !seen.insert(kind) {
            return Err(DefinitionError::Duplicate {
                name: decl.name.clone(),
            });
        }
        check_decl(kind, decl)?;
    }

    let missing: Vec<String> = Taxonomy::all()
        .iter()
        .filter(|kind| !seen.contains(*kind))
        .map(|kind| kind.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DefinitionError::Missing { names: missing });
    }

    debug!("verified {} operator definitions", decls.len());
    Ok(())
}

fn check_decl(kind: OperatorKind, decl: &OperatorDecl) -> Result<(), DefinitionError> {
    let mismatch = |reason: String| DefinitionError::Mismatch {
        name: decl.name.clone(),
        reason,
    };
    let schema = kind.schema();
    if schema.len() != decl.fields.len() {
        return Err(mismatch(format!(
            "expected {} fields, declared {}",
            schema.len(),
            decl.fields.len()
        )));
    }
    for (i, (expected, declared)) in schema.iter().zip(&decl.fields).enumerate() {
        if expected.name != declared.name || expected.typ != declared.typ {
            return Err(mismatch(format!(
                "field {} is {}: {}, declared {}: {}",
                i, expected.name, expected.typ, declared.name, declared.typ
            )));
        }
    }
    if kind.tags() != decl.tags {
        return Err(mismatch(format!(
            "tags are {}, declared {}",
            kind.tags(),
            decl.tags
        )));
    }
    Ok(())
}

/// Read, parse and verify a definition file.
pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<OperatorDecl>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definitions from {}", path.display()))?;
    let decls = parse_definitions(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    verify_definitions(&decls)
        .with_context(|| format!("Definitions in {} do not match", path.display()))?;
    Ok(decls)
}
