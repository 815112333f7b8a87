//! Binary encoding of expression trees.
//!
//! Layout: one format version byte followed by the bincode encoding of the
//! tree. Decoding bypasses the constructors, so every decoded tree is
//! validated before it is handed out.

use crate::expression::error::{IrError, IrResult};
use crate::expression::operator::ScalarExpr;
use crate::expression::validate::validate;
use bincode::Options;

pub const CODEC_VERSION: u8 = 1;

/// Fixed-width integers, as `bincode::serialize` writes them. Bytes left
/// over after the tree are an error.
fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub fn encode(expr: &ScalarExpr) -> IrResult<Vec<u8>> {
    let body = options().serialize(expr).map_err(codec_error)?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> IrResult<ScalarExpr> {
    let (version, body) = bytes.split_first().ok_or_else(|| IrError::Codec {
        reason: "empty input".to_string(),
    })?;
    if *version != CODEC_VERSION {
        return Err(IrError::Codec {
            reason: format!("unsupported format version {}", version),
        });
    }
    let expr: ScalarExpr = options().deserialize(body).map_err(codec_error)?;
    validate(&expr)?;
    Ok(expr)
}

fn codec_error(err: bincode::Error) -> IrError {
    IrError::Codec {
        reason: err.to_string(),
    }
}
