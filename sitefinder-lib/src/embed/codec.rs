//! Textual form of stored embeddings.
//!
//! The catalog keeps each vector as whitespace-joined decimal text
//! (`"0.013 -0.2 4.1e-5 ..."`). Rows written by older tools may wrap the
//! values in brackets or separate them with commas, so decoding accepts
//! `[`/`]`, commas and any run of whitespace between values.

use crate::embed::Embedding;
use crate::{Error, Result};

/// Serialize an embedding as single-space separated decimal text.
///
/// Uses the shortest representation that parses back to the same `f32`.
#[must_use]
pub fn encode_embedding(embedding: &[f32]) -> String {
    embedding
        .iter()
        .map(f32::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a stored embedding.
///
/// Fails with [`Error::MalformedCandidate`] when the text holds no values,
/// a token is not a number, or a value is not finite.
pub fn decode_embedding(text: &str) -> Result<Embedding> {
    let values = text
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '[' | ']'))
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(Error::MalformedCandidate(format!(
                "non-finite value '{token}' in embedding"
            ))),
            Err(_) => Err(Error::MalformedCandidate(format!(
                "'{token}' is not a number"
            ))),
        })
        .collect::<Result<Embedding>>()?;

    if values.is_empty() {
        return Err(Error::MalformedCandidate("embedding is empty".to_string()));
    }

    Ok(values)
}
