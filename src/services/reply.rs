// src/services/reply.rs
//! Pulls the reply text out of a runner response.
//!
//! The runner nests the text at `outputs[0].outputs[0].results.message.data.text`.
//! Each hop that can be missing has its own error so a shape change upstream
//! shows up in the logs by name.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyShapeError {
    #[error("response has no outputs[0]")]
    MissingOutputs,
    #[error("response has no outputs[0].outputs[0]")]
    MissingInnerOutputs,
    #[error("output has no results")]
    MissingResults,
    #[error("results have no message")]
    MissingMessage,
    #[error("message has no data")]
    MissingData,
    #[error("message data has no text")]
    MissingText,
    #[error("message text is not a string")]
    NotAString,
    #[error("message text is empty")]
    EmptyText,
}

pub fn extract_reply(response: &Value) -> Result<String, ReplyShapeError> {
    use ReplyShapeError::*;

    let text = response
        .get("outputs")
        .and_then(|v| v.get(0))
        .ok_or(MissingOutputs)?
        .get("outputs")
        .and_then(|v| v.get(0))
        .ok_or(MissingInnerOutputs)?
        .get("results")
        .ok_or(MissingResults)?
        .get("message")
        .ok_or(MissingMessage)?
        .get("data")
        .ok_or(MissingData)?
        .get("text")
        .ok_or(MissingText)?;

    match text {
        Value::String(s) if s.is_empty() => Err(EmptyText),
        Value::String(s) => Ok(s.clone()),
        Value::Null => Err(MissingText),
        _ => Err(NotAString),
    }
}
