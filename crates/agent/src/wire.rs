//! Wire encoding
//!
//! Input is any JSON array of message records. Output is the two-element
//! array `[text, thoughts]`, written with `", "` and `": "` separators and
//! every non-ASCII character as a `\uXXXX` escape.

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{json, Value};
use std::io;
use thiserror::Error;

use machina_provider::MessageList;

use crate::Invocation;

/// Input that is not a JSON array of messages
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON array of messages, found {0}")]
    NotAnArray(&'static str),

    #[error("input is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode one framed unit (a daemon line or the whole single-shot input)
pub fn decode_messages(input: &[u8]) -> Result<MessageList, FramingError> {
    let value: Value = serde_json::from_slice(input)?;
    match value {
        Value::Array(messages) => Ok(messages),
        other => Err(FramingError::NotAnArray(kind_of(&other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Compact JSON with a space after every separator, ASCII only
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Encode an invocation result as `[text, thoughts]` (no line terminator)
pub fn encode_invocation(invocation: &Invocation) -> serde_json::Result<Vec<u8>> {
    let value = json!([invocation.text, invocation.thoughts]);
    let mut out = Vec::with_capacity(invocation.text.len() + 16);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
