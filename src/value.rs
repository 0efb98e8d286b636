//! Seam for the structured-value codec consumed by message sub-decoders.
//!
//! Invoke, notify, and shared-object payloads embed values in a generic
//! self-describing serialization that is negotiated outside this crate. The
//! engine never interprets those bytes itself; it drives a [`ValueCodec`]
//! implementation supplied by the caller and treats the decoded values as
//! opaque except for the two narrow views it needs (a numeric invoke id and
//! a textual action or handler name).

use bytes::BytesMut;
use thiserror::Error;

use crate::buffer::ByteCursor;

/// Errors surfaced by [`ValueCodec`] implementations.
///
/// A completed packet has a known byte length, so a value running off the end
/// of its payload is a peer-side framing fault, not a buffering condition.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValueCodecError {
    /// The payload ended in the middle of an encoded value.
    #[error("value encoding truncated inside a completed packet")]
    Truncated,
    /// The bytes do not form a valid value in the negotiated encoding.
    #[error("malformed value encoding: {reason}")]
    Malformed {
        /// Short description of the framing fault.
        reason: &'static str,
    },
    /// A well-formed value had the wrong shape for its slot.
    #[error("unexpected value shape: expected {expected}")]
    UnexpectedType {
        /// The shape the message grammar required.
        expected: &'static str,
    },
}

/// Reader/writer for one structured value in the negotiated encoding.
///
/// `read_value`/`write_value` handle a complete tagged value. The bare-string
/// forms carry a length-prefixed string with no leading type tag — the shape
/// used for shared-object names and attribute keys. `write_string_value` and
/// `write_number_value` emit fully tagged values so the outbound command
/// encoder can produce action names and invoke ids without constructing a
/// `Value` first.
pub trait ValueCodec {
    /// Decoded value type owned by the caller after dispatch.
    type Value;

    /// Decode one tagged value at the cursor position.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the bytes are truncated or malformed.
    fn read_value(&self, cursor: &mut ByteCursor<'_>) -> Result<Self::Value, ValueCodecError>;

    /// Decode a length-prefixed string that carries no type tag.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the bytes are truncated or not valid
    /// text.
    fn read_bare_string(&self, cursor: &mut ByteCursor<'_>) -> Result<String, ValueCodecError>;

    /// Encode one tagged value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the value cannot be represented.
    fn write_value(&self, out: &mut BytesMut, value: &Self::Value) -> Result<(), ValueCodecError>;

    /// Encode a length-prefixed string with no type tag.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the string cannot be represented.
    fn write_bare_string(&self, out: &mut BytesMut, value: &str) -> Result<(), ValueCodecError>;

    /// Encode a string as a complete tagged value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the string cannot be represented.
    fn write_string_value(&self, out: &mut BytesMut, value: &str) -> Result<(), ValueCodecError>;

    /// Encode a number as a complete tagged value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the number cannot be represented.
    fn write_number_value(&self, out: &mut BytesMut, value: f64) -> Result<(), ValueCodecError>;

    /// Encode the encoding's null value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueCodecError`] if the encoding has no null form.
    fn write_null_value(&self, out: &mut BytesMut) -> Result<(), ValueCodecError>;

    /// Numeric view of a value, if it is a number.
    fn as_number(value: &Self::Value) -> Option<f64>;

    /// Textual view of a value, if it is a string.
    fn into_string(value: Self::Value) -> Option<String>;
}
