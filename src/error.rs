//! Fatal protocol error taxonomy.
//!
//! Running out of input is never an error here — the decoder reports it as a
//! buffering outcome and leaves the input untouched. Everything in this
//! module terminates decoding for the connection: the caller is expected to
//! log, drop the connection state, and close the transport.

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::chunk::HeaderClass;
use crate::value::ValueCodecError;

/// Violations that end decoding for a connection.
///
/// Each variant carries the channel it was observed on so operators can match
/// the failure against a capture of the byte stream.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The 2-bit class field held a value outside the defined classes.
    #[error("unknown header class {code:#04x} on channel {channel}")]
    UnknownHeaderClass {
        /// Channel the chunk was addressed to.
        channel: u32,
        /// Raw class code taken from the first header byte.
        code: u8,
    },
    /// A borrowing header class arrived before any full header was cached.
    #[error("header class {class:?} on channel {channel} needs a previously decoded header")]
    MissingHeaderContext {
        /// Channel with no cached header.
        channel: u32,
        /// The class that tried to borrow.
        class: HeaderClass,
    },
    /// A header declared a payload larger than the configured cap.
    #[error("packet of {size} bytes on channel {channel} exceeds the {limit} byte limit")]
    PacketTooLarge {
        /// Channel the oversized packet arrived on.
        channel: u32,
        /// Declared payload size.
        size: usize,
        /// Configured maximum.
        limit: NonZeroUsize,
    },
    /// Internal invariant: a completed packet consumed no input.
    ///
    /// This indicates corrupted reassembly state rather than bad peer input.
    #[error("decoder reported a completed packet without consuming input on channel {channel}")]
    StalledDecoder {
        /// Channel whose reassembly state is corrupt.
        channel: u32,
    },
    /// A completed packet's payload failed structured-value decoding.
    #[error("malformed message payload: {0}")]
    Value(#[from] ValueCodecError),
}

/// Failures on the outbound mirror path.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Channel ids 0 and 1 collide with the extended-id markers on the wire.
    #[error("channel id {channel} is reserved for extended channel-id markers")]
    ReservedChannel {
        /// The rejected channel id.
        channel: u32,
    },
    /// The id does not fit the two-byte extended encoding.
    #[error("channel id {channel} exceeds the extended encoding range")]
    ChannelOutOfRange {
        /// The rejected channel id.
        channel: u32,
    },
    /// The value codec could not represent part of the message.
    #[error(transparent)]
    Value(#[from] ValueCodecError),
}
