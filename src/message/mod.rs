//! Typed domain messages produced by the dispatcher.
//!
//! One enum variant per wire message kind, selected by a single match on the
//! packet's type code. Variants own only the fields that kind carries; media
//! payloads stay as frozen [`Bytes`] and are never parsed here.

use bytes::Bytes;

pub mod call;
pub mod shared_object;

pub use call::{CommandCall, ServiceCall};
pub use shared_object::{SharedObjectEvent, SharedObjectEventType, SharedObjectMessage, SharedObjectValue};

use crate::chunk::ChunkHeader;

/// Wire type codes, kept as named constants because they are the contract
/// with third-party peers.
pub mod type_code {
    /// Updates the connection-wide read chunk size.
    pub const CHUNK_SIZE: u8 = 0x01;
    /// Counter of stream bytes consumed by the peer.
    pub const STREAM_BYTES_READ: u8 = 0x03;
    /// Ping / control event.
    pub const PING: u8 = 0x04;
    /// Opaque audio payload.
    pub const AUDIO_DATA: u8 = 0x08;
    /// Opaque video payload.
    pub const VIDEO_DATA: u8 = 0x09;
    /// Notification; doubles as stream metadata on non-zero stream ids.
    pub const NOTIFY: u8 = 0x12;
    /// Shared-object update batch.
    pub const SHARED_OBJECT: u8 = 0x13;
    /// Two-phase invocation expecting a correlated result.
    pub const INVOKE: u8 = 0x14;
}

/// Ping / control message: an event code plus one or two values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingMessage {
    /// Control event code.
    pub event: u16,
    /// First event value.
    pub value: u32,
    /// Second event value, present only when the payload carries it.
    pub extra: Option<u32>,
}

/// A decoded domain message.
///
/// Ownership passes to the caller on emission; the engine never touches a
/// message again after handing it out.
#[derive(Clone, Debug, PartialEq)]
pub enum Message<V> {
    /// New chunk size for every channel of the connection.
    ChunkSize(u32),
    /// Bytes-received counter reported by the peer.
    StreamBytesRead(u32),
    /// Ping / control event.
    Ping(PingMessage),
    /// Remote invocation awaiting a result correlated by its invoke id.
    Invoke(CommandCall<V>),
    /// Fire-and-forget notification.
    Notify(CommandCall<V>),
    /// Opaque audio payload.
    Audio(Bytes),
    /// Opaque video payload.
    Video(Bytes),
    /// Notification re-interpreted as stream metadata because the packet
    /// arrived on a non-zero stream id; carried opaquely.
    StreamMetadata(Bytes),
    /// Batched shared-object synchronization events.
    SharedObject(SharedObjectMessage<V>),
    /// Unrecognised type code; payload carried for inspection.
    Unknown {
        /// The unmatched wire type code.
        type_code: u8,
        /// Raw payload bytes.
        payload: Bytes,
    },
}

impl<V> Message<V> {
    /// Wire type code this message travels under.
    #[must_use]
    pub fn type_code(&self) -> u8 {
        match self {
            Self::ChunkSize(_) => type_code::CHUNK_SIZE,
            Self::StreamBytesRead(_) => type_code::STREAM_BYTES_READ,
            Self::Ping(_) => type_code::PING,
            Self::Invoke(_) => type_code::INVOKE,
            Self::Audio(_) => type_code::AUDIO_DATA,
            Self::Video(_) => type_code::VIDEO_DATA,
            Self::Notify(_) | Self::StreamMetadata(_) => type_code::NOTIFY,
            Self::SharedObject(_) => type_code::SHARED_OBJECT,
            Self::Unknown { type_code, .. } => *type_code,
        }
    }
}

/// One complete logical message with the header of its first chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet<V> {
    /// Header the packet was opened with (timestamp, channel, stream id).
    pub header: ChunkHeader,
    /// The decoded message.
    pub message: Message<V>,
}

impl<V> Packet<V> {
    /// Channel the packet arrived on or is addressed to.
    #[must_use]
    pub const fn channel_id(&self) -> u32 {
        self.header.channel_id
    }

    /// Timestamp carried by the packet's header.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        self.header.timestamp
    }
}
