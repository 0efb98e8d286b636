//! Chunk header model and wire codec.
//!
//! The first byte packs the header class into its top two bits and the
//! channel id into the low six. Ids 2–63 fit directly; the low-six values 0
//! and 1 are markers for one or two extension bytes (offset by 64, the
//! two-byte form little-endian). Because the markers shadow them, channel
//! ids 0 and 1 cannot appear on the wire and are rejected when encoding.

use bytes::{BufMut, BytesMut};

use super::class::HeaderClass;
use crate::buffer::ByteCursor;
use crate::byte_order::{write_medium_be, write_reverse_u32};
use crate::error::{EncodeError, ProtocolError};

/// Offset applied to extended channel ids.
const EXTENDED_ID_OFFSET: u32 = 64;

/// Largest id representable by the two-byte extension.
const MAX_CHANNEL_ID: u32 = EXTENDED_ID_OFFSET + 0xFF + (0xFF << 8);

/// Fully resolved header for one packet on one channel.
///
/// Decoding always produces a complete header: fields a compressed class
/// left out are filled in from the channel's previous header before the
/// value reaches the reassembler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Channel the packet travels on.
    pub channel_id: u32,
    /// Packet timestamp (24 bits on the wire).
    pub timestamp: u32,
    /// Total payload size in bytes (24 bits on the wire).
    pub size: u32,
    /// Message type code dispatched on after reassembly.
    pub type_code: u8,
    /// Stream the packet belongs to; zero means the control stream.
    pub stream_id: u32,
}

/// Number of bytes the channel marker occupies, judged from its first byte.
#[must_use]
pub const fn channel_id_width(first: u8) -> usize {
    match first & 0x3F {
        0 => 2,
        1 => 3,
        _ => 1,
    }
}

/// Number of marker bytes needed to encode `channel_id`.
#[must_use]
pub const fn encoded_channel_width(channel_id: u32) -> usize {
    if channel_id <= 63 {
        1
    } else if channel_id < EXTENDED_ID_OFFSET + 256 {
        2
    } else {
        3
    }
}

/// Total header length (marker plus class body) implied by the first byte.
#[must_use]
pub const fn header_len(first: u8) -> usize {
    let class = match HeaderClass::from_code(first >> 6, 0) {
        Ok(class) => class,
        // Two bits cannot exceed 3; keep the arm total anyway.
        Err(_) => HeaderClass::Continue,
    };
    channel_id_width(first) + class.body_len()
}

/// Read the channel id at the cursor position without consuming anything.
///
/// Returns `None` when the marker's extension bytes are not yet buffered.
#[must_use]
pub fn peek_channel_id(cursor: &ByteCursor<'_>) -> Option<u32> {
    let mut probe = cursor.clone();
    let first = probe.get_u8()?;
    match first & 0x3F {
        0 => Some(EXTENDED_ID_OFFSET + u32::from(probe.get_u8()?)),
        1 => {
            let low = probe.get_u8()?;
            let high = probe.get_u8()?;
            Some(EXTENDED_ID_OFFSET + u32::from(low) + (u32::from(high) << 8))
        }
        direct => Some(u32::from(direct)),
    }
}

/// Decode one compressed header if the input holds it completely.
///
/// Returns `Ok(None)` — with the cursor position untouched — when the full
/// header is not yet buffered. On success the cursor has consumed exactly
/// the header bytes and the returned header is fully resolved against
/// `last`, the channel's previously decoded header.
///
/// # Errors
///
/// Returns [`ProtocolError::MissingHeaderContext`] when a borrowing class
/// arrives on a channel with no cached header.
pub fn try_decode(
    cursor: &mut ByteCursor<'_>,
    last: Option<&ChunkHeader>,
) -> Result<Option<ChunkHeader>, ProtocolError> {
    let start = cursor.position();
    let Some(first) = cursor.peek_u8() else {
        return Ok(None);
    };
    if cursor.remaining() < header_len(first) {
        return Ok(None);
    }

    let _ = cursor.skip(1);
    let channel_id = match first & 0x3F {
        0 => {
            let low = cursor.get_u8().unwrap_or_default();
            EXTENDED_ID_OFFSET + u32::from(low)
        }
        1 => {
            let low = cursor.get_u8().unwrap_or_default();
            let high = cursor.get_u8().unwrap_or_default();
            EXTENDED_ID_OFFSET + u32::from(low) + (u32::from(high) << 8)
        }
        direct => u32::from(direct),
    };
    let class = HeaderClass::from_code(first >> 6, channel_id)?;

    let borrow = |cursor: &mut ByteCursor<'_>| -> Result<ChunkHeader, ProtocolError> {
        let Some(last) = last else {
            cursor.set_position(start);
            return Err(ProtocolError::MissingHeaderContext {
                channel: channel_id,
                class,
            });
        };
        Ok(*last)
    };

    let header = match class {
        HeaderClass::New => ChunkHeader {
            channel_id,
            timestamp: cursor.get_u24().unwrap_or_default(),
            size: cursor.get_u24().unwrap_or_default(),
            type_code: cursor.get_u8().unwrap_or_default(),
            stream_id: cursor.get_u32_le().unwrap_or_default(),
        },
        HeaderClass::SameSource => ChunkHeader {
            channel_id,
            timestamp: cursor.get_u24().unwrap_or_default(),
            size: cursor.get_u24().unwrap_or_default(),
            type_code: cursor.get_u8().unwrap_or_default(),
            stream_id: borrow(cursor)?.stream_id,
        },
        HeaderClass::TimerChange => {
            let last = borrow(cursor)?;
            ChunkHeader {
                channel_id,
                timestamp: cursor.get_u24().unwrap_or_default(),
                size: last.size,
                type_code: last.type_code,
                stream_id: last.stream_id,
            }
        }
        HeaderClass::Continue => {
            let last = borrow(cursor)?;
            ChunkHeader { channel_id, ..last }
        }
    };
    Ok(Some(header))
}

/// Pick the strongest compression consistent with the last header sent on
/// the channel.
///
/// The policy deliberately prefers the largest compression whose borrowed
/// fields still match, rather than re-sending explicit fields, so the remote
/// header cache stays in step.
#[must_use]
pub fn select_class(header: &ChunkHeader, last: Option<&ChunkHeader>) -> HeaderClass {
    let Some(last) = last else {
        return HeaderClass::New;
    };
    if header.stream_id != last.stream_id {
        return HeaderClass::New;
    }
    if header.size != last.size || header.type_code != last.type_code {
        return HeaderClass::SameSource;
    }
    if header.timestamp != last.timestamp {
        return HeaderClass::TimerChange;
    }
    HeaderClass::Continue
}

/// Append the channel marker for `class` and `channel_id`.
///
/// # Errors
///
/// Returns [`EncodeError::ReservedChannel`] for ids 0 and 1 and
/// [`EncodeError::ChannelOutOfRange`] for ids beyond the two-byte extension.
fn encode_marker(out: &mut BytesMut, class: HeaderClass, channel_id: u32) -> Result<(), EncodeError> {
    let class_bits = class.code() << 6;
    match channel_id {
        0 | 1 => Err(EncodeError::ReservedChannel {
            channel: channel_id,
        }),
        2..=63 => {
            #[allow(clippy::cast_possible_truncation)]
            out.put_u8(class_bits | channel_id as u8);
            Ok(())
        }
        64..=319 => {
            out.put_u8(class_bits);
            #[allow(clippy::cast_possible_truncation)]
            out.put_u8((channel_id - EXTENDED_ID_OFFSET) as u8);
            Ok(())
        }
        320..=MAX_CHANNEL_ID => {
            let extended = channel_id - EXTENDED_ID_OFFSET;
            out.put_u8(class_bits | 1);
            #[allow(clippy::cast_possible_truncation)]
            out.put_u8((extended & 0xFF) as u8);
            #[allow(clippy::cast_possible_truncation)]
            out.put_u8((extended >> 8) as u8);
            Ok(())
        }
        _ => Err(EncodeError::ChannelOutOfRange {
            channel: channel_id,
        }),
    }
}

/// Encode `header` at the given compression class.
///
/// # Errors
///
/// Returns an [`EncodeError`] when the channel id cannot be represented.
pub fn encode(
    out: &mut BytesMut,
    header: &ChunkHeader,
    class: HeaderClass,
) -> Result<(), EncodeError> {
    encode_marker(out, class, header.channel_id)?;
    match class {
        HeaderClass::New => {
            out.put_slice(&write_medium_be(header.timestamp));
            out.put_slice(&write_medium_be(header.size));
            out.put_u8(header.type_code);
            out.put_slice(&write_reverse_u32(header.stream_id));
        }
        HeaderClass::SameSource => {
            out.put_slice(&write_medium_be(header.timestamp));
            out.put_slice(&write_medium_be(header.size));
            out.put_u8(header.type_code);
        }
        HeaderClass::TimerChange => {
            out.put_slice(&write_medium_be(header.timestamp));
        }
        HeaderClass::Continue => {}
    }
    Ok(())
}

/// Encode the continuation marker used between the pieces of a split packet.
///
/// # Errors
///
/// Returns an [`EncodeError`] when the channel id cannot be represented.
pub fn encode_continuation(out: &mut BytesMut, channel_id: u32) -> Result<(), EncodeError> {
    encode_marker(out, HeaderClass::Continue, channel_id)
}
