//! Inbound decode loop: handshake gating, chunk reassembly, dispatch.
//!
//! The loop consumes as much of the input as it can, emitting completed
//! packets in arrival order. Channel state only changes when every byte a
//! step needs is already buffered; a shortfall rolls the position back to
//! the step boundary and reports the exact requirement, to be retried when
//! the caller has appended more bytes.

use std::num::NonZeroUsize;

use bytes::{Buf, Bytes, BytesMut};

use super::state::{InboundPacket, ProtocolState};
use crate::buffer::ByteCursor;
use crate::chunk;
use crate::error::ProtocolError;
use crate::handshake::{HANDSHAKE_SIZE, HandshakeStep};
use crate::message::{Message, Packet};
use crate::value::ValueCodec;

/// Everything one decode invocation produced.
#[derive(Debug)]
pub struct DecodeRun<V> {
    /// Completed packets in arrival order.
    pub packets: Vec<Packet<V>>,
    /// Handshake payload that must be echoed to the peer, when the init
    /// blob was consumed during this run.
    pub handshake_echo: Option<Bytes>,
    /// Bytes still missing before the pending step can continue, if the run
    /// stopped on a shortfall.
    pub needed: Option<NonZeroUsize>,
}

/// Outcome of one decode step inside the loop.
enum Step<V> {
    /// A packet completed.
    Packet(Packet<V>),
    /// The handshake init was consumed and produced an echo.
    Echo(Bytes),
    /// State advanced; re-enter the loop at the next position.
    Continue,
    /// The step needs this many bytes (measured from its start position).
    Buffer(usize),
}

/// Inbound half of the protocol engine.
///
/// Stateless apart from its value codec; all connection state lives in the
/// [`ProtocolState`] passed to every call, so one decoder may serve many
/// connections as long as each connection is driven sequentially.
#[derive(Debug)]
pub struct Decoder<C> {
    values: C,
    max_packet_size: Option<NonZeroUsize>,
}

impl<C: ValueCodec> Decoder<C> {
    /// Decoder with no declared-size cap, matching the classic behaviour.
    #[must_use]
    pub const fn new(values: C) -> Self {
        Self {
            values,
            max_packet_size: None,
        }
    }

    /// Decoder that rejects packets whose header declares more than
    /// `max_packet_size` bytes of payload.
    #[must_use]
    pub const fn with_packet_limit(values: C, max_packet_size: NonZeroUsize) -> Self {
        Self {
            values,
            max_packet_size: Some(max_packet_size),
        }
    }

    pub(super) const fn values(&self) -> &C {
        &self.values
    }

    /// Decode as much of `input` as possible for one connection.
    ///
    /// Consumed bytes are drained from the front of `input`; unconsumed
    /// bytes stay put for the next call. The returned run carries completed
    /// packets, an optional handshake echo, and the byte shortfall if the
    /// loop stopped early.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] on any fatal violation; the connection
    /// must then be discarded along with its state.
    pub fn decode_buffer(
        &self,
        state: &mut ProtocolState,
        input: &mut BytesMut,
    ) -> Result<DecodeRun<C::Value>, ProtocolError> {
        let mut packets = Vec::new();
        let mut handshake_echo = None;
        let mut cursor = ByteCursor::new(&input[..]);

        loop {
            if cursor.remaining() < state.requirement() {
                break;
            }
            state.begin_step();
            let step_start = cursor.position();

            let step = match self.decode_step(state, &mut cursor) {
                Ok(step) => step,
                Err(error) => {
                    tracing::error!(%error, "protocol violation; decoding stops");
                    return Err(error);
                }
            };
            match step {
                Step::Packet(packet) => {
                    if cursor.position() == step_start {
                        let channel = packet.header.channel_id;
                        tracing::error!(channel, "completed packet consumed no input");
                        return Err(ProtocolError::StalledDecoder { channel });
                    }
                    packets.push(packet);
                    if !cursor.has_remaining() {
                        break;
                    }
                }
                Step::Echo(echo) => {
                    handshake_echo = Some(echo);
                    if !state.handshake().is_established() {
                        // The ack's length is fixed; report it up front so
                        // the caller knows the full outstanding amount.
                        state.require(HANDSHAKE_SIZE);
                    }
                }
                Step::Continue => {}
                Step::Buffer(required) => {
                    cursor.set_position(step_start);
                    state.require(required);
                    break;
                }
            }
        }

        let consumed = cursor.position();
        let remaining = cursor.remaining();
        input.advance(consumed);
        Ok(DecodeRun {
            packets,
            handshake_echo,
            needed: NonZeroUsize::new(state.requirement().saturating_sub(remaining)),
        })
    }

    fn decode_step(
        &self,
        state: &mut ProtocolState,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<Step<C::Value>, ProtocolError> {
        if !state.handshake().is_established() {
            return Ok(match state.handshake_mut().advance(cursor) {
                HandshakeStep::Incomplete { required } => Step::Buffer(required),
                HandshakeStep::Echo(echo) => Step::Echo(echo),
                HandshakeStep::Established => Step::Continue,
            });
        }
        self.decode_chunk(state, cursor)
    }

    /// Decode one chunk: header, then at most one chunk-size worth of
    /// payload for the addressed channel.
    fn decode_chunk(
        &self,
        state: &mut ProtocolState,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<Step<C::Value>, ProtocolError> {
        let Some(first) = cursor.peek_u8() else {
            return Ok(Step::Buffer(1));
        };
        let header_bytes = chunk::header_len(first);
        let Some(channel_id) = chunk::peek_channel_id(cursor) else {
            return Ok(Step::Buffer(chunk::channel_id_width(first)));
        };

        let last = state.last_read_header(channel_id).copied();
        let Some(header) = chunk::try_decode(cursor, last.as_ref())? else {
            tracing::debug!(channel_id, header_bytes, "header not fully buffered");
            return Ok(Step::Buffer(header_bytes));
        };

        // The chunk carries min(outstanding payload, chunk size) bytes.
        let chunk_size = state.read_chunk_size();
        let to_read = match state.in_progress_mut(channel_id) {
            Some(packet) => packet.remaining().min(chunk_size),
            None => {
                let size = header.size as usize;
                if let Some(limit) = self.max_packet_size
                    && size > limit.get()
                {
                    tracing::warn!(channel_id, size, limit = limit.get(), "oversized packet");
                    return Err(ProtocolError::PacketTooLarge {
                        channel: channel_id,
                        size,
                        limit,
                    });
                }
                size.min(chunk_size)
            }
        };

        let Some(chunk_bytes) = cursor.take(to_read) else {
            tracing::debug!(
                channel_id,
                to_read,
                remaining = cursor.remaining(),
                "chunk body not fully buffered",
            );
            return Ok(Step::Buffer(header_bytes + to_read));
        };

        // Everything the step needs is present; from here on state changes.
        state.cache_read_header(header);
        let mut packet = state
            .take_packet(channel_id)
            .unwrap_or_else(|| InboundPacket::new(header));
        packet.extend(chunk_bytes);

        if !packet.is_complete() {
            state.start_packet(packet);
            return Ok(Step::Continue);
        }

        let (first_header, payload) = packet.into_parts();
        let message = self.dispatch(&first_header, payload.freeze())?;
        if let Message::ChunkSize(size) = message {
            tracing::debug!(channel_id, size, "read chunk size renegotiated");
            state.set_read_chunk_size(size as usize);
        }
        Ok(Step::Packet(Packet {
            header: first_header,
            message,
        }))
    }
}
