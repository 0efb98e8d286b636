//! Outbound mirror path: message encoding and re-chunking.
//!
//! Encoding follows the same header-compression policy the decoder expects:
//! the strongest class whose borrowed fields match the channel's last-sent
//! header, with continuation markers between the pieces of a split payload.
//! The per-channel last-sent cache lives in the connection's
//! [`ProtocolState`] and is updated after every packet.

use bytes::{BufMut, Bytes, BytesMut};

use super::state::ProtocolState;
use crate::chunk::{self, ChunkHeader};
use crate::error::EncodeError;
use crate::message::shared_object::{SharedObjectEventType, SharedObjectMessage, SharedObjectValue};
use crate::message::{CommandCall, Message, Packet};
use crate::value::ValueCodec;

/// Outbound half of the protocol engine.
#[derive(Debug)]
pub struct Encoder<C> {
    values: C,
}

impl<C: ValueCodec> Encoder<C> {
    /// Encoder writing structured payloads through `values`.
    #[must_use]
    pub const fn new(values: C) -> Self {
        Self { values }
    }

    /// Encode one packet into wire chunks for its channel.
    ///
    /// The header's `size` and `type_code` are derived from the message;
    /// channel id, timestamp, and stream id are taken from `packet.header`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the channel id cannot be represented
    /// or the value codec rejects part of the message.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode_packet(
        &self,
        state: &mut ProtocolState,
        packet: &Packet<C::Value>,
    ) -> Result<Bytes, EncodeError> {
        let payload = self.encode_message(&packet.message)?;
        let header = ChunkHeader {
            channel_id: packet.header.channel_id,
            timestamp: packet.header.timestamp,
            size: payload.len() as u32,
            type_code: packet.message.type_code(),
            stream_id: packet.header.stream_id,
        };

        let class = chunk::select_class(&header, state.last_write_header(header.channel_id));
        // A zero chunk size could never make progress; clamp to one byte.
        let chunk_size = state.write_chunk_size().max(1);

        let mut out = BytesMut::with_capacity(payload.len() + 16);
        chunk::encode(&mut out, &header, class)?;
        for (index, piece) in payload.chunks(chunk_size).enumerate() {
            if index > 0 {
                chunk::encode_continuation(&mut out, header.channel_id)?;
            }
            out.put_slice(piece);
        }

        state.cache_write_header(header);
        if let Message::ChunkSize(size) = packet.message {
            tracing::debug!(size, "write chunk size renegotiated");
            state.set_write_chunk_size(size as usize);
        }
        Ok(out.freeze())
    }

    /// Encode a message body without chunk framing.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the value codec rejects part of the
    /// message.
    pub fn encode_message(&self, message: &Message<C::Value>) -> Result<BytesMut, EncodeError> {
        let mut out = BytesMut::new();
        match message {
            Message::ChunkSize(size) => out.put_u32(*size),
            Message::StreamBytesRead(count) => out.put_u32(*count),
            Message::Ping(ping) => {
                out.put_u16(ping.event);
                out.put_u32(ping.value);
                if let Some(extra) = ping.extra {
                    out.put_u32(extra);
                }
            }
            Message::Invoke(command) | Message::Notify(command) => {
                self.encode_command(&mut out, command)?;
            }
            Message::SharedObject(shared_object) => {
                self.encode_shared_object(&mut out, shared_object)?;
            }
            Message::Audio(data) | Message::Video(data) | Message::StreamMetadata(data) => {
                out.put_slice(data);
            }
            Message::Unknown { payload, .. } => out.put_slice(payload),
        }
        Ok(out)
    }

    fn encode_command(
        &self,
        out: &mut BytesMut,
        command: &CommandCall<C::Value>,
    ) -> Result<(), EncodeError> {
        self.values.write_string_value(out, &command.call.action())?;
        self.values
            .write_number_value(out, f64::from(command.invoke_id))?;
        // The decoder reads a parameter slot before any arguments, so one is
        // written whenever arguments follow, null when absent.
        if command.connection_params.is_some() || !command.call.arguments.is_empty() {
            match &command.connection_params {
                Some(params) => self.values.write_value(out, params)?,
                None => self.values.write_null_value(out)?,
            }
            for argument in &command.call.arguments {
                self.values.write_value(out, argument)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_shared_object(
        &self,
        out: &mut BytesMut,
        message: &SharedObjectMessage<C::Value>,
    ) -> Result<(), EncodeError> {
        self.values.write_bare_string(out, &message.name)?;
        out.put_u32(message.version);
        out.put_u32(message.flags);
        out.put_bytes(0, 4);

        for event in &message.events {
            out.put_u8(event.event_type.tag());
            let mut body = BytesMut::new();
            if event.event_type == SharedObjectEventType::SendMessage {
                if let Some(key) = &event.key {
                    self.values.write_string_value(&mut body, key)?;
                }
                if let SharedObjectValue::List(list) = &event.value {
                    for item in list {
                        self.values.write_value(&mut body, item)?;
                    }
                }
            } else {
                if let Some(key) = &event.key {
                    self.values.write_bare_string(&mut body, key)?;
                }
                if let SharedObjectValue::Single(value) = &event.value {
                    self.values.write_value(&mut body, value)?;
                }
            }
            out.put_u32(body.len() as u32);
            out.put_slice(&body);
        }
        Ok(())
    }
}
