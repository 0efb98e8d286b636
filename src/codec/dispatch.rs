//! Typed dispatch from a completed packet to a domain message.
//!
//! A single match on the header's type code selects the sub-decoder. The
//! structured payloads (invoke, notify, shared object) are walked with the
//! connection's value codec; media payloads pass through untouched.

use bytes::Bytes;

use super::decoder::Decoder;
use crate::buffer::ByteCursor;
use crate::chunk::ChunkHeader;
use crate::error::ProtocolError;
use crate::message::shared_object::{
    SharedObjectEvent,
    SharedObjectEventType,
    SharedObjectMessage,
    SharedObjectValue,
    event_tag,
};
use crate::message::{CommandCall, Message, PingMessage, ServiceCall, type_code};
use crate::value::{ValueCodec, ValueCodecError};

impl<C: ValueCodec> Decoder<C> {
    /// Turn a completed packet's payload into a typed message.
    pub(super) fn dispatch(
        &self,
        header: &ChunkHeader,
        payload: Bytes,
    ) -> Result<Message<C::Value>, ProtocolError> {
        let message = match header.type_code {
            type_code::CHUNK_SIZE => {
                let mut cursor = ByteCursor::new(&payload);
                Message::ChunkSize(cursor.get_u32().ok_or(ValueCodecError::Truncated)?)
            }
            type_code::STREAM_BYTES_READ => {
                let mut cursor = ByteCursor::new(&payload);
                Message::StreamBytesRead(cursor.get_u32().ok_or(ValueCodecError::Truncated)?)
            }
            type_code::PING => Message::Ping(decode_ping(&payload)?),
            type_code::INVOKE => Message::Invoke(self.decode_command(&payload)?),
            // The same code carries notifications and stream metadata; only
            // the packet's stream id tells them apart.
            type_code::NOTIFY if header.stream_id != 0 => Message::StreamMetadata(payload),
            type_code::NOTIFY => Message::Notify(self.decode_command(&payload)?),
            type_code::AUDIO_DATA => Message::Audio(payload),
            type_code::VIDEO_DATA => Message::Video(payload),
            type_code::SHARED_OBJECT => Message::SharedObject(self.decode_shared_object(&payload)?),
            other => {
                tracing::debug!(type_code = other, len = payload.len(), "unknown message type");
                Message::Unknown {
                    type_code: other,
                    payload,
                }
            }
        };
        Ok(message)
    }

    /// Decode an invocation or notification body.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn decode_command(&self, payload: &[u8]) -> Result<CommandCall<C::Value>, ProtocolError> {
        let mut cursor = ByteCursor::new(payload);
        let values = self.values();

        let action_value = values.read_value(&mut cursor)?;
        let action = C::into_string(action_value).ok_or(ValueCodecError::UnexpectedType {
            expected: "string action name",
        })?;
        let id_value = values.read_value(&mut cursor)?;
        let invoke_id = C::as_number(&id_value).ok_or(ValueCodecError::UnexpectedType {
            expected: "numeric invoke id",
        })? as u32;

        // A parameter map precedes the positional arguments, but only when
        // the payload carries anything past the invoke id.
        let mut connection_params = None;
        let mut arguments = Vec::new();
        if cursor.has_remaining() {
            connection_params = Some(values.read_value(&mut cursor)?);
            while cursor.has_remaining() {
                arguments.push(values.read_value(&mut cursor)?);
            }
        }

        Ok(CommandCall {
            invoke_id,
            connection_params,
            call: ServiceCall::parse(&action, arguments),
        })
    }

    /// Decode a shared-object batch body.
    fn decode_shared_object(
        &self,
        payload: &[u8],
    ) -> Result<SharedObjectMessage<C::Value>, ProtocolError> {
        let mut cursor = ByteCursor::new(payload);
        let values = self.values();

        let name = values.read_bare_string(&mut cursor)?;
        let version = cursor.get_u32().ok_or(ValueCodecError::Truncated)?;
        let flags = cursor.get_u32().ok_or(ValueCodecError::Truncated)?;
        cursor.skip(4).ok_or(ValueCodecError::Truncated)?;

        let mut events = Vec::new();
        while cursor.has_remaining() {
            let tag = cursor.get_u8().ok_or(ValueCodecError::Truncated)?;
            let length = cursor.get_u32().ok_or(ValueCodecError::Truncated)? as usize;
            let event_type = SharedObjectEventType::from_tag(tag);

            let event = if tag == event_tag::SEND_MESSAGE {
                // The handler name arrives as a complete tagged value, and
                // the argument list runs until the declared length is used
                // up, measured from the start of the event body.
                let start = cursor.position();
                let key_value = values.read_value(&mut cursor)?;
                let key = C::into_string(key_value).ok_or(ValueCodecError::UnexpectedType {
                    expected: "string handler name",
                })?;
                let mut list = Vec::new();
                while cursor.position() - start < length {
                    list.push(values.read_value(&mut cursor)?);
                }
                SharedObjectEvent {
                    event_type,
                    key: Some(key),
                    value: SharedObjectValue::List(list),
                }
            } else {
                let mut key = None;
                let mut value = SharedObjectValue::None;
                if length > 0 {
                    let key_start = cursor.position();
                    let key_name = values.read_bare_string(&mut cursor)?;
                    let key_len = cursor.position() - key_start;
                    if length > key_len {
                        value = SharedObjectValue::Single(values.read_value(&mut cursor)?);
                    }
                    key = Some(key_name);
                }
                SharedObjectEvent {
                    event_type,
                    key,
                    value,
                }
            };
            events.push(event);
        }

        Ok(SharedObjectMessage {
            name,
            version,
            flags,
            events,
        })
    }
}

fn decode_ping(payload: &[u8]) -> Result<PingMessage, ProtocolError> {
    let mut cursor = ByteCursor::new(payload);
    let event = cursor.get_u16().ok_or(ValueCodecError::Truncated)?;
    let value = cursor.get_u32().ok_or(ValueCodecError::Truncated)?;
    let extra = if cursor.has_remaining() {
        Some(cursor.get_u32().ok_or(ValueCodecError::Truncated)?)
    } else {
        None
    };
    Ok(PingMessage {
        event,
        value,
        extra,
    })
}
