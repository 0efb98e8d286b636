//! Dispatcher behaviour per message kind.

mod common;

use bytes::{BufMut, BytesMut};
use chunkwire::chunk::{self, ChunkHeader, HeaderClass};
use chunkwire::message::shared_object::{SharedObjectEventType, SharedObjectValue, event_tag};
use chunkwire::message::{Message, PingMessage, type_code};
use chunkwire::value::ValueCodec;
use chunkwire_testing::{TestCodec, TestValue};
use common::{decoder, established_server};

/// Frame `payload` as one packet on channel 3 and run it through a fresh
/// server-side engine.
fn decode_one(type_code: u8, stream_id: u32, payload: &[u8]) -> Message<TestValue> {
    let mut state = established_server();
    let header = ChunkHeader {
        channel_id: 3,
        timestamp: 0,
        size: u32::try_from(payload.len()).expect("payload fits a medium int"),
        type_code,
        stream_id,
    };

    let mut wire = BytesMut::new();
    chunk::encode(&mut wire, &header, HeaderClass::New).expect("encodable header");
    for (index, piece) in payload.chunks(128).enumerate() {
        if index > 0 {
            chunk::encode_continuation(&mut wire, 3).expect("encodable marker");
        }
        wire.put_slice(piece);
    }

    let mut input = BytesMut::from(&wire[..]);
    let mut run = decoder()
        .decode_buffer(&mut state, &mut input)
        .expect("valid packet");
    assert_eq!(run.packets.len(), 1);
    run.packets.remove(0).message
}

#[test]
fn chunk_size_payload_is_a_big_endian_integer() {
    let message = decode_one(type_code::CHUNK_SIZE, 0, &[0x00, 0x00, 0x10, 0x00]);
    assert_eq!(message, Message::ChunkSize(4096));
}

#[test]
fn stream_bytes_read_payload_is_a_counter() {
    let message = decode_one(type_code::STREAM_BYTES_READ, 0, &[0x00, 0x01, 0x00, 0x00]);
    assert_eq!(message, Message::StreamBytesRead(65_536));
}

#[test]
fn ping_decodes_two_or_three_fields() {
    let message = decode_one(type_code::PING, 0, &[0x00, 0x06, 0x00, 0x00, 0x00, 0x2A]);
    assert_eq!(
        message,
        Message::Ping(PingMessage {
            event: 6,
            value: 42,
            extra: None,
        })
    );

    let message = decode_one(
        type_code::PING,
        0,
        &[0x00, 0x07, 0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x09],
    );
    assert_eq!(
        message,
        Message::Ping(PingMessage {
            event: 7,
            value: 42,
            extra: Some(9),
        })
    );
}

#[test]
fn notify_on_the_control_stream_is_a_call() {
    let mut payload = BytesMut::new();
    TestCodec
        .write_string_value(&mut payload, "onMetaData")
        .expect("writable value");
    TestCodec
        .write_number_value(&mut payload, 0.0)
        .expect("writable value");

    let message = decode_one(type_code::NOTIFY, 0, &payload);
    let Message::Notify(command) = message else {
        panic!("stream id 0 keeps the notification a call");
    };
    assert!(command.call.service_name.is_none());
    assert_eq!(command.call.method_name, "onMetaData");
    assert!(command.connection_params.is_none());
    assert!(command.call.arguments.is_empty());
}

#[test]
fn notify_on_a_stream_becomes_opaque_metadata() {
    // Same payload bytes as a call — the stream id alone flips the meaning.
    let mut payload = BytesMut::new();
    TestCodec
        .write_string_value(&mut payload, "onMetaData")
        .expect("writable value");
    TestCodec
        .write_number_value(&mut payload, 0.0)
        .expect("writable value");

    let message = decode_one(type_code::NOTIFY, 5, &payload);
    let Message::StreamMetadata(data) = message else {
        panic!("stream id 5 reinterprets the notification");
    };
    assert_eq!(&data[..], &payload[..], "metadata is carried unparsed");
}

#[test]
fn invoke_with_params_and_arguments() {
    let mut payload = BytesMut::new();
    TestCodec
        .write_string_value(&mut payload, "connect")
        .expect("writable value");
    TestCodec
        .write_number_value(&mut payload, 1.0)
        .expect("writable value");
    TestCodec
        .write_value(
            &mut payload,
            &TestValue::Map(vec![("app".to_owned(), TestValue::from("demo"))]),
        )
        .expect("writable value");
    TestCodec
        .write_value(&mut payload, &TestValue::from(true))
        .expect("writable value");

    let message = decode_one(type_code::INVOKE, 0, &payload);
    let Message::Invoke(command) = message else {
        panic!("expected an invoke");
    };
    assert_eq!(command.invoke_id, 1);
    assert_eq!(
        command.connection_params,
        Some(TestValue::Map(vec![(
            "app".to_owned(),
            TestValue::from("demo")
        )]))
    );
    assert_eq!(command.call.arguments, vec![TestValue::from(true)]);
}

#[test]
fn invoke_with_a_non_string_action_is_a_protocol_error() {
    let mut state = established_server();
    let mut payload = BytesMut::new();
    TestCodec
        .write_number_value(&mut payload, 3.0)
        .expect("writable value");

    let header = ChunkHeader {
        channel_id: 3,
        timestamp: 0,
        size: u32::try_from(payload.len()).expect("small payload"),
        type_code: type_code::INVOKE,
        stream_id: 0,
    };
    let mut wire = BytesMut::new();
    chunk::encode(&mut wire, &header, HeaderClass::New).expect("encodable header");
    wire.put_slice(&payload);

    let mut input = BytesMut::from(&wire[..]);
    decoder()
        .decode_buffer(&mut state, &mut input)
        .expect_err("a numeric action name is malformed");
}

fn shared_object_prelude(name: &str, version: u32, flags: u32) -> BytesMut {
    let mut payload = BytesMut::new();
    TestCodec
        .write_bare_string(&mut payload, name)
        .expect("writable name");
    payload.put_u32(version);
    payload.put_u32(flags);
    payload.put_bytes(0, 4);
    payload
}

#[test]
fn shared_object_batch_decodes_every_event_shape() {
    let mut payload = shared_object_prelude("room", 7, 2);

    // Keyless event: connect, declared length zero.
    payload.put_u8(event_tag::CONNECT);
    payload.put_u32(0);

    // Key-only event: delete-attribute.
    let mut body = BytesMut::new();
    TestCodec
        .write_bare_string(&mut body, "stale")
        .expect("writable key");
    payload.put_u8(event_tag::DELETE_ATTRIBUTE);
    payload.put_u32(u32::try_from(body.len()).expect("short body"));
    payload.put_slice(&body);

    // Key-and-value event: set-attribute.
    let mut body = BytesMut::new();
    TestCodec
        .write_bare_string(&mut body, "count")
        .expect("writable key");
    TestCodec
        .write_value(&mut body, &TestValue::from(3.0))
        .expect("writable value");
    payload.put_u8(event_tag::SET_ATTRIBUTE);
    payload.put_u32(u32::try_from(body.len()).expect("short body"));
    payload.put_slice(&body);

    let message = decode_one(type_code::SHARED_OBJECT, 0, &payload);
    let Message::SharedObject(batch) = message else {
        panic!("expected a shared-object batch");
    };
    assert_eq!(batch.name, "room");
    assert_eq!(batch.version, 7);
    assert!(batch.is_persistent());
    assert_eq!(batch.events.len(), 3);

    assert_eq!(batch.events[0].event_type, SharedObjectEventType::Connect);
    assert!(batch.events[0].key.is_none());
    assert_eq!(batch.events[0].value, SharedObjectValue::None);

    assert_eq!(
        batch.events[1].event_type,
        SharedObjectEventType::DeleteAttribute
    );
    assert_eq!(batch.events[1].key.as_deref(), Some("stale"));
    assert_eq!(batch.events[1].value, SharedObjectValue::None);

    assert_eq!(batch.events[2].event_type, SharedObjectEventType::SetAttribute);
    assert_eq!(batch.events[2].key.as_deref(), Some("count"));
    assert_eq!(
        batch.events[2].value,
        SharedObjectValue::Single(TestValue::from(3.0))
    );
}

#[test]
fn send_message_consumes_exactly_its_declared_length() {
    let mut payload = shared_object_prelude("room", 1, 0);

    // Handler name as a tagged value, then two arguments.
    let mut body = BytesMut::new();
    TestCodec
        .write_string_value(&mut body, "broadcast")
        .expect("writable handler");
    TestCodec
        .write_value(&mut body, &TestValue::from("hello"))
        .expect("writable argument");
    TestCodec
        .write_value(&mut body, &TestValue::from(2.0))
        .expect("writable argument");
    payload.put_u8(event_tag::SEND_MESSAGE);
    payload.put_u32(u32::try_from(body.len()).expect("short body"));
    payload.put_slice(&body);

    // A trailing event after the declared length must survive untouched.
    payload.put_u8(event_tag::CLEAR);
    payload.put_u32(0);

    let message = decode_one(type_code::SHARED_OBJECT, 0, &payload);
    let Message::SharedObject(batch) = message else {
        panic!("expected a shared-object batch");
    };
    assert_eq!(batch.events.len(), 2, "bytes beyond L belong to the next event");

    let send = &batch.events[0];
    assert_eq!(send.event_type, SharedObjectEventType::SendMessage);
    assert_eq!(send.key.as_deref(), Some("broadcast"));
    assert_eq!(
        send.value,
        SharedObjectValue::List(vec![TestValue::from("hello"), TestValue::from(2.0)])
    );

    assert_eq!(batch.events[1].event_type, SharedObjectEventType::Clear);
}

#[test]
fn audio_and_video_payloads_are_sealed_and_unparsed() {
    let media = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01];

    let Message::Audio(audio) = decode_one(type_code::AUDIO_DATA, 1, &media) else {
        panic!("expected audio");
    };
    assert_eq!(&audio[..], media);

    let Message::Video(video) = decode_one(type_code::VIDEO_DATA, 1, &media) else {
        panic!("expected video");
    };
    assert_eq!(&video[..], media);
}
