//! Shared helpers for the integration tests.
#![allow(dead_code)]

use bytes::{BufMut, BytesMut};
use chunkwire::codec::{Decoder, Encoder, ProtocolState};
use chunkwire::handshake::{HANDSHAKE_SIZE, PROTOCOL_VERSION, Role};
use chunkwire_testing::TestCodec;

#[must_use]
pub fn decoder() -> Decoder<TestCodec> {
    Decoder::new(TestCodec)
}

#[must_use]
pub fn encoder() -> Encoder<TestCodec> {
    Encoder::new(TestCodec)
}

/// Server-side protocol state that has completed its handshake.
#[must_use]
pub fn established_server() -> ProtocolState {
    let mut state = ProtocolState::new(Role::Server);

    let mut init = BytesMut::new();
    init.put_u8(PROTOCOL_VERSION);
    init.put_bytes(0x33, HANDSHAKE_SIZE);
    decoder()
        .decode_buffer(&mut state, &mut init)
        .expect("handshake init decodes");

    let mut ack = BytesMut::new();
    ack.put_bytes(0x00, HANDSHAKE_SIZE);
    decoder()
        .decode_buffer(&mut state, &mut ack)
        .expect("handshake ack decodes");
    assert!(state.handshake().is_established());
    state
}
