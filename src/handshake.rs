//! Fixed-size handshake exchanged before chunked communication begins.
//!
//! Both peers trade opaque blobs of [`HANDSHAKE_SIZE`] bytes behind a single
//! version byte. The engine validates nothing but sizes: the blob is copied
//! verbatim as an echo for the peer and otherwise discarded. Until the state
//! machine reaches `Established`, no chunk decoding takes place.

use bytes::{BufMut, Bytes, BytesMut};

use crate::buffer::ByteCursor;

/// Size of one handshake blob in bytes.
pub const HANDSHAKE_SIZE: usize = 1536;

/// Version marker leading each handshake message.
pub const PROTOCOL_VERSION: u8 = 0x03;

/// Which side of the connection this engine instance plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Accepting side: waits for the peer's init blob.
    Server,
    /// Initiating side: sends the first blob and consumes the double reply.
    Client,
}

/// Handshake progression. `Established` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    AwaitingInit,
    AwaitingAck,
    Established,
}

/// Outcome of one handshake decode attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum HandshakeStep {
    /// Not enough bytes for the current phase; nothing was consumed.
    Incomplete {
        /// Total bytes the phase requires from the current position.
        required: usize,
    },
    /// The init blob was consumed; `echo` must be sent back to the peer.
    Echo(Bytes),
    /// The final ack was consumed (or the handshake had already finished).
    Established,
}

/// Handshake state machine for one connection.
#[derive(Clone, Debug)]
pub struct Handshake {
    role: Role,
    phase: Phase,
}

impl Handshake {
    /// Start a handshake in the initial phase for `role`.
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self {
            role,
            phase: Phase::AwaitingInit,
        }
    }

    /// The side this state machine was created for.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Whether chunk decoding may begin.
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self.phase, Phase::Established)
    }

    /// Consume handshake bytes for the current phase.
    ///
    /// Either the phase's full requirement is available and consumed, or the
    /// cursor is left untouched and the requirement reported.
    pub(crate) fn advance(&mut self, cursor: &mut ByteCursor<'_>) -> HandshakeStep {
        match (self.role, self.phase) {
            (Role::Server, Phase::AwaitingInit) => {
                let required = 1 + HANDSHAKE_SIZE;
                if cursor.remaining() < required {
                    return self.insufficient(cursor, required);
                }
                let _ = cursor.skip(1);
                let echo = take_blob(cursor);
                self.phase = Phase::AwaitingAck;
                HandshakeStep::Echo(echo)
            }
            (Role::Server, Phase::AwaitingAck) => {
                let Some(()) = cursor.skip(HANDSHAKE_SIZE) else {
                    return self.insufficient(cursor, HANDSHAKE_SIZE);
                };
                self.phase = Phase::Established;
                HandshakeStep::Established
            }
            (Role::Client, Phase::AwaitingInit) => {
                let required = 1 + 2 * HANDSHAKE_SIZE;
                if cursor.remaining() < required {
                    return self.insufficient(cursor, required);
                }
                // Version byte, peer blob to echo, then our blob reflected
                // back; only the echo is kept.
                let _ = cursor.skip(1);
                let echo = take_blob(cursor);
                let _ = cursor.skip(HANDSHAKE_SIZE);
                self.phase = Phase::Established;
                HandshakeStep::Echo(echo)
            }
            (_, _) => HandshakeStep::Established,
        }
    }

    fn insufficient(&self, cursor: &mut ByteCursor<'_>, required: usize) -> HandshakeStep {
        tracing::debug!(
            role = ?self.role,
            phase = ?self.phase,
            remaining = cursor.remaining(),
            required,
            "handshake needs more bytes",
        );
        HandshakeStep::Incomplete { required }
    }
}

fn take_blob(cursor: &mut ByteCursor<'_>) -> Bytes {
    // Callers verify the blob is fully buffered before consuming anything.
    let blob = cursor.take(HANDSHAKE_SIZE).unwrap_or_default();
    Bytes::copy_from_slice(blob)
}

/// Build the server's reply to a client init: version byte, a zeroed local
/// blob, then the client's blob echoed verbatim.
#[must_use]
pub fn server_response(echo: &[u8]) -> Bytes {
    debug_assert_eq!(echo.len(), HANDSHAKE_SIZE, "echo must be one blob");
    let mut out = BytesMut::with_capacity(1 + HANDSHAKE_SIZE + echo.len());
    out.put_u8(PROTOCOL_VERSION);
    out.put_bytes(0, HANDSHAKE_SIZE);
    out.put_slice(echo);
    out.freeze()
}

/// Build the client's opening message: version byte plus a blob of seed
/// bytes for the server to echo.
#[must_use]
pub fn client_request(seed: &[u8]) -> Bytes {
    debug_assert_eq!(seed.len(), HANDSHAKE_SIZE, "seed must be one blob");
    let mut out = BytesMut::with_capacity(1 + seed.len());
    out.put_u8(PROTOCOL_VERSION);
    out.put_slice(seed);
    out.freeze()
}
