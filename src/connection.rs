//! Async driver that feeds a byte stream through the engine.
//!
//! The engine itself never touches a socket; this module supplies the caller
//! loop the protocol expects — append arriving bytes, re-invoke the decoder,
//! answer handshakes, write encoded packets. One task per connection, no
//! sharing: everything here is owned by the [`Connection`].

use std::collections::VecDeque;
use std::io;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{Decoder, Encoder, ProtocolState};
use crate::error::{EncodeError, ProtocolError};
use crate::handshake::{self, Role};
use crate::message::Packet;
use crate::value::ValueCodec;

const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Failures observed while driving a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The peer violated the protocol; the connection must be closed.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    /// An outbound message could not be encoded.
    #[error("encode failure: {0}")]
    Encode(#[from] EncodeError),
    /// The transport failed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The peer closed the stream in the middle of a handshake or packet.
    #[error("stream ended mid-message")]
    TruncatedStream,
}

/// One protocol connection over an async byte stream.
pub struct Connection<T, C: ValueCodec> {
    io: T,
    state: ProtocolState,
    decoder: Decoder<C>,
    encoder: Encoder<C>,
    inbound: BytesMut,
    ready: VecDeque<Packet<C::Value>>,
}

impl<T, C> Connection<T, C>
where
    T: AsyncRead + AsyncWrite + Unpin,
    C: ValueCodec,
{
    /// Wrap `io` with fresh protocol state for `role`.
    pub fn new(io: T, role: Role, decoder: Decoder<C>, encoder: Encoder<C>) -> Self {
        Self {
            io,
            state: ProtocolState::new(role),
            decoder,
            encoder,
            inbound: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            ready: VecDeque::new(),
        }
    }

    /// Protocol state for inspection (chunk sizes, handshake progress).
    pub const fn state(&self) -> &ProtocolState {
        &self.state
    }

    /// Open a client connection by sending the handshake request.
    ///
    /// `seed` is the opaque blob the server will echo; it must be
    /// [`handshake::HANDSHAKE_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the transport write fails.
    pub async fn start(&mut self, seed: &[u8]) -> Result<(), ConnectionError> {
        let request = handshake::client_request(seed);
        self.io.write_all(&request).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Drive the stream until the handshake is established.
    ///
    /// Packets that arrive pipelined behind the handshake are queued for
    /// [`recv`](Self::recv). Clients call this after
    /// [`start`](Self::start); servers may call it to gate on readiness but
    /// [`recv`](Self::recv) performs the same exchange on demand.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] on protocol violations, transport
    /// failures, or a stream that ends mid-handshake.
    pub async fn complete_handshake(&mut self) -> Result<(), ConnectionError> {
        while !self.state.handshake().is_established() {
            let run = self.decoder.decode_buffer(&mut self.state, &mut self.inbound)?;
            if let Some(echo) = run.handshake_echo {
                self.answer_handshake(echo).await?;
            }
            self.ready.extend(run.packets);
            if self.state.handshake().is_established() {
                break;
            }
            let read = self.io.read_buf(&mut self.inbound).await?;
            if read == 0 {
                return Err(ConnectionError::TruncatedStream);
            }
        }
        Ok(())
    }

    /// Receive the next complete packet.
    ///
    /// Handshake traffic is answered internally and never surfaces. Returns
    /// `Ok(None)` when the peer closes the stream at a packet boundary.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] on protocol violations, transport
    /// failures, or a stream that ends mid-packet.
    pub async fn recv(&mut self) -> Result<Option<Packet<C::Value>>, ConnectionError> {
        loop {
            if let Some(packet) = self.ready.pop_front() {
                return Ok(Some(packet));
            }

            let run = self.decoder.decode_buffer(&mut self.state, &mut self.inbound)?;
            if let Some(echo) = run.handshake_echo {
                self.answer_handshake(echo).await?;
            }
            self.ready.extend(run.packets);
            if !self.ready.is_empty() {
                continue;
            }

            let read = self.io.read_buf(&mut self.inbound).await?;
            if read == 0 {
                if self.inbound.is_empty() && !self.state.has_in_progress() {
                    return Ok(None);
                }
                return Err(ConnectionError::TruncatedStream);
            }
        }
    }

    async fn answer_handshake(&mut self, echo: bytes::Bytes) -> Result<(), ConnectionError> {
        let reply = match self.state.role() {
            Role::Server => handshake::server_response(&echo),
            // The client acknowledges by reflecting the blob as-is.
            Role::Client => echo,
        };
        self.io.write_all(&reply).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Encode and send one packet.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if encoding or the transport write
    /// fails.
    pub async fn send(&mut self, packet: &Packet<C::Value>) -> Result<(), ConnectionError> {
        let bytes = self.encoder.encode_packet(&mut self.state, packet)?;
        self.io.write_all(&bytes).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Tear the connection apart, returning the transport.
    pub fn into_inner(self) -> T {
        self.io
    }
}
