//! Engine for a chunked, multiplexed binary streaming protocol.
//!
//! One persistent connection carries remote invocations, shared-object
//! synchronization batches, and timestamped media payloads, multiplexed as
//! interleaved chunks on integer-identified channels. This crate implements
//! the wire engine: the handshake state machine, the delta-compressed chunk
//! header codec, per-channel packet reassembly, typed message dispatch, and
//! the symmetric outbound path.
//!
//! The engine is synchronous and never blocks — running out of input is a
//! normal outcome carrying the exact byte requirement, and the caller
//! re-invokes once more bytes arrive. [`connection::Connection`] wraps that
//! loop around any `tokio` byte stream for callers who want the buffering
//! handled for them.

pub mod buffer;
pub mod byte_order;
pub mod chunk;
pub mod codec;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod message;
pub mod value;

pub use buffer::ByteCursor;
pub use chunk::{ChunkHeader, HeaderClass};
pub use codec::{DEFAULT_CHUNK_SIZE, DecodeRun, Decoder, Encoder, ProtocolState};
pub use connection::{Connection, ConnectionError};
pub use error::{EncodeError, ProtocolError};
pub use handshake::{HANDSHAKE_SIZE, Handshake, Role};
pub use message::{CommandCall, Message, Packet, PingMessage, ServiceCall};
pub use value::{ValueCodec, ValueCodecError};
