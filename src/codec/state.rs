//! Mutable per-connection protocol state.
//!
//! One instance per connection, owned by whoever drives the engine. The
//! decode path mutates the handshake, the read-side header cache, and the
//! in-progress packet map; the encode path mutates the write-side cache and
//! chunk size. Channel state is two plain integer-keyed maps — the header
//! cache survives packet completion, the in-progress entry does not.

use std::collections::HashMap;

use bytes::BytesMut;

use crate::chunk::ChunkHeader;
use crate::handshake::{Handshake, Role};

/// Chunk size both directions start from before any chunk-size message.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// A packet being accumulated chunk by chunk.
#[derive(Debug)]
pub(crate) struct InboundPacket {
    header: ChunkHeader,
    buffer: BytesMut,
}

impl InboundPacket {
    pub(crate) fn new(header: ChunkHeader) -> Self {
        Self {
            header,
            buffer: BytesMut::with_capacity(header.size as usize),
        }
    }

    /// Header of the chunk that opened the packet.
    pub(crate) const fn header(&self) -> &ChunkHeader {
        &self.header
    }

    /// Bytes still missing from the declared payload size.
    pub(crate) fn remaining(&self) -> usize {
        (self.header.size as usize).saturating_sub(self.buffer.len())
    }

    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        debug_assert!(chunk.len() <= self.remaining(), "payload overrun");
        self.buffer.extend_from_slice(chunk);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.buffer.len() >= self.header.size as usize
    }

    pub(crate) fn into_parts(self) -> (ChunkHeader, BytesMut) {
        (self.header, self.buffer)
    }
}

/// Connection-scoped protocol state record.
#[derive(Debug)]
pub struct ProtocolState {
    handshake: Handshake,
    read_chunk_size: usize,
    write_chunk_size: usize,
    last_read_headers: HashMap<u32, ChunkHeader>,
    last_write_headers: HashMap<u32, ChunkHeader>,
    in_progress: HashMap<u32, InboundPacket>,
    /// Bytes the pending decode step needs before it can run.
    required: usize,
}

impl ProtocolState {
    /// Fresh state for a new connection playing `role`.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            handshake: Handshake::new(role),
            read_chunk_size: DEFAULT_CHUNK_SIZE,
            write_chunk_size: DEFAULT_CHUNK_SIZE,
            last_read_headers: HashMap::new(),
            last_write_headers: HashMap::new(),
            in_progress: HashMap::new(),
            required: 0,
        }
    }

    /// The side this connection plays.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.handshake.role()
    }

    /// Handshake progress for this connection.
    #[must_use]
    pub const fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub(crate) const fn handshake_mut(&mut self) -> &mut Handshake {
        &mut self.handshake
    }

    /// Chunk size applied to inbound reassembly.
    #[must_use]
    pub const fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }

    /// Chunk size applied when splitting outbound packets.
    #[must_use]
    pub const fn write_chunk_size(&self) -> usize {
        self.write_chunk_size
    }

    pub(crate) const fn set_read_chunk_size(&mut self, size: usize) {
        self.read_chunk_size = size;
    }

    pub(crate) const fn set_write_chunk_size(&mut self, size: usize) {
        self.write_chunk_size = size;
    }

    /// Whether any channel holds a partially reassembled packet.
    #[must_use]
    pub fn has_in_progress(&self) -> bool {
        !self.in_progress.is_empty()
    }

    pub(crate) fn last_read_header(&self, channel_id: u32) -> Option<&ChunkHeader> {
        self.last_read_headers.get(&channel_id)
    }

    pub(crate) fn cache_read_header(&mut self, header: ChunkHeader) {
        self.last_read_headers.insert(header.channel_id, header);
    }

    pub(crate) fn last_write_header(&self, channel_id: u32) -> Option<&ChunkHeader> {
        self.last_write_headers.get(&channel_id)
    }

    pub(crate) fn cache_write_header(&mut self, header: ChunkHeader) {
        self.last_write_headers.insert(header.channel_id, header);
    }

    pub(crate) fn in_progress_mut(&mut self, channel_id: u32) -> Option<&mut InboundPacket> {
        self.in_progress.get_mut(&channel_id)
    }

    pub(crate) fn start_packet(&mut self, packet: InboundPacket) {
        self.in_progress.insert(packet.header().channel_id, packet);
    }

    pub(crate) fn take_packet(&mut self, channel_id: u32) -> Option<InboundPacket> {
        self.in_progress.remove(&channel_id)
    }

    /// Bytes the decoder needs before its next step can run.
    pub(crate) const fn requirement(&self) -> usize {
        self.required
    }

    pub(crate) const fn require(&mut self, bytes: usize) {
        self.required = bytes;
    }

    pub(crate) const fn begin_step(&mut self) {
        self.required = 0;
    }
}
