//! Compressed per-chunk header codec.
//!
//! Every chunk opens with a one-to-three byte channel marker followed by a
//! header body whose length depends on the header class. The class decides
//! which fields are explicit and which are borrowed from the channel's
//! previous header, so both directions keep a per-channel header cache.

pub mod class;
pub mod header;

pub use class::HeaderClass;
pub use header::{
    ChunkHeader,
    channel_id_width,
    encode,
    encode_continuation,
    encoded_channel_width,
    header_len,
    peek_channel_id,
    select_class,
    try_decode,
};
