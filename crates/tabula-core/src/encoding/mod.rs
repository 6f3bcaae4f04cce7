//! Record codec: fixed-width packing of tuples into byte records.
//!
//! Integers are big-endian; `f32`/`f64` are IEEE-754 bit patterns in
//! little-endian byte order. The asymmetry is part of the record format's
//! round-trip contract and is pinned byte-for-byte by the tests in
//! [`record`].

pub mod record;

pub use record::{pack_tuple, pack_value, unpack_tuple, unpack_value};

/// Packed width of a `Str` field: the value's bytes followed by NUL padding.
pub const STR_FIELD_LEN: usize = 64;
