//! Byte-level key encodings.
//!
//! These are pure functions of their input: identical bytes always encode to
//! identical text, which is what lets a `did:key` created on one machine
//! resolve to the same key bytes on another.

mod jwk;
pub mod multibase;
pub mod multicodec;

pub use jwk::Jwk;
