//! XML plumbing shared by the decoder and the encoder.
//!
//! - [`charset`] - the single-byte encoding TISS files are written in
//! - [`element`] - in-memory element tree for generated documents, its
//!   text content (hash input) and its indented serialization

pub mod charset;
pub mod element;

pub use element::{to_bytes, Element};
