//! Transformation module.
//!
//! This module handles XTE <-> table conversion:
//! - Decoder: XTE document to flat rows
//! - Grouper: flat rows back to claims
//! - Encoder: flat rows to XTE documents
//! - Pipeline: batch orchestration shared by the CLI and the server

pub mod decoder;
pub mod encoder;
pub mod grouper;
pub mod pipeline;

pub use decoder::decode;
pub use encoder::{encode, ArtifactKind, Artifacts};
pub use pipeline::*;
