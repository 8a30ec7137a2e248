//! Data models for the kode-share backend.
//!
//! Field names follow the persisted JSON document so records round-trip unchanged.

mod document;
mod file;
mod snippet;

pub use document::*;
pub use file::*;
pub use snippet::*;
