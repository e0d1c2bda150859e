//! # Boundary Formats
//!
//! Typed decoding of upstream payloads into engine snapshots.
//!
//! Upstream services speak camelCase JSON with a few loosely typed fields
//! (`isPremium` as a string, `benefits` as JSON inside a string). Those are
//! decoded here, once, into strongly typed values. Nothing past this module
//! sees the raw wire form.

mod wire;

pub use wire::*;
