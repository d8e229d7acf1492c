//! Codec for the metadata envelopes of the Sheaf columnar container.
//!
//! A Sheaf dataset stores its raw column pages separately from the
//! metadata that describes them. This crate serializes and deserializes
//! that metadata: the **header** envelope (the schema of fields and
//! columns), the **footer** envelope (cluster summaries and pointers to
//! page lists), **page-list** envelopes (per-cluster-group lists of
//! column pages), and the compact per-cluster envelope.
//!
//! Everything on the wire is little-endian and framed: envelopes carry a
//! version preamble and a trailing CRC32, and their bodies are built from
//! record and list frames whose signed size word encodes both the frame
//! kind and its length. During header serialization every field, column,
//! and cluster is assigned a dense *physical* ID; the resulting
//! [`StreamerContext`] threads those assignments into the page-list and
//! footer passes.
//!
//! All serializers write through a [`WriteCursor`], which is either a real
//! byte buffer or a counting sink — the counting mode returns exactly the
//! byte count a subsequent write would produce, supporting the two-pass
//! size-then-write usage pattern.

mod context;
mod descriptor;
mod envelope;
mod flags;
mod frame;
mod locator;
mod record;
mod schema;
mod serialize;
mod wire;

pub use context::*;
pub use descriptor::*;
pub use envelope::*;
pub use flags::*;
pub use frame::*;
pub use locator::*;
pub use record::*;
pub use schema::*;
pub use serialize::*;
pub use wire::*;
