//! Chunked array reader for zarr v2 stores.
//!
//! A store is a directory holding one sub-directory per array. Each array
//! carries a `.zarray` metadata record, an optional `.zattrs` record and one
//! file per chunk. Chunks are decoded independently and reassembled into a
//! single contiguous buffer:
//!
//! ```text
//! read_f64("lon")
//!      │
//!      ├─► parse .zarray  (shape, chunks, dtype, compressor)
//!      │
//!      ├─► for each chunk k (parallel over disjoint slices)
//!      │         ├─► fetch "lon/k"
//!      │         └─► Codec::decode_into(raw, &mut dest[k])
//!      │
//!      └─► widen dtype to f64
//! ```
//!
//! Any failure aborts the whole array read; partial buffers are dropped.

pub mod blosc;
pub mod codec;
pub mod metadata;
pub mod reader;
pub mod store;

pub use codec::Codec;
pub use metadata::{ArrayMetadata, ChunkLayout, CompressorMetadata, ElementKind, ElementType};
pub use reader::{ArrayInfo, ChunkedArrayReader};
pub use store::{ChunkSource, FilesystemChunkSource};
