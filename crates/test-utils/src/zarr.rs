//! Writer for small zarr v2 stores used as test fixtures.
//!
//! Chunks are written the way zarr v2 writers do it: every chunk is encoded
//! at the full chunk length, so the final chunk is padded with zeros.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use serde_json::{json, Value};

/// Compressor used for every chunk of a fixture array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureCodec {
    Raw,
    Lz4,
    Blosc,
    Zlib,
    Gzip,
    /// Writes raw chunks but declares the given compressor id.
    Declared(&'static str),
}

/// One array to write into a fixture store.
#[derive(Debug, Clone)]
pub struct FixtureArray {
    pub name: String,
    pub shape: Vec<usize>,
    /// Chunk extent along the first axis.
    pub chunk_len: usize,
    pub dtype: String,
    /// Little-endian encoded elements, `shape.product()` of them.
    pub data: Vec<u8>,
    pub codec: FixtureCodec,
    pub attributes: Option<Value>,
    /// Chunk indices to leave unwritten.
    pub skip_chunks: Vec<usize>,
}

impl FixtureArray {
    pub fn f64(name: &str, shape: &[usize], chunk_len: usize, values: &[f64]) -> Self {
        Self::new(name, shape, chunk_len, "<f8", f64_bytes(values))
    }

    pub fn f32(name: &str, shape: &[usize], chunk_len: usize, values: &[f32]) -> Self {
        Self::new(name, shape, chunk_len, "<f4", f32_bytes(values))
    }

    pub fn i32(name: &str, shape: &[usize], chunk_len: usize, values: &[i32]) -> Self {
        Self::new(name, shape, chunk_len, "<i4", i32_bytes(values))
    }

    fn new(name: &str, shape: &[usize], chunk_len: usize, dtype: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            shape: shape.to_vec(),
            chunk_len,
            dtype: dtype.to_string(),
            data,
            codec: FixtureCodec::Raw,
            attributes: None,
            skip_chunks: Vec::new(),
        }
    }

    pub fn codec(mut self, codec: FixtureCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set `_ARRAY_DIMENSIONS`.
    pub fn dims(self, dims: &[&str]) -> Self {
        self.attr("_ARRAY_DIMENSIONS", json!(dims))
    }

    pub fn units(self, units: &str) -> Self {
        self.attr("units", json!(units))
    }

    pub fn attr(mut self, key: &str, value: Value) -> Self {
        let attrs = self.attributes.get_or_insert_with(|| json!({}));
        if let Value::Object(map) = attrs {
            map.insert(key.to_string(), value);
        }
        self
    }

    pub fn skip_chunk(mut self, k: usize) -> Self {
        self.skip_chunks.push(k);
        self
    }

    fn element_width(&self) -> usize {
        self.dtype[2..].parse().unwrap_or(8)
    }
}

/// A zarr v2 store rooted at a directory.
pub struct ZarrFixture {
    root: PathBuf,
}

impl ZarrFixture {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        std::fs::write(root.join(".zgroup"), br#"{"zarr_format":2}"#)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, array: &FixtureArray) -> Result<(), Box<dyn Error>> {
        let dir = self.root.join(&array.name);
        std::fs::create_dir_all(&dir)?;

        let mut chunks = array.shape.clone();
        chunks[0] = array.chunk_len;
        let compressor = match array.codec {
            FixtureCodec::Raw => Value::Null,
            FixtureCodec::Lz4 => json!({"id": "lz4", "acceleration": 1}),
            FixtureCodec::Blosc => {
                json!({"id": "blosc", "cname": "lz4", "clevel": 5, "shuffle": 1, "blocksize": 0})
            }
            FixtureCodec::Zlib => json!({"id": "zlib", "level": 1}),
            FixtureCodec::Gzip => json!({"id": "gzip", "level": 1}),
            FixtureCodec::Declared(id) => json!({ "id": id }),
        };
        let metadata = json!({
            "zarr_format": 2,
            "shape": array.shape,
            "chunks": chunks,
            "dtype": array.dtype,
            "compressor": compressor,
            "fill_value": 0,
            "order": "C",
            "filters": null,
        });
        std::fs::write(dir.join(".zarray"), serde_json::to_vec_pretty(&metadata)?)?;

        if let Some(attrs) = &array.attributes {
            std::fs::write(dir.join(".zattrs"), serde_json::to_vec_pretty(attrs)?)?;
        }

        let width = array.element_width();
        let row: usize = array.shape[1..].iter().product();
        let chunk_bytes = array.chunk_len * row * width;
        let trailing = ".0".repeat(array.shape.len() - 1);

        for (k, piece) in array.data.chunks(chunk_bytes.max(1)).enumerate() {
            if array.skip_chunks.contains(&k) {
                continue;
            }
            let mut padded = piece.to_vec();
            padded.resize(chunk_bytes, 0);
            let encoded = encode(array.codec, &padded, width)?;
            std::fs::write(dir.join(format!("{}{}", k, trailing)), encoded)?;
        }

        Ok(())
    }
}

fn encode(codec: FixtureCodec, data: &[u8], width: usize) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(match codec {
        FixtureCodec::Raw | FixtureCodec::Declared(_) => data.to_vec(),
        FixtureCodec::Lz4 => lz4_flex::block::compress_prepend_size(data),
        FixtureCodec::Blosc => zarr_reader::blosc::compress(data, width)?,
        FixtureCodec::Zlib => {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)?;
            enc.finish()?
        }
        FixtureCodec::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)?;
            enc.finish()?
        }
    })
}

pub fn f64_bytes(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
