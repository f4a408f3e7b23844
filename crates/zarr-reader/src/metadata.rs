//! Array metadata records (`.zarray`) and the chunk layout derived from them.

use serde::Deserialize;

use mesh_common::{MeshError, MeshResult};

/// Compressor entry of a `.zarray` record.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompressorMetadata {
    pub id: String,
}

/// Parsed `.zarray` record.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayMetadata {
    pub shape: Vec<u64>,
    #[serde(default)]
    pub chunks: Option<Vec<u64>>,
    pub dtype: String,
    #[serde(default)]
    pub compressor: Option<CompressorMetadata>,
    #[serde(default)]
    pub fill_value: Option<serde_json::Value>,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_separator")]
    pub dimension_separator: String,
}

fn default_order() -> String {
    "C".to_string()
}

fn default_separator() -> String {
    ".".to_string()
}

impl ArrayMetadata {
    pub fn parse(bytes: &[u8]) -> MeshResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Total number of elements, or `None` if it overflows.
    pub fn element_count(&self) -> Option<u64> {
        checked_product(&self.shape)
    }

    /// Chunk shape; defaults to the full shape when absent.
    pub fn chunk_shape(&self) -> &[u64] {
        self.chunks.as_deref().unwrap_or(&self.shape)
    }

    pub fn element_type(&self) -> MeshResult<ElementType> {
        ElementType::parse(&self.dtype)
    }

    /// Numeric fill value for chunks that were never written.
    pub fn fill_value_f64(&self) -> Option<f64> {
        match self.fill_value.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => match s.as_str() {
                "NaN" => Some(f64::NAN),
                "Infinity" => Some(f64::INFINITY),
                "-Infinity" => Some(f64::NEG_INFINITY),
                _ => None,
            },
            _ => None,
        }
    }

    /// Chunk layout along the first axis.
    ///
    /// Only chunking along the slowest axis is supported: every trailing
    /// chunk extent must cover its full dimension.
    pub fn layout(&self) -> MeshResult<ChunkLayout> {
        if self.shape.is_empty() {
            return Err(MeshError::unsupported("zero-dimensional arrays are not supported"));
        }

        let chunks = self.chunk_shape();
        if chunks.len() != self.shape.len() {
            return Err(MeshError::unsupported(format!(
                "chunk rank {} does not match array rank {}",
                chunks.len(),
                self.shape.len()
            )));
        }

        if self.shape.len() > 1 && self.order != "C" {
            return Err(MeshError::unsupported(format!(
                "order '{}' is not supported for multi-dimensional arrays",
                self.order
            )));
        }

        if chunks[1..] != self.shape[1..] {
            return Err(MeshError::unsupported(format!(
                "chunks {:?} split trailing dimensions of shape {:?}",
                chunks, self.shape
            )));
        }

        if chunks[0] == 0 && self.shape[0] != 0 {
            return Err(MeshError::unsupported("chunk length must be positive"));
        }

        let too_large =
            || MeshError::unsupported(format!("array shape {:?} is too large", self.shape));
        let total = self.element_count().ok_or_else(too_large)?;
        let row = checked_product(&self.shape[1..]).ok_or_else(too_large)?;
        let chunk = chunks[0].checked_mul(row).ok_or_else(too_large)?;
        Ok(ChunkLayout {
            total_length: to_usize(total)?,
            chunk_length: to_usize(chunk)?,
            trailing_rank: self.shape.len() - 1,
            separator: self.dimension_separator.clone(),
        })
    }
}

fn checked_product(dims: &[u64]) -> Option<u64> {
    dims.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
}

fn to_usize(v: u64) -> MeshResult<usize> {
    usize::try_from(v).map_err(|_| MeshError::unsupported(format!("array too large: {}", v)))
}

/// How a flattened array splits into chunk files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Elements in the whole array.
    pub total_length: usize,
    /// Elements in one full chunk.
    pub chunk_length: usize,
    trailing_rank: usize,
    separator: String,
}

impl ChunkLayout {
    pub fn chunk_count(&self) -> usize {
        if self.chunk_length == 0 {
            return 0;
        }
        self.total_length.div_ceil(self.chunk_length)
    }

    /// Logical element count of chunk `k`; the final chunk may be shorter.
    pub fn chunk_elements(&self, k: usize) -> usize {
        self.chunk_length
            .min(self.total_length.saturating_sub(k * self.chunk_length))
    }

    /// Store key of chunk `k` relative to the array directory.
    pub fn chunk_key(&self, k: usize) -> String {
        let mut key = k.to_string();
        for _ in 0..self.trailing_rank {
            key.push_str(&self.separator);
            key.push('0');
        }
        key
    }
}

/// Element kind of a dtype code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Float,
    Int,
    UInt,
}

/// Parsed dtype such as `<f8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementType {
    pub kind: ElementKind,
    pub width: usize,
    pub big_endian: bool,
}

impl ElementType {
    /// Parse a two-character-prefixed dtype code (byte order, kind, width).
    pub fn parse(code: &str) -> MeshResult<Self> {
        let mut chars = code.chars();
        let order = chars.next();
        let kind = chars.next();
        let width: Option<usize> = chars.as_str().parse().ok();

        let big_endian = match order {
            Some('<') | Some('|') => false,
            Some('>') => true,
            _ => return Err(MeshError::unsupported(format!("dtype '{}'", code))),
        };
        let kind = match kind {
            Some('f') => ElementKind::Float,
            Some('i') => ElementKind::Int,
            Some('u') => ElementKind::UInt,
            _ => return Err(MeshError::unsupported(format!("dtype '{}'", code))),
        };
        let width = match (kind, width) {
            (ElementKind::Float, Some(w @ (4 | 8))) => w,
            (ElementKind::Int | ElementKind::UInt, Some(w @ (1 | 2 | 4 | 8))) => w,
            _ => return Err(MeshError::unsupported(format!("dtype '{}'", code))),
        };

        Ok(Self {
            kind,
            width,
            big_endian,
        })
    }

    /// Encode a fill value in this element type.
    pub fn encode(&self, value: f64) -> Vec<u8> {
        let mut bytes = match (self.kind, self.width) {
            (ElementKind::Float, 4) => (value as f32).to_le_bytes().to_vec(),
            (ElementKind::Float, _) => value.to_le_bytes().to_vec(),
            (ElementKind::Int, _) => (value as i64).to_le_bytes()[..self.width].to_vec(),
            (ElementKind::UInt, _) => (value as u64).to_le_bytes()[..self.width].to_vec(),
        };
        if self.big_endian {
            bytes.reverse();
        }
        bytes
    }

    /// Convert encoded floating-point elements to `f64`.
    ///
    /// 8-byte floats are reinterpreted, 4-byte floats widened; anything else
    /// is `UnsupportedFormat`.
    pub fn to_f64(&self, bytes: &[u8]) -> MeshResult<Vec<f64>> {
        let be = self.big_endian;
        match (self.kind, self.width) {
            (ElementKind::Float, 8) => Ok(bytes
                .chunks_exact(8)
                .map(|b| {
                    let b: [u8; 8] = b.try_into().unwrap_or_default();
                    if be {
                        f64::from_be_bytes(b)
                    } else {
                        f64::from_le_bytes(b)
                    }
                })
                .collect()),
            (ElementKind::Float, 4) => Ok(bytes
                .chunks_exact(4)
                .map(|b| {
                    let b: [u8; 4] = b.try_into().unwrap_or_default();
                    let v = if be {
                        f32::from_be_bytes(b)
                    } else {
                        f32::from_le_bytes(b)
                    };
                    v as f64
                })
                .collect()),
            _ => Err(MeshError::unsupported(format!(
                "{:?}{} cannot be read as floating point",
                self.kind, self.width
            ))),
        }
    }

    /// Convert encoded integer elements to `i64`.
    pub fn to_i64(&self, bytes: &[u8]) -> MeshResult<Vec<i64>> {
        if self.kind == ElementKind::Float {
            return Err(MeshError::unsupported(format!(
                "float{} cannot be read as integer",
                self.width * 8
            )));
        }
        let signed = self.kind == ElementKind::Int;
        let width = self.width;
        let be = self.big_endian;

        let mut out = Vec::with_capacity(bytes.len() / width);
        for chunk in bytes.chunks_exact(width) {
            let mut buf = [0u8; 8];
            if be {
                for (i, &b) in chunk.iter().rev().enumerate() {
                    buf[i] = b;
                }
            } else {
                buf[..width].copy_from_slice(chunk);
            }
            // sign-extend
            if signed && buf[width - 1] & 0x80 != 0 {
                for b in buf.iter_mut().skip(width) {
                    *b = 0xff;
                }
            }
            let v = i64::from_le_bytes(buf);
            if !signed && width == 8 && v < 0 {
                return Err(MeshError::unsupported("uint64 value exceeds i64 range"));
            }
            out.push(v);
        }
        Ok(out)
    }
}
