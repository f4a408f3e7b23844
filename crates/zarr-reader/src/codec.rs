//! Uniform decode interface over the supported chunk compressors.
//!
//! Each codec reports the decoded size differently: lz4 frames carry a
//! 4-byte little-endian size prefix, blosc frames a self-describing header,
//! and zlib/gzip streams only reveal it once inflated. A chunk may decode to
//! more bytes than it logically holds (the final chunk of an array is stored
//! padded to the full chunk length); only the needed prefix is kept.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use mesh_common::{MeshError, MeshResult};

use crate::blosc;
use crate::metadata::CompressorMetadata;

/// Compressor identity of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Raw bytes.
    None,
    /// LZ4 block with a 4-byte little-endian uncompressed-size prefix.
    Lz4,
    /// Blosc frame.
    Blosc,
    /// zlib stream.
    Zlib,
    /// gzip stream.
    Gzip,
}

impl Codec {
    /// Resolve the compressor entry of a metadata record.
    pub fn from_metadata(compressor: Option<&CompressorMetadata>) -> MeshResult<Self> {
        match compressor {
            None => Ok(Codec::None),
            Some(c) => Self::from_id(&c.id),
        }
    }

    pub fn from_id(id: &str) -> MeshResult<Self> {
        match id {
            "lz4" => Ok(Codec::Lz4),
            "blosc" => Ok(Codec::Blosc),
            "zlib" => Ok(Codec::Zlib),
            "gzip" => Ok(Codec::Gzip),
            other => Err(MeshError::unsupported(format!("compressor '{}'", other))),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Codec::None => "none",
            Codec::Lz4 => "lz4",
            Codec::Blosc => "blosc",
            Codec::Zlib => "zlib",
            Codec::Gzip => "gzip",
        }
    }

    /// Decode `raw` into a new buffer of exactly `expected_len` bytes.
    pub fn decode(&self, raw: &[u8], expected_len: usize) -> MeshResult<Vec<u8>> {
        let mut out = vec![0u8; expected_len];
        self.decode_into(raw, &mut out)?;
        Ok(out)
    }

    /// Decode `raw` into `dest`, filling it completely.
    pub fn decode_into(&self, raw: &[u8], dest: &mut [u8]) -> MeshResult<()> {
        match self {
            Codec::None => copy_prefix(raw, dest, "raw chunk"),
            Codec::Lz4 => decode_lz4(raw, dest),
            Codec::Blosc => decode_blosc(raw, dest),
            Codec::Zlib => {
                let mut decoded = Vec::with_capacity(dest.len());
                ZlibDecoder::new(raw)
                    .read_to_end(&mut decoded)
                    .map_err(|e| MeshError::unsupported(format!("zlib: {}", e)))?;
                copy_prefix(&decoded, dest, "zlib chunk")
            }
            Codec::Gzip => {
                let mut decoded = Vec::with_capacity(dest.len());
                GzDecoder::new(raw)
                    .read_to_end(&mut decoded)
                    .map_err(|e| MeshError::unsupported(format!("gzip: {}", e)))?;
                copy_prefix(&decoded, dest, "gzip chunk")
            }
        }
    }
}

fn copy_prefix(decoded: &[u8], dest: &mut [u8], what: &str) -> MeshResult<()> {
    if decoded.len() < dest.len() {
        return Err(MeshError::unsupported(format!(
            "{} holds {} bytes, expected at least {}",
            what,
            decoded.len(),
            dest.len()
        )));
    }
    dest.copy_from_slice(&decoded[..dest.len()]);
    Ok(())
}

fn decode_lz4(raw: &[u8], dest: &mut [u8]) -> MeshResult<()> {
    if raw.len() < 4 {
        return Err(MeshError::unsupported(format!(
            "lz4 chunk of {} bytes has no size prefix",
            raw.len()
        )));
    }
    let (prefix, body) = raw.split_at(4);
    let declared = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;

    let decompress = |out: &mut [u8]| -> MeshResult<()> {
        let written = lz4_flex::block::decompress_into(body, out)
            .map_err(|e| MeshError::unsupported(format!("lz4: {}", e)))?;
        if written != out.len() {
            return Err(MeshError::unsupported(format!(
                "lz4 chunk declares {} bytes, decoded {}",
                out.len(),
                written
            )));
        }
        Ok(())
    };

    if declared == dest.len() {
        decompress(dest)
    } else if declared > dest.len() {
        let mut scratch = vec![0u8; declared];
        decompress(&mut scratch)?;
        dest.copy_from_slice(&scratch[..dest.len()]);
        Ok(())
    } else {
        Err(MeshError::unsupported(format!(
            "lz4 chunk declares {} bytes, expected at least {}",
            declared,
            dest.len()
        )))
    }
}

fn decode_blosc(raw: &[u8], dest: &mut [u8]) -> MeshResult<()> {
    let declared = blosc::decompressed_size(raw)?;
    if declared == dest.len() {
        blosc::decompress_into(raw, dest)
    } else if declared > dest.len() {
        // Only the final, shorter chunk gets here.
        let mut scratch = vec![0u8; declared];
        blosc::decompress_into(raw, &mut scratch)?;
        dest.copy_from_slice(&scratch[..dest.len()]);
        Ok(())
    } else {
        Err(MeshError::unsupported(format!(
            "blosc chunk declares {} bytes, expected at least {}",
            declared,
            dest.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn sample(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_from_metadata() {
        assert_eq!(Codec::from_metadata(None).unwrap(), Codec::None);
        let c = CompressorMetadata {
            id: "blosc".to_string(),
        };
        assert_eq!(Codec::from_metadata(Some(&c)).unwrap(), Codec::Blosc);
        let c = CompressorMetadata {
            id: "bz2".to_string(),
        };
        assert!(matches!(
            Codec::from_metadata(Some(&c)),
            Err(MeshError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_raw_truncates_to_expected() {
        let data = sample(100);
        assert_eq!(Codec::None.decode(&data, 40).unwrap(), data[..40].to_vec());
        assert!(Codec::None.decode(&data, 101).is_err());
    }

    #[test]
    fn test_lz4_exact_and_padded() {
        let data = sample(512);
        let frame = lz4_flex::block::compress_prepend_size(&data);
        assert_eq!(Codec::Lz4.decode(&frame, 512).unwrap(), data);
        assert_eq!(Codec::Lz4.decode(&frame, 100).unwrap(), data[..100].to_vec());
        assert!(Codec::Lz4.decode(&frame, 513).is_err());
    }

    #[test]
    fn test_lz4_short_payload() {
        assert!(matches!(
            Codec::Lz4.decode(&[1, 0], 4),
            Err(MeshError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_lz4_corrupt_body() {
        let mut frame = 64u32.to_le_bytes().to_vec();
        frame.extend_from_slice(&[0xff; 8]);
        assert!(Codec::Lz4.decode(&frame, 64).is_err());
    }

    #[test]
    fn test_blosc_padded() {
        let data = sample(800);
        let frame = blosc::compress(&data, 8).unwrap();
        assert_eq!(Codec::Blosc.decode(&frame, 800).unwrap(), data);
        assert_eq!(Codec::Blosc.decode(&frame, 16).unwrap(), data[..16].to_vec());
    }

    #[test]
    fn test_zlib() {
        let data = sample(300);
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&data).unwrap();
        let frame = enc.finish().unwrap();
        assert_eq!(Codec::Zlib.decode(&frame, 300).unwrap(), data);
        assert!(Codec::Zlib.decode(&frame, 301).is_err());
    }

    #[test]
    fn test_gzip_keeps_prefix() {
        let data = sample(300);
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&data).unwrap();
        let frame = enc.finish().unwrap();
        assert_eq!(Codec::Gzip.decode(&frame, 300).unwrap(), data);
        assert_eq!(Codec::Gzip.decode(&frame, 120).unwrap(), data[..120].to_vec());
        assert!(matches!(
            Codec::Gzip.decode(&data, 10),
            Err(MeshError::UnsupportedFormat(_))
        ));
    }
}
