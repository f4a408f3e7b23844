//! Chunked array reader: metadata lookup, per-chunk decode and reassembly.

use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use mesh_common::{MeshError, MeshResult};

use crate::codec::Codec;
use crate::metadata::{ArrayMetadata, ChunkLayout, ElementKind, ElementType};
use crate::store::ChunkSource;

const ARRAY_METADATA_KEY: &str = ".zarray";
const ATTRIBUTES_KEY: &str = ".zattrs";
const DIMENSIONS_ATTRIBUTE: &str = "_ARRAY_DIMENSIONS";

/// Everything needed to read one array, resolved from its metadata records.
#[derive(Debug, Clone)]
pub struct ArrayInfo {
    pub name: String,
    pub metadata: ArrayMetadata,
    pub layout: ChunkLayout,
    pub element_type: ElementType,
    pub codec: Codec,
    pub attributes: Map<String, Value>,
}

impl ArrayInfo {
    pub fn shape(&self) -> Vec<usize> {
        self.metadata.shape.iter().map(|&d| d as usize).collect()
    }

    pub fn rank(&self) -> usize {
        self.metadata.shape.len()
    }

    /// Dimension names from the `_ARRAY_DIMENSIONS` attribute.
    pub fn dimension_names(&self) -> Option<Vec<String>> {
        let names = self.attributes.get(DIMENSIONS_ATTRIBUTE)?.as_array()?;
        names
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    pub fn attribute_text(&self, name: &str) -> Option<String> {
        self.attributes
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn attribute_int(&self, name: &str) -> Option<i64> {
        let value = self.attributes.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_array()?.first()?.as_i64())
    }
}

/// Reads whole arrays out of a chunked store.
pub struct ChunkedArrayReader<S: ChunkSource> {
    source: S,
    parallel: bool,
}

impl<S: ChunkSource> ChunkedArrayReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parallel: true,
        }
    }

    /// Decode chunks on the rayon pool (default) or sequentially.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the metadata records of `name`.
    ///
    /// A missing `.zarray` record is `NotFound`; one that cannot be parsed,
    /// or that names an unknown dtype or compressor, is `UnsupportedFormat`.
    pub fn open_array(&self, name: &str) -> MeshResult<ArrayInfo> {
        let key = format!("{}/{}", name, ARRAY_METADATA_KEY);
        let raw = self
            .source
            .get(&key)?
            .ok_or_else(|| MeshError::not_found(format!("array '{}' has no {}", name, key)))?;

        let metadata = ArrayMetadata::parse(&raw)?;
        let layout = metadata.layout()?;
        let element_type = metadata.element_type()?;
        let codec = Codec::from_metadata(metadata.compressor.as_ref())?;

        let attributes = match self.source.get(&format!("{}/{}", name, ATTRIBUTES_KEY))? {
            Some(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => map,
                _ => {
                    return Err(MeshError::unsupported(format!(
                        "attributes of '{}' are not an object",
                        name
                    )))
                }
            },
            None => Map::new(),
        };

        debug!(
            array = %name,
            shape = ?metadata.shape,
            chunks = layout.chunk_count(),
            dtype = %metadata.dtype,
            codec = codec.id(),
            "Opened chunked array"
        );

        Ok(ArrayInfo {
            name: name.to_string(),
            metadata,
            layout,
            element_type,
            codec,
            attributes,
        })
    }

    /// Open the first array in `names` that exists.
    pub fn find_array(&self, names: &[String]) -> MeshResult<ArrayInfo> {
        for name in names {
            match self.open_array(name) {
                Ok(info) => return Ok(info),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(MeshError::not_found(format!(
            "none of {:?} exist in {}",
            names,
            self.source.base_location().display()
        )))
    }

    /// Read and decode every chunk into one contiguous buffer of encoded
    /// elements, in chunk order.
    pub fn read_bytes(&self, info: &ArrayInfo) -> MeshResult<Vec<u8>> {
        let width = info.element_type.width;
        let total_bytes = info.layout.total_length.checked_mul(width).ok_or_else(|| {
            MeshError::unsupported(format!("array '{}' is too large", info.name))
        })?;
        let mut buffer = vec![0u8; total_bytes];
        if total_bytes == 0 {
            return Ok(buffer);
        }

        let chunk_bytes = info.layout.chunk_length * width;
        if self.parallel {
            buffer
                .par_chunks_mut(chunk_bytes)
                .enumerate()
                .try_for_each(|(k, region)| self.read_chunk(info, k, region))?;
        } else {
            buffer
                .chunks_mut(chunk_bytes)
                .enumerate()
                .try_for_each(|(k, region)| self.read_chunk(info, k, region))?;
        }

        Ok(buffer)
    }

    /// Read a floating-point array widened to `f64`.
    pub fn read_f64(&self, info: &ArrayInfo) -> MeshResult<Vec<f64>> {
        if info.element_type.kind != ElementKind::Float {
            return Err(MeshError::unsupported(format!(
                "array '{}' has dtype {}, expected a float",
                info.name, info.metadata.dtype
            )));
        }
        let bytes = self.read_bytes(info)?;
        info.element_type.to_f64(&bytes)
    }

    /// Read an integer array as `i64`.
    pub fn read_i64(&self, info: &ArrayInfo) -> MeshResult<Vec<i64>> {
        if info.element_type.kind == ElementKind::Float {
            return Err(MeshError::unsupported(format!(
                "array '{}' has dtype {}, expected an integer",
                info.name, info.metadata.dtype
            )));
        }
        let bytes = self.read_bytes(info)?;
        info.element_type.to_i64(&bytes)
    }

    /// Open and read `name` as `f64`.
    pub fn read_array_f64(&self, name: &str) -> MeshResult<Vec<f64>> {
        let info = self.open_array(name)?;
        self.read_f64(&info)
    }

    fn read_chunk(&self, info: &ArrayInfo, k: usize, dest: &mut [u8]) -> MeshResult<()> {
        debug_assert_eq!(
            dest.len(),
            info.layout.chunk_elements(k) * info.element_type.width
        );
        let key = format!("{}/{}", info.name, info.layout.chunk_key(k));

        match self.source.get(&key)? {
            Some(raw) => {
                trace!(chunk = %key, raw_bytes = raw.len(), expected = dest.len(), "Decoding chunk");
                info.codec.decode_into(&raw, dest).map_err(|e| match e {
                    MeshError::UnsupportedFormat(msg) => {
                        MeshError::unsupported(format!("chunk {}: {}", key, msg))
                    }
                    other => other,
                })
            }
            None => {
                let fill = info.metadata.fill_value_f64().ok_or_else(|| {
                    MeshError::not_found(format!("chunk {} is missing and has no fill value", key))
                })?;
                trace!(chunk = %key, fill, "Filling missing chunk");
                let encoded = info.element_type.encode(fill);
                for slot in dest.chunks_exact_mut(encoded.len()) {
                    slot.copy_from_slice(&encoded);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    struct MemorySource(HashMap<String, Vec<u8>>);

    impl ChunkSource for MemorySource {
        fn base_location(&self) -> &Path {
            Path::new("memory")
        }

        fn get(&self, key: &str) -> MeshResult<Option<Vec<u8>>> {
            Ok(self.0.get(key).cloned())
        }
    }

    fn f8(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn store(entries: &[(&str, Vec<u8>)]) -> ChunkedArrayReader<MemorySource> {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ChunkedArrayReader::new(MemorySource(map)).with_parallel(false)
    }

    #[test]
    fn test_reassembles_raw_chunks() {
        let r = store(&[
            ("a/.zarray", br#"{"shape":[5],"chunks":[2],"dtype":"<f8","compressor":null}"#.to_vec()),
            ("a/0", f8(&[1.0, 2.0])),
            ("a/1", f8(&[3.0, 4.0])),
            ("a/2", f8(&[5.0, 0.0])),
        ]);
        assert_eq!(r.read_array_f64("a").unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_missing_metadata_is_not_found() {
        let r = store(&[]);
        assert!(r.open_array("a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_chunk_uses_fill_value() {
        let r = store(&[
            ("a/.zarray", br#"{"shape":[4],"chunks":[2],"dtype":"<f4","fill_value":-1.0}"#.to_vec()),
            ("a/0", [7.0f32, 8.0].iter().flat_map(|v| v.to_le_bytes()).collect()),
        ]);
        assert_eq!(r.read_array_f64("a").unwrap(), vec![7.0, 8.0, -1.0, -1.0]);
    }

    #[test]
    fn test_missing_chunk_without_fill_is_not_found() {
        let r = store(&[(
            "a/.zarray",
            br#"{"shape":[4],"chunks":[2],"dtype":"<f8","fill_value":null}"#.to_vec(),
        )]);
        assert!(r.read_array_f64("a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_array_tries_in_order() {
        let r = store(&[
            ("lat/.zarray", br#"{"shape":[1],"dtype":"<f8"}"#.to_vec()),
            ("lat/0", f8(&[9.0])),
        ]);
        let names = vec!["latitude".to_string(), "lat".to_string()];
        assert_eq!(r.find_array(&names).unwrap().name, "lat");

        let names = vec!["nope".to_string()];
        let err = r.find_array(&names).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_attributes() {
        let r = store(&[
            ("a/.zarray", br#"{"shape":[1],"dtype":"<i4"}"#.to_vec()),
            (
                "a/.zattrs",
                br#"{"_ARRAY_DIMENSIONS":["nFaces"],"units":"1","start_index":1}"#.to_vec(),
            ),
            ("a/0", 5i32.to_le_bytes().to_vec()),
        ]);
        let info = r.open_array("a").unwrap();
        assert_eq!(info.dimension_names(), Some(vec!["nFaces".to_string()]));
        assert_eq!(info.attribute_int("start_index"), Some(1));
        assert_eq!(r.read_i64(&info).unwrap(), vec![5]);
        assert!(matches!(
            r.read_f64(&info),
            Err(MeshError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_short_raw_chunk_fails_whole_read() {
        let r = store(&[
            ("a/.zarray", br#"{"shape":[4],"chunks":[2],"dtype":"<f8"}"#.to_vec()),
            ("a/0", f8(&[1.0, 2.0])),
            ("a/1", f8(&[3.0])),
        ]);
        assert!(matches!(
            r.read_array_f64("a"),
            Err(MeshError::UnsupportedFormat(_))
        ));
    }
}
