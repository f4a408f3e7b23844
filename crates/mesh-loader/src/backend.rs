//! Adapters that let the loader read coordinates and index tables from
//! either storage backend through one interface.

use mesh_common::{DimensionId, MeshResult, StructuredSource, VariableHandle};
use zarr_reader::{ArrayInfo, ChunkSource, ChunkedArrayReader};

use crate::topology::CoordinateDescriptor;

const START_INDEX_ATTRIBUTE: &str = "start_index";
const UNITS_ATTRIBUTE: &str = "units";

/// A face/vertex table as stored, before normalization.
#[derive(Debug, Clone)]
pub struct RawIndexTable {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<i64>,
    pub start_index: Option<i64>,
}

/// Read access to coordinate variables and index tables.
pub trait MeshBackend {
    type Handle;

    /// Describe the first variable in `names` that exists.
    fn describe(&self, names: &[String]) -> MeshResult<CoordinateDescriptor<Self::Handle>>;

    /// Read the values of a described variable in native flattened order.
    fn read(&self, desc: &CoordinateDescriptor<Self::Handle>) -> MeshResult<Vec<f64>>;

    /// Read the first index table in `names` that exists.
    fn index_table(&self, names: &[String]) -> MeshResult<RawIndexTable>;
}

/// Backend over a structured array file.
pub struct StructuredBackend<'a, S: StructuredSource> {
    source: &'a S,
}

impl<'a, S: StructuredSource> StructuredBackend<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }
}

impl<S: StructuredSource> MeshBackend for StructuredBackend<'_, S> {
    type Handle = VariableHandle;

    fn describe(&self, names: &[String]) -> MeshResult<CoordinateDescriptor<VariableHandle>> {
        let handle = self.source.find_variable(names)?;
        let extents = self.source.dim_lengths(&handle);
        let rank = extents.len();
        Ok(CoordinateDescriptor {
            name: handle.name().to_string(),
            dim_ids: (0..rank)
                .map(|axis| self.source.dim_identity(&handle, axis))
                .collect(),
            dim_names: (0..rank)
                .map(|axis| self.source.dim_name(&handle, axis))
                .collect(),
            units: self.source.read_attribute_text(&handle, UNITS_ATTRIBUTE),
            extents,
            handle,
        })
    }

    fn read(&self, desc: &CoordinateDescriptor<VariableHandle>) -> MeshResult<Vec<f64>> {
        self.source.read_values(&desc.handle)
    }

    fn index_table(&self, names: &[String]) -> MeshResult<RawIndexTable> {
        let handle = self.source.find_variable(names)?;
        let values = self
            .source
            .read_values_int(&handle)?
            .into_iter()
            .map(i64::from)
            .collect();
        Ok(RawIndexTable {
            name: handle.name().to_string(),
            shape: self.source.dim_lengths(&handle),
            values,
            start_index: self.source.read_attribute_int(&handle, START_INDEX_ATTRIBUTE),
        })
    }
}

/// Backend over a chunked array store.
///
/// Dimension names come from the `_ARRAY_DIMENSIONS` attribute. Arrays
/// without it get anonymous dimensions keyed by extent, so equal-length
/// siblings in one store share a dimension.
pub struct ChunkedBackend<'a, C: ChunkSource> {
    reader: &'a ChunkedArrayReader<C>,
}

impl<'a, C: ChunkSource> ChunkedBackend<'a, C> {
    pub fn new(reader: &'a ChunkedArrayReader<C>) -> Self {
        Self { reader }
    }
}

fn dimension_names(info: &ArrayInfo) -> (Vec<DimensionId>, Vec<String>) {
    match info.dimension_names() {
        Some(names) if names.len() == info.rank() => (
            names.iter().map(DimensionId::new).collect(),
            names,
        ),
        _ => (
            info.shape()
                .iter()
                .map(|len| DimensionId::new(format!("#{}", len)))
                .collect(),
            vec![String::new(); info.rank()],
        ),
    }
}

impl<C: ChunkSource> MeshBackend for ChunkedBackend<'_, C> {
    type Handle = ArrayInfo;

    fn describe(&self, names: &[String]) -> MeshResult<CoordinateDescriptor<ArrayInfo>> {
        let info = self.reader.find_array(names)?;
        let (dim_ids, dim_names) = dimension_names(&info);
        Ok(CoordinateDescriptor {
            name: info.name.clone(),
            extents: info.shape(),
            dim_ids,
            dim_names,
            units: info.attribute_text(UNITS_ATTRIBUTE),
            handle: info,
        })
    }

    fn read(&self, desc: &CoordinateDescriptor<ArrayInfo>) -> MeshResult<Vec<f64>> {
        self.reader.read_f64(&desc.handle)
    }

    fn index_table(&self, names: &[String]) -> MeshResult<RawIndexTable> {
        let info = self.reader.find_array(names)?;
        let values = self.reader.read_i64(&info)?;
        Ok(RawIndexTable {
            name: info.name.clone(),
            shape: info.shape(),
            start_index: info.attribute_int(START_INDEX_ATTRIBUTE),
            values,
        })
    }
}
