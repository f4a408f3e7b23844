//! Thin safe wrappers over the c-blosc library.

use std::ffi::{c_char, c_int, c_void};

use blosc_src::{
    blosc_cbuffer_validate, blosc_compress_ctx, blosc_decompress_ctx, BLOSC_MAX_OVERHEAD,
};

use mesh_common::{MeshError, MeshResult};

/// Uncompressed size declared in a blosc frame header.
///
/// Validates the header against the frame length first so a truncated or
/// foreign payload is reported instead of read out of bounds.
pub fn decompressed_size(src: &[u8]) -> MeshResult<usize> {
    let mut nbytes: usize = 0;
    // SAFETY: the pointer and length describe `src`; blosc only reads within
    // `cbytes` and writes one usize to `nbytes`.
    let status = unsafe {
        blosc_cbuffer_validate(src.as_ptr().cast::<c_void>(), src.len(), &mut nbytes)
    };
    if status != 0 {
        return Err(MeshError::unsupported(format!(
            "invalid blosc frame of {} bytes",
            src.len()
        )));
    }
    Ok(nbytes)
}

/// Decompress a blosc frame into `dest`, which must be exactly the declared
/// size.
pub fn decompress_into(src: &[u8], dest: &mut [u8]) -> MeshResult<()> {
    let declared = decompressed_size(src)?;
    if declared != dest.len() {
        return Err(MeshError::unsupported(format!(
            "blosc frame declares {} bytes, destination holds {}",
            declared,
            dest.len()
        )));
    }
    if declared == 0 {
        return Ok(());
    }
    // SAFETY: `src` was validated above and `dest` is exactly as large as
    // the size the frame declares.
    let written = unsafe {
        blosc_decompress_ctx(
            src.as_ptr().cast::<c_void>(),
            dest.as_mut_ptr().cast::<c_void>(),
            dest.len(),
            1,
        )
    };
    if written < 0 || written as usize != declared {
        return Err(MeshError::unsupported(format!(
            "blosc decompression failed with status {}",
            written
        )));
    }
    Ok(())
}

/// Compress `src` into a blosc frame using the lz4 backend and byte shuffle.
pub fn compress(src: &[u8], typesize: usize) -> MeshResult<Vec<u8>> {
    let mut dest = vec![0u8; src.len() + BLOSC_MAX_OVERHEAD as usize];
    let compressor = b"lz4\0";
    // SAFETY: `dest` has room for the worst case of `src.len()` plus the
    // frame overhead; the compressor name is NUL-terminated.
    let written = unsafe {
        blosc_compress_ctx(
            5,
            1,
            typesize,
            src.len(),
            src.as_ptr().cast::<c_void>(),
            dest.as_mut_ptr().cast::<c_void>(),
            dest.len(),
            compressor.as_ptr().cast::<c_char>(),
            0,
            1,
        )
    };
    if written <= 0 {
        return Err(MeshError::unsupported(format!(
            "blosc compression failed with status {}",
            written
        )));
    }
    dest.truncate(written as usize);
    Ok(dest)
}
