//! Self-describing binary codec for spectrogram payloads
//!
//! A spectrogram is a complex-valued time-frequency matrix (rows = frequency
//! bins, columns = time samples). The wire format is explicit about element
//! type, dimensions and byte order so that a payload written by one service
//! can be decoded by any other without environment-specific assumptions:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "GWSP"
//! 4       1     format version (currently 1)
//! 5       1     element type code (1 = complex64: two little-endian f32)
//! 6       2     reserved (zero)
//! 8       4     row count, little-endian u32
//! 12      4     column count, little-endian u32
//! 16      ...   row-major (re, im) f32 pairs, little-endian
//! ```

use crate::db::models::SpectrogramMetadata;
use crate::{Error, Result};
use ndarray::Array2;
use num_complex::Complex32;

const MAGIC: &[u8; 4] = b"GWSP";
const FORMAT_VERSION: u8 = 1;
const ELEM_COMPLEX64: u8 = 1;
const HEADER_LEN: usize = 16;

/// Element type name recorded in spectrogram metadata
pub const DTYPE_COMPLEX64: &str = "complex64";

/// Decoded spectrogram payload
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramBlob {
    pub matrix: Array2<Complex32>,
}

impl SpectrogramBlob {
    pub fn new(matrix: Array2<Complex32>) -> Self {
        Self { matrix }
    }

    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Shape/dtype metadata stored alongside the binary payload
    pub fn metadata(&self) -> SpectrogramMetadata {
        SpectrogramMetadata {
            rows: self.rows(),
            cols: self.cols(),
            dtype: DTYPE_COMPLEX64.to_string(),
        }
    }

    /// Serialize to the self-describing binary format
    pub fn encode(&self) -> Vec<u8> {
        let rows = self.rows();
        let cols = self.cols();
        let mut out = Vec::with_capacity(HEADER_LEN + rows * cols * 8);
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.push(ELEM_COMPLEX64);
        out.extend_from_slice(&[0u8, 0u8]);
        out.extend_from_slice(&(rows as u32).to_le_bytes());
        out.extend_from_slice(&(cols as u32).to_le_bytes());
        for value in self.matrix.iter() {
            out.extend_from_slice(&value.re.to_le_bytes());
            out.extend_from_slice(&value.im.to_le_bytes());
        }
        out
    }

    /// Decode a binary payload, validating magic, version and length
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Codec(format!(
                "payload too short: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(Error::Codec("bad magic".to_string()));
        }
        if bytes[4] != FORMAT_VERSION {
            return Err(Error::Codec(format!(
                "unsupported format version {}",
                bytes[4]
            )));
        }
        if bytes[5] != ELEM_COMPLEX64 {
            return Err(Error::Codec(format!(
                "unsupported element type code {}",
                bytes[5]
            )));
        }

        let rows = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let cols = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
        let expected = HEADER_LEN + rows * cols * 8;
        if bytes.len() != expected {
            return Err(Error::Codec(format!(
                "payload length {} does not match shape ({}, {})",
                bytes.len(),
                rows,
                cols
            )));
        }

        let mut values = Vec::with_capacity(rows * cols);
        for chunk in bytes[HEADER_LEN..].chunks_exact(8) {
            let re = f32::from_le_bytes(chunk[0..4].try_into().unwrap());
            let im = f32::from_le_bytes(chunk[4..8].try_into().unwrap());
            values.push(Complex32::new(re, im));
        }

        let matrix = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::Codec(format!("shape error: {}", e)))?;
        Ok(Self { matrix })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn encode_decode_preserves_values() {
        let matrix = arr2(&[
            [Complex32::new(1.0, -2.0), Complex32::new(0.5, 0.25)],
            [Complex32::new(0.0, 0.0), Complex32::new(-3.5, 7.0)],
            [Complex32::new(1e-8, 1e8), Complex32::new(f32::MIN, f32::MAX)],
        ]);
        let blob = SpectrogramBlob::new(matrix);
        let bytes = blob.encode();
        let decoded = SpectrogramBlob::decode(&bytes).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn metadata_reports_shape_and_dtype() {
        let blob = SpectrogramBlob::new(Array2::zeros((4, 8)));
        let meta = blob.metadata();
        assert_eq!(meta.rows, 4);
        assert_eq!(meta.cols, 8);
        assert_eq!(meta.dtype, "complex64");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = SpectrogramBlob::new(Array2::zeros((2, 2))).encode();
        bytes[0] = b'X';
        assert!(SpectrogramBlob::decode(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = SpectrogramBlob::new(Array2::zeros((2, 2))).encode();
        assert!(SpectrogramBlob::decode(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = SpectrogramBlob::new(Array2::zeros((1, 1))).encode();
        bytes[4] = 9;
        assert!(SpectrogramBlob::decode(&bytes).is_err());
    }
}
