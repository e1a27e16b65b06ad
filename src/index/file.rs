//! Index file layout (all integers little-endian):
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0      | 8    | magic `RAGIDX01` |
//! | 8      | 1    | metric (0 = L2, 1 = inner product) |
//! | 9      | 1    | element type (0 = f32, 1 = f16) |
//! | 10     | 2    | reserved, zero |
//! | 12     | 4    | dimension |
//! | 16     | 8    | vector count |
//! | 24     | ...  | `count * dimension` elements, row-major |

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use half::f16;
use memmap2::Mmap;
use tracing::{debug, info};

use super::{ElementType, FlatIndex, IndexError, IndexResult, Metric, Storage};

pub const INDEX_MAGIC: &[u8; 8] = b"RAGIDX01";

pub const HEADER_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    metric: Metric,
    element: ElementType,
    dim: usize,
    count: usize,
}

impl Header {
    fn encode(&self) -> IndexResult<[u8; HEADER_LEN]> {
        let dim = u32::try_from(self.dim).map_err(|_| IndexError::Corrupt {
            reason: format!("dimension {} does not fit the header", self.dim),
        })?;

        let mut out = [0u8; HEADER_LEN];
        out[0..8].copy_from_slice(INDEX_MAGIC);
        out[8] = self.metric.tag();
        out[9] = self.element.tag();
        out[12..16].copy_from_slice(&dim.to_le_bytes());
        out[16..24].copy_from_slice(&(self.count as u64).to_le_bytes());
        Ok(out)
    }

    fn decode(bytes: &[u8], path: &Path) -> IndexResult<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..8] != INDEX_MAGIC {
            return Err(IndexError::BadMagic {
                path: path.to_path_buf(),
            });
        }

        let metric = Metric::from_tag(bytes[8])?;
        let element = ElementType::from_tag(bytes[9])?;

        let mut dim = [0u8; 4];
        dim.copy_from_slice(&bytes[12..16]);
        let mut count = [0u8; 8];
        count.copy_from_slice(&bytes[16..24]);

        let dim = u32::from_le_bytes(dim) as usize;
        let count = usize::try_from(u64::from_le_bytes(count)).map_err(|_| IndexError::Corrupt {
            reason: "vector count exceeds address space".to_string(),
        })?;

        if dim == 0 {
            return Err(IndexError::Corrupt {
                reason: "dimension is zero".to_string(),
            });
        }

        Ok(Self {
            metric,
            element,
            dim,
            count,
        })
    }

    fn file_len(&self) -> Option<usize> {
        self.count
            .checked_mul(self.dim)?
            .checked_mul(self.element.size())?
            .checked_add(HEADER_LEN)
    }
}

impl FlatIndex {
    /// Memory maps an index file written by [`FlatIndex::write_to`].
    pub fn open<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let path = path.as_ref();
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let actual_len = file.metadata().map_err(io_err)?.len() as usize;
        if actual_len < HEADER_LEN {
            return Err(IndexError::Corrupt {
                reason: format!(
                    "file is {} bytes, shorter than the {}-byte header",
                    actual_len, HEADER_LEN
                ),
            });
        }

        // SAFETY: the index file is treated as immutable while the process runs.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        let header = Header::decode(&mmap[..HEADER_LEN], path)?;

        let expected_len = header.file_len().ok_or_else(|| IndexError::Corrupt {
            reason: "header sizes overflow".to_string(),
        })?;
        if expected_len != mmap.len() {
            return Err(IndexError::Corrupt {
                reason: format!(
                    "expected {} bytes for {} x {} {:?} vectors, found {}",
                    expected_len,
                    header.count,
                    header.dim,
                    header.element,
                    mmap.len()
                ),
            });
        }

        let storage = if cfg!(target_endian = "little") {
            let payload = &mmap[HEADER_LEN..];
            let castable = match header.element {
                ElementType::F32 => bytemuck::try_cast_slice::<u8, f32>(payload).is_ok(),
                ElementType::F16 => bytemuck::try_cast_slice::<u8, f16>(payload).is_ok(),
            };
            if !castable {
                return Err(IndexError::Corrupt {
                    reason: "payload is misaligned".to_string(),
                });
            }
            Storage::Mapped {
                mmap,
                element: header.element,
            }
        } else {
            Storage::Owned(decode_le(&mmap[HEADER_LEN..], header.element))
        };

        info!(
            path = %path.display(),
            metric = ?header.metric,
            element = ?header.element,
            dim = header.dim,
            count = header.count,
            "Vector index opened"
        );

        Ok(Self {
            metric: header.metric,
            dim: header.dim,
            len: header.count,
            storage,
        })
    }

    /// Persists the index, encoding elements as `element`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P, element: ElementType) -> IndexResult<()> {
        let path = path.as_ref();
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        let header = Header {
            metric: self.metric,
            element,
            dim: self.dim,
            count: self.len,
        };

        let mut payload = Vec::with_capacity(self.len * self.dim * element.size());
        self.for_each_row(|_, row| {
            for &x in row {
                match element {
                    ElementType::F32 => payload.extend_from_slice(&x.to_le_bytes()),
                    ElementType::F16 => payload.extend_from_slice(&f16::from_f32(x).to_le_bytes()),
                }
            }
        })?;

        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        writer.write_all(&header.encode()?).map_err(io_err)?;
        writer.write_all(&payload).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        debug!(path = %path.display(), count = self.len, "Vector index written");
        Ok(())
    }
}

fn decode_le(payload: &[u8], element: ElementType) -> Vec<f32> {
    match element {
        ElementType::F32 => payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        ElementType::F16 => payload
            .chunks_exact(2)
            .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect(),
    }
}
