//! Exact (flat) nearest-neighbor index over the corpus embeddings.
//!
//! Every query scans all stored vectors, so results are exact. Position `i` in
//! the index is passage `i` of the corpus; the index itself knows nothing about
//! text. On disk the vectors sit behind a small fixed header (see [`HEADER_LEN`])
//! and are memory mapped on open.

mod error;
mod file;


pub use error::{IndexError, IndexResult};
pub use file::{HEADER_LEN, INDEX_MAGIC};

use half::f16;
use half::slice::HalfFloatSliceExt;
use memmap2::Mmap;

/// Distance function the index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared Euclidean distance.
    L2,
    /// Inner product, reported negated so that lower is closer.
    InnerProduct,
}

impl Metric {
    /// Distance between two equal-length vectors; lower is closer for every metric.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum(),
            Metric::InnerProduct => -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            Metric::L2 => 0,
            Metric::InnerProduct => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> IndexResult<Self> {
        match tag {
            0 => Ok(Metric::L2),
            1 => Ok(Metric::InnerProduct),
            tag => Err(IndexError::UnsupportedMetric { tag }),
        }
    }
}

/// On-disk element encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    #[default]
    F32,
    F16,
}

impl ElementType {
    /// Bytes per stored element.
    pub fn size(self) -> usize {
        match self {
            ElementType::F32 => 4,
            ElementType::F16 => 2,
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            ElementType::F32 => 0,
            ElementType::F16 => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> IndexResult<Self> {
        match tag {
            0 => Ok(ElementType::F32),
            1 => Ok(ElementType::F16),
            tag => Err(IndexError::UnsupportedElementType { tag }),
        }
    }
}

/// One search result: a corpus position and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
}

enum Storage {
    Owned(Vec<f32>),
    Mapped { mmap: Mmap, element: ElementType },
}

/// Read-only exact index.
pub struct FlatIndex {
    metric: Metric,
    dim: usize,
    len: usize,
    storage: Storage,
}

impl std::fmt::Debug for FlatIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatIndex")
            .field("metric", &self.metric)
            .field("dim", &self.dim)
            .field("len", &self.len)
            .field(
                "storage",
                &match &self.storage {
                    Storage::Owned(_) => "owned".to_string(),
                    Storage::Mapped { element, .. } => format!("mapped({:?})", element),
                },
            )
            .finish()
    }
}

impl FlatIndex {
    /// Builds an in-memory index. Every vector must have `dim` elements.
    pub fn from_vectors<I, V>(metric: Metric, dim: usize, vectors: I) -> IndexResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        if dim == 0 {
            return Err(IndexError::Corrupt {
                reason: "dimension must be at least 1".to_string(),
            });
        }

        let mut data = Vec::new();
        let mut len = 0;
        for vector in vectors {
            let vector = vector.as_ref();
            if vector.len() != dim {
                return Err(IndexError::InvalidDimension {
                    expected: dim,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
            len += 1;
        }

        Ok(Self {
            metric,
            dim,
            len,
            storage: Storage::Owned(data),
        })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns up to `k` hits ordered by increasing distance.
    ///
    /// Fewer than `k` hits come back when the index holds fewer vectors. Equal
    /// distances keep the lower position first.
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(IndexError::InvalidDimension {
                expected: self.dim,
                actual: query.len(),
            });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let metric = self.metric;
        let mut hits = Vec::with_capacity(self.len);
        self.for_each_row(|position, row| {
            hits.push(SearchHit {
                position,
                distance: metric.distance(query, row),
            });
        })?;

        let order = |a: &SearchHit, b: &SearchHit| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        };

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, order);
            hits.truncate(k);
        }
        hits.sort_by(order);

        Ok(hits)
    }

    /// Visits every stored vector in position order, widening f16 rows to f32.
    pub(crate) fn for_each_row<F>(&self, mut visit: F) -> IndexResult<()>
    where
        F: FnMut(usize, &[f32]),
    {
        match &self.storage {
            Storage::Owned(data) => {
                for (position, row) in data.chunks_exact(self.dim).enumerate() {
                    visit(position, row);
                }
            }
            Storage::Mapped {
                mmap,
                element: ElementType::F32,
            } => {
                let data: &[f32] = bytemuck::try_cast_slice(&mmap[HEADER_LEN..])
                    .map_err(|e| IndexError::Corrupt {
                        reason: format!("f32 payload not castable: {:?}", e),
                    })?;
                for (position, row) in data.chunks_exact(self.dim).enumerate() {
                    visit(position, row);
                }
            }
            Storage::Mapped {
                mmap,
                element: ElementType::F16,
            } => {
                let data: &[f16] = bytemuck::try_cast_slice(&mmap[HEADER_LEN..])
                    .map_err(|e| IndexError::Corrupt {
                        reason: format!("f16 payload not castable: {:?}", e),
                    })?;
                let mut widened = vec![0.0f32; self.dim];
                for (position, row) in data.chunks_exact(self.dim).enumerate() {
                    row.convert_to_f32_slice(&mut widened);
                    visit(position, &widened);
                }
            }
        }
        Ok(())
    }
}
