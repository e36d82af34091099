/// Options fixed when a [`Glue`](crate::Glue) is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlueOptions {
    /// How many mutations may be nested inside listener callbacks before a
    /// further one fails with [`GlueError::ReentrancyLimit`](crate::GlueError).
    pub max_dispatch_depth: usize,
    /// Whether `set` past the end of an array pads the gap with `null`.
    /// When `false`, only writes at `len` (appends) are accepted.
    pub pad_sparse_writes: bool,
    /// Largest number of `null`s a single padded write may insert.
    pub max_sparse_gap: usize,
}

impl GlueOptions {
    pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;
    pub const DEFAULT_MAX_SPARSE_GAP: usize = 1024;

    pub fn max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    pub fn pad_sparse_writes(mut self, pad: bool) -> Self {
        self.pad_sparse_writes = pad;
        self
    }

    pub fn max_sparse_gap(mut self, gap: usize) -> Self {
        self.max_sparse_gap = gap;
        self
    }

    /// How many slots past the end of an array a `set` may land.
    pub(crate) fn allowed_gap(&self) -> usize {
        if self.pad_sparse_writes {
            self.max_sparse_gap
        } else {
            0
        }
    }
}

impl Default for GlueOptions {
    fn default() -> Self {
        Self {
            max_dispatch_depth: Self::DEFAULT_MAX_DISPATCH_DEPTH,
            pad_sparse_writes: true,
            max_sparse_gap: Self::DEFAULT_MAX_SPARSE_GAP,
        }
    }
}
