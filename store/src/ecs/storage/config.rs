/// Configuration for a [`Storage`](super::Storage) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Bytes pre-allocated for the table's arena, and the minimum size of the fresh arena built
    /// by compaction or copying.
    pub reserve: usize,
}

impl Config {
    /// The default arena reserve: 64 KiB.
    pub const DEFAULT_RESERVE: usize = 64 * 1024;

    /// Set the arena reserve.
    pub const fn with_reserve(mut self, bytes: usize) -> Self {
        self.reserve = bytes;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reserve: Self::DEFAULT_RESERVE,
        }
    }
}
