//! Entity identity for the store.
//!
//! Entities are plain integer ids. The store never reuses an id: once an entity is removed its id
//! is retired for good, and the table it lived in drops the record at the next compaction.
//!
//! # Architecture
//!
//! - **[`Id`]**: A strictly increasing 64-bit entity identifier.
//!
//! - **[`Handle`]**: A lightweight, `Copy` reference to an entity record in a
//!   [`Storage`](crate::ecs::storage::Storage). A handle caches the record's position and the
//!   table version it was issued under, so lookups are O(1) until the table is compacted or
//!   copied. After that, the handle is transparently re-resolved by id.
//!
//! - **[`Allocator`]**: Issues fresh ids, starting at 1.
//!
//! ```rust,ignore
//! let allocator = Allocator::new();
//! let first = allocator.alloc();  // Id(1)
//! let second = allocator.alloc(); // Id(2)
//! assert!(first < second);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// An entity identifier. Ids issued by an [`Allocator`] start at 1 and only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    /// Construct an id from a raw value.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value of this id.
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Id {
    /// Get an id from a raw value.
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A reference to an entity record in a storage table.
///
/// Handles don't own anything and are cheap to copy. The cached `index` is only trusted while
/// `version` matches the table's version and the record at `index` still carries `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Position of the record in the table's record sequence.
    index: usize,

    /// The entity this handle refers to.
    id: Id,

    /// The table version this handle was issued under.
    version: u64,
}

impl Handle {
    #[inline]
    pub(crate) const fn new(index: usize, id: Id, version: u64) -> Self {
        Self { index, id, version }
    }

    /// Get the id of the entity this handle refers to.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the cached record position.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the table version this handle was issued under.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// A monotonic issuer of entity ids.
///
/// Allocation is lock-free, so a single allocator can be shared between threads. Ids are never
/// recycled.
#[derive(Debug)]
pub struct Allocator {
    /// Next fresh ID to allocate.
    next_id: AtomicU64,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// The first id issued by a fresh allocator.
    pub const FIRST: Id = Id(1);

    /// Construct a new entity allocator starting from [`Allocator::FIRST`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(Self::FIRST.0),
        }
    }

    /// Allocate a new, never before issued id.
    #[inline]
    pub fn alloc(&self) -> Id {
        Id(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate `count` consecutive ids at once.
    pub fn alloc_many(&self, count: usize) -> Vec<Id> {
        let start = self.next_id.fetch_add(count as u64, Ordering::Relaxed);
        (start..start + count as u64).map(Id).collect()
    }

    /// Make sure no id up to and including `id` is issued from now on.
    #[inline]
    pub fn skip_past(&self, id: Id) {
        self.next_id.fetch_max(id.0 + 1, Ordering::Relaxed);
    }

    /// Peek at the id the next call to [`Allocator::alloc`] would return.
    #[inline]
    pub fn peek(&self) -> Id {
        Id(self.next_id.load(Ordering::Relaxed))
    }
}
